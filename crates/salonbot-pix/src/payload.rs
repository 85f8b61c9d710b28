// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static Pix payload builder (EMV merchant-presented mode, BR profile).

use salonbot_core::SalonError;
use thiserror::Error;

use crate::crc::crc16_hex;
use crate::fold::fold_ascii;

const GUI: &str = "BR.GOV.BCB.PIX";
const DEFAULT_TXID: &str = "***";
const CHECKSUM_HEADER: &str = "6304";
const MAX_NAME: usize = 25;
const MAX_CITY: usize = 15;
const MAX_TXID: usize = 25;
const MAX_FIELD: usize = 99;

/// Preconditions a payload cannot be produced without.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PixError {
    /// The Pix key is empty after whitespace removal.
    #[error("pix key is missing")]
    MissingKey,

    /// A TLV value does not fit the two-digit length prefix.
    #[error("field {id} is {len} characters long, the limit is 99")]
    FieldTooLong { id: &'static str, len: usize },

    #[error("qr rendering failed: {0}")]
    Qr(String),
}

impl From<PixError> for SalonError {
    fn from(err: PixError) -> Self {
        SalonError::Pix(err.to_string())
    }
}

/// Payment parameters for one "copia e cola" string.
///
/// ```
/// use salonbot_pix::PixPayload;
///
/// let code = PixPayload::new("5511999999999", "Dr. Teste", "Sao Paulo")
///     .amount_cents(15000)
///     .txid("TESTE123")
///     .encode()
///     .unwrap();
/// assert!(code.starts_with("000201"));
/// assert!(code.contains("150.00"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixPayload {
    key: String,
    merchant_name: String,
    merchant_city: String,
    amount_cents: u64,
    txid: String,
}

impl PixPayload {
    pub fn new(
        key: impl Into<String>,
        merchant_name: impl Into<String>,
        merchant_city: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            merchant_name: merchant_name.into(),
            merchant_city: merchant_city.into(),
            amount_cents: 0,
            txid: String::new(),
        }
    }

    /// Amount in centavos. Zero leaves the amount open for the payer.
    pub fn amount_cents(mut self, cents: u64) -> Self {
        self.amount_cents = cents;
        self
    }

    pub fn txid(mut self, txid: impl Into<String>) -> Self {
        self.txid = txid.into();
        self
    }

    /// Renders the payload string, checksum included.
    pub fn encode(&self) -> Result<String, PixError> {
        let key: String = self.key.chars().filter(|c| !c.is_whitespace()).collect();
        if key.is_empty() {
            return Err(PixError::MissingKey);
        }

        let merchant_account = tlv("00", GUI)? + &tlv("01", &key)?;
        let txid = normalize_txid(&self.txid);
        let additional = tlv("05", &txid)?;

        let mut out = String::with_capacity(128);
        out.push_str(&tlv("00", "01")?);
        out.push_str(&tlv("01", "12")?);
        out.push_str(&tlv("26", &merchant_account)?);
        out.push_str(&tlv("52", "0000")?);
        out.push_str(&tlv("53", "986")?);
        if self.amount_cents > 0 {
            out.push_str(&tlv("54", &format_amount(self.amount_cents))?);
        }
        out.push_str(&tlv("58", "BR")?);
        out.push_str(&tlv("59", &fold_ascii(&self.merchant_name, MAX_NAME))?);
        out.push_str(&tlv("60", &fold_ascii(&self.merchant_city, MAX_CITY))?);
        out.push_str(&tlv("62", &additional)?);
        out.push_str(CHECKSUM_HEADER);

        let crc = crc16_hex(out.as_bytes());
        out.push_str(&crc);
        Ok(out)
    }
}

/// One-shot form of [`PixPayload::encode`].
pub fn encode(
    key: &str,
    merchant_name: &str,
    merchant_city: &str,
    amount_cents: u64,
    txid: &str,
) -> Result<String, PixError> {
    PixPayload::new(key, merchant_name, merchant_city)
        .amount_cents(amount_cents)
        .txid(txid)
        .encode()
}

/// True when `payload` ends in a checksum field matching its prefix.
pub fn verify(payload: &str) -> bool {
    if !payload.is_ascii() || payload.len() < 8 {
        return false;
    }
    let (body, crc) = payload.split_at(payload.len() - 4);
    body.ends_with(CHECKSUM_HEADER) && crc16_hex(body.as_bytes()) == crc
}

fn tlv(id: &'static str, value: &str) -> Result<String, PixError> {
    let len = value.len();
    if len > MAX_FIELD {
        return Err(PixError::FieldTooLong { id, len });
    }
    Ok(format!("{id}{len:02}{value}"))
}

fn normalize_txid(raw: &str) -> String {
    let txid: String = raw
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(MAX_TXID)
        .collect();
    if txid.is_empty() {
        DEFAULT_TXID.to_string()
    } else {
        txid
    }
}

fn format_amount(cents: u64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}
