// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Known-answer and property tests for the Pix codec.

use proptest::prelude::*;
use salonbot_pix::{PixPayload, crc16_ccitt, encode, verify};

#[test]
fn phone_key_with_amount_matches_known_payload() {
    let code = encode("5511999999999", "Dr. Teste", "Sao Paulo", 15000, "TESTE123").unwrap();
    assert_eq!(
        code,
        "00020101021226350014BR.GOV.BCB.PIX011355119999999995204000053039865406150.005802BR\
         5909Dr. Teste6009Sao Paulo62120508TESTE1236304922F"
    );
    assert!(code.starts_with("000201"));
    assert!(code.contains("5511999999999"));
    assert!(code.contains("150.00"));

    let (body, crc) = code.split_at(code.len() - 4);
    assert_eq!(crc, format!("{:04X}", crc16_ccitt(body.as_bytes())));
}

#[test]
fn zero_amount_omits_field_and_defaults_txid() {
    let code = encode("5511999999999", "Dr. Teste", "Sao Paulo", 0, "").unwrap();
    assert_eq!(
        code,
        "00020101021226350014BR.GOV.BCB.PIX011355119999999995204000053039865802BR\
         5909Dr. Teste6009Sao Paulo62070503***630416EB"
    );
    assert!(!code.contains("5406"));
}

#[test]
fn accented_merchant_fields_are_folded_and_truncated() {
    let code = PixPayload::new(
        "salao@exemplo.com.br",
        "Salão Beleza Pura Estética Avançada",
        "São José dos Campos",
    )
    .amount_cents(8990)
    .txid("AGD42")
    .encode()
    .unwrap();
    assert_eq!(
        code,
        "00020101021226420014BR.GOV.BCB.PIX0120salao@exemplo.com.br520400005303986540589.90\
         5802BR5925Salao Beleza Pura Estetic6015Sao Jose dos Ca62090505AGD4263048653"
    );
}

#[test]
fn key_whitespace_is_stripped() {
    let spaced = encode("55 11 99999 9999", "Dr. Teste", "Sao Paulo", 15000, "TESTE123").unwrap();
    let plain = encode("5511999999999", "Dr. Teste", "Sao Paulo", 15000, "TESTE123").unwrap();
    assert_eq!(spaced, plain);
}

proptest! {
    #[test]
    fn encoding_is_deterministic_and_self_checking(
        key in "[a-z0-9@.+-]{1,60}",
        name in "\\PC{0,40}",
        city in "\\PC{0,30}",
        cents in 0u64..10_000_000,
        txid in "[A-Za-z0-9]{0,30}",
    ) {
        let first = encode(&key, &name, &city, cents, &txid).unwrap();
        let second = encode(&key, &name, &city, cents, &txid).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert!(first.starts_with("000201"));
        prop_assert!(first.is_ascii());
        prop_assert!(verify(&first));
    }
}
