// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pix "copia e cola" codec.
//!
//! Encodes payment parameters into the Brazilian Central Bank's EMV-QR TLV
//! string. The trailing four characters are always the CRC16-CCITT of
//! everything before them, `6304` checksum header included. Encoding is a
//! pure function; callers skip the payment step on [`PixError`].

pub mod crc;
pub mod fold;
pub mod payload;
pub mod qr;

pub use crc::crc16_ccitt;
pub use fold::fold_ascii;
pub use payload::{PixError, PixPayload, encode, verify};
pub use qr::render_terminal;
