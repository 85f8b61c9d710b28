// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CRC16-CCITT as used by the EMV QR checksum field.

const POLY: u16 = 0x1021;
const INIT: u16 = 0xFFFF;

/// CRC16-CCITT (poly `0x1021`, init `0xFFFF`, MSB-first, no final XOR).
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    data.iter().fold(INIT, |mut crc, &byte| {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLY
            } else {
                crc << 1
            };
        }
        crc
    })
}

/// Four uppercase, zero-padded hex digits.
pub fn crc16_hex(data: &[u8]) -> String {
    format!("{:04X}", crc16_ccitt(data))
}
