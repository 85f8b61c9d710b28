// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal QR rendering for payment codes.

use qrcode::{Color, EcLevel, QrCode};

use crate::payload::PixError;

/// Renders `payload` as a QR code made of Unicode half blocks, two module
/// rows per text line, with a one-module quiet zone.
pub fn render_terminal(payload: &str) -> Result<String, PixError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
        .map_err(|e| PixError::Qr(e.to_string()))?;

    let width = code.width();
    let colors = code.into_colors();
    let quiet = 1;
    let span = width + 2 * quiet;
    let is_dark = |row: usize, col: usize| -> bool {
        let (Some(r), Some(c)) = (row.checked_sub(quiet), col.checked_sub(quiet)) else {
            return false;
        };
        r < width && c < width && colors[r * width + c] == Color::Dark
    };

    let mut out = String::with_capacity(span * (span / 2 + 1) * 3);
    for row in (0..span).step_by(2) {
        for col in 0..span {
            out.push(match (is_dark(row, col), is_dark(row + 1, col)) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            });
        }
        out.push('\n');
    }
    Ok(out)
}
