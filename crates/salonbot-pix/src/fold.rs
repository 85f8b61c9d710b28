// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Strips diacritics and anything outside printable ASCII, then keeps at
/// most `max` characters.
///
/// `"São José"` folds to `"Sao Jose"`. The result is pure ASCII, so the
/// character limit is also a byte limit.
pub fn fold_ascii(input: &str, max: usize) -> String {
    input
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .take(max)
        .collect()
}
