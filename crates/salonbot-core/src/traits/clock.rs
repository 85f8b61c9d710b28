// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Calendar clock used for age checks.

use chrono::NaiveDate;

/// Source of the current calendar date.
pub trait Clock: Send + Sync {
    /// Today's date in the salon's local time zone.
    fn today(&self) -> NaiveDate;
}

/// [`Clock`] backed by the system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}
