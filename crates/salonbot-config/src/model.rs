// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Salonbot dispatch engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level Salonbot configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SalonConfig {
    /// Salon identity and operator contact.
    #[serde(default)]
    pub salon: SalonSection,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Per-sender anti-flood limits.
    #[serde(default)]
    pub flood: FloodConfig,

    /// Broadcast pacing.
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// Booking flow settings.
    #[serde(default)]
    pub booking: BookingConfig,

    /// Pix payment settings.
    #[serde(default)]
    pub pix: PixConfig,

    /// Service catalog offered in the booking flow.
    #[serde(default)]
    pub services: Vec<ServiceConfig>,

    /// Salon units customers can book at.
    #[serde(default)]
    pub locations: Vec<LocationConfig>,

    /// Frequently asked questions.
    #[serde(default)]
    pub faq: Vec<FaqConfig>,

    /// Service packages shown in the packages menu.
    #[serde(default)]
    pub packages: Vec<PackageConfig>,

    /// Message copy overrides keyed by message key (e.g. `welcome`).
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
}

/// Salon identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SalonSection {
    /// Display name of the salon, used in greetings.
    #[serde(default = "default_salon_name")]
    pub name: String,

    /// Tenant the conversations belong to. Applied as a storage filter.
    #[serde(default = "default_tenant_id")]
    pub tenant_id: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Phone number that receives operator alerts. `None` logs alerts only.
    #[serde(default)]
    pub operator_phone: Option<String>,
}

impl Default for SalonSection {
    fn default() -> Self {
        Self {
            name: default_salon_name(),
            tenant_id: default_tenant_id(),
            log_level: default_log_level(),
            operator_phone: None,
        }
    }
}

fn default_salon_name() -> String {
    "Salonbot".to_string()
}

fn default_tenant_id() -> String {
    "default".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("salonbot").join("salonbot.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("salonbot.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Sliding-window anti-flood configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FloodConfig {
    /// Length of the counting window in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Messages allowed per window before the sender is blocked.
    #[serde(default = "default_max_messages")]
    pub max_messages: u32,

    /// How long a flooding sender stays blocked, in seconds.
    #[serde(default = "default_block_secs")]
    pub block_secs: u64,
}

impl Default for FloodConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_messages: default_max_messages(),
            block_secs: default_block_secs(),
        }
    }
}

fn default_window_secs() -> u64 {
    60
}

fn default_max_messages() -> u32 {
    50
}

fn default_block_secs() -> u64 {
    600
}

/// Broadcast pacing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BroadcastConfig {
    /// Fixed pause between two recipients, in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound of the random extra pause, in milliseconds.
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

fn default_base_delay_ms() -> u64 {
    2000
}

fn default_jitter_ms() -> u64 {
    1000
}

/// Booking flow configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BookingConfig {
    /// How many days ahead to search for free slots.
    #[serde(default = "default_days_ahead")]
    pub days_ahead: u32,

    /// Maximum number of slots listed to the customer at once.
    #[serde(default = "default_max_offered_slots")]
    pub max_offered_slots: usize,

    /// Weeks probed for the recurrence upsell after a booking.
    #[serde(default = "default_recurrence_weeks")]
    pub recurrence_weeks: u32,

    /// Minimum age for booking without a human in the loop.
    #[serde(default = "default_adult_age")]
    pub adult_age: u32,

    /// First bookable hour of the day (inclusive).
    #[serde(default = "default_open_hour")]
    pub open_hour: u32,

    /// Closing hour of the day (exclusive).
    #[serde(default = "default_close_hour")]
    pub close_hour: u32,

    /// Length of one slot in minutes.
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,

    /// Weekdays without any slot, as `Mon`..`Sun`.
    #[serde(default = "default_closed_weekdays")]
    pub closed_weekdays: Vec<String>,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            days_ahead: default_days_ahead(),
            max_offered_slots: default_max_offered_slots(),
            recurrence_weeks: default_recurrence_weeks(),
            adult_age: default_adult_age(),
            open_hour: default_open_hour(),
            close_hour: default_close_hour(),
            slot_minutes: default_slot_minutes(),
            closed_weekdays: default_closed_weekdays(),
        }
    }
}

fn default_days_ahead() -> u32 {
    14
}

fn default_max_offered_slots() -> usize {
    8
}

fn default_recurrence_weeks() -> u32 {
    4
}

fn default_adult_age() -> u32 {
    18
}

fn default_open_hour() -> u32 {
    9
}

fn default_close_hour() -> u32 {
    18
}

fn default_slot_minutes() -> u32 {
    60
}

fn default_closed_weekdays() -> Vec<String> {
    vec!["Sun".to_string()]
}

/// Pix payment configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PixConfig {
    /// Pix key (phone, e-mail, CPF/CNPJ, or random key). `None` disables the payment step.
    #[serde(default)]
    pub key: Option<String>,

    /// Merchant name printed in the payment app (folded to 25 ASCII chars).
    #[serde(default = "default_merchant_name")]
    pub merchant_name: String,

    /// Merchant city (folded to 15 ASCII chars).
    #[serde(default = "default_merchant_city")]
    pub merchant_city: String,
}

impl Default for PixConfig {
    fn default() -> Self {
        Self {
            key: None,
            merchant_name: default_merchant_name(),
            merchant_city: default_merchant_city(),
        }
    }
}

fn default_merchant_name() -> String {
    "Salonbot".to_string()
}

fn default_merchant_city() -> String {
    "Sao Paulo".to_string()
}

/// One bookable service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price_cents: u64,
    /// Deposit charged through Pix right after booking. `0` skips the payment step.
    #[serde(default)]
    pub deposit_cents: u64,
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,
    /// Service minors may book without an operator (e.g. a kids' haircut).
    #[serde(default)]
    pub age_exempt: bool,
    /// Extra words that select this service in free-text answers.
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn default_duration_minutes() -> u32 {
    60
}

/// One salon unit.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LocationConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// One FAQ entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FaqConfig {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// One service package.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PackageConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price_cents: u64,
}
