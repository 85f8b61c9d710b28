// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./salonbot.toml` > `~/.config/salonbot/salonbot.toml` >
//! `/etc/salonbot/salonbot.toml` with environment variable overrides via `SALONBOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::SalonConfig;

/// Sections whose keys can be overridden from `SALONBOT_<SECTION>_<KEY>`.
const ENV_SECTIONS: &[&str] = &["salon", "storage", "flood", "broadcast", "booking", "pix"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/salonbot/salonbot.toml` (system-wide)
/// 3. `~/.config/salonbot/salonbot.toml` (user XDG config)
/// 4. `./salonbot.toml` (local directory)
/// 5. `SALONBOT_*` environment variables
pub fn load_config() -> Result<SalonConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<SalonConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SalonConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SalonConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SalonConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SalonConfig::default()))
        .merge(Toml::file("/etc/salonbot/salonbot.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("salonbot/salonbot.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("salonbot.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` and not `Env::split("_")`: key names contain underscores,
/// so `SALONBOT_PIX_MERCHANT_NAME` must map to `pix.merchant_name`, not
/// `pix.merchant.name`.
fn env_provider() -> Env {
    Env::prefixed("SALONBOT_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env key to its dotted config path.
fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
