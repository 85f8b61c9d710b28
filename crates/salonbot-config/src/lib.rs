// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Salonbot dispatch engine.
//!
//! TOML parsing with strict `deny_unknown_fields`, XDG file lookup,
//! `SALONBOT_*` environment overrides, and miette diagnostics with typo
//! suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use salonbot_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Salon: {}", config.salon.name);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::SalonConfig;

/// Loads configuration from the XDG hierarchy and validates it.
///
/// Figment errors are converted into diagnostics carrying source spans
/// for whichever config file produced them.
pub fn load_and_validate() -> Result<SalonConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &collect_toml_sources(),
        )),
    }
}

/// Loads an explicit config file (plus env overrides) and validates it.
pub fn load_and_validate_path(path: &Path) -> Result<SalonConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = std::fs::read_to_string(path)
                .map(|content| vec![(source_name(path), content)])
                .unwrap_or_default();
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Loads a TOML string and validates it.
pub fn load_and_validate_str(toml_content: &str) -> Result<SalonConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

// figment records file sources by their canonical path.
fn source_name(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![std::path::PathBuf::from("salonbot.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("salonbot/salonbot.toml"));
    }
    candidates.push(std::path::PathBuf::from("/etc/salonbot/salonbot.toml"));

    candidates
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (source_name(&path), content))
        })
        .collect()
}
