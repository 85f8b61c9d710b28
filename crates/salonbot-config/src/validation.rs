// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks the constraints serde cannot express: positive limits, sane
//! opening hours, unique catalog ids, and known template keys.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::Weekday;
use salonbot_core::MessageKey;
use strum::IntoEnumIterator;

use crate::diagnostic::{ConfigError, suggest_key};
use crate::model::SalonConfig;

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &SalonConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.salon.tenant_id.trim().is_empty() {
        errors.push(ConfigError::validation("salon.tenant_id must not be empty"));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if config.flood.window_secs == 0 {
        errors.push(ConfigError::validation("flood.window_secs must be > 0"));
    }
    if config.flood.max_messages == 0 {
        errors.push(ConfigError::validation("flood.max_messages must be > 0"));
    }
    if config.flood.block_secs == 0 {
        errors.push(ConfigError::validation("flood.block_secs must be > 0"));
    }

    validate_booking(config, &mut errors);
    validate_pix(config, &mut errors);
    validate_catalog(config, &mut errors);
    validate_templates(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_booking(config: &SalonConfig, errors: &mut Vec<ConfigError>) {
    let booking = &config.booking;

    if booking.close_hour > 24 {
        errors.push(ConfigError::validation(format!(
            "booking.close_hour must be at most 24, got {}",
            booking.close_hour
        )));
    }
    if booking.open_hour >= booking.close_hour {
        errors.push(ConfigError::validation(format!(
            "booking.open_hour ({}) must be earlier than booking.close_hour ({})",
            booking.open_hour, booking.close_hour
        )));
    }
    if booking.slot_minutes == 0 {
        errors.push(ConfigError::validation("booking.slot_minutes must be > 0"));
    }
    if booking.max_offered_slots == 0 {
        errors.push(ConfigError::validation(
            "booking.max_offered_slots must be > 0",
        ));
    }
    for day in &booking.closed_weekdays {
        if Weekday::from_str(day).is_err() {
            errors.push(ConfigError::validation(format!(
                "booking.closed_weekdays: `{day}` is not a weekday (use Mon..Sun)"
            )));
        }
    }
}

fn validate_pix(config: &SalonConfig, errors: &mut Vec<ConfigError>) {
    let Some(key) = config.pix.key.as_deref() else {
        return;
    };
    if key.trim().is_empty() {
        errors.push(ConfigError::validation(
            "pix.key is set but empty; remove it to disable payments",
        ));
    }
    if config.pix.merchant_name.trim().is_empty() {
        errors.push(ConfigError::validation(
            "pix.merchant_name must not be empty when pix.key is set",
        ));
    }
    if config.pix.merchant_city.trim().is_empty() {
        errors.push(ConfigError::validation(
            "pix.merchant_city must not be empty when pix.key is set",
        ));
    }
}

fn validate_catalog(config: &SalonConfig, errors: &mut Vec<ConfigError>) {
    let mut seen = HashSet::new();
    for service in &config.services {
        if service.id.trim().is_empty() {
            errors.push(ConfigError::validation("services: id must not be empty"));
        } else if !seen.insert(service.id.as_str()) {
            errors.push(ConfigError::validation(format!(
                "services: duplicate id `{}`",
                service.id
            )));
        }
        if service.deposit_cents > service.price_cents && service.price_cents > 0 {
            errors.push(ConfigError::validation(format!(
                "services.{}: deposit_cents exceeds price_cents",
                service.id
            )));
        }
    }

    let mut seen = HashSet::new();
    for location in &config.locations {
        if location.id.trim().is_empty() {
            errors.push(ConfigError::validation("locations: id must not be empty"));
        } else if !seen.insert(location.id.as_str()) {
            errors.push(ConfigError::validation(format!(
                "locations: duplicate id `{}`",
                location.id
            )));
        }
    }

    if !config.services.is_empty() && config.locations.is_empty() {
        errors.push(ConfigError::validation(
            "locations: at least one [[locations]] entry is required when services are offered",
        ));
    }
}

fn validate_templates(config: &SalonConfig, errors: &mut Vec<ConfigError>) {
    if config.templates.is_empty() {
        return;
    }
    let known: Vec<&'static str> = MessageKey::iter().map(<&'static str>::from).collect();
    for key in config.templates.keys() {
        if MessageKey::from_str(key).is_err() {
            errors.push(ConfigError::UnknownTemplate {
                key: key.clone(),
                suggestion: suggest_key(key, &known),
                valid_keys: known.join(", "),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LocationConfig, ServiceConfig};

    fn service(id: &str) -> ServiceConfig {
        ServiceConfig {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            price_cents: 0,
            deposit_cents: 0,
            duration_minutes: 60,
            age_exempt: false,
            keywords: Vec::new(),
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&SalonConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_failure() {
        let mut config = SalonConfig::default();
        config.flood.max_messages = 0;
        config.booking.open_hour = 20;
        config.booking.close_hour = 8;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn duplicate_service_ids_rejected() {
        let mut config = SalonConfig::default();
        config.services = vec![service("corte"), service("corte")];
        config.locations = vec![LocationConfig {
            id: "centro".into(),
            name: "Centro".into(),
            address: String::new(),
            keywords: Vec::new(),
        }];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("duplicate id `corte`"));
    }

    #[test]
    fn services_need_a_location() {
        let mut config = SalonConfig::default();
        config.services = vec![service("corte")];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("[[locations]]"));
    }

    #[test]
    fn duplicate_location_ids_rejected() {
        let mut config = SalonConfig::default();
        let unit = LocationConfig {
            id: "centro".into(),
            name: "Centro".into(),
            address: String::new(),
            keywords: Vec::new(),
        };
        config.locations = vec![unit.clone(), unit];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn pix_key_requires_merchant_fields() {
        let mut config = SalonConfig::default();
        config.pix.key = Some("salao@exemplo.com.br".into());
        config.pix.merchant_city = "  ".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("merchant_city"));
    }

    #[test]
    fn bad_weekday_rejected() {
        let mut config = SalonConfig::default();
        config.booking.closed_weekdays = vec!["Domingo".into()];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn unknown_template_key_gets_suggestion() {
        let mut config = SalonConfig::default();
        config.templates.insert("welcom".into(), "Oi!".into());
        let errors = validate_config(&config).unwrap_err();
        match &errors[0] {
            ConfigError::UnknownTemplate { suggestion, .. } => {
                assert_eq!(suggestion.as_deref(), Some("welcome"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn known_template_key_accepted() {
        let mut config = SalonConfig::default();
        config.templates.insert("welcome".into(), "Oi!".into());
        assert!(validate_config(&config).is_ok());
    }
}
