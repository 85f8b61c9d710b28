// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Salonbot configuration system.

use salonbot_config::diagnostic::ConfigError;
use salonbot_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use serial_test::serial;

const FULL: &str = r#"
[salon]
name = "Beleza Pura"
tenant_id = "bp-01"
log_level = "debug"
operator_phone = "5511988887777"

[storage]
database_path = "/tmp/salonbot-test.db"
wal_mode = false

[flood]
window_secs = 30
max_messages = 10
block_secs = 120

[broadcast]
base_delay_ms = 500
jitter_ms = 0

[booking]
days_ahead = 7
recurrence_weeks = 3
adult_age = 16
closed_weekdays = ["Sun", "Mon"]

[pix]
key = "salao@exemplo.com.br"
merchant_name = "Beleza Pura"
merchant_city = "Campinas"

[[services]]
id = "corte"
name = "Corte feminino"
price_cents = 9000
deposit_cents = 2000
keywords = ["cabelo", "tesoura"]

[[services]]
id = "corte-infantil"
name = "Corte infantil"
price_cents = 4000
age_exempt = true

[[locations]]
id = "centro"
name = "Unidade Centro"
address = "Rua Direita, 100"

[[faq]]
question = "Aceitam cartao?"
answer = "Sim, debito e credito."
keywords = ["cartao", "pagamento"]

[[packages]]
name = "Noiva"
description = "Cabelo e maquiagem"
price_cents = 50000

[templates]
welcome = "Oi! Aqui e o {salon}."
"#;

#[test]
fn full_config_deserializes() {
    let config = load_and_validate_str(FULL).expect("valid config");
    assert_eq!(config.salon.name, "Beleza Pura");
    assert_eq!(config.salon.tenant_id, "bp-01");
    assert_eq!(config.salon.operator_phone.as_deref(), Some("5511988887777"));
    assert!(!config.storage.wal_mode);
    assert_eq!(config.flood.max_messages, 10);
    assert_eq!(config.broadcast.jitter_ms, 0);
    assert_eq!(config.booking.adult_age, 16);
    assert_eq!(config.booking.closed_weekdays, vec!["Sun", "Mon"]);
    assert_eq!(config.pix.key.as_deref(), Some("salao@exemplo.com.br"));
    assert_eq!(config.services.len(), 2);
    assert!(config.services[1].age_exempt);
    assert_eq!(config.services[0].keywords, vec!["cabelo", "tesoura"]);
    assert_eq!(config.locations[0].address, "Rua Direita, 100");
    assert_eq!(config.faq.len(), 1);
    assert_eq!(config.packages[0].price_cents, 50000);
    assert_eq!(
        config.templates.get("welcome").map(String::as_str),
        Some("Oi! Aqui e o {salon}.")
    );
}

#[test]
fn empty_config_uses_defaults() {
    let config = load_config_from_str("").expect("empty config");
    assert_eq!(config.flood.window_secs, 60);
    assert_eq!(config.flood.max_messages, 50);
    assert_eq!(config.flood.block_secs, 600);
    assert_eq!(config.broadcast.base_delay_ms, 2000);
    assert_eq!(config.broadcast.jitter_ms, 1000);
    assert_eq!(config.booking.adult_age, 18);
    assert!(config.pix.key.is_none());
    assert!(config.services.is_empty());
}

#[test]
fn unknown_key_gets_suggestion() {
    let toml = "[flood]\nmax_mesages = 3\n";
    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            ..
        } => {
            assert_eq!(key, "max_mesages");
            assert_eq!(suggestion.as_deref(), Some("max_messages"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_top_level_section_rejected() {
    let errors = load_and_validate_str("[telegram]\nbot_token = \"x\"\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::UnknownKey { .. }));
}

#[test]
fn wrong_type_reported() {
    let errors = load_and_validate_str("[flood]\nmax_messages = \"lots\"\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
}

#[test]
fn service_without_id_is_missing_key() {
    let errors = load_and_validate_str("[[services]]\nname = \"Corte\"\n").unwrap_err();
    match &errors[0] {
        ConfigError::MissingKey { key } => assert!(key.ends_with("id")),
        other => panic!("expected MissingKey, got {other:?}"),
    }
}

#[test]
fn validation_errors_are_collected() {
    let toml = r#"
[flood]
max_messages = 0

[booking]
open_hour = 18
close_hour = 9
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
}

#[test]
#[serial]
fn file_config_with_env_override() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("salonbot.toml");
    std::fs::write(&path, "[salon]\nname = \"Arquivo\"\n").unwrap();

    // SAFETY: serialized test; no other thread reads the environment.
    unsafe { std::env::set_var("SALONBOT_SALON_NAME", "Ambiente") };
    let result = load_and_validate_path(&path);
    unsafe { std::env::remove_var("SALONBOT_SALON_NAME") };

    assert_eq!(result.expect("valid").salon.name, "Ambiente");
}
