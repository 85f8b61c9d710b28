// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `salonbot doctor`: quick checks of config, database, Pix, and catalog.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use salonbot_config::SalonConfig;
use salonbot_core::{HealthStatus, PluginAdapter, SalonError};
use salonbot_pix::PixPayload;
use salonbot_storage::{Database, SqliteStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, started: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: started.elapsed(),
        }
    }
}

/// Runs every check and prints one line per result.
///
/// Returns the number of checks that warned or failed.
pub async fn run_doctor(config: &SalonConfig, plain: bool) -> Result<usize, SalonError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let results = vec![
        check_database(config).await,
        check_pix(config),
        check_catalog(config),
        check_operator(config),
    ];

    println!();
    println!("  salonbot doctor ({})", config.salon.name);
    println!("  {}", "-".repeat(50));
    for result in &results {
        println!("{}", render_line(result, use_color));
    }
    println!();

    let issues = results
        .iter()
        .filter(|r| r.status != CheckStatus::Pass)
        .count();
    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();
    Ok(issues)
}

fn render_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.normal().to_string()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow().to_string()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red().to_string()),
        };
        format!("    {symbol} {:<20} {message} ({duration_ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

async fn check_database(config: &SalonConfig) -> CheckResult {
    let started = Instant::now();
    let name = "database";
    let db = match Database::open(&config.storage, &config.salon.tenant_id).await {
        Ok(db) => db,
        Err(e) => return CheckResult::new(name, CheckStatus::Fail, e.to_string(), started),
    };
    let store = SqliteStore::new(db);
    match store.health_check().await {
        Ok(HealthStatus::Healthy) => CheckResult::new(
            name,
            CheckStatus::Pass,
            format!("{} (migrations applied)", config.storage.database_path),
            started,
        ),
        Ok(HealthStatus::Degraded(why)) => CheckResult::new(name, CheckStatus::Warn, why, started),
        Ok(HealthStatus::Unhealthy(why)) => CheckResult::new(name, CheckStatus::Fail, why, started),
        Err(e) => CheckResult::new(name, CheckStatus::Fail, e.to_string(), started),
    }
}

fn check_pix(config: &SalonConfig) -> CheckResult {
    let started = Instant::now();
    let name = "pix";
    let Some(key) = config.pix.key.as_deref() else {
        return CheckResult::new(name, CheckStatus::Warn, "no pix.key, deposits disabled", started);
    };
    let sample = PixPayload::new(key, &config.pix.merchant_name, &config.pix.merchant_city)
        .amount_cents(100)
        .txid("DOCTOR")
        .encode();
    match sample {
        Ok(code) if salonbot_pix::verify(&code) => {
            CheckResult::new(name, CheckStatus::Pass, "sample payload encodes and verifies", started)
        }
        Ok(_) => CheckResult::new(name, CheckStatus::Fail, "sample payload fails its checksum", started),
        Err(e) => CheckResult::new(name, CheckStatus::Fail, e.to_string(), started),
    }
}

fn check_catalog(config: &SalonConfig) -> CheckResult {
    let started = Instant::now();
    let name = "catalog";
    if config.services.is_empty() || config.locations.is_empty() {
        return CheckResult::new(
            name,
            CheckStatus::Warn,
            format!(
                "{} services, {} locations; booking needs at least one of each",
                config.services.len(),
                config.locations.len()
            ),
            started,
        );
    }
    CheckResult::new(
        name,
        CheckStatus::Pass,
        format!(
            "{} services, {} locations, {} faq entries",
            config.services.len(),
            config.locations.len(),
            config.faq.len()
        ),
        started,
    )
}

fn check_operator(config: &SalonConfig) -> CheckResult {
    let started = Instant::now();
    match config.salon.operator_phone.as_deref().map(str::trim) {
        Some(phone) if !phone.is_empty() => CheckResult::new(
            "operator",
            CheckStatus::Pass,
            format!("alerts go to {phone}"),
            started,
        ),
        _ => CheckResult::new(
            "operator",
            CheckStatus::Warn,
            "no salon.operator_phone, alerts are only logged",
            started,
        ),
    }
}
