// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Salonbot: WhatsApp booking assistant and campaign dispatcher for salons.
//!
//! This binary is the operator console: a customer-side shell, campaign
//! broadcasts, manual handover, Pix code generation, and diagnostics.

mod app;
mod console;
mod doctor;
mod shell;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use salonbot_config::SalonConfig;
use salonbot_core::SalonError;
use salonbot_dispatch::shutdown::install_signal_handler;
use salonbot_pix::PixPayload;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::console::ConsoleTransport;

/// Salonbot: WhatsApp booking assistant for beauty salons.
#[derive(Parser, Debug)]
#[command(name = "salonbot", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat with the bot from the terminal as one customer.
    Shell {
        /// Phone number the conversation is stored under.
        #[arg(long, default_value = "5500000000000")]
        sender: String,
    },
    /// Send a campaign message to every contact with a tag.
    Broadcast {
        #[arg(long)]
        tag: String,
        #[arg(long)]
        message: String,
        /// List the recipients without sending anything.
        #[arg(long)]
        dry_run: bool,
    },
    /// Hand a conversation to a human or back to the bot.
    Handoff {
        #[command(subcommand)]
        action: HandoffAction,
    },
    /// Print a Pix "copia e cola" code and its QR code.
    Pix {
        /// Amount in reais, e.g. `150.00` or `150,00`.
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "")]
        txid: String,
    },
    /// Check configuration, database, and payment setup.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[derive(Subcommand, Debug)]
enum HandoffAction {
    /// An operator takes over the conversation.
    Start {
        #[arg(long)]
        sender: String,
        #[arg(long, default_value = "operator")]
        agent: String,
    },
    /// Give the conversation back to the bot.
    Resolve {
        #[arg(long)]
        sender: String,
        #[arg(long, default_value = "operator")]
        agent: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match cli.config.as_deref() {
        Some(path) => salonbot_config::load_and_validate_path(path),
        None => salonbot_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            salonbot_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.salon.log_level);

    let result = match cli.command {
        Commands::Shell { sender } => shell::run_shell(config, sender).await,
        Commands::Broadcast {
            tag,
            message,
            dry_run,
        } => run_broadcast(&config, &tag, &message, dry_run).await,
        Commands::Handoff { action } => run_handoff(&config, action).await,
        Commands::Pix { amount, txid } => run_pix(&config, &amount, &txid),
        Commands::Doctor { plain } => doctor::run_doctor(&config, plain).await.map(|issues| {
            if issues > 0 {
                std::process::exit(2);
            }
        }),
    };

    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over `salon.log_level`.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("salonbot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_broadcast(
    config: &SalonConfig,
    tag: &str,
    message: &str,
    dry_run: bool,
) -> Result<(), SalonError> {
    let app = App::build(config, Arc::new(ConsoleTransport::new())).await?;

    if dry_run {
        let (recipients, skipped) = app.dispatcher.broadcaster().recipients(tag).await?;
        for phone in &recipients {
            println!("{phone}");
        }
        println!(
            "{} recipients, {} skipped (opted out)",
            recipients.len().to_string().bold(),
            skipped
        );
        return app.close().await;
    }

    let cancel = install_signal_handler();
    let report = app.dispatcher.dispatch_broadcast(tag, message, &cancel).await?;
    println!(
        "tag {}: {} sent, {} failed, {} skipped (opted out){}",
        report.tag.bold(),
        report.sent.to_string().green(),
        report.failed.len().to_string().red(),
        report.skipped_opted_out,
        if report.cancelled { ", cancelled" } else { "" }
    );
    for phone in &report.failed {
        println!("  {} {phone}", "failed:".red());
    }
    app.close().await
}

async fn run_handoff(config: &SalonConfig, action: HandoffAction) -> Result<(), SalonError> {
    let app = App::build(config, Arc::new(ConsoleTransport::new())).await?;
    match action {
        HandoffAction::Start { sender, agent } => {
            app.dispatcher.start_handover(&sender, &agent);
            println!("{sender} is now handled by {agent}");
        }
        HandoffAction::Resolve { sender, agent } => {
            app.dispatcher.resolve_handover(&sender, &agent).await;
            println!("{sender} is back with the bot");
        }
    }
    app.close().await
}

fn run_pix(config: &SalonConfig, amount: &str, txid: &str) -> Result<(), SalonError> {
    let key = config
        .pix
        .key
        .as_deref()
        .ok_or_else(|| SalonError::Pix("pix.key is not configured".into()))?;
    let cents = parse_amount(amount)?;
    let code = PixPayload::new(key, &config.pix.merchant_name, &config.pix.merchant_city)
        .amount_cents(cents)
        .txid(txid)
        .encode()?;

    println!("{}", salonbot_pix::render_terminal(&code)?);
    println!("{code}");
    Ok(())
}

/// Parses a reais amount (`150`, `150.5`, `150,00`) into centavos.
fn parse_amount(input: &str) -> Result<u64, SalonError> {
    let invalid = || SalonError::Pix(format!("invalid amount `{input}`"));
    let normalized = input.trim().replace(',', ".");
    let (whole, frac) = match normalized.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (normalized.as_str(), ""),
    };
    if whole.is_empty() || frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let reais: u64 = whole.parse().map_err(|_| invalid())?;
    let centavos: u64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<u64>().map_err(|_| invalid())? * 10,
        _ => frac.parse().map_err(|_| invalid())?,
    };
    reais
        .checked_mul(100)
        .and_then(|c| c.checked_add(centavos))
        .ok_or_else(invalid)
}
