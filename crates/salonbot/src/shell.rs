// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `salonbot shell`: chat with the bot from the terminal as one customer.

use std::sync::Arc;

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use salonbot_config::SalonConfig;
use salonbot_core::{InboundMessage, SalonError, SessionStore};
use tracing::warn;

use crate::app::App;
use crate::console::ConsoleTransport;

/// What the REPL should do with one input line.
#[derive(Debug, PartialEq, Eq)]
enum ShellInput<'a> {
    Quit,
    State,
    Skip,
    Message(&'a str),
}

fn classify(line: &str) -> ShellInput<'_> {
    match line.trim() {
        "" => ShellInput::Skip,
        "/quit" | "/exit" => ShellInput::Quit,
        "/state" => ShellInput::State,
        text => ShellInput::Message(text),
    }
}

/// Runs the REPL with `sender` as the customer's phone number.
///
/// Replies are printed instead of sent; the session and every side effect
/// land in the configured database.
pub async fn run_shell(config: SalonConfig, sender: String) -> Result<(), SalonError> {
    let app = App::build(&config, Arc::new(ConsoleTransport::new())).await?;

    let mut rl = DefaultEditor::new()
        .map_err(|e| SalonError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", format!("salonbot shell ({})", config.salon.name).bold().green());
    println!(
        "Chatting as {}. Type {} to see the session, {} to exit.\n",
        sender.cyan(),
        "/state".yellow(),
        "/quit".yellow()
    );

    let prompt = format!("{}> ", sender.green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                if let Err(e) = rl.add_history_entry(line.as_str()) {
                    warn!(error = %e, "history not updated");
                }
                match classify(&line) {
                    ShellInput::Quit => break,
                    ShellInput::Skip => continue,
                    ShellInput::State => match app.store.get_session(&sender).await {
                        Ok(Some(session)) => {
                            println!("{} {}", "state:".dimmed(), session.state);
                            println!("{} {:?}\n", "data:".dimmed(), session.data);
                        }
                        Ok(None) => println!("{}\n", "no session yet".dimmed()),
                        Err(e) => eprintln!("{}: {e}", "error".red()),
                    },
                    ShellInput::Message(text) => {
                        let msg = InboundMessage::text(&sender, text);
                        match app.dispatcher.process_message(&msg).await {
                            Ok(replies) if replies.is_empty() => {
                                println!("{}\n", "(no reply)".dimmed());
                            }
                            Ok(replies) => {
                                for reply in replies {
                                    println!("{}\n", reply);
                                }
                            }
                            Err(e) => eprintln!("{}: {e}", "error".red()),
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    app.close().await?;
    println!("{}", "goodbye".dimmed());
    Ok(())
}
