// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tag broadcasts to salon contacts.
//!
//! Recipients are every contact carrying the tag who has not opted out.
//! Messages go out strictly one at a time with a randomized pause between
//! recipients, so a campaign looks human-paced to the messaging provider.
//! A failed send is logged and skipped; it is never retried within the run.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use salonbot_config::model::BroadcastConfig;
use salonbot_core::{ContactStore, MessageTransport, OutboundContent, SalonError, normalize_tag};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Pause between two recipients: `base` plus a uniform extra in `0..=jitter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub base: Duration,
    pub jitter: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self::from(&BroadcastConfig::default())
    }
}

impl From<&BroadcastConfig> for Pacing {
    fn from(config: &BroadcastConfig) -> Self {
        Self {
            base: Duration::from_millis(config.base_delay_ms),
            jitter: Duration::from_millis(config.jitter_ms),
        }
    }
}

impl Pacing {
    /// Draws one pause.
    pub fn next_pause(&self) -> Duration {
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms == 0 {
            return self.base;
        }
        self.base + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

/// Outcome of one broadcast run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Normalized tag the run targeted.
    pub tag: String,
    /// Contacts that were eligible (tagged and not opted out).
    pub recipients: usize,
    /// Tagged contacts left out because they opted out.
    pub skipped_opted_out: usize,
    /// Sends actually attempted.
    pub attempted: usize,
    /// Sends the transport accepted.
    pub sent: usize,
    /// Recipients whose send failed.
    pub failed: Vec<String>,
    /// The run stopped early on cancellation.
    pub cancelled: bool,
}

pub struct BroadcastDispatcher {
    contacts: Arc<dyn ContactStore>,
    pacing: Pacing,
}

impl BroadcastDispatcher {
    pub fn new(contacts: Arc<dyn ContactStore>, pacing: Pacing) -> Self {
        Self { contacts, pacing }
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Phones of the contacts that would receive a broadcast for `tag`,
    /// plus how many tagged contacts were skipped for opting out.
    pub async fn recipients(&self, tag: &str) -> Result<(Vec<String>, usize), SalonError> {
        let tag = normalize_tag(tag);
        let contacts = self.contacts.contacts_with_tag(&tag).await?;

        let mut seen = HashSet::new();
        let mut phones = Vec::new();
        let mut opted_out = 0;
        for contact in contacts {
            if contact.opted_out {
                opted_out += 1;
            } else if seen.insert(contact.phone.clone()) {
                phones.push(contact.phone);
            }
        }
        Ok((phones, opted_out))
    }

    /// Sends `message` to every eligible contact tagged `tag`.
    ///
    /// Only the recipient lookup can fail the run. Cancelling `cancel`
    /// stops before the next recipient, including during a pause.
    pub async fn send(
        &self,
        transport: &dyn MessageTransport,
        tag: &str,
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<BroadcastReport, SalonError> {
        let (recipients, skipped_opted_out) = self.recipients(tag).await?;
        let mut report = BroadcastReport {
            tag: normalize_tag(tag),
            recipients: recipients.len(),
            skipped_opted_out,
            ..BroadcastReport::default()
        };

        if recipients.is_empty() {
            info!(tag = %report.tag, "broadcast has no recipients");
            return Ok(report);
        }
        info!(tag = %report.tag, recipients = report.recipients, skipped_opted_out, "broadcast started");

        for (i, phone) in recipients.iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            report.attempted += 1;
            match transport
                .send_message(phone, OutboundContent::Text(message.to_string()))
                .await
            {
                Ok(id) => {
                    report.sent += 1;
                    debug!(tag = %report.tag, recipient = %phone, message_id = %id.0, "broadcast message sent");
                }
                Err(e) => {
                    warn!(tag = %report.tag, recipient = %phone, error = %e, "broadcast send failed");
                    report.failed.push(phone.clone());
                }
            }

            if i + 1 < recipients.len() {
                let pause = self.pacing.next_pause();
                tokio::select! {
                    _ = tokio::time::sleep(pause) => {}
                    _ = cancel.cancelled() => {
                        report.cancelled = true;
                        break;
                    }
                }
            }
        }

        if report.cancelled {
            warn!(tag = %report.tag, sent = report.sent, remaining = report.recipients - report.attempted, "broadcast cancelled");
        } else {
            info!(tag = %report.tag, sent = report.sent, failed = report.failed.len(), "broadcast finished");
        }
        Ok(report)
    }
}
