// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use salonbot_core::{AlertKind, Clock, OperatorAlert, OperatorNotifier, SalonError};

/// Operator notifier that keeps every alert for later assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<OperatorAlert>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn alerts(&self) -> Vec<OperatorAlert> {
        self.alerts.lock().await.clone()
    }

    pub async fn kinds(&self) -> Vec<AlertKind> {
        self.alerts.lock().await.iter().map(|a| a.kind).collect()
    }
}

#[async_trait]
impl OperatorNotifier for RecordingNotifier {
    async fn notify(&self, alert: &OperatorAlert) -> Result<(), SalonError> {
        self.alerts.lock().await.push(alert.clone());
        Ok(())
    }
}

/// Clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
