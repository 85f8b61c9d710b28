// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator notification trait.

use async_trait::async_trait;

use crate::error::SalonError;
use crate::types::OperatorAlert;

/// Delivers alerts to the human operators of the salon.
#[async_trait]
pub trait OperatorNotifier: Send + Sync {
    /// Sends one alert.
    async fn notify(&self, alert: &OperatorAlert) -> Result<(), SalonError>;
}
