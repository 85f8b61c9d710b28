// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait implemented by long-lived collaborator adapters.

use async_trait::async_trait;

use crate::error::SalonError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for transports and storage backends.
///
/// Provides identity, lifecycle, and health check capabilities so the CLI
/// `doctor` command can probe every wired adapter the same way.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the kind of adapter (transport, storage, ...).
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, SalonError>;

    /// Gracefully shuts down the adapter, releasing any held resources.
    async fn shutdown(&self) -> Result<(), SalonError>;
}
