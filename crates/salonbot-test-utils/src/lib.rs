// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Salonbot integration tests.
//!
//! Provides mock collaborators (transport, stores, booking, notifier, clock)
//! and a [`TestHarness`] that wires the full dispatch pipeline around them.

pub mod harness;
pub mod memory_store;
pub mod mock_booking;
pub mod mock_transport;
pub mod notifier;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use memory_store::{LoggedEvent, MemoryStore};
pub use mock_booking::{MockBooking, slot};
pub use mock_transport::{MockTransport, SentMessage};
pub use notifier::{FixedClock, RecordingNotifier};
