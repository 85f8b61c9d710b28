// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Booking backend trait (calendar and appointment book).

use async_trait::async_trait;

use crate::error::SalonError;
use crate::types::{Appointment, BatchBooking, Slot};

/// The calendar the conversation engine books into.
#[async_trait]
pub trait BookingBackend: Send + Sync {
    /// Lists free slots at `location_id` over the next `days_ahead` days, earliest first.
    async fn find_available_slots(
        &self,
        location_id: &str,
        days_ahead: u32,
    ) -> Result<Vec<Slot>, SalonError>;

    /// Books `slot` for the given customer.
    async fn book_appointment(
        &self,
        slot: &Slot,
        name: &str,
        phone: &str,
        service_id: &str,
    ) -> Result<Appointment, SalonError>;

    /// Cancels a booked appointment.
    async fn cancel_appointment(&self, appointment_id: &str) -> Result<(), SalonError>;

    /// Marks a booked appointment as confirmed by the customer.
    async fn confirm_appointment(&self, appointment_id: &str) -> Result<(), SalonError>;

    /// Returns free slots on the same weekday and time as `slot` for the next `weeks` weeks.
    async fn find_consecutive_slots(
        &self,
        slot: &Slot,
        weeks: u32,
    ) -> Result<Vec<Slot>, SalonError>;

    /// Books each slot independently; failures are reported, not raised.
    async fn book_batch(
        &self,
        slots: &[Slot],
        name: &str,
        phone: &str,
        service_id: &str,
    ) -> Result<BatchBooking, SalonError>;
}
