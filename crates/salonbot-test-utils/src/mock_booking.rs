// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scriptable booking backend.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::Mutex;

use salonbot_core::{
    Appointment, AppointmentStatus, BatchBooking, BookingBackend, SalonError, Slot,
};

/// Builds a slot from a `YYYY-MM-DD HH:MM` string.
///
/// Panics on malformed input; test helper only.
pub fn slot(id: &str, location_id: &str, starts_at: &str) -> Slot {
    Slot {
        id: id.to_string(),
        location_id: location_id.to_string(),
        starts_at: NaiveDateTime::parse_from_str(starts_at, "%Y-%m-%d %H:%M")
            .expect("slot time must be YYYY-MM-DD HH:MM"),
    }
}

#[derive(Default)]
pub struct MockBooking {
    available: Mutex<Vec<Slot>>,
    consecutive: Mutex<Vec<Slot>>,
    taken: Mutex<HashSet<String>>,
    appointments: Mutex<Vec<Appointment>>,
    confirmed: Mutex<Vec<String>>,
    cancelled: Mutex<Vec<String>>,
    fail_all: AtomicBool,
    next_id: AtomicU64,
}

impl MockBooking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slots returned by `find_available_slots` (filtered by location).
    pub async fn set_available(&self, slots: Vec<Slot>) {
        *self.available.lock().await = slots;
    }

    /// Slots returned by `find_consecutive_slots`.
    pub async fn set_consecutive(&self, slots: Vec<Slot>) {
        *self.consecutive.lock().await = slots;
    }

    /// Makes booking `slot_id` fail, as if someone else took it.
    pub async fn mark_taken(&self, slot_id: &str) {
        self.taken.lock().await.insert(slot_id.to_string());
    }

    /// Makes every call fail as if the calendar were unreachable.
    pub fn set_unreachable(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub async fn appointments(&self) -> Vec<Appointment> {
        self.appointments.lock().await.clone()
    }

    pub async fn confirmed(&self) -> Vec<String> {
        self.confirmed.lock().await.clone()
    }

    pub async fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().await.clone()
    }

    fn check_reachable(&self) -> Result<(), SalonError> {
        if self.fail_all.load(Ordering::SeqCst) {
            Err(SalonError::booking("calendar unreachable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BookingBackend for MockBooking {
    async fn find_available_slots(
        &self,
        location_id: &str,
        _days_ahead: u32,
    ) -> Result<Vec<Slot>, SalonError> {
        self.check_reachable()?;
        Ok(self
            .available
            .lock()
            .await
            .iter()
            .filter(|s| s.location_id == location_id)
            .cloned()
            .collect())
    }

    async fn book_appointment(
        &self,
        slot: &Slot,
        name: &str,
        phone: &str,
        service_id: &str,
    ) -> Result<Appointment, SalonError> {
        self.check_reachable()?;
        if !self.taken.lock().await.insert(slot.id.clone()) {
            return Err(SalonError::booking(format!("slot {} already taken", slot.id)));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let appointment = Appointment {
            id: format!("apt-{id}"),
            slot: slot.clone(),
            customer_name: name.to_string(),
            phone: phone.to_string(),
            service_id: service_id.to_string(),
            status: AppointmentStatus::Scheduled,
        };
        self.appointments.lock().await.push(appointment.clone());
        Ok(appointment)
    }

    async fn cancel_appointment(&self, appointment_id: &str) -> Result<(), SalonError> {
        self.check_reachable()?;
        self.cancelled.lock().await.push(appointment_id.to_string());
        Ok(())
    }

    async fn confirm_appointment(&self, appointment_id: &str) -> Result<(), SalonError> {
        self.check_reachable()?;
        self.confirmed.lock().await.push(appointment_id.to_string());
        Ok(())
    }

    async fn find_consecutive_slots(
        &self,
        _slot: &Slot,
        weeks: u32,
    ) -> Result<Vec<Slot>, SalonError> {
        self.check_reachable()?;
        Ok(self
            .consecutive
            .lock()
            .await
            .iter()
            .take(weeks as usize)
            .cloned()
            .collect())
    }

    async fn book_batch(
        &self,
        slots: &[Slot],
        name: &str,
        phone: &str,
        service_id: &str,
    ) -> Result<BatchBooking, SalonError> {
        self.check_reachable()?;
        let mut batch = BatchBooking::default();
        for slot in slots {
            match self.book_appointment(slot, name, phone, service_id).await {
                Ok(appointment) => batch.booked.push(appointment),
                Err(_) => batch.failed.push(slot.clone()),
            }
        }
        Ok(batch)
    }
}
