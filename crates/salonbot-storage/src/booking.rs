// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slot-based booking backend on top of the `appointments` table.
//!
//! Slots are generated from the opening hours rather than stored: a slot is
//! free when no live (non-cancelled) appointment occupies it. A partial
//! unique index makes double-booking impossible even under races.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use rusqlite::{ErrorCode, OptionalExtension, params};
use tracing::{debug, warn};

use salonbot_config::model::{BookingConfig, LocationConfig};
use salonbot_core::{
    Appointment, AppointmentStatus, BatchBooking, BookingBackend, Clock, SalonError, Slot,
};

use crate::database::{Database, map_tr_err, now_timestamp};

/// Storage format of `appointments.starts_at`.
const STARTS_AT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Opening hours and units that define which slots exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRules {
    pub open_hour: u32,
    pub close_hour: u32,
    pub slot_minutes: u32,
    pub closed_weekdays: Vec<Weekday>,
    pub locations: Vec<String>,
}

impl SlotRules {
    pub fn from_config(booking: &BookingConfig, locations: &[LocationConfig]) -> Self {
        Self {
            open_hour: booking.open_hour,
            close_hour: booking.close_hour,
            slot_minutes: booking.slot_minutes,
            closed_weekdays: booking
                .closed_weekdays
                .iter()
                .filter_map(|d| Weekday::from_str(d).ok())
                .collect(),
            locations: locations.iter().map(|l| l.id.clone()).collect(),
        }
    }

    fn is_open_on(&self, date: NaiveDate) -> bool {
        !self.closed_weekdays.contains(&date.weekday())
    }

    /// Start times of every slot on `date`, earliest first.
    fn times_on(&self, date: NaiveDate) -> Vec<NaiveDateTime> {
        if !self.is_open_on(date) || self.slot_minutes == 0 {
            return Vec::new();
        }
        let open = self.open_hour * 60;
        let close = self.close_hour.min(24) * 60;
        (open..)
            .step_by(self.slot_minutes as usize)
            .take_while(|m| m + self.slot_minutes <= close)
            .filter_map(|m| NaiveTime::from_hms_opt(m / 60, m % 60, 0))
            .map(|t| date.and_time(t))
            .collect()
    }

    fn check_location(&self, location_id: &str) -> Result<(), SalonError> {
        if self.locations.iter().any(|l| l == location_id) {
            Ok(())
        } else {
            Err(SalonError::booking(format!("unknown location `{location_id}`")))
        }
    }
}

pub fn slot_id(location_id: &str, starts_at: NaiveDateTime) -> String {
    format!("{location_id}@{}", starts_at.format(STARTS_AT_FORMAT))
}

fn make_slot(location_id: &str, starts_at: NaiveDateTime) -> Slot {
    Slot {
        id: slot_id(location_id, starts_at),
        location_id: location_id.to_string(),
        starts_at,
    }
}

pub struct SqliteBooking {
    db: Database,
    rules: SlotRules,
    clock: Arc<dyn Clock>,
}

impl SqliteBooking {
    pub fn new(db: Database, rules: SlotRules, clock: Arc<dyn Clock>) -> Self {
        Self { db, rules, clock }
    }

    /// Start times of live appointments at `location_id`.
    async fn taken(&self, location_id: &str) -> Result<HashSet<NaiveDateTime>, SalonError> {
        let tenant = self.db.tenant_owned();
        let location_id = location_id.to_string();
        let rows = self
            .db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT starts_at FROM appointments
                     WHERE tenant_id = ?1 AND location_id = ?2 AND status != 'cancelled'",
                )?;
                let rows = stmt
                    .query_map(params![tenant, location_id], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)?;

        Ok(rows
            .iter()
            .filter_map(|raw| NaiveDateTime::parse_from_str(raw, STARTS_AT_FORMAT).ok())
            .collect())
    }

    /// Looks up one appointment by id.
    pub async fn appointment(&self, id: &str) -> Result<Option<Appointment>, SalonError> {
        let tenant = self.db.tenant_owned();
        let id = id.to_string();
        let row = self
            .db
            .connection()
            .call(move |conn| {
                conn.query_row(
                    "SELECT id, location_id, starts_at, customer_name, phone, service_id, status
                     FROM appointments WHERE tenant_id = ?1 AND id = ?2",
                    params![tenant, id],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, String>(4)?,
                            row.get::<_, String>(5)?,
                            row.get::<_, String>(6)?,
                        ))
                    },
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)?;

        let Some((id, location_id, starts_at, customer_name, phone, service_id, status)) = row
        else {
            return Ok(None);
        };
        let starts_at = NaiveDateTime::parse_from_str(&starts_at, STARTS_AT_FORMAT)
            .map_err(SalonError::storage)?;
        let status = AppointmentStatus::from_str(&status).map_err(SalonError::storage)?;
        Ok(Some(Appointment {
            id,
            slot: make_slot(&location_id, starts_at),
            customer_name,
            phone,
            service_id,
            status,
        }))
    }

    async fn set_status(&self, id: &str, status: AppointmentStatus) -> Result<(), SalonError> {
        let tenant = self.db.tenant_owned();
        let appointment_id = id.to_string();
        let new_status = status.to_string();
        let updated = self
            .db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "UPDATE appointments SET status = ?3
                     WHERE tenant_id = ?1 AND id = ?2 AND status != 'cancelled'",
                    params![tenant, appointment_id, new_status],
                )
            })
            .await
            .map_err(map_tr_err)?;

        if updated == 0 {
            return Err(SalonError::booking(format!("no live appointment `{id}`")));
        }
        debug!(appointment = id, status = %status, "appointment status changed");
        Ok(())
    }
}

#[async_trait]
impl BookingBackend for SqliteBooking {
    async fn find_available_slots(
        &self,
        location_id: &str,
        days_ahead: u32,
    ) -> Result<Vec<Slot>, SalonError> {
        self.rules.check_location(location_id)?;
        let taken = self.taken(location_id).await?;
        let today = self.clock.today();

        Ok((1..=i64::from(days_ahead))
            .map(|d| today + Duration::days(d))
            .flat_map(|date| self.rules.times_on(date))
            .filter(|t| !taken.contains(t))
            .map(|t| make_slot(location_id, t))
            .collect())
    }

    async fn book_appointment(
        &self,
        slot: &Slot,
        name: &str,
        phone: &str,
        service_id: &str,
    ) -> Result<Appointment, SalonError> {
        self.rules.check_location(&slot.location_id)?;
        if !self.rules.is_open_on(slot.starts_at.date()) {
            return Err(SalonError::booking(format!(
                "salon is closed on {}",
                slot.starts_at.format("%d/%m/%Y")
            )));
        }

        let appointment = Appointment {
            id: format!("apt-{}", uuid::Uuid::new_v4().simple()),
            slot: slot.clone(),
            customer_name: name.to_string(),
            phone: phone.to_string(),
            service_id: service_id.to_string(),
            status: AppointmentStatus::Scheduled,
        };

        let tenant = self.db.tenant_owned();
        let row = appointment.clone();
        let inserted = self
            .db
            .connection()
            .call(move |conn| {
                let result = conn.execute(
                    "INSERT INTO appointments
                     (id, tenant_id, location_id, starts_at, customer_name, phone, service_id, status, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        row.id,
                        tenant,
                        row.slot.location_id,
                        row.slot.starts_at.format(STARTS_AT_FORMAT).to_string(),
                        row.customer_name,
                        row.phone,
                        row.service_id,
                        row.status.to_string(),
                        now_timestamp(),
                    ],
                );
                match result {
                    Ok(_) => Ok(true),
                    Err(rusqlite::Error::SqliteFailure(e, _))
                        if e.code == ErrorCode::ConstraintViolation =>
                    {
                        Ok(false)
                    }
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(map_tr_err)?;

        if !inserted {
            return Err(SalonError::booking(format!("slot {} already taken", slot.id)));
        }
        debug!(appointment = %appointment.id, slot = %slot.id, "appointment booked");
        Ok(appointment)
    }

    async fn cancel_appointment(&self, appointment_id: &str) -> Result<(), SalonError> {
        self.set_status(appointment_id, AppointmentStatus::Cancelled)
            .await
    }

    async fn confirm_appointment(&self, appointment_id: &str) -> Result<(), SalonError> {
        self.set_status(appointment_id, AppointmentStatus::Confirmed)
            .await
    }

    async fn find_consecutive_slots(
        &self,
        slot: &Slot,
        weeks: u32,
    ) -> Result<Vec<Slot>, SalonError> {
        self.rules.check_location(&slot.location_id)?;
        let taken = self.taken(&slot.location_id).await?;

        Ok((1..=i64::from(weeks))
            .map(|w| slot.starts_at + Duration::weeks(w))
            .filter(|t| self.rules.is_open_on(t.date()) && !taken.contains(t))
            .map(|t| make_slot(&slot.location_id, t))
            .collect())
    }

    async fn book_batch(
        &self,
        slots: &[Slot],
        name: &str,
        phone: &str,
        service_id: &str,
    ) -> Result<BatchBooking, SalonError> {
        let mut batch = BatchBooking::default();
        for slot in slots {
            match self.book_appointment(slot, name, phone, service_id).await {
                Ok(appointment) => batch.booked.push(appointment),
                Err(e) => {
                    warn!(slot = %slot.id, error = %e, "batch slot not booked");
                    batch.failed.push(slot.clone());
                }
            }
        }
        Ok(batch)
    }
}
