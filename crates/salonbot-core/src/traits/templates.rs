// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message template lookup.
//!
//! The conversation engine only ever refers to copy by [`MessageKey`]; the
//! final user-facing text comes from a [`MessageTemplates`] implementation.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Logical identifiers for every piece of user- and operator-facing copy.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageKey {
    Welcome,
    MainMenu,
    Clarify,
    BackToMenu,
    ServicesHeader,
    ServiceLine,
    ServiceDetail,
    PickServicePrompt,
    PickLocationPrompt,
    LocationLine,
    SlotsHeader,
    SlotLine,
    NoSlots,
    WaitingListJoined,
    WaitingListDeclined,
    AskName,
    InvalidName,
    AskBirthdate,
    InvalidBirthdate,
    MinorHandoff,
    ConfirmSummary,
    Booked,
    PixPayment,
    BookingFailed,
    BookingAborted,
    RecurrenceOffer,
    RecurrenceBooked,
    RecurrenceNoneBooked,
    RecurrenceDeclined,
    RecurrenceRetry,
    FaqHeader,
    FaqLine,
    FaqAnswer,
    LocationsHeader,
    LocationDetail,
    PackagesHeader,
    PackageLine,
    PackageDetail,
    HumanHandoff,
    OptOutConfirmed,
    ConfirmationRequest,
    AppointmentConfirmed,
    AppointmentCancelled,
    FeedbackRequest,
    FeedbackThanks,
    OperatorHumanRequested,
    OperatorMinorBooking,
    OperatorUnmatchedConfirmation,
    OperatorUnmatchedFeedback,
}

/// Renders message copy for a key with `{placeholder}` replacements.
pub trait MessageTemplates: Send + Sync {
    /// Returns the copy for `key` with every `{name}` placeholder found in
    /// `replacements` substituted.
    fn get_message(&self, key: MessageKey, replacements: &[(&str, String)]) -> String;
}
