// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Salonbot dispatch engine.

use thiserror::Error;

/// The primary error type used across all collaborator traits and core operations.
#[derive(Debug, Error)]
pub enum SalonError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat transport errors (connection failure, rejected recipient, provider ban).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Booking backend errors (calendar unreachable, slot already taken).
    #[error("booking error: {message}")]
    Booking {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Payment payload could not be produced (missing key, oversized field).
    #[error("pix error: {0}")]
    Pix(String),

    /// A message template key has no copy in the active catalog.
    #[error("unknown message template `{key}`")]
    Template { key: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SalonError {
    /// Shorthand for a booking failure without an underlying source.
    pub fn booking(message: impl Into<String>) -> Self {
        SalonError::Booking {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a transport failure without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        SalonError::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SalonError::Storage {
            source: Box::new(err),
        }
    }
}
