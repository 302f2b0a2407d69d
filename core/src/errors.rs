//! Error types for partialkey

use thiserror::Error;

/// Result type alias using partialkey Error
pub type Result<T> = std::result::Result<T, Error>;

/// partialkey error types
#[derive(Error, Debug)]
pub enum Error {
    /// Balancer constructed with no slots
    #[error("Invalid slot count: {0} (must be at least 1)")]
    InvalidSlotCount(usize),

    /// Slot index outside `[0, slots)`
    #[error("Slot {slot} out of range for {slots} slots")]
    SlotOutOfRange { slot: usize, slots: usize },

    /// Two per-slot tallies built for different slot counts
    #[error("Slot count mismatch: expected {expected}, got {actual}")]
    SlotCountMismatch { expected: usize, actual: usize },

    /// Release of a slot whose load is already zero
    #[error("Release underflow on slot {slot}: load is already zero")]
    Underflow { slot: usize },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Returns a stable error code for reports and logs
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidSlotCount(_) => "invalid_slot_count",
            Error::SlotOutOfRange { .. } => "slot_out_of_range",
            Error::SlotCountMismatch { .. } => "slot_count_mismatch",
            Error::Underflow { .. } => "release_underflow",
            Error::InvalidConfig(_) => "invalid_config",
            Error::Serialization(_) => "serialization_error",
        }
    }

    /// Whether the error stems from caller misuse of an already-built balancer
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::SlotOutOfRange { .. } | Error::SlotCountMismatch { .. } | Error::Underflow { .. }
        )
    }
}
