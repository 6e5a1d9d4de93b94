//! Error types for spin resolution and the statistics ledger

use thiserror::Error;

/// Slot engine error types
#[derive(Error, Debug)]
pub enum SlotError {
    /// Bad bet, non-positive auto-spin count, out-of-range deposit
    #[error("Validation error: {0}")]
    Validation(String),

    /// Spin requested without a logged-in user
    #[error("No active user")]
    NoActiveUser,

    /// Zero free spins and balance below the bet
    #[error("Insufficient funds: balance {balance:.2}, bet {bet:.2}")]
    InsufficientFunds { balance: f64, bet: f64 },

    /// Unexpected failure after the debit (grid generation, cancelled reveal)
    #[error("Spin resolution failed: {0}")]
    InternalResolution(String),

    /// Random source could not supply a usable value
    #[error("Random source error: {0}")]
    RandomSource(String),

    /// Invalid game configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Statistics store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SlotError {
    /// Rejected before any balance mutation
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NoActiveUser | Self::InsufficientFunds { .. }
        )
    }
}

/// Result alias used across the crate
pub type SlotResult<T> = Result<T, SlotError>;
