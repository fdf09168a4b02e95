//! Error types for chainspawn_core.
//!
//! Misuse by the caller (bad configuration, exhausted rehash chains, failed
//! seeding) surfaces as a [`CoreError`]. Imperfect-but-usable input is
//! logged and reported in result `errors` lists instead.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for chainspawn_core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Block data could not be obtained or turned into a seed
    #[error("Seed source error for block {height}: {reason}")]
    SeedSource { height: u64, reason: String },

    /// `rehash` was called after the chain budget was spent
    #[error("Rehash chain length exceeded (max {max}); reseed explicitly to continue")]
    ChainLengthExceeded { max: u32 },

    /// Allocation parameters rejected before any draw
    #[error("Invalid allocation config: {0}")]
    InvalidAllocationConfig(String),

    /// A parent id that was never generated or registered
    #[error("Unknown organism: {0}")]
    UnknownOrganism(Uuid),

    /// Service graph could not be ordered or assembled
    #[error("Startup error: {0}")]
    Startup(String),
}

/// Result type alias for chainspawn_core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Creates a new seed source error.
    #[must_use]
    pub fn seed_source<S: Into<String>>(height: u64, reason: S) -> Self {
        Self::SeedSource {
            height,
            reason: reason.into(),
        }
    }

    /// Creates a new invalid allocation config error.
    #[must_use]
    pub fn invalid_allocation<S: Into<String>>(msg: S) -> Self {
        Self::InvalidAllocationConfig(msg.into())
    }

    /// Creates a new startup error.
    #[must_use]
    pub fn startup<S: Into<String>>(msg: S) -> Self {
        Self::Startup(msg.into())
    }

    /// Whether retrying the same call can succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::SeedSource { .. })
    }
}
