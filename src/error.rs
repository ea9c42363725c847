//! Error taxonomy for the telemetry core.
//!
//! Only conditions a caller must react to are errors. Acknowledging an
//! unknown alert is deliberately absent: it is an idempotent no-op.

use thiserror::Error;

// ---

/// Unified error type for the core library.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ---
    /// Toggle or lookup on an id outside the fixed device set.
    #[error("Unknown device: {id}")]
    UnknownDevice { id: String },

    /// Toggle on an id outside the fixed automation flag set.
    #[error("Unknown automation setting: {id}")]
    UnknownAutomation { id: String },

    /// The reading source could not produce a reading (timeout, disconnect).
    #[error("Reading source unavailable: {reason}")]
    SourceUnavailable { reason: String },
}
