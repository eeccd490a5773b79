//! Error types for the arena simulation.
//!
//! The per-frame step itself never fails. These errors only surface at the
//! edges: persistence, network snapshot decoding, config loading and
//! state serialization.

use thiserror::Error;

/// Result type alias using [`ArenaError`].
pub type Result<T> = std::result::Result<T, ArenaError>;

/// Top-level error type for the arena simulation.
#[derive(Debug, Error)]
pub enum ArenaError {
    /// Filesystem access failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// RON text could not be parsed.
    #[error("Failed to parse RON data: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// RON text could not be produced.
    #[error("Failed to write RON data: {0}")]
    RonWrite(#[from] ron::Error),

    /// Binary (de)serialization of simulation state or a replay failed.
    #[error("Binary codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// A persistence backend rejected a load or save.
    #[error("Progress store error: {0}")]
    Store(String),

    /// A network link could not deliver or receive snapshots.
    #[error("Network link error: {0}")]
    Link(String),

    /// A snapshot was missing a field or carried the wrong value type.
    #[error("Snapshot field '{field}' is invalid: {message}")]
    SnapshotField {
        /// Snapshot key that failed to decode.
        field: String,
        /// Error message.
        message: String,
    },

    /// Match configuration is inconsistent.
    #[error("Invalid match configuration: {0}")]
    InvalidConfig(String),

    /// A replay file is from an incompatible format version.
    #[error("Replay version mismatch: expected {expected}, got {found}")]
    ReplayVersion {
        /// Version this build understands.
        expected: u32,
        /// Version found in the file.
        found: u32,
    },

    /// Replaying the recorded inputs produced a different final state.
    #[error("Desync detected at tick {tick}: expected hash {expected}, got {actual}")]
    DesyncDetected {
        /// Tick where the comparison was made.
        tick: u64,
        /// Recorded state hash.
        expected: u64,
        /// Recomputed state hash.
        actual: u64,
    },
}
