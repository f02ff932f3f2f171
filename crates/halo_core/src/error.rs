//! # Engine Error Types
//!
//! Landmark loss and degenerate geometry are NOT errors; they are absorbed
//! inside the tick. What remains is configuration and commit rejection.

use thiserror::Error;

/// Errors that can occur in the engine.
#[derive(Error, Debug)]
pub enum HaloError {
    /// A configuration value is out of its valid range.
    #[error("invalid configuration: {field}: {reason}")]
    Config {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The configuration file could not be read.
    #[error("configuration file unreadable: {0}")]
    Io(#[from] std::io::Error),

    /// Committed text exceeds the configured maximum.
    #[error("commit too long: {chars} chars, max {max}")]
    CommitTooLong {
        /// Characters in the rejected commit.
        chars: usize,
        /// Configured maximum.
        max: usize,
    },

    /// A token contains nothing renderable.
    #[error("invalid token: {0:?}")]
    InvalidToken(String),

    /// The pending-commit channel is full.
    #[error("commit queue full ({capacity} pending)")]
    CommitQueueFull {
        /// Channel capacity.
        capacity: usize,
    },

    /// The engine owning the pending-commit channel was dropped.
    #[error("engine dropped, commit discarded")]
    EngineGone,
}

/// Result type for engine operations.
pub type HaloResult<T> = Result<T, HaloError>;
