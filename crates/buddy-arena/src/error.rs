//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// No free block is large enough for the request, including the case
    /// where nothing is free at all.
    CapacityExhausted {
        /// Bytes the request needs, header included, before rounding up
        /// to a power of two.
        requested: usize,
        /// Size in bytes of the largest free block (0 if none is free).
        largest_free: usize,
    },
    /// The configuration cannot describe a valid arena.
    InvalidConfig {
        /// Human-readable description of the rejected parameter.
        reason: String,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExhausted {
                requested,
                largest_free,
            } => {
                write!(
                    f,
                    "arena capacity exhausted: requested {requested} bytes, largest free block {largest_free} bytes"
                )
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid arena config: {reason}")
            }
        }
    }
}

impl Error for ArenaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_message_names_both_sizes() {
        let err = ArenaError::CapacityExhausted {
            requested: 1040,
            largest_free: 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("1040"));
        assert!(msg.contains("1024"));
    }

    #[test]
    fn invalid_config_message_carries_reason() {
        let err = ArenaError::InvalidConfig {
            reason: "min_elements must be a power of two".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid arena config: min_elements must be a power of two"
        );
    }
}
