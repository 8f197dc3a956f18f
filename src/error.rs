//! Error types for the simple-ble-node crate.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// The radio stack refused an operation.
    #[error("Transport error during {operation}: {reason}")]
    Transport {
        /// The operation that failed (e.g. "start_advertising").
        operation: &'static str,
        /// Description of the failure reported by the stack.
        reason: String,
    },

    /// A durable commit to the non-volatile medium failed.
    #[error("Storage commit failed: {reason}")]
    StorageCommit {
        /// Description of why the commit failed.
        reason: String,
    },

    /// The parameter cell lies outside the medium.
    #[error("Storage offset {offset} out of range (capacity {capacity})")]
    StorageOffset {
        /// The requested offset.
        offset: usize,
        /// The capacity of the medium in bytes.
        capacity: usize,
    },

    /// I/O error from a file-backed medium.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A characteristic payload exceeded the transport ceiling.
    #[error("Payload too large: {len} bytes (max {max})")]
    PayloadTooLarge {
        /// Length of the rejected payload.
        len: usize,
        /// The maximum allowed length.
        max: usize,
    },

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter {
        /// The name of the parameter.
        name: String,
        /// The invalid value that was provided.
        value: String,
    },

    /// Characteristic not part of the sensor service.
    #[error("Characteristic not found: {uuid}")]
    CharacteristicNotFound {
        /// The UUID of the characteristic that was not found.
        uuid: String,
    },

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build a transport error from anything displayable.
    pub fn transport(operation: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::Transport {
            operation,
            reason: reason.to_string(),
        }
    }

    /// Check if this error came from the non-volatile medium.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::StorageCommit { .. } | Self::StorageOffset { .. } | Self::Io(_)
        )
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PayloadTooLarge { len: 24, max: 20 };
        assert_eq!(err.to_string(), "Payload too large: 24 bytes (max 20)");

        let err = Error::transport("notify", "radio off");
        assert_eq!(err.to_string(), "Transport error during notify: radio off");
    }

    #[test]
    fn test_is_storage() {
        assert!(Error::StorageCommit {
            reason: "flash busy".to_string()
        }
        .is_storage());
        assert!(Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk")).is_storage());
        assert!(!Error::Internal("x".to_string()).is_storage());
    }
}
