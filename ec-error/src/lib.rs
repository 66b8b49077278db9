//! Unified error handling for the EC sensor driver
//!
//! A single error type shared by the sensor-map compiler, the block-read
//! engine, the cache layer and the command-line front end.

use std::io;
use std::path::PathBuf;

/// Result type alias using EcError
pub type Result<T> = std::result::Result<T, EcError>;

/// Unified error type for all driver operations
#[derive(thiserror::Error, Debug)]
pub enum EcError {
    // ============================================================================
    // Initialization Errors
    // ============================================================================
    #[error("Unsupported board: {vendor} {name}")]
    BoardUnsupported {
        vendor: String,
        name: String,
    },

    #[error("Unable to allocate {what}")]
    AllocationFailure {
        what: &'static str,
    },

    #[error("Sensor table integrity violation: {0}")]
    TableIntegrity(String),

    // ============================================================================
    // Hardware Access Errors
    // ============================================================================
    #[error("Hardware access mutex {name} could not be resolved")]
    MutexUnavailable {
        name: String,
    },

    #[error("Timed out after {timeout_ms}ms acquiring hardware access mutex {name}")]
    MutexBusy {
        name: String,
        timeout_ms: u64,
    },

    #[error("EC bank switch to {bank} failed: {source}")]
    BankSwitch {
        bank: u8,
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Sensor state is busy (waited {waited_ms}ms)")]
    Busy {
        waited_ms: u64,
    },

    // ============================================================================
    // Lookup Errors
    // ============================================================================
    #[error("No {kind} sensor at channel {channel}")]
    SensorNotFound {
        kind: &'static str,
        channel: usize,
    },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },
}

impl EcError {
    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a board-unsupported error from the identification strings
    pub fn unsupported(vendor: impl Into<String>, name: impl Into<String>) -> Self {
        Self::BoardUnsupported {
            vendor: vendor.into(),
            name: name.into(),
        }
    }

    /// Errors that abort driver setup. No instance exists after one of these.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::BoardUnsupported { .. } | Self::AllocationFailure { .. } | Self::TableIntegrity(_)
        )
    }

    /// Contention with another party; the next poll retries naturally.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::MutexBusy { .. } | Self::Busy { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(EcError::unsupported("Foo", "Bar").is_fatal());
        assert!(EcError::AllocationFailure { what: "read buffer" }.is_fatal());
        assert!(!EcError::Busy { waited_ms: 10 }.is_fatal());
        assert!(!EcError::SensorNotFound { kind: "fan", channel: 3 }.is_fatal());
    }

    #[test]
    fn test_busy_classification() {
        let err = EcError::MutexBusy { name: "\\AMW0.ASMX".into(), timeout_ms: 500 };
        assert!(err.is_busy());
        assert!(EcError::Busy { waited_ms: 2000 }.is_busy());
        let io = EcError::from(io::Error::new(io::ErrorKind::Other, "boom"));
        assert!(!io.is_busy());
    }

    #[test]
    fn test_display_messages() {
        let err = EcError::BankSwitch {
            bank: 1,
            source: io::Error::new(io::ErrorKind::TimedOut, "ec timeout"),
        };
        assert_eq!(err.to_string(), "EC bank switch to 1 failed: ec timeout");

        let err = EcError::SensorNotFound { kind: "curr", channel: 2 };
        assert_eq!(err.to_string(), "No curr sensor at channel 2");

        let err = EcError::unsupported("ASUSTeK COMPUTER INC.", "PRIME Z690-P");
        assert_eq!(err.to_string(), "Unsupported board: ASUSTeK COMPUTER INC. PRIME Z690-P");
    }
}
