//! Error types for the exsim simulator.
//!
//! Order admission failures are data (`RejectReason` in the engine crate),
//! not errors; this type covers the I/O and configuration surfaces.

use thiserror::Error;

/// Core error type for the simulator
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid command-line argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error while writing simulation output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Config("lot_size must be >= 1".to_string());
        assert_eq!(err.to_string(), "Configuration error: lot_size must be >= 1");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(err.to_string().contains("I/O error"));
    }
}
