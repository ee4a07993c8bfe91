//! Error types for trackball-core.

use thiserror::Error;

/// Core library error type.
#[derive(Debug, Error)]
pub enum SensorError {
    /// The SPI transfer primitive failed.
    #[error("bus error: {0}")]
    Bus(String),

    /// The chip-select line could not be driven.
    #[error("chip-select error: {0}")]
    ChipSelect(String),

    /// SROM_ID read back after the firmware burst did not match.
    #[error("firmware verification failed: expected SROM ID 0x{expected:02X}, read 0x{actual:02X}")]
    FirmwareVerificationFailed { expected: u8, actual: u8 },

    /// Identification registers do not describe a PMW3360.
    #[error("unknown product: id 0x{product_id:02X}, inverse 0x{inverse_product_id:02X}")]
    UnknownProduct {
        product_id: u8,
        inverse_product_id: u8,
    },

    /// Value out of the encodable range.
    #[error("value out of range: {field} = {value} (allowed {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    /// Configuration file could not be read, written or parsed.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, SensorError>;
