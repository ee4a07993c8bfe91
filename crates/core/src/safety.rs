//! Checked resolution handling for the configuration and CLI layers.
//!
//! The driver path ([`crate::sensor::Sensor::set_resolution`]) trusts its
//! caller. Anything that comes from a file or a command line goes through
//! here first, so no unencodable value reaches Config1.
//!
//! ## Resolution
//! - **Range**: 100 – 25,600 CPI
//! - **Step size**: 100 CPI (Config1 holds `cpi / 100 - 1`, one byte)
//! - **Default**: 800 CPI

use crate::error::{Result, SensorError};
use crate::sensor::{resolution_register_value, RESOLUTION_STEP_CPI};

pub const RESOLUTION_MIN: u16 = 100;
pub const RESOLUTION_MAX: u16 = 25600;
pub const RESOLUTION_DEFAULT: u16 = 800;

/// Validate a resolution and round it to the nearest 100 CPI step.
pub fn validate_resolution(cpi: u16) -> Result<u16> {
    if !(RESOLUTION_MIN..=RESOLUTION_MAX).contains(&cpi) {
        return Err(SensorError::OutOfRange {
            field: "resolution_cpi",
            value: cpi as u32,
            min: RESOLUTION_MIN as u32,
            max: RESOLUTION_MAX as u32,
        });
    }
    let step = RESOLUTION_STEP_CPI;
    let rounded = ((cpi as u32 + step as u32 / 2) / step as u32 * step as u32) as u16;
    Ok(rounded.clamp(RESOLUTION_MIN, RESOLUTION_MAX))
}

/// Validate and encode a resolution as its Config1 value.
pub fn encode_resolution(cpi: u16) -> Result<u8> {
    validate_resolution(cpi).map(resolution_register_value)
}

/// Resolution represented by a Config1 value.
pub fn decode_resolution(register: u8) -> u16 {
    (register as u16 + 1) * RESOLUTION_STEP_CPI
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_resolution_in_range() {
        assert_eq!(validate_resolution(800).unwrap(), 800);
        assert_eq!(validate_resolution(100).unwrap(), 100);
        assert_eq!(validate_resolution(25600).unwrap(), 25600);
    }

    #[test]
    fn validate_resolution_rounds_to_step() {
        assert_eq!(validate_resolution(810).unwrap(), 800);
        assert_eq!(validate_resolution(850).unwrap(), 900);
        assert_eq!(validate_resolution(149).unwrap(), 100);
        assert_eq!(validate_resolution(25599).unwrap(), 25600);
    }

    #[test]
    fn validate_resolution_rejects_out_of_range() {
        assert!(validate_resolution(0).is_err());
        assert!(validate_resolution(99).is_err());
        assert!(validate_resolution(25601).is_err());
        assert!(validate_resolution(u16::MAX).is_err());
    }

    #[test]
    fn encode_matches_register_formula() {
        assert_eq!(encode_resolution(800).unwrap(), 7);
        assert_eq!(encode_resolution(100).unwrap(), 0);
        assert_eq!(encode_resolution(25600).unwrap(), 255);
    }

    #[test]
    fn decode_inverts_encode() {
        for cpi in (RESOLUTION_MIN..=RESOLUTION_MAX).step_by(RESOLUTION_STEP_CPI as usize) {
            assert_eq!(decode_resolution(encode_resolution(cpi).unwrap()), cpi);
        }
    }

    #[test]
    fn initial_download_resolution() {
        // Config1 is left at 0x15 by the SROM download.
        assert_eq!(decode_resolution(0x15), 2200);
    }
}
