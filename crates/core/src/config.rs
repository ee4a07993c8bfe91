//! Sensor configuration file.
//!
//! Stored as pretty-printed JSON. Every field has a default, so a partial
//! file (or `{}`) is valid.

use crate::error::{Result, SensorError};
use crate::firmware::FirmwareImage;
use crate::motion::Orientation;
use crate::protocol::LinkMode;
use crate::safety;
use crate::sensor::Sensor;
use crate::transport::SensorBus;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// How the sensor is brought up and how its samples are oriented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Resolution applied after startup, in CPI.
    pub resolution_cpi: u16,
    /// Config2 value after the SROM download.
    pub link_mode: LinkMode,
    /// Expected SROM_ID after the download; `None` skips the check.
    pub verify_srom_id: Option<u8>,
    /// Axis transform for reported motion.
    pub orientation: Orientation,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            resolution_cpi: safety::RESOLUTION_DEFAULT,
            link_mode: LinkMode::Wired,
            verify_srom_id: None,
            orientation: Orientation::trackball(),
        }
    }
}

impl SensorConfig {
    /// Check every field, rounding the resolution to a valid step.
    pub fn validate(&self) -> Result<Self> {
        Ok(Self {
            resolution_cpi: safety::validate_resolution(self.resolution_cpi)?,
            ..self.clone()
        })
    }

    /// Build a sensor with this configuration's startup options.
    pub fn sensor<'fw, B: SensorBus>(
        &self,
        bus: B,
        firmware: FirmwareImage<'fw>,
    ) -> Sensor<'fw, B> {
        let sensor = Sensor::new(bus, firmware).with_link_mode(self.link_mode);
        match self.verify_srom_id {
            Some(expected) => sensor.with_firmware_check(expected),
            None => sensor,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SensorError::Config(format!("parse: {e}")))?;
        config.validate()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SensorError::Config(format!("serialize: {e}")))
    }
}

/// Load and validate a configuration file.
pub fn load_config(path: &Path) -> Result<SensorConfig> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| SensorError::Config(format!("read {}: {e}", path.display())))?;
    let config = SensorConfig::from_json(&json)?;
    debug!(path = %path.display(), ?config, "Loaded sensor config");
    Ok(config)
}

/// Validate and write a configuration file.
pub fn save_config(path: &Path, config: &SensorConfig) -> Result<()> {
    let json = config.validate()?.to_json()?;
    std::fs::write(path, json)
        .map_err(|e| SensorError::Config(format!("write {}: {e}", path.display())))?;
    debug!(path = %path.display(), "Saved sensor config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::Register;
    use crate::sensor::SessionState;
    use crate::transport::recording::RecordingBus;

    #[test]
    fn default_config_matches_trackball() {
        let c = SensorConfig::default();
        assert_eq!(c.resolution_cpi, 800);
        assert_eq!(c.link_mode, LinkMode::Wired);
        assert!(c.orientation.invert_y);
        assert!(!c.orientation.invert_x);
        assert_eq!(c.verify_srom_id, None);
    }

    #[test]
    fn empty_json_uses_defaults() {
        assert_eq!(SensorConfig::from_json("{}").unwrap(), SensorConfig::default());
    }

    #[test]
    fn partial_json() {
        let c = SensorConfig::from_json(
            r#"{ "resolution_cpi": 1640, "link_mode": "wireless", "verify_srom_id": 4 }"#,
        )
        .unwrap();
        assert_eq!(c.resolution_cpi, 1600);
        assert_eq!(c.link_mode, LinkMode::Wireless);
        assert_eq!(c.verify_srom_id, Some(4));
        assert!(c.orientation.invert_y);
    }

    #[test]
    fn json_out_of_range_resolution_rejected() {
        let err = SensorConfig::from_json(r#"{ "resolution_cpi": 50 }"#).unwrap_err();
        assert!(matches!(err, SensorError::OutOfRange { .. }));
    }

    #[test]
    fn malformed_json_is_config_error() {
        let err = SensorConfig::from_json("{ resolution").unwrap_err();
        assert!(matches!(err, SensorError::Config(_)));
    }

    #[test]
    fn serialization_roundtrip() {
        let config = SensorConfig {
            verify_srom_id: Some(0x04),
            ..SensorConfig::default()
        };
        let json = config.to_json().expect("serialize config");
        assert!(json.contains("\"wired\""));
        let back: SensorConfig = serde_json::from_str(&json).expect("deserialize config");
        assert_eq!(back, config);
    }

    #[test]
    fn save_and_load_file() {
        let path = std::env::temp_dir().join(format!(
            "trackball-config-test-{}.json",
            std::process::id()
        ));
        let config = SensorConfig {
            resolution_cpi: 3200,
            ..SensorConfig::default()
        };
        save_config(&path, &config).unwrap();
        let loaded = load_config(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let err = load_config(Path::new("/nonexistent/trackball.json")).unwrap_err();
        assert!(matches!(err, SensorError::Config(_)));
    }

    #[test]
    fn sensor_applies_verification() {
        let config = SensorConfig {
            verify_srom_id: Some(0x04),
            ..SensorConfig::default()
        };
        let mut bus = RecordingBus::new();
        bus.set_register(Register::SromId, 0x03);
        let mut sensor = config.sensor(&mut bus, FirmwareImage::new(&[0xAA]));
        assert!(sensor.perform_startup().is_err());
        assert_eq!(sensor.state(), SessionState::UploadingFirmware);
    }

    #[test]
    fn sensor_applies_link_mode() {
        let config = SensorConfig {
            link_mode: LinkMode::Wireless,
            ..SensorConfig::default()
        };
        let mut bus = RecordingBus::new();
        let sensor = config.sensor(&mut bus, FirmwareImage::new(&[]));
        assert_eq!(sensor.link_mode(), LinkMode::Wireless);
    }
}
