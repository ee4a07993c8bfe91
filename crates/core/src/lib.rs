//! trackball-core: PMW3360 register protocol, SROM download, and motion decoding.
//!
//! This crate drives a PMW3360 optical sensor over SPI from power-on to
//! steady-state polling. It is written against the [`transport::SensorBus`]
//! capability set; [`hal::HalBus`] adapts embedded-hal 1.0 peripherals and
//! [`transport::recording::RecordingBus`] stands in for hardware.

pub mod config;
pub mod device;
pub mod error;
pub mod firmware;
pub mod hal;
#[cfg(test)]
mod integration_tests;
pub mod motion;
pub mod protocol;
pub mod registers;
pub mod safety;
pub mod sensor;
pub mod transport;

pub use error::{Result, SensorError};
pub use firmware::FirmwareImage;
pub use motion::MotionSample;
pub use sensor::{Sensor, SessionState};
