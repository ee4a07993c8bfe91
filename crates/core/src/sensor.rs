//! Sensor lifecycle: power-up reset, SROM download, resolution, motion polling.
//!
//! A [`Sensor`] owns its bus, so at most one transaction is ever in flight.
//! Lifecycle:
//!
//! ```text
//! Uninitialized -> Resetting -> UploadingFirmware -> Configured -> Polling
//! ```
//!
//! There is no teardown. Running [`Sensor::perform_startup`] again is the only
//! way back from any state, including a failed download.

use crate::device::{self, SensorIdentity, SensorStatus};
use crate::error::{Result, SensorError};
use crate::firmware::FirmwareImage;
use crate::motion::MotionSample;
use crate::protocol::{self, read_register, write_register, LinkMode};
use crate::registers::{values, Register};
use crate::transport::SensorBus;
use tracing::{debug, info, warn};

/// Wait after Power_Up_Reset before touching the sensor again.
pub const RESET_SETTLE_MS: u32 = 50;
/// Wait after the post-download configuration.
pub const STARTUP_SETTLE_MS: u32 = 10;
/// CPI covered by one step of the Config1 register.
pub const RESOLUTION_STEP_CPI: u16 = 100;

/// Where the sensor is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Resetting,
    UploadingFirmware,
    Configured,
    Polling,
}

/// Config1 value for a resolution: `cpi / 100 - 1`.
///
/// Valid input is 100..=25600 CPI. Anything else is a caller error and wraps
/// rather than panicking; see [`crate::safety::validate_resolution`] for the
/// checked version.
pub fn resolution_register_value(cpi: u16) -> u8 {
    (cpi / RESOLUTION_STEP_CPI).wrapping_sub(1) as u8
}

/// A PMW3360 on a dedicated bus.
pub struct Sensor<'fw, B: SensorBus> {
    bus: B,
    firmware: FirmwareImage<'fw>,
    link_mode: LinkMode,
    expected_srom_id: Option<u8>,
    state: SessionState,
    srom_id: Option<u8>,
}

impl<'fw, B: SensorBus> Sensor<'fw, B> {
    /// Wrap a bus. Nothing is sent until [`Sensor::perform_startup`].
    pub fn new(bus: B, firmware: FirmwareImage<'fw>) -> Self {
        Self {
            bus,
            firmware,
            link_mode: LinkMode::default(),
            expected_srom_id: None,
            state: SessionState::Uninitialized,
            srom_id: None,
        }
    }

    /// Select the post-download Config2 value.
    pub fn with_link_mode(mut self, link_mode: LinkMode) -> Self {
        self.link_mode = link_mode;
        self
    }

    /// Fail startup unless SROM_ID reads back as `expected` after the download.
    ///
    /// This only compares the ID register. The download itself has no
    /// checksum, so a corrupted image with a correct ID byte still passes.
    pub fn with_firmware_check(mut self, expected: u8) -> Self {
        self.expected_srom_id = Some(expected);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn link_mode(&self) -> LinkMode {
        self.link_mode
    }

    /// SROM_ID read back by the last download, if one completed.
    pub fn srom_id(&self) -> Option<u8> {
        self.srom_id
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_inner(self) -> B {
        self.bus
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "Sensor state change");
        self.state = next;
    }

    /// Reset the sensor, download the SROM and wait for it to settle.
    ///
    /// Steps:
    /// 1. Toggle NCS (deselect, select, deselect) to reset the serial port
    /// 2. Power_Up_Reset = 0x5A, wait 50ms
    /// 3. Read and discard Motion and the four delta registers
    /// 4. [`protocol::upload_firmware`]
    /// 5. Wait 10ms
    pub fn perform_startup(&mut self) -> Result<()> {
        self.transition(SessionState::Resetting);
        self.srom_id = None;

        self.bus.deselect()?;
        self.bus.select()?;
        self.bus.deselect()?;

        write_register(&mut self.bus, Register::PowerUpReset, values::POWER_UP_RESET)?;
        self.bus.delay_ms(RESET_SETTLE_MS);

        for reg in [
            Register::Motion,
            Register::DeltaXL,
            Register::DeltaXH,
            Register::DeltaYL,
            Register::DeltaYH,
        ] {
            read_register(&mut self.bus, reg)?;
        }

        self.transition(SessionState::UploadingFirmware);
        let srom_id = protocol::upload_firmware(&mut self.bus, self.firmware, self.link_mode)?;
        self.bus.delay_ms(STARTUP_SETTLE_MS);

        if let Some(expected) = self.expected_srom_id {
            if srom_id != expected {
                warn!(
                    expected = format_args!("0x{:02X}", expected),
                    actual = format_args!("0x{:02X}", srom_id),
                    "SROM verification failed"
                );
                return Err(SensorError::FirmwareVerificationFailed {
                    expected,
                    actual: srom_id,
                });
            }
        }

        self.srom_id = Some(srom_id);
        self.transition(SessionState::Configured);
        info!(
            srom_id = format_args!("0x{:02X}", srom_id),
            link_mode = ?self.link_mode,
            "Sensor startup complete"
        );
        Ok(())
    }

    /// Write the resolution register.
    ///
    /// `cpi` must be within 100..=25600; see [`resolution_register_value`].
    pub fn set_resolution(&mut self, cpi: u16) -> Result<()> {
        let value = resolution_register_value(cpi);
        write_register(&mut self.bus, Register::Config1, value)?;
        info!(
            cpi = cpi,
            register = format_args!("0x{:02X}", value),
            "Resolution set"
        );
        Ok(())
    }

    /// Latch and read one motion sample.
    ///
    /// Writing Motion freezes the delta registers and reading it releases
    /// them for reading, so the four delta reads are mutually consistent.
    pub fn read_motion(&mut self) -> Result<MotionSample> {
        match self.state {
            SessionState::Configured => self.transition(SessionState::Polling),
            SessionState::Polling => {}
            state => warn!(state = ?state, "Polling motion before startup completed"),
        }

        write_register(&mut self.bus, Register::Motion, values::MOTION_FREEZE)?;
        read_register(&mut self.bus, Register::Motion)?;

        let x_high = read_register(&mut self.bus, Register::DeltaXH)?;
        let x_low = read_register(&mut self.bus, Register::DeltaXL)?;
        let y_high = read_register(&mut self.bus, Register::DeltaYH)?;
        let y_low = read_register(&mut self.bus, Register::DeltaYL)?;

        Ok(MotionSample::from_registers(x_high, x_low, y_high, y_low))
    }

    /// Full startup followed by the initial resolution.
    ///
    /// A bus failure anywhere is returned immediately; there are no retries.
    pub fn initialize_sensor(&mut self, resolution: u16) -> Result<()> {
        self.perform_startup()?;
        self.set_resolution(resolution)
    }

    /// One decoded (dx, dy) pair.
    ///
    /// Calling faster than the frame rate returns zero deltas, not stale ones.
    pub fn poll_motion(&mut self) -> Result<MotionSample> {
        self.read_motion()
    }

    /// Read the identification registers. Does not change the session state.
    pub fn identify(&mut self) -> Result<SensorIdentity> {
        device::identify(&mut self.bus)
    }

    pub fn check_status(&mut self) -> Result<SensorStatus> {
        device::check_sensor_status(&mut self.bus)
    }
}
