//! Register protocol engine: single-register access and the SROM burst upload.
//!
//! Every wait below is a lower bound taken from the PMW3360 datasheet timing
//! table. Shortening any of them does not produce an error, it produces
//! garbage on the bus, so the values here may only ever grow.
//!
//! Timing reference: PMW3360DM-T2QU datasheet, "SPI timings" and
//! "SROM download" (p.18).

use crate::error::Result;
use crate::firmware::FirmwareImage;
use crate::registers::{values, Register};
use crate::transport::SensorBus;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// tSRAD: address byte to first data bit of a read.
pub const T_SRAD_US: u32 = 100;
/// tSCLK-NCS after the last bit of a read (120ns, rounded up).
pub const T_SCLK_NCS_READ_US: u32 = 1;
/// tSRR/tSRW (20us) minus tSCLK-NCS.
pub const T_SRX_US: u32 = 19;
/// tSCLK-NCS after the last bit of a write.
pub const T_SCLK_NCS_WRITE_US: u32 = 20;
/// tSWW/tSWR (120us) minus tSCLK-NCS.
pub const T_SWX_US: u32 = 100;
/// One frame period, assuming a frame rate as low as 100fps.
pub const FRAME_PERIOD_MS: u32 = 10;
/// Gap after each byte of the SROM burst.
pub const T_SROM_BYTE_US: u32 = 15;

/// Post-download Config2 setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// Rest modes disabled, lowest latency.
    #[default]
    Wired,
    /// Rest modes enabled to save power.
    Wireless,
}

impl LinkMode {
    pub fn config2_value(self) -> u8 {
        match self {
            Self::Wired => values::CONFIG2_WIRED,
            Self::Wireless => values::CONFIG2_WIRELESS,
        }
    }
}

/// Run `body` with NCS asserted.
///
/// NCS is released even when `body` fails, so the next transaction starts
/// with a fresh address byte. The first error wins.
fn framed<T>(
    bus: &mut dyn SensorBus,
    body: impl FnOnce(&mut dyn SensorBus) -> Result<T>,
) -> Result<T> {
    bus.select()?;
    let result = body(&mut *bus);
    let released = bus.deselect();
    let value = result?;
    released?;
    Ok(value)
}

/// Read one register.
///
/// The returned byte is not validated: a missing sensor reads as whatever
/// MISO floats to.
pub fn read_register(bus: &mut dyn SensorBus, reg: Register) -> Result<u8> {
    let value = framed(bus, |bus| {
        bus.transfer_byte(reg.read_byte())?;
        bus.delay_us(T_SRAD_US);
        let value = bus.transfer_byte(0x00)?;
        bus.delay_us(T_SCLK_NCS_READ_US);
        Ok(value)
    })?;
    bus.delay_us(T_SRX_US);

    trace!(
        reg = reg.name(),
        value = format_args!("0x{:02X}", value),
        "register read"
    );
    Ok(value)
}

/// Write one register.
pub fn write_register(bus: &mut dyn SensorBus, reg: Register, value: u8) -> Result<()> {
    framed(bus, |bus| {
        bus.transfer_byte(reg.write_byte())?;
        bus.transfer_byte(value)?;
        bus.delay_us(T_SCLK_NCS_WRITE_US);
        Ok(())
    })?;
    bus.delay_us(T_SWX_US);

    trace!(
        reg = reg.name(),
        value = format_args!("0x{:02X}", value),
        "register write"
    );
    Ok(())
}

/// Upload the SROM image and apply the post-download configuration.
///
/// Returns the SROM_ID byte read right after the burst. The sensor gives no
/// acknowledgement of the download, so this value is the only hint that it
/// worked; interpreting it is left to the caller.
///
/// Steps:
/// 1. Config2 = 0x20 (rest mode off)
/// 2. SROM_Enable = 0x1D, wait one frame
/// 3. SROM_Enable = 0x18
/// 4. One NCS assertion: SROM_Load_Burst address, then every image byte,
///    each followed by 15us
/// 5. Read SROM_ID before any other register access
/// 6. Config2 = link mode value, Config1 = initial resolution
///
/// There is no abort path. The sensor's download state machine cannot be
/// interrupted, and a bus error part way through leaves it in an unknown
/// state that only a new power-up reset clears.
pub fn upload_firmware(
    bus: &mut dyn SensorBus,
    image: FirmwareImage<'_>,
    link_mode: LinkMode,
) -> Result<u8> {
    if !image.has_vendor_length() {
        warn!(len = image.len(), "SROM image length differs from the vendor blob");
    }
    debug!(len = image.len(), "Starting SROM download");

    write_register(bus, Register::Config2, values::CONFIG2_REST_DISABLED)?;
    write_register(bus, Register::SromEnable, values::SROM_PREPARE)?;
    bus.delay_ms(FRAME_PERIOD_MS);
    write_register(bus, Register::SromEnable, values::SROM_START)?;

    framed(bus, |bus| {
        bus.transfer_byte(Register::SromLoadBurst.write_byte())?;
        bus.delay_us(T_SROM_BYTE_US);
        for &byte in image.bytes() {
            bus.transfer_byte(byte)?;
            bus.delay_us(T_SROM_BYTE_US);
        }
        Ok(())
    })?;

    let srom_id = read_register(bus, Register::SromId)?;
    debug!(
        srom_id = format_args!("0x{:02X}", srom_id),
        "SROM download finished"
    );

    write_register(bus, Register::Config2, link_mode.config2_value())?;
    write_register(bus, Register::Config1, values::CONFIG1_INITIAL)?;

    Ok(srom_id)
}
