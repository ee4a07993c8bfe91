//! [`SensorBus`] over embedded-hal 1.0 traits.
//!
//! The SPI bus must be configured for mode 3, MSB first, at no more than
//! 2MHz. Chip-select is a plain GPIO because the protocol holds NCS low
//! across delays and, for the SROM burst, across thousands of bytes.

use crate::error::{Result, SensorError};
use crate::transport::SensorBus;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

/// Settle time around each NCS edge.
pub const CS_GUARD_NS: u32 = 50;

/// Hardware sensor bus: an SPI bus, an NCS pin and a blocking delay.
pub struct HalBus<SPI, CS, D> {
    spi: SPI,
    cs: CS,
    delay: D,
}

impl<SPI, CS, D> HalBus<SPI, CS, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    D: DelayNs,
{
    /// Take ownership of the bus parts. NCS is driven high immediately.
    pub fn new(spi: SPI, mut cs: CS, delay: D) -> Result<Self> {
        cs.set_high()
            .map_err(|e| SensorError::ChipSelect(format!("{e:?}")))?;
        Ok(Self { spi, cs, delay })
    }

    /// Give the bus parts back.
    pub fn release(self) -> (SPI, CS, D) {
        (self.spi, self.cs, self.delay)
    }
}

impl<SPI, CS, D> SensorBus for HalBus<SPI, CS, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    D: DelayNs,
{
    fn select(&mut self) -> Result<()> {
        self.delay.delay_ns(CS_GUARD_NS);
        self.cs
            .set_low()
            .map_err(|e| SensorError::ChipSelect(format!("{e:?}")))?;
        self.delay.delay_ns(CS_GUARD_NS);
        Ok(())
    }

    fn deselect(&mut self) -> Result<()> {
        self.delay.delay_ns(CS_GUARD_NS);
        self.cs
            .set_high()
            .map_err(|e| SensorError::ChipSelect(format!("{e:?}")))?;
        self.delay.delay_ns(CS_GUARD_NS);
        Ok(())
    }

    fn transfer_byte(&mut self, out: u8) -> Result<u8> {
        let mut buf = [out];
        self.spi
            .transfer_in_place(&mut buf)
            .map_err(|e| SensorError::Bus(format!("transfer: {e:?}")))?;
        // Delays are measured from the last clock edge, so the byte must be
        // fully shifted out before returning.
        self.spi
            .flush()
            .map_err(|e| SensorError::Bus(format!("flush: {e:?}")))?;
        Ok(buf[0])
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
