//! Sensor identification and health checks.

use crate::error::{Result, SensorError};
use crate::protocol::read_register;
use crate::registers::{values, Register};
use crate::transport::SensorBus;
use tracing::{debug, info};

/// Contents of the identification registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorIdentity {
    pub product_id: u8,
    pub inverse_product_id: u8,
    pub revision_id: u8,
    /// Zero until an SROM has been downloaded.
    pub srom_id: u8,
}

impl SensorIdentity {
    /// Product ID is the PMW3360's and the inverse register agrees with it.
    pub fn is_pmw3360(&self) -> bool {
        self.product_id == values::PRODUCT_ID && self.inverse_product_id == !self.product_id
    }

    /// Whether the firmware download has been latched.
    pub fn has_firmware(&self) -> bool {
        self.srom_id != 0x00
    }

    /// Fail unless this is a PMW3360.
    pub fn ensure_pmw3360(&self) -> Result<()> {
        if self.is_pmw3360() {
            Ok(())
        } else {
            Err(SensorError::UnknownProduct {
                product_id: self.product_id,
                inverse_product_id: self.inverse_product_id,
            })
        }
    }
}

/// Sensor health as seen from the identification registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorStatus {
    /// A PMW3360 answered.
    Ready,
    /// MISO is stuck: product and inverse product read the same.
    NotResponding,
    /// Something answered, but not a PMW3360.
    UnknownProduct,
}

/// Read Product_ID, Inverse_Product_ID, Revision_ID and SROM_ID.
pub fn identify(bus: &mut dyn SensorBus) -> Result<SensorIdentity> {
    let identity = SensorIdentity {
        product_id: read_register(bus, Register::ProductId)?,
        inverse_product_id: read_register(bus, Register::InverseProductId)?,
        revision_id: read_register(bus, Register::RevisionId)?,
        srom_id: read_register(bus, Register::SromId)?,
    };
    debug!(
        product_id = format_args!("0x{:02X}", identity.product_id),
        inverse_product_id = format_args!("0x{:02X}", identity.inverse_product_id),
        revision_id = format_args!("0x{:02X}", identity.revision_id),
        srom_id = format_args!("0x{:02X}", identity.srom_id),
        "Sensor identification"
    );
    Ok(identity)
}

/// Classify the sensor from its identification registers.
///
/// Bus errors are returned as errors; a silent bus is `NotResponding`.
pub fn check_sensor_status(bus: &mut dyn SensorBus) -> Result<SensorStatus> {
    let identity = identify(bus)?;
    let status = if identity.product_id == identity.inverse_product_id {
        SensorStatus::NotResponding
    } else if identity.is_pmw3360() {
        SensorStatus::Ready
    } else {
        SensorStatus::UnknownProduct
    };
    info!(status = ?status, "Sensor status");
    Ok(status)
}
