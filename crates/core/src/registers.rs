//! PMW3360 register catalog and the sentinel values written during startup.
//!
//! Addresses are stored without the direction bit. The protocol engine sets
//! or clears bit 7 on the wire only.

/// Direction bit set on the address byte of a write transaction.
pub const WRITE_FLAG: u8 = 0x80;
/// Mask applied to the address byte of a read transaction.
pub const READ_MASK: u8 = 0x7F;

/// PMW3360 register addresses.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    ProductId = 0x00,
    RevisionId = 0x01,
    Motion = 0x02,
    DeltaXL = 0x03,
    DeltaXH = 0x04,
    DeltaYL = 0x05,
    DeltaYH = 0x06,
    Squal = 0x07,
    RawDataSum = 0x08,
    MaximumRawData = 0x09,
    MinimumRawData = 0x0A,
    ShutterLower = 0x0B,
    ShutterUpper = 0x0C,
    Control = 0x0D,
    /// Resolution, in 100 CPI steps minus one.
    Config1 = 0x0F,
    /// Rest mode enable and wired/wireless selection.
    Config2 = 0x10,
    AngleTune = 0x11,
    FrameCapture = 0x12,
    SromEnable = 0x13,
    RunDownshift = 0x14,
    Rest1RateLower = 0x15,
    Rest1RateUpper = 0x16,
    Rest1Downshift = 0x17,
    Rest2RateLower = 0x18,
    Rest2RateUpper = 0x19,
    Rest2Downshift = 0x1A,
    Rest3RateLower = 0x1B,
    Rest3RateUpper = 0x1C,
    Observation = 0x24,
    DataOutLower = 0x25,
    DataOutUpper = 0x26,
    RawDataDump = 0x29,
    SromId = 0x2A,
    MinSqRun = 0x2B,
    RawDataThreshold = 0x2C,
    Config5 = 0x2F,
    PowerUpReset = 0x3A,
    Shutdown = 0x3B,
    InverseProductId = 0x3F,
    LiftCutoffTune3 = 0x41,
    AngleSnap = 0x42,
    LiftCutoffTune1 = 0x4A,
    MotionBurst = 0x50,
    LiftCutoffTuneTimeout = 0x58,
    LiftCutoffTuneMinLength = 0x5A,
    /// Burst destination for the SROM download.
    SromLoadBurst = 0x62,
    LiftConfig = 0x63,
    RawDataBurst = 0x64,
    LiftCutoffTune2 = 0x65,
}

impl Register {
    /// Raw register address, direction bit clear.
    #[inline]
    pub fn addr(self) -> u8 {
        self as u8
    }

    /// Address byte for a read transaction.
    #[inline]
    pub fn read_byte(self) -> u8 {
        self.addr() & READ_MASK
    }

    /// Address byte for a write transaction.
    #[inline]
    pub fn write_byte(self) -> u8 {
        self.addr() | WRITE_FLAG
    }

    /// Datasheet name, used in log output and traces.
    pub fn name(self) -> &'static str {
        match self {
            Self::ProductId => "Product_ID",
            Self::RevisionId => "Revision_ID",
            Self::Motion => "Motion",
            Self::DeltaXL => "Delta_X_L",
            Self::DeltaXH => "Delta_X_H",
            Self::DeltaYL => "Delta_Y_L",
            Self::DeltaYH => "Delta_Y_H",
            Self::Squal => "SQUAL",
            Self::RawDataSum => "Raw_Data_Sum",
            Self::MaximumRawData => "Maximum_Raw_data",
            Self::MinimumRawData => "Minimum_Raw_data",
            Self::ShutterLower => "Shutter_Lower",
            Self::ShutterUpper => "Shutter_Upper",
            Self::Control => "Control",
            Self::Config1 => "Config1",
            Self::Config2 => "Config2",
            Self::AngleTune => "Angle_Tune",
            Self::FrameCapture => "Frame_Capture",
            Self::SromEnable => "SROM_Enable",
            Self::RunDownshift => "Run_Downshift",
            Self::Rest1RateLower => "Rest1_Rate_Lower",
            Self::Rest1RateUpper => "Rest1_Rate_Upper",
            Self::Rest1Downshift => "Rest1_Downshift",
            Self::Rest2RateLower => "Rest2_Rate_Lower",
            Self::Rest2RateUpper => "Rest2_Rate_Upper",
            Self::Rest2Downshift => "Rest2_Downshift",
            Self::Rest3RateLower => "Rest3_Rate_Lower",
            Self::Rest3RateUpper => "Rest3_Rate_Upper",
            Self::Observation => "Observation",
            Self::DataOutLower => "Data_Out_Lower",
            Self::DataOutUpper => "Data_Out_Upper",
            Self::RawDataDump => "Raw_Data_Dump",
            Self::SromId => "SROM_ID",
            Self::MinSqRun => "Min_SQ_Run",
            Self::RawDataThreshold => "Raw_Data_Threshold",
            Self::Config5 => "Config5",
            Self::PowerUpReset => "Power_Up_Reset",
            Self::Shutdown => "Shutdown",
            Self::InverseProductId => "Inverse_Product_ID",
            Self::LiftCutoffTune3 => "LiftCutoff_Tune3",
            Self::AngleSnap => "Angle_Snap",
            Self::LiftCutoffTune1 => "LiftCutoff_Tune1",
            Self::MotionBurst => "Motion_Burst",
            Self::LiftCutoffTuneTimeout => "LiftCutoff_Tune_Timeout",
            Self::LiftCutoffTuneMinLength => "LiftCutoff_Tune_Min_Length",
            Self::SromLoadBurst => "SROM_Load_Burst",
            Self::LiftConfig => "Lift_Config",
            Self::RawDataBurst => "Raw_Data_Burst",
            Self::LiftCutoffTune2 => "LiftCutoff_Tune2",
        }
    }

    /// Look up a register from its address (direction bit ignored).
    pub fn from_addr(addr: u8) -> Option<Self> {
        let addr = addr & READ_MASK;
        ALL.iter().copied().find(|r| r.addr() == addr)
    }
}

/// Every register in the catalog, in address order.
pub const ALL: &[Register] = &[
    Register::ProductId,
    Register::RevisionId,
    Register::Motion,
    Register::DeltaXL,
    Register::DeltaXH,
    Register::DeltaYL,
    Register::DeltaYH,
    Register::Squal,
    Register::RawDataSum,
    Register::MaximumRawData,
    Register::MinimumRawData,
    Register::ShutterLower,
    Register::ShutterUpper,
    Register::Control,
    Register::Config1,
    Register::Config2,
    Register::AngleTune,
    Register::FrameCapture,
    Register::SromEnable,
    Register::RunDownshift,
    Register::Rest1RateLower,
    Register::Rest1RateUpper,
    Register::Rest1Downshift,
    Register::Rest2RateLower,
    Register::Rest2RateUpper,
    Register::Rest2Downshift,
    Register::Rest3RateLower,
    Register::Rest3RateUpper,
    Register::Observation,
    Register::DataOutLower,
    Register::DataOutUpper,
    Register::RawDataDump,
    Register::SromId,
    Register::MinSqRun,
    Register::RawDataThreshold,
    Register::Config5,
    Register::PowerUpReset,
    Register::Shutdown,
    Register::InverseProductId,
    Register::LiftCutoffTune3,
    Register::AngleSnap,
    Register::LiftCutoffTune1,
    Register::MotionBurst,
    Register::LiftCutoffTuneTimeout,
    Register::LiftCutoffTuneMinLength,
    Register::SromLoadBurst,
    Register::LiftConfig,
    Register::RawDataBurst,
    Register::LiftCutoffTune2,
];

/// Sentinel and configuration values written by the driver.
pub mod values {
    /// Power_Up_Reset: force a full chip reset.
    pub const POWER_UP_RESET: u8 = 0x5A;
    /// Config2 before the SROM download: rest mode disabled.
    pub const CONFIG2_REST_DISABLED: u8 = 0x20;
    /// Config2 after the download for a wired design.
    pub const CONFIG2_WIRED: u8 = 0x00;
    /// Config2 after the download for a wireless design.
    pub const CONFIG2_WIRELESS: u8 = 0x20;
    /// SROM_Enable: initialise the download state machine.
    pub const SROM_PREPARE: u8 = 0x1D;
    /// SROM_Enable: start the download.
    pub const SROM_START: u8 = 0x18;
    /// Config1 right after the download (2200 CPI).
    pub const CONFIG1_INITIAL: u8 = 0x15;
    /// Motion: freeze the delta registers.
    pub const MOTION_FREEZE: u8 = 0x01;
    /// Product_ID of a PMW3360.
    pub const PRODUCT_ID: u8 = 0x42;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_addresses_have_direction_bit_clear() {
        for reg in ALL {
            assert_eq!(reg.addr() & WRITE_FLAG, 0, "{} has bit 7 set", reg.name());
        }
    }

    #[test]
    fn catalog_is_sorted_and_unique() {
        for pair in ALL.windows(2) {
            assert!(pair[0].addr() < pair[1].addr());
        }
    }

    #[test]
    fn direction_bytes() {
        assert_eq!(Register::Config1.write_byte(), 0x8F);
        assert_eq!(Register::Config1.read_byte(), 0x0F);
        assert_eq!(Register::SromLoadBurst.write_byte(), 0xE2);
    }

    #[test]
    fn from_addr_ignores_direction_bit() {
        assert_eq!(Register::from_addr(0x2A), Some(Register::SromId));
        assert_eq!(Register::from_addr(0xAA), Some(Register::SromId));
        assert_eq!(Register::from_addr(0x0E), None);
    }
}
