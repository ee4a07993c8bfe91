//! SROM firmware image handling.
//!
//! The PMW3360 has no persistent firmware storage, so the vendor SROM blob
//! must be uploaded on every power cycle. Firmware targets embed the blob
//! with `include_bytes!`; the image itself is never modified.

use std::fmt;

/// Size of the vendor PMW3360 SROM blob.
pub const PMW3360_SROM_LEN: usize = 4094;

/// An immutable SROM image, sent byte-for-byte during the burst upload.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FirmwareImage<'a> {
    bytes: &'a [u8],
}

impl<'a> FirmwareImage<'a> {
    /// Wrap a firmware blob.
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the length matches the vendor blob.
    ///
    /// A mismatch is not an error: the sensor does not acknowledge the
    /// download, so this is only a hint for log output.
    pub fn has_vendor_length(&self) -> bool {
        self.bytes.len() == PMW3360_SROM_LEN
    }
}

impl fmt::Debug for FirmwareImage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirmwareImage")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl<'a> From<&'a [u8]> for FirmwareImage<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::new(bytes)
    }
}
