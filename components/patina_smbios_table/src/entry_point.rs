//! SMBIOS 3.0 entry point
//!
//! The entry point tells the OS where the structure table lives and how long it is.
//! Firmware publishes it through the UEFI configuration table under
//! [`SMBIOS_3_X_TABLE_GUID`].
//!
//! ## License
//!
//! Copyright (c) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!

use r_efi::efi;
use zerocopy::{FromBytes, IntoBytes};
use zerocopy_derive::*;

/// SMBIOS 3.x Configuration Table GUID: F2FD1544-9794-4A2C-992E-E5BBCF20E394
pub const SMBIOS_3_X_TABLE_GUID: efi::Guid =
    efi::Guid::from_fields(0xF2FD1544, 0x9794, 0x4A2C, 0x99, 0x2E, &[0xE5, 0xBB, 0xCF, 0x20, 0xE3, 0x94]);

/// Anchor string of the 64-bit entry point
pub const SMBIOS_3_ANCHOR: [u8; 5] = *b"_SM3_";

/// Entry point structure revision defined by SMBIOS 3.0
pub const SMBIOS_3_ENTRY_POINT_REVISION: u8 = 1;

/// SMBIOS 3.0 entry point structure (64-bit)
/// Per SMBIOS 3.0+ specification section 5.2.2
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct Smbios30EntryPoint {
    /// Anchor string "_SM3_" (0x00)
    pub anchor_string: [u8; 5],
    /// Entry Point Structure Checksum (0x05)
    pub checksum: u8,
    /// Entry Point Length - 0x18 = 24 bytes (0x06)
    pub length: u8,
    /// SMBIOS Major Version (0x07)
    pub major_version: u8,
    /// SMBIOS Minor Version (0x08)
    pub minor_version: u8,
    /// SMBIOS Docrev - specification revision (0x09)
    pub docrev: u8,
    /// Entry Point Structure Revision - 0x01 (0x0A)
    pub entry_point_revision: u8,
    /// Reserved - must be 0x00 (0x0B)
    pub reserved: u8,
    /// Structure Table Maximum Size (0x0C)
    pub table_max_size: u32,
    /// Structure Table Address - 64-bit (0x10)
    pub table_address: u64,
}

/// Size of [`Smbios30EntryPoint`] on the wire.
pub const SMBIOS_3_ENTRY_POINT_SIZE: usize = core::mem::size_of::<Smbios30EntryPoint>();

impl Smbios30EntryPoint {
    /// Build an entry point for a table of `table_length` bytes at `table_address`
    ///
    /// The checksum is filled in so the structure's byte sum is zero.
    pub fn new(major_version: u8, minor_version: u8, table_address: u64, table_length: u32) -> Self {
        let mut entry_point = Self {
            anchor_string: SMBIOS_3_ANCHOR,
            checksum: 0,
            length: SMBIOS_3_ENTRY_POINT_SIZE as u8,
            major_version,
            minor_version,
            docrev: 0,
            entry_point_revision: SMBIOS_3_ENTRY_POINT_REVISION,
            reserved: 0,
            table_max_size: table_length,
            table_address,
        };
        entry_point.checksum = calculate_checksum(entry_point.as_bytes());
        entry_point
    }

    /// Parse an entry point from the start of `bytes`
    ///
    /// Returns `None` when `bytes` is too short or the structure does not validate.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let (entry_point, _) = Self::read_from_prefix(bytes).ok()?;
        entry_point.is_valid().then_some(entry_point)
    }

    /// Checks the anchor, the declared length and the checksum.
    pub fn is_valid(&self) -> bool {
        let anchor = self.anchor_string;
        anchor == SMBIOS_3_ANCHOR
            && usize::from(self.length) == SMBIOS_3_ENTRY_POINT_SIZE
            && byte_sum(self.as_bytes()) == 0
    }
}

fn byte_sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Checksum byte that brings the sum of `bytes` to zero
///
/// `bytes` must hold a zero in the checksum position.
pub fn calculate_checksum(bytes: &[u8]) -> u8 {
    0u8.wrapping_sub(byte_sum(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_point_layout() {
        assert_eq!(SMBIOS_3_ENTRY_POINT_SIZE, 0x18);

        let entry_point = Smbios30EntryPoint::new(3, 9, 0x1122_3344_5566_7788, 0x0000_1234);
        let bytes = entry_point.as_bytes();
        assert_eq!(&bytes[..5], b"_SM3_");
        assert_eq!(bytes[6], 0x18);
        assert_eq!(bytes[7], 3);
        assert_eq!(bytes[8], 9);
        assert_eq!(bytes[0x0A], 1);
        assert_eq!(&bytes[0x0C..0x10], &[0x34, 0x12, 0, 0]);
        assert_eq!(&bytes[0x10..], &[0x88, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11]);
    }

    #[test]
    fn test_calculate_checksum() {
        let entry_point = Smbios30EntryPoint::new(3, 9, 0x8000_0000, 0x1000);
        let bytes = entry_point.as_bytes();
        let sum: u8 = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
        assert_eq!(sum, 0);
        assert!(entry_point.is_valid());
    }

    #[test]
    fn test_calculate_checksum_zero() {
        assert_eq!(calculate_checksum(&[0u8; SMBIOS_3_ENTRY_POINT_SIZE]), 0);
        assert_eq!(calculate_checksum(&[0x01, 0x02]), 0xFD);
    }

    #[test]
    fn test_modified_entry_point_is_invalid() {
        let mut entry_point = Smbios30EntryPoint::new(3, 0, 0x8000_0000, 0x1000);
        entry_point.table_max_size = 0x2000;
        assert!(!entry_point.is_valid());

        let mut entry_point = Smbios30EntryPoint::new(3, 0, 0x8000_0000, 0x1000);
        entry_point.anchor_string = *b"_SM_\0";
        entry_point.checksum = 0;
        entry_point.checksum = calculate_checksum(entry_point.as_bytes());
        assert!(!entry_point.is_valid());
    }

    #[test]
    fn test_parse_entry_point() {
        let entry_point = Smbios30EntryPoint::new(3, 7, 0xDEAD_0000, 0x345);
        let parsed = Smbios30EntryPoint::parse(entry_point.as_bytes()).expect("entry point should parse");
        assert_eq!(parsed, entry_point);
        let table_address = parsed.table_address;
        assert_eq!(table_address, 0xDEAD_0000);

        assert!(Smbios30EntryPoint::parse(&entry_point.as_bytes()[..0x10]).is_none());
        assert!(Smbios30EntryPoint::parse(&[0u8; SMBIOS_3_ENTRY_POINT_SIZE]).is_none());
    }

    #[test]
    fn test_smbios_3_x_table_guid() {
        let expected =
            efi::Guid::from_fields(0xF2FD1544, 0x9794, 0x4A2C, 0x99, 0x2E, &[0xE5, 0xBB, 0xCF, 0x20, 0xE3, 0x94]);
        assert_eq!(SMBIOS_3_X_TABLE_GUID, expected);
    }
}
