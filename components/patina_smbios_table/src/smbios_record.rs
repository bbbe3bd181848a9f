//! SMBIOS record header and type numbers
//!
//! Every SMBIOS record starts with the same 4-byte header, followed by its fixed fields
//! and then its string pool:
//!
//! ```text
//! ┌─────────────┬──────────────────────┬──────────────────────────────┐
//! │   Header    │   Structured Data    │         String Pool          │
//! │   (4 bytes) │   (varies by type)   │  "str1\0str2\0\0" or "\0\0"  │
//! └─────────────┴──────────────────────┴──────────────────────────────┘
//! ```
//!
//! The header `length` covers the header and the structured data only.
//!
//! ## License
//!
//! Copyright (c) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!

use zerocopy_derive::*;

/// SMBIOS record handle type (16-bit identifier)
pub type SmbiosHandle = u16;

/// SMBIOS record type
pub type SmbiosType = u8;

/// Each text string is limited to 64 significant characters.
pub const SMBIOS_STRING_MAX_LENGTH: usize = 64;

/// Width of the `0x` prefix written in front of hex-encoded strings.
pub const SMBIOS_STRING_HEX_PREFIX_SIZE: usize = 2;

/// Bytes reserved after every record for its terminator.
pub const SMBIOS_STRUCTURE_TERMINATOR_SIZE: usize = 2;

/// Structure Table Length in the 2.1 entry point is a WORD.
pub const SMBIOS_TABLE_MAX_LENGTH: usize = 0xFFFF;

/// First handle of the range reserved by the SMBIOS specification.
pub const SMBIOS_HANDLE_RESERVED_BEGIN: SmbiosHandle = 0xFF00;

/// Size of [`SmbiosTableHeader`] on the wire.
pub const SMBIOS_HEADER_SIZE: usize = core::mem::size_of::<SmbiosTableHeader>();

pub const SMBIOS_TYPE_BIOS_INFORMATION: SmbiosType = 0;
pub const SMBIOS_TYPE_SYSTEM_INFORMATION: SmbiosType = 1;
pub const SMBIOS_TYPE_BASEBOARD_INFORMATION: SmbiosType = 2;
pub const SMBIOS_TYPE_SYSTEM_ENCLOSURE: SmbiosType = 3;
pub const SMBIOS_TYPE_PROCESSOR_INFORMATION: SmbiosType = 4;
pub const SMBIOS_TYPE_MEMORY_CONTROLLER_INFORMATION: SmbiosType = 5;
pub const SMBIOS_TYPE_MEMORY_MODULE_INFORMATION: SmbiosType = 6;
pub const SMBIOS_TYPE_CACHE_INFORMATION: SmbiosType = 7;
pub const SMBIOS_TYPE_PORT_CONNECTOR_INFORMATION: SmbiosType = 8;
pub const SMBIOS_TYPE_SYSTEM_SLOTS: SmbiosType = 9;
pub const SMBIOS_TYPE_ONBOARD_DEVICE_INFORMATION: SmbiosType = 10;
pub const SMBIOS_TYPE_OEM_STRINGS: SmbiosType = 11;
pub const SMBIOS_TYPE_SYSTEM_CONFIGURATION_OPTIONS: SmbiosType = 12;
pub const SMBIOS_TYPE_BIOS_LANGUAGE_INFORMATION: SmbiosType = 13;
pub const SMBIOS_TYPE_GROUP_ASSOCIATIONS: SmbiosType = 14;
pub const SMBIOS_TYPE_SYSTEM_EVENT_LOG: SmbiosType = 15;
pub const SMBIOS_TYPE_PHYSICAL_MEMORY_ARRAY: SmbiosType = 16;
pub const SMBIOS_TYPE_MEMORY_DEVICE: SmbiosType = 17;
pub const SMBIOS_TYPE_32BIT_MEMORY_ERROR_INFORMATION: SmbiosType = 18;
pub const SMBIOS_TYPE_MEMORY_ARRAY_MAPPED_ADDRESS: SmbiosType = 19;
pub const SMBIOS_TYPE_MEMORY_DEVICE_MAPPED_ADDRESS: SmbiosType = 20;
pub const SMBIOS_TYPE_BUILT_IN_POINTING_DEVICE: SmbiosType = 21;
pub const SMBIOS_TYPE_PORTABLE_BATTERY: SmbiosType = 22;
pub const SMBIOS_TYPE_SYSTEM_RESET: SmbiosType = 23;
pub const SMBIOS_TYPE_HARDWARE_SECURITY: SmbiosType = 24;
pub const SMBIOS_TYPE_SYSTEM_POWER_CONTROLS: SmbiosType = 25;
pub const SMBIOS_TYPE_VOLTAGE_PROBE: SmbiosType = 26;
pub const SMBIOS_TYPE_COOLING_DEVICE: SmbiosType = 27;
pub const SMBIOS_TYPE_TEMPERATURE_PROBE: SmbiosType = 28;
pub const SMBIOS_TYPE_ELECTRICAL_CURRENT_PROBE: SmbiosType = 29;
pub const SMBIOS_TYPE_OUT_OF_BAND_REMOTE_ACCESS: SmbiosType = 30;
pub const SMBIOS_TYPE_BOOT_INTEGRITY_SERVICE: SmbiosType = 31;
pub const SMBIOS_TYPE_SYSTEM_BOOT_INFORMATION: SmbiosType = 32;
pub const SMBIOS_TYPE_64BIT_MEMORY_ERROR_INFORMATION: SmbiosType = 33;
pub const SMBIOS_TYPE_MANAGEMENT_DEVICE: SmbiosType = 34;
pub const SMBIOS_TYPE_MANAGEMENT_DEVICE_COMPONENT: SmbiosType = 35;
pub const SMBIOS_TYPE_MANAGEMENT_DEVICE_THRESHOLD_DATA: SmbiosType = 36;
pub const SMBIOS_TYPE_MEMORY_CHANNEL: SmbiosType = 37;
pub const SMBIOS_TYPE_IPMI_DEVICE_INFORMATION: SmbiosType = 38;
pub const SMBIOS_TYPE_SYSTEM_POWER_SUPPLY: SmbiosType = 39;
pub const SMBIOS_TYPE_ADDITIONAL_INFORMATION: SmbiosType = 40;
pub const SMBIOS_TYPE_ONBOARD_DEVICES_EXTENDED_INFORMATION: SmbiosType = 41;
pub const SMBIOS_TYPE_MANAGEMENT_CONTROLLER_HOST_INTERFACE: SmbiosType = 42;
pub const SMBIOS_TYPE_TPM_DEVICE: SmbiosType = 43;

/// Software that walks the table skips Inactive structures like unknown ones.
pub const SMBIOS_TYPE_INACTIVE: SmbiosType = 126;

/// The end-of-table indicator is the last physical structure in a table.
pub const SMBIOS_TYPE_END_OF_TABLE: SmbiosType = 127;

// Apple vendor extensions (OEM range)
pub const APPLE_SMBIOS_TYPE_FIRMWARE_INFORMATION: SmbiosType = 128;
pub const APPLE_SMBIOS_TYPE_MEMORY_SPD_DATA: SmbiosType = 130;
pub const APPLE_SMBIOS_TYPE_PROCESSOR_TYPE: SmbiosType = 131;
pub const APPLE_SMBIOS_TYPE_PROCESSOR_BUS_SPEED: SmbiosType = 132;
pub const APPLE_SMBIOS_TYPE_PLATFORM_FEATURE: SmbiosType = 133;
pub const APPLE_SMBIOS_TYPE_SMC_INFORMATION: SmbiosType = 134;

/// SMBIOS table header structure
///
/// This is the standard 4-byte header that appears at the start of every SMBIOS record.
/// It contains the record type, length of structured data, and a unique handle.
#[repr(C, packed)]
#[derive(Debug, Clone, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct SmbiosTableHeader {
    /// SMBIOS record type
    pub record_type: SmbiosType,
    /// Length of the structured data (including header)
    pub length: u8,
    /// Unique handle for this record
    pub handle: SmbiosHandle,
}

impl SmbiosTableHeader {
    /// Creates a new SMBIOS table header
    pub fn new(record_type: SmbiosType, length: u8, handle: SmbiosHandle) -> Self {
        Self { record_type, length, handle }
    }
}
