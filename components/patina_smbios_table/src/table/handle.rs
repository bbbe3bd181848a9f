//! Deterministic handle assignment
//!
//! Singleton record types always receive the same reserved handle, the cache hierarchy
//! uses one reserved handle per level, and the remaining repeatable types draw from a
//! per-table counter. The mapping is plain data in [`HANDLE_POLICIES`].
//!
//! ## License
//!
//! Copyright (c) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!

use crate::{
    error::SmbiosError,
    smbios_record::{self as rec, SMBIOS_HANDLE_RESERVED_BEGIN, SmbiosHandle, SmbiosType},
};

pub const SMBIOS_HANDLE_BIOS_INFORMATION: SmbiosHandle = 1;
pub const SMBIOS_HANDLE_SYSTEM_INFORMATION: SmbiosHandle = 2;
pub const SMBIOS_HANDLE_BASEBOARD_INFORMATION: SmbiosHandle = 3;
pub const SMBIOS_HANDLE_SYSTEM_ENCLOSURE: SmbiosHandle = 4;
pub const SMBIOS_HANDLE_PROCESSOR_INFORMATION: SmbiosHandle = 5;
pub const SMBIOS_HANDLE_MEMORY_CONTROLLER_INFORMATION: SmbiosHandle = 6;
pub const SMBIOS_HANDLE_MEMORY_MODULE_INFORMATION: SmbiosHandle = 7;
pub const SMBIOS_HANDLE_L1_CACHE: SmbiosHandle = 8;
pub const SMBIOS_HANDLE_L2_CACHE: SmbiosHandle = 9;
pub const SMBIOS_HANDLE_L3_CACHE: SmbiosHandle = 10;
pub const SMBIOS_HANDLE_ONBOARD_DEVICE_INFORMATION: SmbiosHandle = 11;
pub const SMBIOS_HANDLE_OEM_STRINGS: SmbiosHandle = 12;
pub const SMBIOS_HANDLE_SYSTEM_CONFIGURATION_OPTIONS: SmbiosHandle = 13;
pub const SMBIOS_HANDLE_BIOS_LANGUAGE_INFORMATION: SmbiosHandle = 14;
pub const SMBIOS_HANDLE_GROUP_ASSOCIATIONS: SmbiosHandle = 15;
pub const SMBIOS_HANDLE_SYSTEM_EVENT_LOG: SmbiosHandle = 16;
pub const SMBIOS_HANDLE_PHYSICAL_MEMORY_ARRAY: SmbiosHandle = 17;
pub const SMBIOS_HANDLE_32BIT_MEMORY_ERROR_INFORMATION: SmbiosHandle = 18;
pub const SMBIOS_HANDLE_BUILT_IN_POINTING_DEVICE: SmbiosHandle = 19;
pub const SMBIOS_HANDLE_PORTABLE_BATTERY: SmbiosHandle = 20;
pub const SMBIOS_HANDLE_SYSTEM_RESET: SmbiosHandle = 21;
pub const SMBIOS_HANDLE_HARDWARE_SECURITY: SmbiosHandle = 22;
pub const SMBIOS_HANDLE_SYSTEM_POWER_CONTROLS: SmbiosHandle = 23;
pub const SMBIOS_HANDLE_VOLTAGE_PROBE: SmbiosHandle = 24;
pub const SMBIOS_HANDLE_COOLING_DEVICE: SmbiosHandle = 25;
pub const SMBIOS_HANDLE_TEMPERATURE_PROBE: SmbiosHandle = 26;
pub const SMBIOS_HANDLE_ELECTRICAL_CURRENT_PROBE: SmbiosHandle = 27;
pub const SMBIOS_HANDLE_OUT_OF_BAND_REMOTE_ACCESS: SmbiosHandle = 28;
pub const SMBIOS_HANDLE_BOOT_INTEGRITY_SERVICE: SmbiosHandle = 29;
pub const SMBIOS_HANDLE_SYSTEM_BOOT_INFORMATION: SmbiosHandle = 30;
pub const SMBIOS_HANDLE_64BIT_MEMORY_ERROR_INFORMATION: SmbiosHandle = 31;
pub const SMBIOS_HANDLE_MANAGEMENT_DEVICE: SmbiosHandle = 32;
pub const SMBIOS_HANDLE_MANAGEMENT_DEVICE_COMPONENT: SmbiosHandle = 33;
pub const SMBIOS_HANDLE_MANAGEMENT_DEVICE_THRESHOLD_DATA: SmbiosHandle = 34;
pub const SMBIOS_HANDLE_MEMORY_CHANNEL: SmbiosHandle = 35;
pub const SMBIOS_HANDLE_IPMI_DEVICE_INFORMATION: SmbiosHandle = 36;
pub const SMBIOS_HANDLE_SYSTEM_POWER_SUPPLY: SmbiosHandle = 37;
pub const SMBIOS_HANDLE_ADDITIONAL_INFORMATION: SmbiosHandle = 38;
pub const SMBIOS_HANDLE_ONBOARD_DEVICES_EXTENDED_INFORMATION: SmbiosHandle = 39;
pub const SMBIOS_HANDLE_MANAGEMENT_CONTROLLER_HOST_INTERFACE: SmbiosHandle = 40;
pub const SMBIOS_HANDLE_TPM_DEVICE: SmbiosHandle = 41;
pub const SMBIOS_HANDLE_INACTIVE: SmbiosHandle = 42;
pub const SMBIOS_HANDLE_END_OF_TABLE: SmbiosHandle = 43;
pub const APPLE_SMBIOS_HANDLE_FIRMWARE_INFORMATION: SmbiosHandle = 44;
pub const APPLE_SMBIOS_HANDLE_MEMORY_SPD_DATA: SmbiosHandle = 45;
pub const APPLE_SMBIOS_HANDLE_PROCESSOR_TYPE: SmbiosHandle = 46;
pub const APPLE_SMBIOS_HANDLE_PROCESSOR_BUS_SPEED: SmbiosHandle = 47;
pub const APPLE_SMBIOS_HANDLE_PLATFORM_FEATURE: SmbiosHandle = 48;
pub const APPLE_SMBIOS_HANDLE_SMC_INFORMATION: SmbiosHandle = 49;

/// Highest handle with a fixed meaning; automatic handles must start above it.
pub const LAST_RESERVED_HANDLE: SmbiosHandle = APPLE_SMBIOS_HANDLE_SMC_INFORMATION;

/// Reserved handles of cache levels 1, 2 and 3, indexed by `slot - 1`.
pub const SMBIOS_CACHE_HANDLES: [SmbiosHandle; 3] =
    [SMBIOS_HANDLE_L1_CACHE, SMBIOS_HANDLE_L2_CACHE, SMBIOS_HANDLE_L3_CACHE];

/// How a record type receives its handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlePolicy {
    /// Singleton type with one fixed handle; the slot must be 1
    Reserved(SmbiosHandle),
    /// Repeatable type with one fixed handle per 1-based slot
    Slotted(&'static [SmbiosHandle]),
    /// Repeatable type numbered from the table's automatic counter
    Automatic,
}

/// Handle policy of every record type this table knows how to number
pub static HANDLE_POLICIES: &[(SmbiosType, HandlePolicy)] = &[
    (rec::SMBIOS_TYPE_BIOS_INFORMATION, HandlePolicy::Reserved(SMBIOS_HANDLE_BIOS_INFORMATION)),
    (rec::SMBIOS_TYPE_SYSTEM_INFORMATION, HandlePolicy::Reserved(SMBIOS_HANDLE_SYSTEM_INFORMATION)),
    (rec::SMBIOS_TYPE_BASEBOARD_INFORMATION, HandlePolicy::Reserved(SMBIOS_HANDLE_BASEBOARD_INFORMATION)),
    (rec::SMBIOS_TYPE_SYSTEM_ENCLOSURE, HandlePolicy::Reserved(SMBIOS_HANDLE_SYSTEM_ENCLOSURE)),
    (rec::SMBIOS_TYPE_PROCESSOR_INFORMATION, HandlePolicy::Reserved(SMBIOS_HANDLE_PROCESSOR_INFORMATION)),
    (
        rec::SMBIOS_TYPE_MEMORY_CONTROLLER_INFORMATION,
        HandlePolicy::Reserved(SMBIOS_HANDLE_MEMORY_CONTROLLER_INFORMATION),
    ),
    (rec::SMBIOS_TYPE_MEMORY_MODULE_INFORMATION, HandlePolicy::Reserved(SMBIOS_HANDLE_MEMORY_MODULE_INFORMATION)),
    (rec::SMBIOS_TYPE_CACHE_INFORMATION, HandlePolicy::Slotted(&SMBIOS_CACHE_HANDLES)),
    (rec::SMBIOS_TYPE_PORT_CONNECTOR_INFORMATION, HandlePolicy::Automatic),
    (rec::SMBIOS_TYPE_SYSTEM_SLOTS, HandlePolicy::Automatic),
    (rec::SMBIOS_TYPE_ONBOARD_DEVICE_INFORMATION, HandlePolicy::Reserved(SMBIOS_HANDLE_ONBOARD_DEVICE_INFORMATION)),
    (rec::SMBIOS_TYPE_OEM_STRINGS, HandlePolicy::Reserved(SMBIOS_HANDLE_OEM_STRINGS)),
    (
        rec::SMBIOS_TYPE_SYSTEM_CONFIGURATION_OPTIONS,
        HandlePolicy::Reserved(SMBIOS_HANDLE_SYSTEM_CONFIGURATION_OPTIONS),
    ),
    (rec::SMBIOS_TYPE_BIOS_LANGUAGE_INFORMATION, HandlePolicy::Reserved(SMBIOS_HANDLE_BIOS_LANGUAGE_INFORMATION)),
    (rec::SMBIOS_TYPE_GROUP_ASSOCIATIONS, HandlePolicy::Reserved(SMBIOS_HANDLE_GROUP_ASSOCIATIONS)),
    (rec::SMBIOS_TYPE_SYSTEM_EVENT_LOG, HandlePolicy::Reserved(SMBIOS_HANDLE_SYSTEM_EVENT_LOG)),
    (rec::SMBIOS_TYPE_PHYSICAL_MEMORY_ARRAY, HandlePolicy::Reserved(SMBIOS_HANDLE_PHYSICAL_MEMORY_ARRAY)),
    (rec::SMBIOS_TYPE_MEMORY_DEVICE, HandlePolicy::Automatic),
    (
        rec::SMBIOS_TYPE_32BIT_MEMORY_ERROR_INFORMATION,
        HandlePolicy::Reserved(SMBIOS_HANDLE_32BIT_MEMORY_ERROR_INFORMATION),
    ),
    (rec::SMBIOS_TYPE_MEMORY_ARRAY_MAPPED_ADDRESS, HandlePolicy::Automatic),
    (rec::SMBIOS_TYPE_MEMORY_DEVICE_MAPPED_ADDRESS, HandlePolicy::Automatic),
    (rec::SMBIOS_TYPE_BUILT_IN_POINTING_DEVICE, HandlePolicy::Reserved(SMBIOS_HANDLE_BUILT_IN_POINTING_DEVICE)),
    (rec::SMBIOS_TYPE_PORTABLE_BATTERY, HandlePolicy::Reserved(SMBIOS_HANDLE_PORTABLE_BATTERY)),
    (rec::SMBIOS_TYPE_SYSTEM_RESET, HandlePolicy::Reserved(SMBIOS_HANDLE_SYSTEM_RESET)),
    (rec::SMBIOS_TYPE_HARDWARE_SECURITY, HandlePolicy::Reserved(SMBIOS_HANDLE_HARDWARE_SECURITY)),
    (rec::SMBIOS_TYPE_SYSTEM_POWER_CONTROLS, HandlePolicy::Reserved(SMBIOS_HANDLE_SYSTEM_POWER_CONTROLS)),
    (rec::SMBIOS_TYPE_VOLTAGE_PROBE, HandlePolicy::Reserved(SMBIOS_HANDLE_VOLTAGE_PROBE)),
    (rec::SMBIOS_TYPE_COOLING_DEVICE, HandlePolicy::Reserved(SMBIOS_HANDLE_COOLING_DEVICE)),
    (rec::SMBIOS_TYPE_TEMPERATURE_PROBE, HandlePolicy::Reserved(SMBIOS_HANDLE_TEMPERATURE_PROBE)),
    (rec::SMBIOS_TYPE_ELECTRICAL_CURRENT_PROBE, HandlePolicy::Reserved(SMBIOS_HANDLE_ELECTRICAL_CURRENT_PROBE)),
    (rec::SMBIOS_TYPE_OUT_OF_BAND_REMOTE_ACCESS, HandlePolicy::Reserved(SMBIOS_HANDLE_OUT_OF_BAND_REMOTE_ACCESS)),
    (rec::SMBIOS_TYPE_BOOT_INTEGRITY_SERVICE, HandlePolicy::Reserved(SMBIOS_HANDLE_BOOT_INTEGRITY_SERVICE)),
    (rec::SMBIOS_TYPE_SYSTEM_BOOT_INFORMATION, HandlePolicy::Reserved(SMBIOS_HANDLE_SYSTEM_BOOT_INFORMATION)),
    (
        rec::SMBIOS_TYPE_64BIT_MEMORY_ERROR_INFORMATION,
        HandlePolicy::Reserved(SMBIOS_HANDLE_64BIT_MEMORY_ERROR_INFORMATION),
    ),
    (rec::SMBIOS_TYPE_MANAGEMENT_DEVICE, HandlePolicy::Reserved(SMBIOS_HANDLE_MANAGEMENT_DEVICE)),
    (
        rec::SMBIOS_TYPE_MANAGEMENT_DEVICE_COMPONENT,
        HandlePolicy::Reserved(SMBIOS_HANDLE_MANAGEMENT_DEVICE_COMPONENT),
    ),
    (
        rec::SMBIOS_TYPE_MANAGEMENT_DEVICE_THRESHOLD_DATA,
        HandlePolicy::Reserved(SMBIOS_HANDLE_MANAGEMENT_DEVICE_THRESHOLD_DATA),
    ),
    (rec::SMBIOS_TYPE_MEMORY_CHANNEL, HandlePolicy::Reserved(SMBIOS_HANDLE_MEMORY_CHANNEL)),
    (rec::SMBIOS_TYPE_IPMI_DEVICE_INFORMATION, HandlePolicy::Reserved(SMBIOS_HANDLE_IPMI_DEVICE_INFORMATION)),
    (rec::SMBIOS_TYPE_SYSTEM_POWER_SUPPLY, HandlePolicy::Reserved(SMBIOS_HANDLE_SYSTEM_POWER_SUPPLY)),
    (rec::SMBIOS_TYPE_ADDITIONAL_INFORMATION, HandlePolicy::Reserved(SMBIOS_HANDLE_ADDITIONAL_INFORMATION)),
    (
        rec::SMBIOS_TYPE_ONBOARD_DEVICES_EXTENDED_INFORMATION,
        HandlePolicy::Reserved(SMBIOS_HANDLE_ONBOARD_DEVICES_EXTENDED_INFORMATION),
    ),
    (
        rec::SMBIOS_TYPE_MANAGEMENT_CONTROLLER_HOST_INTERFACE,
        HandlePolicy::Reserved(SMBIOS_HANDLE_MANAGEMENT_CONTROLLER_HOST_INTERFACE),
    ),
    (rec::SMBIOS_TYPE_TPM_DEVICE, HandlePolicy::Reserved(SMBIOS_HANDLE_TPM_DEVICE)),
    (rec::SMBIOS_TYPE_INACTIVE, HandlePolicy::Reserved(SMBIOS_HANDLE_INACTIVE)),
    (rec::SMBIOS_TYPE_END_OF_TABLE, HandlePolicy::Reserved(SMBIOS_HANDLE_END_OF_TABLE)),
    (rec::APPLE_SMBIOS_TYPE_FIRMWARE_INFORMATION, HandlePolicy::Reserved(APPLE_SMBIOS_HANDLE_FIRMWARE_INFORMATION)),
    (rec::APPLE_SMBIOS_TYPE_MEMORY_SPD_DATA, HandlePolicy::Reserved(APPLE_SMBIOS_HANDLE_MEMORY_SPD_DATA)),
    (rec::APPLE_SMBIOS_TYPE_PROCESSOR_TYPE, HandlePolicy::Reserved(APPLE_SMBIOS_HANDLE_PROCESSOR_TYPE)),
    (rec::APPLE_SMBIOS_TYPE_PROCESSOR_BUS_SPEED, HandlePolicy::Reserved(APPLE_SMBIOS_HANDLE_PROCESSOR_BUS_SPEED)),
    (rec::APPLE_SMBIOS_TYPE_PLATFORM_FEATURE, HandlePolicy::Reserved(APPLE_SMBIOS_HANDLE_PLATFORM_FEATURE)),
    (rec::APPLE_SMBIOS_TYPE_SMC_INFORMATION, HandlePolicy::Reserved(APPLE_SMBIOS_HANDLE_SMC_INFORMATION)),
];

/// Look up the handle policy of a record type
///
/// Returns `None` for types with no entry in [`HANDLE_POLICIES`].
pub fn handle_policy(record_type: SmbiosType) -> Option<HandlePolicy> {
    HANDLE_POLICIES.iter().find(|(ty, _)| *ty == record_type).map(|(_, policy)| *policy)
}

/// Per-table handle assignment state
///
/// Each table owns one of these, so automatic numbering and the set of finalized
/// reserved handles restart with every session.
#[derive(Debug, Clone)]
pub struct HandleAssigner {
    next_automatic: SmbiosHandle,
    /// Bit `n` set once a record with reserved handle `n` was finalized
    finalized_reserved: u64,
}

impl HandleAssigner {
    /// Creates an assigner whose automatic counter starts at `first_automatic`
    pub fn new(first_automatic: SmbiosHandle) -> Self {
        Self { next_automatic: first_automatic, finalized_reserved: 0 }
    }

    /// Record that a record carrying `handle` is now part of the table
    ///
    /// Only reserved handles are tracked; automatic handles are unique by construction.
    pub fn mark_finalized(&mut self, handle: SmbiosHandle) {
        if handle <= LAST_RESERVED_HANDLE {
            self.finalized_reserved |= 1u64 << handle;
        }
    }

    /// Whether a finalized record already carries reserved `handle`
    pub fn is_finalized(&self, handle: SmbiosHandle) -> bool {
        handle <= LAST_RESERVED_HANDLE && self.finalized_reserved & (1u64 << handle) != 0
    }

    /// The handle the next automatic assignment will return
    pub fn next_automatic(&self) -> SmbiosHandle {
        self.next_automatic
    }

    /// Pick the handle for a record of `record_type` in 1-based `slot`
    ///
    /// The automatic counter only advances when an automatic handle is returned, so a
    /// failed call leaves the assigner unchanged.
    ///
    /// # Errors
    ///
    /// Returns `SmbiosError::InvalidSlotIndex` if `slot` does not fit the type's policy.
    /// Returns `SmbiosError::HandleInUse` if a finalized record already carries the
    /// reserved handle.
    /// Returns `SmbiosError::HandleExhausted` if automatic handles reached 0xFF00.
    pub fn assign(&mut self, record_type: SmbiosType, slot: u16) -> Result<SmbiosHandle, SmbiosError> {
        let policy = handle_policy(record_type).unwrap_or_else(|| {
            log::error!("SMBIOS type {} has no handle policy, numbering it automatically", record_type);
            HandlePolicy::Automatic
        });

        let handle = match policy {
            HandlePolicy::Reserved(handle) => {
                if slot != 1 {
                    log::error!("SMBIOS type {} is a singleton but slot {} was requested", record_type, slot);
                    return Err(SmbiosError::InvalidSlotIndex);
                }
                handle
            }
            HandlePolicy::Slotted(handles) => {
                usize::from(slot).checked_sub(1).and_then(|index| handles.get(index)).copied().ok_or_else(|| {
                    log::error!("SMBIOS type {} has no reserved handle for slot {}", record_type, slot);
                    SmbiosError::InvalidSlotIndex
                })?
            }
            HandlePolicy::Automatic => return self.next(),
        };

        if self.is_finalized(handle) {
            log::error!("SMBIOS type {} slot {} reuses handle {:#06x}", record_type, slot, handle);
            return Err(SmbiosError::HandleInUse);
        }

        Ok(handle)
    }

    fn next(&mut self) -> Result<SmbiosHandle, SmbiosError> {
        let handle = self.next_automatic;
        if handle >= SMBIOS_HANDLE_RESERVED_BEGIN {
            return Err(SmbiosError::HandleExhausted);
        }
        self.next_automatic = handle + 1;
        Ok(handle)
    }
}
