//! SMBIOS table configuration
//!
//! Limits and numbering used by a table construction session.
//!
//! ## License
//!
//! Copyright (c) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!

use crate::{
    error::SmbiosError,
    smbios_record::{
        SMBIOS_HANDLE_RESERVED_BEGIN, SMBIOS_HEADER_SIZE, SMBIOS_STRUCTURE_TERMINATOR_SIZE, SMBIOS_TABLE_MAX_LENGTH,
        SmbiosHandle,
    },
    table::handle::LAST_RESERVED_HANDLE,
};

/// UEFI page size, used as the default allocation granularity.
pub const EFI_PAGE_SIZE: usize = 0x1000;

/// Default first handle handed out to repeatable record types.
pub const DEFAULT_FIRST_AUTOMATIC_HANDLE: SmbiosHandle = 0x1000;

/// Configuration for one SMBIOS table construction session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmbiosTableConfig {
    /// Hard limit on the number of bytes the table may use
    pub(crate) max_table_length: usize,
    /// Growth requests are rounded up to a multiple of this value
    pub(crate) allocation_granularity: usize,
    /// First handle drawn by the automatic handle counter
    pub(crate) first_automatic_handle: SmbiosHandle,
}

impl SmbiosTableConfig {
    /// Create a validated configuration
    ///
    /// # Arguments
    ///
    /// * `max_table_length` - hard cap on used bytes, including the terminator reservation
    /// * `allocation_granularity` - non-zero power of two
    /// * `first_automatic_handle` - above every reserved handle and below 0xFF00
    ///
    /// # Errors
    ///
    /// Returns `SmbiosError::InvalidConfiguration` if any value is out of range.
    pub fn new(
        max_table_length: usize,
        allocation_granularity: usize,
        first_automatic_handle: SmbiosHandle,
    ) -> Result<Self, SmbiosError> {
        // Smallest valid table is a lone end-of-table record.
        let min_table_length = SMBIOS_HEADER_SIZE + SMBIOS_STRUCTURE_TERMINATOR_SIZE;

        if max_table_length < min_table_length || max_table_length > u32::MAX as usize {
            log::error!("SMBIOS table length limit {:#x} is out of range", max_table_length);
            return Err(SmbiosError::InvalidConfiguration);
        }

        if !allocation_granularity.is_power_of_two() {
            log::error!("SMBIOS allocation granularity {:#x} is not a power of two", allocation_granularity);
            return Err(SmbiosError::InvalidConfiguration);
        }

        if first_automatic_handle <= LAST_RESERVED_HANDLE || first_automatic_handle >= SMBIOS_HANDLE_RESERVED_BEGIN {
            log::error!("SMBIOS first automatic handle {:#x} overlaps a reserved range", first_automatic_handle);
            return Err(SmbiosError::InvalidConfiguration);
        }

        Ok(Self { max_table_length, allocation_granularity, first_automatic_handle })
    }

    /// Hard limit on the number of bytes the table may use
    pub fn max_table_length(&self) -> usize {
        self.max_table_length
    }

    /// Growth requests are rounded up to a multiple of this value
    pub fn allocation_granularity(&self) -> usize {
        self.allocation_granularity
    }

    /// First handle drawn by the automatic handle counter
    pub fn first_automatic_handle(&self) -> SmbiosHandle {
        self.first_automatic_handle
    }
}

impl Default for SmbiosTableConfig {
    fn default() -> Self {
        Self {
            max_table_length: SMBIOS_TABLE_MAX_LENGTH,
            allocation_granularity: EFI_PAGE_SIZE,
            first_automatic_handle: DEFAULT_FIRST_AUTOMATIC_HANDLE,
        }
    }
}
