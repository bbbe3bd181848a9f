//! Error types for SMBIOS table construction
//!
//! This module defines the error type returned by table buffer growth, handle assignment
//! and the record lifecycle.
//!
//! ## License
//!
//! Copyright (c) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!

use r_efi::efi;

/// SMBIOS table construction errors
///
/// Truncation of oversized strings is not an error and never surfaces here; it is only
/// reported through the log.
#[derive(Debug, Clone, PartialEq)]
pub enum SmbiosError {
    // Resource errors
    /// The allocator could not provide a larger table region
    AllocationFailed,
    /// The requested growth would exceed the maximum table length
    TableTooLarge,
    /// Automatic handles reached the SMBIOS reserved range (0xFF00)
    HandleExhausted,

    // Parameter errors
    /// Slot index does not fit the handle policy of the record type
    InvalidSlotIndex,
    /// A finalized record already carries the reserved handle of this type and slot
    HandleInUse,
    /// Fixed length is smaller than the 4-byte record header
    RecordTooSmall,
    /// A record is already open; it must be ended or abandoned first
    RecordInProgress,
    /// The operation needs an open record
    NoRecordInProgress,
    /// Field write falls outside the fixed fields of the open record
    FieldOutOfRange,
    /// Table configuration values are out of range
    InvalidConfiguration,
}

impl SmbiosError {
    /// Returns true for errors caused by exhausted space, memory or handles.
    pub fn is_out_of_resources(&self) -> bool {
        matches!(self, SmbiosError::AllocationFailed | SmbiosError::TableTooLarge | SmbiosError::HandleExhausted)
    }
}

impl From<SmbiosError> for efi::Status {
    fn from(error: SmbiosError) -> Self {
        match error {
            SmbiosError::AllocationFailed | SmbiosError::TableTooLarge | SmbiosError::HandleExhausted => {
                efi::Status::OUT_OF_RESOURCES
            }

            SmbiosError::InvalidSlotIndex
            | SmbiosError::HandleInUse
            | SmbiosError::RecordTooSmall
            | SmbiosError::RecordInProgress
            | SmbiosError::NoRecordInProgress
            | SmbiosError::FieldOutOfRange
            | SmbiosError::InvalidConfiguration => efi::Status::INVALID_PARAMETER,
        }
    }
}
