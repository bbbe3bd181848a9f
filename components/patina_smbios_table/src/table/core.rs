//! Core SMBIOS table implementation
//!
//! This module provides the table that owns the construction buffer and drives the
//! record lifecycle: begin a record, write its fields and strings, end it.
//!
//! ## License
//!
//! Copyright (c) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!

extern crate alloc;

use alloc::vec::Vec;
use zerocopy::IntoBytes;

use crate::{
    config::SmbiosTableConfig,
    entry_point::Smbios30EntryPoint,
    error::SmbiosError,
    smbios_record::{SMBIOS_HEADER_SIZE, SMBIOS_TYPE_END_OF_TABLE, SmbiosHandle, SmbiosTableHeader, SmbiosType},
    walker::TableDescriptor,
};

use super::{
    buffer::{PoolAllocator, TableAllocator},
    builder::RecordBuilder,
    handle::HandleAssigner,
};

/// The record between `begin_record` and `end_record`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct OpenRecord {
    pub(super) record_type: SmbiosType,
    pub(super) fixed_length: u8,
    pub(super) handle: SmbiosHandle,
}

/// SMBIOS structure table under construction
///
/// Records are appended one at a time into a single growable buffer. Two offsets track
/// progress: the record cursor marks the header of the record being built (and so the
/// end of all finalized records), and the string cursor marks the next free byte of
/// that record's string pool.
///
/// Every session starts from a fresh table; handle numbering and statistics are never
/// shared between tables.
pub struct SmbiosTable<A: TableAllocator = PoolAllocator> {
    pub(super) buffer: Vec<u8>,
    pub(super) record_cursor: usize,
    pub(super) string_cursor: usize,
    pub(super) string_index: u8,
    pub(super) open_record: Option<OpenRecord>,
    pub(super) record_count: usize,
    pub(super) max_record_size: usize,
    pub(super) last_record_type: Option<SmbiosType>,
    pub(super) handles: HandleAssigner,
    pub(super) config: SmbiosTableConfig,
    pub(super) allocator: A,
}

impl SmbiosTable<PoolAllocator> {
    /// Creates an empty table with the default configuration
    pub fn new() -> Self {
        Self::with_config(SmbiosTableConfig::default())
    }

    /// Creates an empty table with the given configuration
    pub fn with_config(config: SmbiosTableConfig) -> Self {
        Self::with_allocator(config, PoolAllocator)
    }
}

impl Default for SmbiosTable<PoolAllocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: TableAllocator> SmbiosTable<A> {
    /// Creates an empty table that grows through `allocator`
    pub fn with_allocator(config: SmbiosTableConfig, allocator: A) -> Self {
        Self {
            buffer: Vec::new(),
            record_cursor: 0,
            string_cursor: 0,
            string_index: 0,
            open_record: None,
            record_count: 0,
            max_record_size: 0,
            last_record_type: None,
            handles: HandleAssigner::new(config.first_automatic_handle()),
            config,
            allocator,
        }
    }

    /// Start a new record
    ///
    /// Reserves room for the header and fixed fields, assigns the handle and writes the
    /// header. The fixed fields start zeroed. Strings may then be added with
    /// [`override_string`](Self::override_string) until [`end_record`](Self::end_record).
    ///
    /// # Arguments
    ///
    /// * `record_type` - SMBIOS type of the record
    /// * `fixed_length` - header plus fixed fields, excluding strings and terminator
    /// * `slot` - 1-based instance number, used by the handle policy of the type
    ///
    /// # Errors
    ///
    /// Returns `SmbiosError::RecordInProgress` if another record is still open.
    /// Returns `SmbiosError::RecordTooSmall` if `fixed_length` cannot hold a header.
    /// Returns `SmbiosError::TableTooLarge` or `SmbiosError::AllocationFailed` if the
    /// table cannot grow, and `SmbiosError::InvalidSlotIndex`, `SmbiosError::HandleInUse`
    /// or `SmbiosError::HandleExhausted` if no handle can be assigned. On failure no
    /// cursor moves and no finalized byte changes.
    pub fn begin_record(
        &mut self,
        record_type: SmbiosType,
        fixed_length: u8,
        slot: u16,
    ) -> Result<SmbiosHandle, SmbiosError> {
        if let Some(open) = self.open_record {
            log::warn!("SMBIOS type {} started while type {} is still open", record_type, open.record_type);
            return Err(SmbiosError::RecordInProgress);
        }

        if usize::from(fixed_length) < SMBIOS_HEADER_SIZE {
            return Err(SmbiosError::RecordTooSmall);
        }

        self.ensure_capacity(usize::from(fixed_length)).inspect_err(|e| {
            log::warn!("Failed to extend SMBIOS for table {} - {:?}", record_type, e);
        })?;

        let handle = self.handles.assign(record_type, slot)?;

        let start = self.record_cursor;
        let fixed_end = start + usize::from(fixed_length);
        let record = &mut self.buffer[start..fixed_end];
        record.fill(0);
        record[..SMBIOS_HEADER_SIZE].copy_from_slice(SmbiosTableHeader::new(record_type, fixed_length, handle).as_bytes());

        self.string_cursor = fixed_end;
        self.string_index = 0;
        self.open_record = Some(OpenRecord { record_type, fixed_length, handle });

        Ok(handle)
    }

    /// Fixed fields of the open record, after the 4-byte header
    ///
    /// Returns `None` when no record is open.
    pub fn fields_mut(&mut self) -> Option<&mut [u8]> {
        let open = self.open_record?;
        let start = self.record_cursor + SMBIOS_HEADER_SIZE;
        let end = self.record_cursor + usize::from(open.fixed_length);
        Some(&mut self.buffer[start..end])
    }

    /// Finalize the open record
    ///
    /// Terminates the string pool, then moves both cursors past the record. A record
    /// with strings already carries the terminator of its last string, so one more zero
    /// byte closes the pool; a record without strings needs two.
    pub fn end_record(&mut self) {
        let Some(open) = self.open_record.take() else {
            log::warn!("SMBIOS end_record called without an open record");
            return;
        };

        let start = self.record_cursor;
        let fixed_end = start + usize::from(open.fixed_length);
        let terminator_size = if self.string_cursor != fixed_end { 1 } else { 2 };

        // begin_record and every string write reserved these bytes.
        let end = self.string_cursor + terminator_size;
        self.buffer[self.string_cursor..end].fill(0);

        let total_length = end - start;
        if total_length > self.max_record_size {
            self.max_record_size = total_length;
        }

        self.record_cursor = end;
        self.string_cursor = end;
        self.string_index = 0;
        self.record_count += 1;
        self.last_record_type = Some(open.record_type);
        self.handles.mark_finalized(open.handle);

        log::trace!("SMBIOS type {} handle {:#06x} finalized, {} bytes", open.record_type, open.handle, total_length);
    }

    /// Drop the open record without finalizing it
    ///
    /// The string cursor returns to the record cursor, so the partial record is never
    /// part of the table. A reserved handle stays available; a handle drawn from the
    /// automatic counter is not reused.
    pub fn abandon_record(&mut self) {
        if let Some(open) = self.open_record.take() {
            log::debug!("SMBIOS type {} handle {:#06x} abandoned", open.record_type, open.handle);
            self.string_cursor = self.record_cursor;
            self.string_index = 0;
        }
    }

    /// Start a record and return a guard for filling it
    ///
    /// The guard finalizes the record on [`RecordBuilder::end`] and abandons it when
    /// dropped without ending.
    ///
    /// # Errors
    ///
    /// Same as [`begin_record`](Self::begin_record).
    pub fn record(
        &mut self,
        record_type: SmbiosType,
        fixed_length: u8,
        slot: u16,
    ) -> Result<RecordBuilder<'_, A>, SmbiosError> {
        let handle = self.begin_record(record_type, fixed_length, slot)?;
        Ok(RecordBuilder::new(self, handle))
    }

    /// Terminate the table and hand over its bytes
    ///
    /// An open record is abandoned. The end-of-table record is appended unless the last
    /// finalized record already is one.
    ///
    /// # Errors
    ///
    /// Returns the `begin_record` error if the end-of-table record does not fit, or
    /// `SmbiosError::HandleInUse` if an end-of-table record was finalized earlier but is
    /// not the last record.
    pub fn finish(mut self) -> Result<FinishedTable, SmbiosError> {
        if self.open_record.is_some() {
            log::warn!("SMBIOS table finished with an open record, dropping it");
            self.abandon_record();
        }

        if self.last_record_type != Some(SMBIOS_TYPE_END_OF_TABLE) {
            self.begin_record(SMBIOS_TYPE_END_OF_TABLE, SMBIOS_HEADER_SIZE as u8, 1)?;
            self.end_record();
        }

        let mut data = core::mem::take(&mut self.buffer);
        data.truncate(self.record_cursor);

        log::info!(
            "SMBIOS table finished: {} records, {} bytes, largest record {} bytes",
            self.record_count,
            data.len(),
            self.max_record_size
        );

        Ok(FinishedTable { data, record_count: self.record_count, max_record_size: self.max_record_size })
    }

    /// Finalized records, in table order
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.record_cursor]
    }

    /// Capacity of the construction buffer
    pub fn allocated_size(&self) -> usize {
        self.buffer.len()
    }

    /// Offset of the header of the record being built
    pub fn record_cursor(&self) -> usize {
        self.record_cursor
    }

    /// Offset of the next free byte of the current string pool
    pub fn string_cursor(&self) -> usize {
        self.string_cursor
    }

    /// Number of finalized records
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Largest finalized record, including strings and terminator
    pub fn max_record_size(&self) -> usize {
        self.max_record_size
    }

    /// Handle the next automatically numbered record will receive
    pub fn next_automatic_handle(&self) -> SmbiosHandle {
        self.handles.next_automatic()
    }

    /// Handle of the open record, if any
    pub fn open_handle(&self) -> Option<SmbiosHandle> {
        self.open_record.map(|open| open.handle)
    }

    /// Configuration the table was created with
    pub fn config(&self) -> &SmbiosTableConfig {
        &self.config
    }
}

/// A terminated SMBIOS structure table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedTable {
    data: Vec<u8>,
    record_count: usize,
    max_record_size: usize,
}

impl FinishedTable {
    /// Table bytes, ending with the end-of-table record
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the table and return its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Table length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// A finished table holds at least the end-of-table record
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of records, including the end-of-table record
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Largest record, including strings and terminator
    pub fn max_record_size(&self) -> usize {
        self.max_record_size
    }

    /// Descriptor for walking this table by handle
    pub fn descriptor(&self) -> TableDescriptor<'_> {
        TableDescriptor::new(&self.data, self.data.len() as u32)
    }

    /// SMBIOS 3.0 entry point for this table once it lives at `table_address`
    pub fn entry_point(&self, major_version: u8, minor_version: u8, table_address: u64) -> Smbios30EntryPoint {
        Smbios30EntryPoint::new(major_version, minor_version, table_address, self.data.len() as u32)
    }
}
