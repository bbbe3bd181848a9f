//! SMBIOS table walker
//!
//! Read-only queries over a serialized structure table: record length, lookup by type
//! and occurrence, lookup by handle, per-type counts and string lookup. Every read is
//! bounded by the byte slice handed in; running off the slice means "not found".
//!
//! Records are walked by their computed length, never by a per-type size, so vendor
//! record types the walker knows nothing about are stepped over correctly.
//!
//! ## License
//!
//! Copyright (c) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!

use zerocopy::FromBytes;

use crate::{
    entry_point::Smbios30EntryPoint,
    smbios_record::{SMBIOS_HEADER_SIZE, SMBIOS_TYPE_END_OF_TABLE, SmbiosHandle, SmbiosTableHeader, SmbiosType},
};

/// Location and size of a published structure table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDescriptor<'a> {
    data: &'a [u8],
    table_length: usize,
}

impl<'a> TableDescriptor<'a> {
    /// Describe `data` as a table of `table_length` bytes
    ///
    /// `table_length` is the length the entry point declares; the walk never reads past
    /// `data` even when the declared length is larger.
    pub fn new(data: &'a [u8], table_length: u32) -> Self {
        Self { data, table_length: table_length as usize }
    }

    /// A descriptor for a table that does not exist
    pub fn empty() -> Self {
        Self { data: &[], table_length: 0 }
    }

    /// Describe the table an entry point points at
    ///
    /// A zero table address yields an empty descriptor.
    ///
    /// # Safety
    ///
    /// `table_address` must point to `table_max_size` readable bytes that stay valid and
    /// unmodified for `'a`.
    pub unsafe fn from_entry_point(entry_point: &Smbios30EntryPoint) -> Self {
        let table_address = entry_point.table_address;
        let table_length = entry_point.table_max_size;
        if table_address == 0 {
            return Self::empty();
        }

        // SAFETY: the caller guarantees the entry point describes readable memory.
        let data = unsafe { core::slice::from_raw_parts(table_address as usize as *const u8, table_length as usize) };
        Self::new(data, table_length)
    }

    /// Bytes the walk may read
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Table length declared by the entry point
    pub fn table_length(&self) -> usize {
        self.table_length
    }
}

/// One record inside a serialized table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordView<'a> {
    raw: &'a [u8],
    offset: usize,
    total_length: usize,
}

impl<'a> RecordView<'a> {
    /// View the record starting at `offset`, or `None` if it does not fit in `table`
    pub fn at(table: &'a [u8], offset: usize) -> Option<Self> {
        let total_length = record_length(table, offset)?;
        Some(Self { raw: &table[offset..], offset, total_length })
    }

    /// Offset of the record from the start of the table
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// SMBIOS type from the header
    pub fn record_type(&self) -> SmbiosType {
        self.raw[0]
    }

    /// Length of header plus fixed fields, as stored in the header
    pub fn length(&self) -> u8 {
        self.raw[1]
    }

    /// Handle from the header
    pub fn handle(&self) -> SmbiosHandle {
        u16::from_le_bytes([self.raw[2], self.raw[3]])
    }

    /// Length including the string pool and terminator
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// Copy of the 4-byte record header
    pub fn header(&self) -> SmbiosTableHeader {
        SmbiosTableHeader::new(self.record_type(), self.length(), self.handle())
    }

    /// Every byte of the record, terminator included
    pub fn as_bytes(&self) -> &'a [u8] {
        let end = self.total_length.max(SMBIOS_HEADER_SIZE);
        &self.raw[..end]
    }

    /// Fixed fields after the header
    pub fn fields(&self) -> &'a [u8] {
        self.as_bytes().get(SMBIOS_HEADER_SIZE..usize::from(self.length())).unwrap_or(&[])
    }

    /// String `index` (1-based) of the record's pool, without its terminator
    pub fn string(&self, index: u8) -> Option<&'a [u8]> {
        string_at(self, index)
    }
}

/// Length of the record at `offset`, from its header through the closing double zero
///
/// The scan starts at the end of the fixed fields and stops at the first pair of zero
/// bytes. Returns `None` if the header or the terminator lies outside `table`.
pub fn record_length(table: &[u8], offset: usize) -> Option<usize> {
    let header = table.get(offset..)?;
    let (header, _) = SmbiosTableHeader::read_from_prefix(header).ok()?;
    let pool_start = offset.checked_add(usize::from(header.length))?;
    let pool = table.get(pool_start..)?;
    let terminator = pool.windows(2).position(|pair| pair == [0, 0])?;
    Some(pool_start + terminator + 2 - offset)
}

/// Bound check of the type walks
///
/// The bound is taken relative to the cursor that was just advanced, not to the start
/// of the table, so it only trips when `cursor + table_size` overflows. Scans are in
/// practice stopped by the end-of-table record or by the end of the slice.
fn walk_bound_exceeded(cursor: usize, table_size: u32) -> bool {
    cursor.checked_add(table_size as usize).is_none()
}

/// Find occurrence `index` (1-based) of records of `record_type`
///
/// The scan stops at the end-of-table record, which can itself be found by asking for
/// type 127. Returns `None` for an empty table, when the type runs out before `index`,
/// or when a record runs past the end of `table`.
pub fn find_by_type_and_index(
    table: &[u8],
    table_size: u32,
    record_type: SmbiosType,
    index: u16,
) -> Option<RecordView<'_>> {
    if table.is_empty() {
        return None;
    }

    let mut seen: u16 = 1;
    let mut cursor = 0;
    loop {
        let record = RecordView::at(table, cursor)?;
        if seen == index && record.record_type() == record_type {
            return Some(record);
        }
        if record.record_type() == SMBIOS_TYPE_END_OF_TABLE {
            return None;
        }
        if record.record_type() == record_type {
            seen = seen.wrapping_add(1);
        }

        cursor += record.total_length();
        if walk_bound_exceeded(cursor, table_size) {
            return None;
        }
    }
}

/// Find the record carrying `handle`
///
/// Scans from the start of the described table and stops at the end-of-table record or
/// once the cursor passes the declared table length.
pub fn find_by_handle<'a>(descriptor: &TableDescriptor<'a>, handle: SmbiosHandle) -> Option<RecordView<'a>> {
    let table = descriptor.data;
    if table.is_empty() {
        return None;
    }

    let mut cursor = 0;
    loop {
        let record = RecordView::at(table, cursor)?;
        if record.handle() == handle {
            return Some(record);
        }
        if record.record_type() == SMBIOS_TYPE_END_OF_TABLE {
            return None;
        }

        cursor += record.total_length();
        if cursor > descriptor.table_length {
            return None;
        }
    }
}

/// Count records of `record_type` before the end-of-table record
pub fn count_by_type(table: &[u8], table_size: u32, record_type: SmbiosType) -> u16 {
    let mut count: u16 = 0;
    if table.is_empty() {
        return count;
    }

    let mut cursor = 0;
    while let Some(record) = RecordView::at(table, cursor) {
        if record.record_type() == SMBIOS_TYPE_END_OF_TABLE {
            break;
        }
        if record.record_type() == record_type {
            count = count.wrapping_add(1);
        }

        cursor += record.total_length();
        if walk_bound_exceeded(cursor, table_size) {
            break;
        }
    }

    count
}

/// String `index` (1-based) of `record`, without its terminator
///
/// Index 0 means "no string" and yields `None`, as does an index past the last string.
pub fn string_at<'a>(record: &RecordView<'a>, index: u8) -> Option<&'a [u8]> {
    if index == 0 {
        return None;
    }

    let pool = record.as_bytes().get(usize::from(record.length())..)?;
    pool.split(|b| *b == 0).take_while(|s| !s.is_empty()).nth(usize::from(index) - 1)
}
