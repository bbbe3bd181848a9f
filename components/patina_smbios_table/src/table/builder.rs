//! Scoped record construction
//!
//! [`RecordBuilder`] wraps one open record. Field offsets are measured from the start
//! of the record, the way the SMBIOS specification lists them, so the 4-byte header can
//! never be overwritten through the builder.
//!
//! ```ignore
//! let mut record = table.record(SMBIOS_TYPE_SYSTEM_INFORMATION, 0x1B, 1)?;
//! record.set_string(0x04, Some("Acme"))?;
//! record.set_string(0x05, Some("Widget"))?;
//! record.set_u8(0x18, 0x06)?;
//! record.end();
//! ```
//!
//! ## License
//!
//! Copyright (c) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!

use crate::{
    error::SmbiosError,
    smbios_record::{SMBIOS_HEADER_SIZE, SmbiosHandle},
};

use super::{buffer::TableAllocator, core::SmbiosTable};

/// Guard over the open record of a table
///
/// Ending the guard finalizes the record. Dropping it without [`end`](Self::end)
/// abandons the record, leaving the table as it was before the record began.
pub struct RecordBuilder<'t, A: TableAllocator> {
    table: &'t mut SmbiosTable<A>,
    handle: SmbiosHandle,
    ended: bool,
}

impl<'t, A: TableAllocator> RecordBuilder<'t, A> {
    pub(super) fn new(table: &'t mut SmbiosTable<A>, handle: SmbiosHandle) -> Self {
        Self { table, handle, ended: false }
    }

    /// Handle assigned to this record
    pub fn handle(&self) -> SmbiosHandle {
        self.handle
    }

    /// Fixed fields after the header
    pub fn fields_mut(&mut self) -> &mut [u8] {
        self.table.fields_mut().unwrap_or_default()
    }

    /// Copy `bytes` into the fixed fields at record offset `offset`
    ///
    /// # Errors
    ///
    /// Returns `SmbiosError::FieldOutOfRange` if the write touches the header or runs
    /// past the fixed length.
    pub fn set_bytes(&mut self, offset: usize, bytes: &[u8]) -> Result<(), SmbiosError> {
        let fields = self.table.fields_mut().ok_or(SmbiosError::NoRecordInProgress)?;
        let start = offset.checked_sub(SMBIOS_HEADER_SIZE).ok_or(SmbiosError::FieldOutOfRange)?;
        let end = start.checked_add(bytes.len()).ok_or(SmbiosError::FieldOutOfRange)?;
        let target = fields.get_mut(start..end).ok_or_else(|| {
            log::warn!("SMBIOS field at {:#x} with {} bytes is outside the record", offset, bytes.len());
            SmbiosError::FieldOutOfRange
        })?;
        target.copy_from_slice(bytes);
        Ok(())
    }

    /// Write a byte field at `offset` from the record start
    pub fn set_u8(&mut self, offset: usize, value: u8) -> Result<(), SmbiosError> {
        self.set_bytes(offset, &[value])
    }

    /// Write a little-endian word field at `offset` from the record start
    pub fn set_u16(&mut self, offset: usize, value: u16) -> Result<(), SmbiosError> {
        self.set_bytes(offset, &value.to_le_bytes())
    }

    /// Write a little-endian dword field at `offset` from the record start
    pub fn set_u32(&mut self, offset: usize, value: u32) -> Result<(), SmbiosError> {
        self.set_bytes(offset, &value.to_le_bytes())
    }

    /// Write a little-endian qword field at `offset` from the record start
    pub fn set_u64(&mut self, offset: usize, value: u64) -> Result<(), SmbiosError> {
        self.set_bytes(offset, &value.to_le_bytes())
    }

    /// Append a plain string and return its index (0 if nothing was written)
    pub fn string(&mut self, text: &str) -> u8 {
        self.table.override_string(Some(text), false)
    }

    /// Append a hex-encoded string and return its index (0 if nothing was written)
    pub fn hex_string(&mut self, text: &str) -> u8 {
        self.table.override_string(Some(text), true)
    }

    /// See [`SmbiosTable::override_string`]
    pub fn override_string(&mut self, text: Option<&str>, hex: bool) -> u8 {
        self.table.override_string(text, hex)
    }

    /// Append a plain string and store its index in the byte field at `offset`
    ///
    /// The field is left at 0 when nothing was written.
    pub fn set_string(&mut self, offset: usize, text: Option<&str>) -> Result<u8, SmbiosError> {
        // Check the field first so a bad offset does not leave an unreferenced string.
        self.set_u8(offset, 0)?;
        let index = self.table.override_string(text, false);
        self.set_u8(offset, index)?;
        Ok(index)
    }

    /// Finalize the record and return its handle
    pub fn end(mut self) -> SmbiosHandle {
        self.table.end_record();
        self.ended = true;
        self.handle
    }
}

impl<A: TableAllocator> Drop for RecordBuilder<'_, A> {
    fn drop(&mut self) {
        if !self.ended {
            self.table.abandon_record();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    extern crate std;

    use crate::{
        smbios_record::{
            SMBIOS_TYPE_BIOS_INFORMATION, SMBIOS_TYPE_MEMORY_DEVICE, SMBIOS_TYPE_SYSTEM_INFORMATION,
        },
        table::handle::SMBIOS_HANDLE_SYSTEM_INFORMATION,
        walker,
    };

    #[test]
    fn test_builder_writes_fields_and_strings() {
        let mut table = SmbiosTable::new();
        let mut record = table.record(SMBIOS_TYPE_SYSTEM_INFORMATION, 0x0C, 1).expect("begin failed");
        assert_eq!(record.handle(), SMBIOS_HANDLE_SYSTEM_INFORMATION);
        assert_eq!(record.set_string(0x04, Some("Acme")), Ok(1));
        assert_eq!(record.set_string(0x05, Some("  ")), Ok(0));
        record.set_u16(0x06, 0xBEEF).expect("u16 field");
        record.set_u32(0x08, 0x1234_5678).expect("u32 field");
        assert_eq!(record.end(), SMBIOS_HANDLE_SYSTEM_INFORMATION);

        let bytes = table.as_bytes();
        assert_eq!(&bytes[..4], &[SMBIOS_TYPE_SYSTEM_INFORMATION, 0x0C, 2, 0]);
        assert_eq!(&bytes[4..0x0C], &[1, 0, 0xEF, 0xBE, 0x78, 0x56, 0x34, 0x12]);
        assert_eq!(&bytes[0x0C..], b"Acme\0\0");
        assert_eq!(table.record_count(), 1);
    }

    #[test]
    fn test_builder_rejects_fields_outside_record() {
        let mut table = SmbiosTable::new();
        let mut record = table.record(SMBIOS_TYPE_BIOS_INFORMATION, 0x0A, 1).expect("begin failed");
        assert_eq!(record.set_u8(0x03, 1), Err(SmbiosError::FieldOutOfRange));
        assert_eq!(record.set_u8(0x0A, 1), Err(SmbiosError::FieldOutOfRange));
        assert_eq!(record.set_u32(0x08, 1), Err(SmbiosError::FieldOutOfRange));
        assert_eq!(record.set_u64(usize::MAX, 1), Err(SmbiosError::FieldOutOfRange));
        assert_eq!(record.set_string(0x20, Some("lost")), Err(SmbiosError::FieldOutOfRange));
        record.set_u16(0x08, 0xFFFF).expect("last field fits");
        assert_eq!(record.fields_mut().len(), 6);
        record.end();

        // The rejected string never reached the pool.
        assert_eq!(walker::record_length(table.as_bytes(), 0), Some(0x0A + 2));
    }

    #[test]
    fn test_dropped_builder_abandons_record() {
        let mut table = SmbiosTable::new();
        {
            let mut record = table.record(SMBIOS_TYPE_MEMORY_DEVICE, 0x10, 1).expect("begin failed");
            record.string("DIMM0");
            record.hex_string("serial");
        }

        assert_eq!(table.record_count(), 0);
        assert_eq!(table.record_cursor(), 0);
        assert_eq!(table.string_cursor(), 0);
        assert!(table.as_bytes().is_empty());

        // The abandoned record used an automatic handle, the next one moves on.
        let record = table.record(SMBIOS_TYPE_MEMORY_DEVICE, 0x10, 1).expect("begin failed");
        assert_eq!(record.end(), 0x1001);
    }

    #[test]
    fn test_builder_override_string() {
        let mut table = SmbiosTable::new();
        let mut record = table.record(SMBIOS_TYPE_BIOS_INFORMATION, 0x08, 1).expect("begin failed");
        assert_eq!(record.override_string(None, false), 0);
        assert_eq!(record.override_string(Some("AB"), true), 1);
        record.fields_mut()[0] = 1;
        record.end();

        assert_eq!(&table.as_bytes()[0x08..], b"0x4142\0\0");
        assert_eq!(table.as_bytes()[4], 1);
    }

    #[test]
    fn test_record_refused_while_builder_open() {
        let mut table = SmbiosTable::new();
        table.begin_record(SMBIOS_TYPE_BIOS_INFORMATION, 8, 1).expect("begin failed");
        assert!(matches!(table.record(SMBIOS_TYPE_SYSTEM_INFORMATION, 8, 1), Err(SmbiosError::RecordInProgress)));
    }
}
