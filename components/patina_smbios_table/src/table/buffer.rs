//! Table buffer growth
//!
//! The construction buffer grows in whole allocation units through a [`TableAllocator`],
//! and never past the configured table limit. Offsets into the buffer stay valid across
//! growth, so the cursors need no fixing up.
//!
//! ## License
//!
//! Copyright (c) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!

extern crate alloc;

use alloc::vec::Vec;

#[cfg(any(test, feature = "mockall"))]
use mockall::automock;

use crate::{error::SmbiosError, smbios_record::SMBIOS_STRUCTURE_TERMINATOR_SIZE};

use super::core::SmbiosTable;

/// Source of table memory
///
/// `reallocate` returns a new region of exactly `new_size` bytes whose prefix holds a copy
/// of `region`. The remainder must be zeroed.
#[cfg_attr(any(test, feature = "mockall"), automock)]
pub trait TableAllocator {
    /// Allocate a `new_size` byte region starting with a copy of `region`
    ///
    /// # Errors
    ///
    /// Returns `SmbiosError::AllocationFailed` if the memory cannot be provided.
    fn reallocate(&self, region: &[u8], new_size: usize) -> Result<Vec<u8>, SmbiosError>;
}

/// Allocator backed by the global heap
#[derive(Debug, Default, Clone, Copy)]
pub struct PoolAllocator;

impl TableAllocator for PoolAllocator {
    fn reallocate(&self, region: &[u8], new_size: usize) -> Result<Vec<u8>, SmbiosError> {
        if region.len() > new_size {
            return Err(SmbiosError::AllocationFailed);
        }

        let mut grown = Vec::new();
        grown.try_reserve_exact(new_size).map_err(|_| SmbiosError::AllocationFailed)?;
        grown.extend_from_slice(region);
        grown.resize(new_size, 0);
        Ok(grown)
    }
}

fn align_up(value: usize, granularity: usize) -> usize {
    value.checked_next_multiple_of(granularity).unwrap_or(value)
}

impl<A: TableAllocator> SmbiosTable<A> {
    /// Make room for `additional` more bytes after the string cursor
    ///
    /// Two further bytes are always reserved so the current record can be terminated.
    /// Nothing happens when the buffer is already large enough. Otherwise the buffer is
    /// reallocated to the required size rounded up to the allocation granularity, capped
    /// at the rounded table limit.
    ///
    /// # Errors
    ///
    /// Returns `SmbiosError::TableTooLarge` if the table limit would be exceeded and
    /// `SmbiosError::AllocationFailed` if the allocator fails. Either way the buffer and
    /// cursors are left as they were.
    pub fn ensure_capacity(&mut self, additional: usize) -> Result<(), SmbiosError> {
        let used = self.string_cursor;
        let required = used.saturating_add(additional).saturating_add(SMBIOS_STRUCTURE_TERMINATOR_SIZE);
        let max_table_length = self.config.max_table_length;

        if required > max_table_length {
            log::debug!("SMBIOS table would need {:#x} bytes, limit is {:#x}", required, max_table_length);
            return Err(SmbiosError::TableTooLarge);
        }

        if required <= self.buffer.len() {
            return Ok(());
        }

        let granularity = self.config.allocation_granularity;
        let new_size = align_up(required, granularity).min(align_up(max_table_length, granularity));

        let grown = self.allocator.reallocate(&self.buffer[..used], new_size).inspect_err(|e| {
            log::warn!("SMBIOS failed to grow table to {:#x} bytes - {:?}", new_size, e);
        })?;

        if grown.len() < required {
            log::warn!("SMBIOS allocator returned {:#x} bytes, {:#x} required", grown.len(), required);
            return Err(SmbiosError::AllocationFailed);
        }

        log::debug!("SMBIOS table grown from {:#x} to {:#x} bytes", self.buffer.len(), grown.len());
        self.buffer = grown;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    extern crate std;
    use std::vec;

    use crate::{
        config::SmbiosTableConfig,
        smbios_record::{SMBIOS_TYPE_BIOS_INFORMATION, SMBIOS_TYPE_SYSTEM_INFORMATION},
    };

    fn pool_grow(region: &[u8], new_size: usize) -> Result<Vec<u8>, SmbiosError> {
        PoolAllocator.reallocate(region, new_size)
    }

    #[test]
    fn test_pool_allocator_preserves_prefix() {
        let grown = PoolAllocator.reallocate(&[1, 2, 3], 8).expect("allocation failed");
        assert_eq!(grown, vec![1, 2, 3, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_pool_allocator_rejects_shrinking() {
        assert_eq!(PoolAllocator.reallocate(&[1, 2, 3], 2), Err(SmbiosError::AllocationFailed));
    }

    #[test]
    fn test_first_growth_rounds_to_page() {
        let mut table = SmbiosTable::new();
        table.ensure_capacity(10).expect("growth failed");
        assert_eq!(table.allocated_size(), 0x1000);
        assert!(table.buffer.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_ensure_capacity_is_idempotent() {
        let mut allocator = MockTableAllocator::new();
        allocator.expect_reallocate().times(1).returning(|region, new_size| {
            assert!(region.is_empty());
            assert_eq!(new_size, 0x1000);
            pool_grow(region, new_size)
        });

        let mut table = SmbiosTable::with_allocator(SmbiosTableConfig::default(), allocator);
        table.ensure_capacity(0x100).expect("growth failed");
        table.ensure_capacity(0x100).expect("second call should not allocate");
        table.ensure_capacity(0x1000 - 2).expect("exact fit should not allocate");
        assert_eq!(table.allocated_size(), 0x1000);
    }

    #[test]
    fn test_growth_preserves_data_and_offsets() {
        let mut table = SmbiosTable::new();
        table.begin_record(SMBIOS_TYPE_BIOS_INFORMATION, 0x12, 1).expect("begin failed");
        table.fields_mut().expect("record is open").copy_from_slice(&[0x5A; 0x0E]);
        table.end_record();
        table.begin_record(SMBIOS_TYPE_SYSTEM_INFORMATION, 8, 1).expect("begin failed");
        table.override_string(Some("Acme"), false);

        let record_cursor = table.record_cursor();
        let string_cursor = table.string_cursor();
        let snapshot = table.buffer[..string_cursor].to_vec();

        table.ensure_capacity(0x2000).expect("growth failed");

        assert_eq!(table.allocated_size(), 0x3000);
        assert_eq!(table.record_cursor(), record_cursor);
        assert_eq!(table.string_cursor(), string_cursor);
        assert_eq!(&table.buffer[..string_cursor], snapshot.as_slice());
    }

    #[test]
    fn test_growth_past_limit_is_rejected() {
        let config = SmbiosTableConfig::new(0x40, 0x10, 0x1000).expect("valid configuration");
        let mut allocator = MockTableAllocator::new();
        allocator.expect_reallocate().times(1).returning(pool_grow);

        let mut table = SmbiosTable::with_allocator(config, allocator);
        table.ensure_capacity(0x10).expect("growth failed");
        assert_eq!(table.allocated_size(), 0x20);

        // 0x3F plus the terminator reservation is one byte over
        assert_eq!(table.ensure_capacity(0x3F), Err(SmbiosError::TableTooLarge));
        assert_eq!(table.allocated_size(), 0x20);
        assert_eq!(table.string_cursor(), 0);
    }

    #[test]
    fn test_growth_to_limit_is_capped() {
        let config = SmbiosTableConfig::new(0x1234, 0x1000, 0x1000).expect("valid configuration");
        let mut table = SmbiosTable::with_config(config);
        table.ensure_capacity(0x1232).expect("growth to the limit should succeed");
        assert_eq!(table.allocated_size(), 0x2000);
        assert_eq!(table.ensure_capacity(0x1233), Err(SmbiosError::TableTooLarge));
    }

    #[test]
    fn test_allocation_failure_leaves_table_untouched() {
        let mut allocator = MockTableAllocator::new();
        let mut calls = 0;
        allocator.expect_reallocate().times(2).returning(move |region, new_size| {
            calls += 1;
            if calls == 1 { pool_grow(region, new_size) } else { Err(SmbiosError::AllocationFailed) }
        });

        let mut table = SmbiosTable::with_allocator(SmbiosTableConfig::default(), allocator);
        table.begin_record(SMBIOS_TYPE_BIOS_INFORMATION, 8, 1).expect("begin failed");
        table.end_record();
        let snapshot = table.as_bytes().to_vec();

        assert_eq!(table.ensure_capacity(0x1000), Err(SmbiosError::AllocationFailed));
        assert_eq!(table.allocated_size(), 0x1000);
        assert_eq!(table.as_bytes(), snapshot.as_slice());
        assert_eq!(table.begin_record(SMBIOS_TYPE_SYSTEM_INFORMATION, 0xFF, 1), Ok(2));
    }

    #[test]
    fn test_short_allocation_is_rejected() {
        let mut allocator = MockTableAllocator::new();
        allocator.expect_reallocate().returning(|region, _| Ok(region.to_vec()));

        let mut table = SmbiosTable::with_allocator(SmbiosTableConfig::default(), allocator);
        assert_eq!(table.ensure_capacity(4), Err(SmbiosError::AllocationFailed));
        assert_eq!(table.allocated_size(), 0);
    }
}
