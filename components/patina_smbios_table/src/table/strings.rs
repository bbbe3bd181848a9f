//! String pool encoding
//!
//! ## License
//!
//! Copyright (c) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!

use crate::smbios_record::{SMBIOS_STRING_HEX_PREFIX_SIZE, SMBIOS_STRING_MAX_LENGTH};

use super::{buffer::TableAllocator, core::SmbiosTable};

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Longest input accepted for one string, in source bytes.
pub const fn max_string_length(hex: bool) -> usize {
    if hex { SMBIOS_STRING_MAX_LENGTH / 2 - SMBIOS_STRING_HEX_PREFIX_SIZE } else { SMBIOS_STRING_MAX_LENGTH }
}

/// Bytes one string of `length` source bytes occupies in the pool, terminator included.
pub const fn encoded_length(length: usize, hex: bool) -> usize {
    if hex { SMBIOS_STRING_HEX_PREFIX_SIZE + length * 2 + 1 } else { length + 1 }
}

/// Cut at the first NUL, truncate to the limit, strip trailing spaces.
fn prepare(text: &str, hex: bool) -> &[u8] {
    let mut bytes = text.as_bytes();
    if let Some(nul) = bytes.iter().position(|b| *b == 0) {
        bytes = &bytes[..nul];
    }

    let max_length = max_string_length(hex);
    if bytes.len() > max_length {
        bytes = &bytes[..max_length];
        log::info!("SMBIOS truncating '{}' to {} bytes for hex {}", text, max_length, hex);
    }

    while let [rest @ .., b' '] = bytes {
        bytes = rest;
    }

    bytes
}

fn encode_plain(target: &mut [u8], source: &[u8]) {
    target[..source.len()].copy_from_slice(source);
    target[source.len()] = 0;
}

fn encode_hex(target: &mut [u8], source: &[u8]) {
    target[0] = b'0';
    target[1] = b'x';
    for (pair, byte) in target[SMBIOS_STRING_HEX_PREFIX_SIZE..].chunks_exact_mut(2).zip(source) {
        pair[0] = HEX_DIGITS[usize::from(byte >> 4)];
        pair[1] = HEX_DIGITS[usize::from(byte & 0xF)];
    }
    target[SMBIOS_STRING_HEX_PREFIX_SIZE + source.len() * 2] = 0;
}

impl<A: TableAllocator> SmbiosTable<A> {
    /// Append a string to the open record's pool
    ///
    /// Returns the 1-based index the record's fields use to reference the string, or 0
    /// when nothing was written: no text, no open record, nothing left after trimming,
    /// the per-record index is exhausted, or the table could not grow. Oversized text
    /// is truncated, never rejected.
    ///
    /// With `hex` set, each source byte is written as two uppercase hex digits behind a
    /// `0x` prefix.
    pub fn override_string(&mut self, text: Option<&str>, hex: bool) -> u8 {
        let Some(text) = text else {
            return 0;
        };

        if self.open_record.is_none() {
            log::warn!("SMBIOS string '{}' written without an open record", text);
            return 0;
        }

        let source = prepare(text, hex);
        if source.is_empty() {
            return 0;
        }

        if self.string_index == u8::MAX {
            log::warn!("SMBIOS record has no string index left for '{}'", text);
            return 0;
        }

        let byte_length = encoded_length(source.len(), hex);
        if self.ensure_capacity(byte_length).is_err() {
            log::warn!("SMBIOS failed to write '{}' with {} byte extension", text, byte_length);
            return 0;
        }

        let start = self.string_cursor;
        let target = &mut self.buffer[start..start + byte_length];
        if hex {
            encode_hex(target, source);
        } else {
            encode_plain(target, source);
        }

        self.string_cursor += byte_length;
        self.string_index += 1;
        self.string_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    extern crate std;
    use std::{string::String, vec::Vec};

    use crate::{
        config::SmbiosTableConfig,
        error::SmbiosError,
        smbios_record::SMBIOS_TYPE_SYSTEM_INFORMATION,
        table::buffer::{MockTableAllocator, PoolAllocator},
    };

    fn open_table() -> SmbiosTable {
        let mut table = SmbiosTable::new();
        table.begin_record(SMBIOS_TYPE_SYSTEM_INFORMATION, 8, 1).expect("begin failed");
        table
    }

    fn pool(table: &SmbiosTable) -> &[u8] {
        &table.buffer[8..table.string_cursor()]
    }

    #[test]
    fn test_limits() {
        assert_eq!(max_string_length(false), 64);
        assert_eq!(max_string_length(true), 30);
        assert_eq!(encoded_length(4, false), 5);
        assert_eq!(encoded_length(4, true), 11);
    }

    #[test]
    fn test_none_writes_nothing() {
        let mut table = open_table();
        assert_eq!(table.override_string(None, false), 0);
        assert_eq!(table.override_string(None, true), 0);
        assert_eq!(table.string_cursor(), 8);
    }

    #[test]
    fn test_plain_strings_get_increasing_indices() {
        let mut table = open_table();
        assert_eq!(table.override_string(Some("Acme"), false), 1);
        assert_eq!(table.override_string(Some("Board"), false), 2);
        assert_eq!(pool(&table), b"Acme\0Board\0");
        assert_eq!(table.string_cursor(), 8 + 5 + 6);
    }

    #[test]
    fn test_hex_encoding() {
        let mut table = open_table();
        assert_eq!(table.override_string(Some("AB\x01\u{ff}"), true), 1);
        assert_eq!(pool(&table), b"0x414201C3BF\0");
        assert_eq!(table.string_cursor(), 8 + encoded_length(5, true));
    }

    #[test]
    fn test_hex_digits_are_uppercase_high_nibble_first() {
        let mut target = [0xAAu8; 7];
        encode_hex(&mut target, &[0x0F, 0xA5]);
        assert_eq!(&target, b"0x0FA5\0");
    }

    #[test]
    fn test_plain_truncation() {
        let long: String = "x".repeat(100);
        let mut table = open_table();
        assert_eq!(table.override_string(Some(&long), false), 1);
        assert_eq!(table.string_cursor(), 8 + 64 + 1);
        assert_eq!(&pool(&table)[..64], "x".repeat(64).as_bytes());
        assert_eq!(pool(&table)[64], 0);
    }

    #[test]
    fn test_hex_truncation() {
        let long: String = "y".repeat(31);
        let mut table = open_table();
        assert_eq!(table.override_string(Some(&long), true), 1);
        assert_eq!(table.string_cursor(), 8 + 2 + 60 + 1);
    }

    #[test]
    fn test_truncation_happens_before_space_stripping() {
        let mut text = "z".repeat(60);
        text.push_str("     and more");
        let mut table = open_table();
        assert_eq!(table.override_string(Some(&text), false), 1);
        assert_eq!(table.string_cursor(), 8 + 60 + 1);
    }

    #[test]
    fn test_trailing_spaces_stripped() {
        let mut table = open_table();
        assert_eq!(table.override_string(Some("  Vendor   "), false), 1);
        assert_eq!(pool(&table), b"  Vendor\0");
    }

    #[test]
    fn test_blank_input_writes_nothing() {
        let mut table = open_table();
        assert_eq!(table.override_string(Some(""), false), 0);
        assert_eq!(table.override_string(Some("    "), true), 0);
        assert_eq!(table.string_cursor(), 8);
        assert_eq!(table.override_string(Some("next"), false), 1);
    }

    #[test]
    fn test_input_stops_at_embedded_nul() {
        let mut table = open_table();
        assert_eq!(table.override_string(Some("abc\0def"), false), 1);
        assert_eq!(pool(&table), b"abc\0");
    }

    #[test]
    fn test_no_open_record_writes_nothing() {
        let mut table = SmbiosTable::new();
        assert_eq!(table.override_string(Some("orphan"), false), 0);
        assert_eq!(table.allocated_size(), 0);
    }

    #[test]
    fn test_string_index_exhaustion() {
        let mut table = open_table();
        for expected in 1..=u8::MAX {
            assert_eq!(table.override_string(Some("s"), false), expected);
        }
        let cursor = table.string_cursor();
        assert_eq!(table.override_string(Some("s"), false), 0);
        assert_eq!(table.string_cursor(), cursor);
    }

    #[test]
    fn test_growth_failure_returns_zero() {
        let mut allocator = MockTableAllocator::new();
        let mut calls = 0;
        allocator.expect_reallocate().returning(move |region, new_size| {
            calls += 1;
            if calls == 1 { PoolAllocator.reallocate(region, new_size) } else { Err(SmbiosError::AllocationFailed) }
        });

        let mut table = SmbiosTable::with_allocator(SmbiosTableConfig::default(), allocator);
        table.begin_record(SMBIOS_TYPE_SYSTEM_INFORMATION, 0xFF, 1).expect("begin failed");

        // Fill the first page, leaving less than one more string.
        let chunk: String = "c".repeat(63);
        let mut written = Vec::new();
        loop {
            let before = table.string_cursor();
            let index = table.override_string(Some(&chunk), false);
            if index == 0 {
                assert_eq!(table.string_cursor(), before);
                break;
            }
            written.push(index);
        }

        assert_eq!(table.allocated_size(), 0x1000);
        assert_eq!(written.len(), (0x1000 - 0xFF - 2) / 64);
    }

    #[test]
    fn test_table_limit_returns_zero() {
        let config = SmbiosTableConfig::new(0x1C, 0x10, 0x1000).expect("valid configuration");
        let mut table = SmbiosTable::with_config(config);
        table.begin_record(SMBIOS_TYPE_SYSTEM_INFORMATION, 8, 1).expect("begin failed");
        assert_eq!(table.override_string(Some("0123456789"), false), 1);
        assert_eq!(table.override_string(Some("0123456789"), false), 0);
        assert_eq!(table.string_cursor(), 8 + 11);
    }
}
