//! SMBIOS structure table construction and walking
//!
//! This crate builds an SMBIOS structure table record by record in one growable buffer,
//! and walks serialized tables to find records by type, occurrence or handle.
//!
//! # Architecture Overview
//!
//! ```text
//!        ┌──────────────────────────────┐
//!        │        Record builders       │
//!        │  (platform data producers)   │
//!        └──────────────┬───────────────┘
//!                       │ begin / fields / strings / end
//!                       ▼
//!        ┌──────────────────────────────┐
//!        │         SmbiosTable          │
//!        │                              │
//!        │ • record lifecycle           │
//!        │ • string pool encoding       │
//!        │ • buffer growth ─────────────┼──▶ TableAllocator
//!        │ • handle assignment          │
//!        └──────────────┬───────────────┘
//!                       │ finish()
//!                       ▼
//!        ┌──────────────────────────────┐
//!        │ FinishedTable + entry point  │
//!        └──────────────┬───────────────┘
//!                       │ bytes
//!                       ▼
//!        ┌──────────────────────────────┐
//!        │         Table walker         │
//!        │ type/index, handle, count,   │
//!        │ string lookup                │
//!        └──────────────────────────────┘
//! ```
//!
//! ## Buffer Model
//!
//! The table keeps two offsets into its buffer. The record cursor marks the header of the
//! record being built; everything before it is finalized. The string cursor marks the
//! next free byte of that record's string pool. Growth copies the used prefix into a new
//! region, so both offsets stay valid. Two bytes are always reserved past the string
//! cursor so the open record can be terminated without growing.
//!
//! ## Handles
//!
//! Singleton record types receive fixed handles, the three cache levels receive one fixed
//! handle each, and repeatable types (ports, slots, memory devices and mapped addresses)
//! are numbered from a per-table counter. See [`table::handle`].
//!
//! # Usage
//!
//! ```ignore
//! use patina_smbios_table::{SmbiosTable, smbios_record::SMBIOS_TYPE_BIOS_INFORMATION, walker};
//!
//! let mut table = SmbiosTable::new();
//!
//! let mut bios = table.record(SMBIOS_TYPE_BIOS_INFORMATION, 0x1A, 1)?;
//! bios.set_string(0x04, Some("ACME BIOS Corp"))?;
//! bios.set_string(0x05, Some("v2.4.1"))?;
//! bios.set_u16(0x06, 0xE000)?;
//! bios.end();
//!
//! let finished = table.finish()?;
//! let entry_point = finished.entry_point(3, 9, table_address);
//!
//! let bios = walker::find_by_type_and_index(finished.as_bytes(), finished.len() as u32, 0, 1);
//! ```
//!
//! # Error Handling
//!
//! Every fallible operation returns [`error::SmbiosError`], which converts into an
//! `efi::Status`. Oversized strings are truncated and logged, never rejected.
//!
//! # License
//!
//! Copyright (c) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod entry_point;
pub mod error;
pub mod smbios_record;
pub mod table;
pub mod walker;

pub use config::SmbiosTableConfig;
pub use entry_point::{SMBIOS_3_X_TABLE_GUID, Smbios30EntryPoint};
pub use error::SmbiosError;
pub use table::{FinishedTable, PoolAllocator, RecordBuilder, SmbiosTable, TableAllocator};
pub use walker::{RecordView, TableDescriptor};
