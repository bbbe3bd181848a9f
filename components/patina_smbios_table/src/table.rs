//! SMBIOS Table Module
//!
//! This module provides the table construction engine organized into focused submodules:
//! - `core`: SmbiosTable struct, record lifecycle and the finished table
//! - `buffer`: Buffer growth and the allocator capability
//! - `strings`: String pool encoding (plain and hex)
//! - `builder`: Scoped record guard with field setters
//! - `handle`: Deterministic handle assignment
//!
//! ## License
//!
//! Copyright (c) Microsoft Corporation.
//!
//! SPDX-License-Identifier: Apache-2.0
//!

mod buffer;
mod builder;
mod core;
pub mod handle;
mod strings;

// Re-export main types and functions
pub use buffer::{PoolAllocator, TableAllocator};
#[cfg(any(test, feature = "mockall"))]
pub use buffer::MockTableAllocator;
pub use builder::RecordBuilder;
pub use self::core::{FinishedTable, SmbiosTable};
pub use handle::{HandleAssigner, HandlePolicy};
pub use strings::{encoded_length, max_string_length};
