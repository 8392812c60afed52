// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Registry snapshots.
//!
//! Body layout: `[MAGIC "RLKS"][SCHEMA_VERSION u32 LE][bincode Registry]`.
//! File framing (header, checksum, atomic rename) belongs to the
//! persistence crate; this module only turns a registry into bytes and back.

pub mod encode;
pub mod decode;

pub const MAGIC: &[u8; 4] = b"RLKS";
pub const SCHEMA_VERSION: u32 = 1;
