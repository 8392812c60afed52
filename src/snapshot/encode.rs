// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Snapshot encoding.

use alloc::vec::Vec;

use crate::error::{KernelError, Result};
use crate::snapshot::{MAGIC, SCHEMA_VERSION};
use crate::state::registry::Registry;

pub fn encode_registry(registry: &Registry) -> Result<Vec<u8>> {
    let body = bincode::serde::encode_to_vec(registry, bincode::config::standard())
        .map_err(|_| KernelError::Codec)?;
    let mut out = Vec::with_capacity(8 + body.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&SCHEMA_VERSION.to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}
