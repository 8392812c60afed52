// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Snapshot decoding.

use crate::error::{KernelError, Result};
use crate::snapshot::{MAGIC, SCHEMA_VERSION};
use crate::state::registry::Registry;

/// Decodes a snapshot body and checks the registry invariants before
/// handing it back. A snapshot that decodes but violates continuity is
/// rejected the same way as a corrupt one.
pub fn decode_registry(buf: &[u8]) -> Result<Registry> {
    if buf.len() < 8 || &buf[0..4] != MAGIC {
        return Err(KernelError::Codec);
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&buf[4..8]);
    if u32::from_le_bytes(version) != SCHEMA_VERSION {
        return Err(KernelError::Codec);
    }

    let (registry, read): (Registry, usize) =
        bincode::serde::decode_from_slice(&buf[8..], bincode::config::standard())
            .map_err(|_| KernelError::Codec)?;
    if read != buf.len() - 8 {
        return Err(KernelError::Codec);
    }

    registry.check_invariants()?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{NoopObserver, OwnerOnly};
    use crate::snapshot::encode::encode_registry;
    use crate::state::registry::DistributionMetadata;
    use crate::types::commitment::Commitment;
    use crate::types::id::Principal;
    use crate::types::time::Timestamp;

    #[test]
    fn test_snapshot_restores_registry() {
        let mut reg = Registry::new(60).unwrap();
        let id = reg
            .create_distribution(Principal::new("ops"), 30, DistributionMetadata::new("n", "d"), &NoopObserver)
            .unwrap();
        reg.publish_default(Commitment([1; 32]), Timestamp(60), Timestamp(61), &NoopObserver).unwrap();
        reg.publish(id, &Principal::new("ops"), Commitment([2; 32]), Timestamp(30), Timestamp(31), &OwnerOnly, &NoopObserver)
            .unwrap();

        let bytes = encode_registry(&reg).unwrap();
        assert_eq!(decode_registry(&bytes).unwrap(), reg);
    }

    #[test]
    fn test_bad_magic_and_truncation() {
        let reg = Registry::new(60).unwrap();
        let mut bytes = encode_registry(&reg).unwrap();
        assert!(decode_registry(&bytes[..bytes.len() - 1]).is_err());
        bytes[0] = b'X';
        assert_eq!(decode_registry(&bytes), Err(KernelError::Codec));
    }
}
