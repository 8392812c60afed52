// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Commitment roots.
//!
//! A root is an opaque 32-byte summary of off-band data for one epoch. The
//! kernel stores roots; it never checks inclusion proofs against them.

use alloc::string::String;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Commitment(pub [u8; 32]);

impl Commitment {
    /// Sentinel for an epoch with no activity.
    pub const EMPTY: Commitment = Commitment([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Commitment(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// BLAKE3 digest of `data`, for callers that commit to a flat payload.
    pub fn digest(data: &[u8]) -> Self {
        Commitment(*blake3::hash(data).as_bytes())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseCommitmentError;

impl fmt::Display for ParseCommitmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("commitment must be 64 hex characters")
    }
}

impl FromStr for Commitment {
    type Err = ParseCommitmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out).map_err(|_| ParseCommitmentError)?;
        Ok(Commitment(out))
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parse_accepts_prefix_and_case() {
        let lower = "ab".repeat(32);
        let upper = format!("0x{}", "AB".repeat(32));
        let a: Commitment = lower.parse().unwrap();
        let b: Commitment = upper.parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_hex(), lower);
        assert_eq!(format!("{}", a), lower);
    }

    #[test]
    fn test_hex_parse_rejects_bad_input() {
        assert!("abc".parse::<Commitment>().is_err());
        assert!("zz".repeat(32).parse::<Commitment>().is_err());
        assert!("ab".repeat(33).parse::<Commitment>().is_err());
    }

    #[test]
    fn test_empty_sentinel() {
        assert!(Commitment::EMPTY.is_empty());
        assert!(!Commitment::digest(b"epoch").is_empty());
    }
}
