//! Algorand account addresses
//!
//! An address is the base32 (no padding) encoding of a 32-byte ed25519 public
//! key followed by a 4-byte checksum, the last 4 bytes of SHA-512/256 of the key.

use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha512_256};
use std::fmt;
use std::str::FromStr;

use super::error::SwapError;
use crate::constants::{ADDRESS_CHECKSUM_LEN, ADDRESS_LEN, APP_ID_PREFIX};

pub(crate) fn sha512_256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha512_256::new();
    for part in parts {
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 32]);

impl Address {
    pub const fn new(public_key: [u8; 32]) -> Self {
        Self(public_key)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The all-zero address, used by the chain as "no account"
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Escrow account controlled by an application
    pub fn for_application(app_id: u64) -> Self {
        Self(sha512_256(&[APP_ID_PREFIX, &app_id.to_be_bytes()]))
    }

    fn checksum(public_key: &[u8; 32]) -> [u8; ADDRESS_CHECKSUM_LEN] {
        let hash = sha512_256(&[public_key]);
        let mut checksum = [0u8; ADDRESS_CHECKSUM_LEN];
        checksum.copy_from_slice(&hash[32 - ADDRESS_CHECKSUM_LEN..]);
        checksum
    }

    pub fn encode(&self) -> String {
        let mut raw = Vec::with_capacity(32 + ADDRESS_CHECKSUM_LEN);
        raw.extend_from_slice(&self.0);
        raw.extend_from_slice(&Self::checksum(&self.0));
        BASE32_NOPAD.encode(&raw)
    }
}

impl FromStr for Address {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ADDRESS_LEN {
            return Err(SwapError::invalid_address(
                s,
                format!("expected {ADDRESS_LEN} characters, got {}", s.len()),
            ));
        }
        let raw = BASE32_NOPAD
            .decode(s.as_bytes())
            .map_err(|e| SwapError::invalid_address(s, e.to_string()))?;
        if raw.len() != 32 + ADDRESS_CHECKSUM_LEN {
            return Err(SwapError::invalid_address(s, "decoded length mismatch"));
        }

        let mut public_key = [0u8; 32];
        public_key.copy_from_slice(&raw[..32]);
        if raw[32..] != Self::checksum(&public_key) {
            return Err(SwapError::invalid_address(s, "checksum mismatch"));
        }
        Ok(Self(public_key))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.encode())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
