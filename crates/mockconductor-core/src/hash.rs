//! Content addressing and the hash-string encoding shared with agent ids
//!
//! An encoded hash is `u` + base64url (no padding) of
//! `prefix[3] ‖ core[32] ‖ location[4]`. The prefix tags what the core is
//! (agent key, entry digest) and the location is the SHA-256 of the core
//! XOR-folded into four bytes, which doubles as a checksum.

use crate::canonical::canonicalize;
use crate::error::{Error, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use ring::digest::{digest, SHA256};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const AGENT_PREFIX: [u8; 3] = [0x84, 0x20, 0x24];
pub const ENTRY_PREFIX: [u8; 3] = [0x84, 0x21, 0x24];

const CORE_LEN: usize = 32;
const RAW_LEN: usize = 3 + CORE_LEN + 4;

fn location(core: &[u8]) -> [u8; 4] {
    let hash = digest(&SHA256, core);
    let mut loc = [0u8; 4];
    for (i, b) in hash.as_ref().iter().enumerate() {
        loc[i % 4] ^= b;
    }
    loc
}

pub(crate) fn encode_hash(prefix: [u8; 3], core: &[u8; CORE_LEN]) -> String {
    let mut raw = Vec::with_capacity(RAW_LEN);
    raw.extend_from_slice(&prefix);
    raw.extend_from_slice(core);
    raw.extend_from_slice(&location(core));
    format!("u{}", URL_SAFE_NO_PAD.encode(raw))
}

pub(crate) fn decode_hash(
    prefix: [u8; 3],
    encoded: &str,
    what: &'static str,
) -> Result<[u8; CORE_LEN]> {
    let body = encoded
        .strip_prefix('u')
        .ok_or_else(|| Error::encoding(what, "missing 'u' multibase marker"))?;
    let raw = URL_SAFE_NO_PAD
        .decode(body)
        .map_err(|e| Error::encoding(what, e.to_string()))?;
    if raw.len() != RAW_LEN {
        return Err(Error::encoding(
            what,
            format!("expected {} bytes, got {}", RAW_LEN, raw.len()),
        ));
    }
    if raw[..3] != prefix {
        return Err(Error::encoding(what, "wrong hash type prefix"));
    }
    let mut core = [0u8; CORE_LEN];
    core.copy_from_slice(&raw[3..3 + CORE_LEN]);
    if raw[3 + CORE_LEN..] != location(&core) {
        return Err(Error::encoding(what, "location bytes do not match"));
    }
    Ok(core)
}

/// Encoded content address of some payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Validate an already encoded address.
    pub fn decode(encoded: &str) -> Result<Self> {
        decode_hash(ENTRY_PREFIX, encoded, "hash")?;
        Ok(Self(encoded.to_string()))
    }

    pub fn from_digest(core: &[u8; CORE_LEN]) -> Self {
        Self(encode_hash(ENTRY_PREFIX, core))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// SHA-256 the bytes and encode the digest as an address.
pub fn address(bytes: &[u8]) -> Address {
    let hash = digest(&SHA256, bytes);
    let mut core = [0u8; CORE_LEN];
    core.copy_from_slice(hash.as_ref());
    Address::from_digest(&core)
}

/// Address of a structured value's canonical form.
pub fn address_of(value: &Value) -> Address {
    address(&canonicalize(value))
}
