//! Agent identities and Ed25519 signature verification over canonical payloads

use crate::canonical::canonicalize;
use crate::error::{Error, Result};
use crate::hash::{decode_hash, encode_hash, AGENT_PREFIX};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ring::rand::SystemRandom;
use ring::signature::{Ed25519KeyPair, KeyPair, UnparsedPublicKey, ED25519};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

const SIGNATURE_LEN: usize = 64;

/// Encoded agent public key (`uhCAk…`). Only decoded when verifying.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn from_public_key(key: &[u8]) -> Result<Self> {
        let core: [u8; 32] = key.try_into().map_err(|_| {
            Error::encoding(
                "agent_id",
                format!("public key must be 32 bytes, got {}", key.len()),
            )
        })?;
        Ok(Self(encode_hash(AGENT_PREFIX, &core)))
    }

    /// Validate an encoded agent id.
    pub fn parse(encoded: &str) -> Result<Self> {
        decode_hash(AGENT_PREFIX, encoded, "agent_id")?;
        Ok(Self(encoded.to_string()))
    }

    pub fn public_key(&self) -> Result<[u8; 32]> {
        decode_hash(AGENT_PREFIX, &self.0, "agent_id")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn encode_signature(raw: &[u8]) -> String {
    STANDARD.encode(raw)
}

pub fn decode_signature(encoded: &str) -> Result<[u8; SIGNATURE_LEN]> {
    let raw = STANDARD
        .decode(encoded)
        .map_err(|e| Error::encoding("signature", e.to_string()))?;
    raw.as_slice().try_into().map_err(|_| {
        Error::encoding(
            "signature",
            format!("expected {} bytes, got {}", SIGNATURE_LEN, raw.len()),
        )
    })
}

/// Check `signature` over the canonical form of `payload` under `agent_id`.
///
/// `Ok(false)` means the proof failed. Malformed keys or signatures are an
/// `Error::Encoding`, never a silent `false`.
pub fn verify(agent_id: &str, payload: &Value, signature: &str) -> Result<bool> {
    let message = canonicalize(payload);
    let public_key = AgentId(agent_id.to_string()).public_key()?;
    let sig = decode_signature(signature)?;
    Ok(UnparsedPublicKey::new(&ED25519, public_key)
        .verify(&message, &sig)
        .is_ok())
}

/// Sign the canonical form of `payload`.
pub fn sign(keypair: &Ed25519KeyPair, payload: &Value) -> String {
    encode_signature(keypair.sign(&canonicalize(payload)).as_ref())
}

pub fn generate_keypair() -> Result<Ed25519KeyPair> {
    let rng = SystemRandom::new();
    let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng)
        .map_err(|_| Error::internal("failed to generate Ed25519 key"))?;
    Ed25519KeyPair::from_pkcs8(pkcs8.as_ref())
        .map_err(|e| Error::internal(format!("rejected generated key: {}", e)))
}

pub fn agent_id_of(keypair: &Ed25519KeyPair) -> Result<AgentId> {
    AgentId::from_public_key(keypair.public_key().as_ref())
}
