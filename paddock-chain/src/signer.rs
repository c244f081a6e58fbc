//! Payload signing
//!
//! A payload is serialized to JSON, hashed with keccak256, and the hash is
//! signed as an EIP-191 personal message. Consumers verify with any
//! `personal_sign` recovery over the 32 hash bytes.

use std::str::FromStr;

use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Signature};
use ethers::utils::{hash_message, keccak256};
use paddock_core::{ChainError, SignedEnvelope};
use serde::Serialize;

use crate::util::{checksum, parse_address};

/// Signs response payloads with the service key.
///
/// ECDSA nonces are derived per RFC 6979, so signing the same payload twice
/// yields the same signature.
#[derive(Clone)]
pub struct PayloadSigner {
    wallet: LocalWallet,
}

impl PayloadSigner {
    /// Parse a hex private key, with or without `0x`.
    pub fn from_private_key(key: &str) -> Result<Self, ChainError> {
        let wallet = key.trim().parse::<LocalWallet>().map_err(|e| ChainError::Signing {
            reason: format!("invalid private key: {}", e),
        })?;
        Ok(Self { wallet })
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Checksummed signer address.
    pub fn owner(&self) -> String {
        checksum(&self.wallet.address())
    }

    /// Wallet for transaction signing.
    pub fn wallet(&self) -> LocalWallet {
        self.wallet.clone()
    }

    /// keccak256 of the JSON encoding of `data`.
    pub fn payload_hash<T: Serialize>(data: &T) -> Result<[u8; 32], ChainError> {
        let bytes = serde_json::to_vec(data).map_err(|e| ChainError::Signing {
            reason: format!("payload is not serializable: {}", e),
        })?;
        Ok(keccak256(bytes))
    }

    pub fn sign<T: Serialize>(&self, data: T) -> Result<SignedEnvelope<T>, ChainError> {
        let hash = Self::payload_hash(&data)?;
        let signature = self
            .wallet
            .sign_hash(hash_message(hash))
            .map_err(|e| ChainError::Signing { reason: e.to_string() })?;

        Ok(SignedEnvelope {
            owner: self.owner(),
            data,
            signature: format!("0x{}", hex::encode(signature.to_vec())),
            hash: format!("0x{}", hex::encode(hash)),
        })
    }
}

/// Check that `envelope` was signed by its `owner` over its `data`.
///
/// Returns `Ok(false)` for a well-formed envelope whose hash or signer does
/// not match.
pub fn verify<T: Serialize>(envelope: &SignedEnvelope<T>) -> Result<bool, ChainError> {
    let hash = PayloadSigner::payload_hash(&envelope.data)?;
    if format!("0x{}", hex::encode(hash)) != envelope.hash.to_lowercase() {
        return Ok(false);
    }

    let owner = parse_address(&envelope.owner)?;
    let signature = Signature::from_str(&envelope.signature).map_err(|e| ChainError::Signing {
        reason: format!("malformed signature: {}", e),
    })?;
    let recovered = signature
        .recover(hash.to_vec())
        .map_err(|e| ChainError::Signing { reason: e.to_string() })?;

    Ok(recovered == owner)
}

impl std::fmt::Debug for PayloadSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadSigner")
            .field("owner", &self.owner())
            .field("key", &"[REDACTED]")
            .finish()
    }
}
