//! Signed response envelope

use serde::{Deserialize, Serialize};

/// A payload together with the signer's attestation over it.
///
/// `hash` is the `0x`-prefixed keccak256 of the JSON encoding of `data`;
/// `signature` is the 65-byte personal-sign signature over that hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SignedEnvelope<T> {
    /// Checksummed address of the signer
    pub owner: String,
    pub data: T,
    pub signature: String,
    pub hash: String,
}
