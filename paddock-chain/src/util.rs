//! Address and value helpers shared by readers and aggregators.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use ethers::types::{Address, U256};
use ethers::utils::to_checksum;
use paddock_core::ChainError;

/// Parse a `0x`-prefixed 20-byte hex address. Checksums are not enforced.
pub fn parse_address(value: &str) -> Result<Address, ChainError> {
    let trimmed = value.trim();
    let invalid = || ChainError::InvalidAddress {
        value: value.to_string(),
    };

    let hex_part = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")).ok_or_else(invalid)?;
    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    hex_part.parse::<Address>().map_err(|_| invalid())
}

/// EIP-55 checksummed form of `address`.
pub fn checksum(address: &Address) -> String {
    to_checksum(address, None)
}

/// Decode a right-padded `bytesN` value as text, falling back to hex when it
/// is not printable UTF-8.
pub fn decode_padded_bytes(bytes: &[u8]) -> String {
    let end = bytes.iter().rposition(|b| *b != 0).map(|i| i + 1).unwrap_or(0);
    let trimmed = &bytes[..end];
    match std::str::from_utf8(trimmed) {
        Ok(text) if !text.is_empty() && text.chars().all(|c| !c.is_control()) => text.to_string(),
        _ => format!("0x{}", hex::encode(bytes)),
    }
}

/// Narrow a contract-returned `uint256` to `u64`, rejecting values that do
/// not fit rather than truncating them.
pub(crate) fn narrow_u64(value: U256, contract: &Address, method: &str) -> Result<u64, ChainError> {
    if value > U256::from(u64::MAX) {
        return Err(ChainError::ContractCall {
            contract: checksum(contract),
            method: method.to_string(),
            reason: format!("value {} does not fit in u64", value),
        });
    }
    Ok(value.as_u64())
}

/// Run a contract call under `limit`, mapping failures to [`ChainError`].
pub(crate) async fn bounded_call<T, E, F>(
    limit: Duration,
    contract: &Address,
    method: &str,
    call: F,
) -> Result<T, ChainError>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ChainError::ContractCall {
            contract: checksum(contract),
            method: method.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Err(ChainError::Timeout {
            operation: format!("{}.{}", checksum(contract), method),
            elapsed: limit,
        }),
    }
}
