//! On-chain entity projections
//!
//! Token amounts are carried as base-10 strings of the raw integer value so
//! they survive JSON without precision loss. Addresses are EIP-55 checksummed.

use serde::{Deserialize, Serialize};

/// Which registry enumeration to walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    Markets,
    Vaults,
}

impl RegistryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markets => "markets",
            Self::Vaults => "vaults",
        }
    }
}

impl std::fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Addresses enumerated from the registry, in index order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AddressList {
    pub kind: RegistryKind,
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MarketDetails {
    pub address: String,
    pub vault_address: String,
    pub margin: String,
    pub total_in_play: String,
    pub in_play_count: String,
    pub total_exposure: String,
    pub bet_count: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct VaultDetails {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Underlying ERC-20 asset
    pub asset: String,
    pub total_assets: String,
    pub total_supply: String,
    pub performance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct VaultPerformance {
    pub address: String,
    /// `"0"` when the vault could not be read
    pub performance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct VaultPerformanceList {
    pub vaults: Vec<VaultPerformance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct VaultLiquidity {
    pub address: String,
    pub total_assets: String,
}

/// Per-vault liquidity and its sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Liquidity {
    pub vaults: Vec<VaultLiquidity>,
    pub total: String,
}

/// A bet recorded by a market's `Placed` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BetHistory {
    pub market: String,
    pub index: u64,
    pub proposition_id: String,
    pub market_id: String,
    pub amount: String,
    pub payout: String,
    pub owner: String,
    pub tx_hash: String,
    pub block_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BetHistoryList {
    pub results: Vec<BetHistory>,
}

/// Body of `POST /faucet`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FaucetRequest {
    /// Recipient address
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FaucetTransfer {
    pub token: String,
    pub symbol: String,
    pub amount: String,
    pub tx_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FaucetReceipt {
    pub to: String,
    pub transfers: Vec<FaucetTransfer>,
}
