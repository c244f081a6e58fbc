//! Read access to the protocol's contracts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{Address, U256};
use paddock_core::{BetHistory, ChainError, ConfigError, MarketDetails, PaddockResult, RegistryKind, VaultDetails};

use crate::bindings::{Market, Registry, Vault};
use crate::util::{bounded_call, checksum, decode_padded_bytes, narrow_u64};

/// Contract reads the HTTP routes are built from.
///
/// Every method is a single logical read; callers decide how to combine
/// them and how to react to individual failures.
#[async_trait]
pub trait ProtocolReader: Send + Sync {
    /// Number of entries the registry reports for `kind`.
    async fn registry_count(&self, kind: RegistryKind) -> PaddockResult<u64>;

    /// Address stored at `index` in the registry's `kind` list.
    async fn registry_address_at(&self, kind: RegistryKind, index: u64) -> PaddockResult<Address>;

    async fn market_details(&self, market: Address) -> PaddockResult<MarketDetails>;

    async fn vault_details(&self, vault: Address) -> PaddockResult<VaultDetails>;

    async fn vault_performance(&self, vault: Address) -> PaddockResult<U256>;

    async fn vault_total_assets(&self, vault: Address) -> PaddockResult<U256>;

    /// `Placed` events emitted by `market` from `from_block` onward.
    async fn placed_bets(&self, market: Address, from_block: u64) -> PaddockResult<Vec<BetHistory>>;

    /// Latest block number, used as a connectivity check.
    async fn block_number(&self) -> PaddockResult<u64>;
}

/// [`ProtocolReader`] over a JSON-RPC endpoint.
#[derive(Clone)]
pub struct EthersProtocol {
    provider: Arc<Provider<Http>>,
    registry: Address,
    timeout: Duration,
}

impl EthersProtocol {
    pub fn new(rpc_url: &str, registry: Address, timeout: Duration) -> PaddockResult<Self> {
        let provider = Provider::<Http>::try_from(rpc_url).map_err(|e| ConfigError::InvalidValue {
            field: "PADDOCK_RPC_URL".to_string(),
            value: rpc_url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::with_provider(Arc::new(provider), registry, timeout))
    }

    pub fn with_provider(provider: Arc<Provider<Http>>, registry: Address, timeout: Duration) -> Self {
        Self {
            provider,
            registry,
            timeout,
        }
    }

    pub fn provider(&self) -> Arc<Provider<Http>> {
        Arc::clone(&self.provider)
    }

    pub fn registry(&self) -> Address {
        self.registry
    }

    fn registry_contract(&self) -> Registry<Provider<Http>> {
        Registry::new(self.registry, Arc::clone(&self.provider))
    }
}

#[async_trait]
impl ProtocolReader for EthersProtocol {
    async fn registry_count(&self, kind: RegistryKind) -> PaddockResult<u64> {
        let registry = self.registry_contract();
        let count = match kind {
            RegistryKind::Markets => {
                bounded_call(self.timeout, &self.registry, "marketCount", registry.market_count().call()).await?
            }
            RegistryKind::Vaults => {
                bounded_call(self.timeout, &self.registry, "vaultCount", registry.vault_count().call()).await?
            }
        };
        Ok(narrow_u64(count, &self.registry, &format!("{}Count", kind))?)
    }

    async fn registry_address_at(&self, kind: RegistryKind, index: u64) -> PaddockResult<Address> {
        let registry = self.registry_contract();
        let index = U256::from(index);
        let address = match kind {
            RegistryKind::Markets => {
                bounded_call(self.timeout, &self.registry, "markets", registry.markets(index).call()).await?
            }
            RegistryKind::Vaults => {
                bounded_call(self.timeout, &self.registry, "vaults", registry.vaults(index).call()).await?
            }
        };
        Ok(address)
    }

    async fn market_details(&self, market: Address) -> PaddockResult<MarketDetails> {
        let contract = Market::new(market, self.provider());
        let t = self.timeout;

        let vault = bounded_call(t, &market, "getVaultAddress", contract.get_vault_address().call()).await?;
        let margin = bounded_call(t, &market, "getMargin", contract.get_margin().call()).await?;
        let total_in_play = bounded_call(t, &market, "getTotalInPlay", contract.get_total_in_play().call()).await?;
        let in_play_count = bounded_call(t, &market, "getInPlayCount", contract.get_in_play_count().call()).await?;
        let total_exposure =
            bounded_call(t, &market, "getTotalExposure", contract.get_total_exposure().call()).await?;
        let bet_count = bounded_call(t, &market, "getCount", contract.get_count().call()).await?;

        Ok(MarketDetails {
            address: checksum(&market),
            vault_address: checksum(&vault),
            margin: margin.to_string(),
            total_in_play: total_in_play.to_string(),
            in_play_count: in_play_count.to_string(),
            total_exposure: total_exposure.to_string(),
            bet_count: bet_count.to_string(),
        })
    }

    async fn vault_details(&self, vault: Address) -> PaddockResult<VaultDetails> {
        let contract = Vault::new(vault, self.provider());
        let t = self.timeout;

        let name = bounded_call(t, &vault, "name", contract.name().call()).await?;
        let symbol = bounded_call(t, &vault, "symbol", contract.symbol().call()).await?;
        let decimals = bounded_call(t, &vault, "decimals", contract.decimals().call()).await?;
        let asset = bounded_call(t, &vault, "asset", contract.asset().call()).await?;
        let total_assets = bounded_call(t, &vault, "totalAssets", contract.total_assets().call()).await?;
        let total_supply = bounded_call(t, &vault, "totalSupply", contract.total_supply().call()).await?;
        let performance = bounded_call(t, &vault, "getPerformance", contract.get_performance().call()).await?;

        Ok(VaultDetails {
            address: checksum(&vault),
            name,
            symbol,
            decimals,
            asset: checksum(&asset),
            total_assets: total_assets.to_string(),
            total_supply: total_supply.to_string(),
            performance: performance.to_string(),
        })
    }

    async fn vault_performance(&self, vault: Address) -> PaddockResult<U256> {
        let contract = Vault::new(vault, self.provider());
        Ok(bounded_call(self.timeout, &vault, "getPerformance", contract.get_performance().call()).await?)
    }

    async fn vault_total_assets(&self, vault: Address) -> PaddockResult<U256> {
        let contract = Vault::new(vault, self.provider());
        Ok(bounded_call(self.timeout, &vault, "totalAssets", contract.total_assets().call()).await?)
    }

    async fn placed_bets(&self, market: Address, from_block: u64) -> PaddockResult<Vec<BetHistory>> {
        let contract = Market::new(market, self.provider());
        let events = contract.placed_filter().from_block(from_block);
        let logs = bounded_call(self.timeout, &market, "Placed", events.query_with_meta()).await?;

        let bets = logs
            .into_iter()
            .map(|(placed, meta)| -> Result<BetHistory, ChainError> {
                Ok(BetHistory {
                    market: checksum(&market),
                    index: narrow_u64(placed.index, &market, "Placed.index")?,
                    proposition_id: decode_padded_bytes(&placed.proposition_id),
                    market_id: decode_padded_bytes(&placed.market_id),
                    amount: placed.amount.to_string(),
                    payout: placed.payout.to_string(),
                    owner: checksum(&placed.owner),
                    tx_hash: format!("{:#x}", meta.transaction_hash),
                    block_number: meta.block_number.as_u64(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(bets)
    }

    async fn block_number(&self) -> PaddockResult<u64> {
        let block = match tokio::time::timeout(self.timeout, self.provider.get_block_number()).await {
            Ok(Ok(block)) => block,
            Ok(Err(e)) => return Err(ChainError::Rpc { reason: e.to_string() }.into()),
            Err(_) => {
                return Err(ChainError::Timeout {
                    operation: "eth_blockNumber".to_string(),
                    elapsed: self.timeout,
                }
                .into())
            }
        };
        Ok(block.as_u64())
    }
}

impl std::fmt::Debug for EthersProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthersProtocol")
            .field("registry", &checksum(&self.registry))
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_rpc_url() {
        let err = EthersProtocol::new("not a url", Address::zero(), Duration::from_secs(1)).unwrap_err();
        assert!(format!("{}", err).contains("PADDOCK_RPC_URL"));
    }

    #[tokio::test]
    async fn test_unreachable_rpc_reports_chain_error() {
        let protocol = EthersProtocol::new("http://127.0.0.1:9", Address::zero(), Duration::from_secs(2)).unwrap();
        let err = protocol.block_number().await.unwrap_err();
        assert!(matches!(err, paddock_core::PaddockError::Chain(_)));
    }
}
