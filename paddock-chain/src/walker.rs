//! Multi-contract reads: registry enumeration and per-vault aggregation.
//!
//! Every loop here is sequential and in index order. Any failed read aborts
//! the whole result, except vault performance where a failed vault reports
//! zero.

use ethers::types::{Address, U256};
use paddock_core::{
    BetHistory, CountBound, Liquidity, PaddockResult, RegistryKind, VaultLiquidity, VaultPerformance,
};

use crate::reader::ProtocolReader;
use crate::util::checksum;

/// Cap on the up-front allocation; the reported count is untrusted.
const LISTING_PREALLOC: u64 = 256;

/// Enumerate the registry's `kind` list.
///
/// Reads the count, then each index in ascending order. `bound` decides
/// whether the last counted index is read.
pub async fn list_addresses(
    reader: &dyn ProtocolReader,
    kind: RegistryKind,
    bound: CountBound,
) -> PaddockResult<Vec<Address>> {
    let count = reader.registry_count(kind).await?;
    let readable = bound.readable(count);
    tracing::debug!(%kind, count, readable, ?bound, "Walking registry");

    let mut addresses = Vec::with_capacity(readable.min(LISTING_PREALLOC) as usize);
    for index in 0..readable {
        addresses.push(reader.registry_address_at(kind, index).await?);
    }
    Ok(addresses)
}

/// Performance for each vault, substituting zero where a read fails.
pub async fn vault_performance_all(reader: &dyn ProtocolReader, vaults: &[Address]) -> Vec<VaultPerformance> {
    let mut results = Vec::with_capacity(vaults.len());
    for vault in vaults {
        let performance = match reader.vault_performance(*vault).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(vault = %checksum(vault), error = %e, "Vault performance read failed, reporting zero");
                U256::zero()
            }
        };
        results.push(VaultPerformance {
            address: checksum(vault),
            performance: performance.to_string(),
        });
    }
    results
}

/// Total assets per vault and their sum.
pub async fn liquidity(reader: &dyn ProtocolReader, vaults: &[Address]) -> PaddockResult<Liquidity> {
    let mut total = U256::zero();
    let mut per_vault = Vec::with_capacity(vaults.len());
    for vault in vaults {
        let assets = reader.vault_total_assets(*vault).await?;
        total = total.saturating_add(assets);
        per_vault.push(VaultLiquidity {
            address: checksum(vault),
            total_assets: assets.to_string(),
        });
    }
    Ok(Liquidity {
        vaults: per_vault,
        total: total.to_string(),
    })
}

/// Bets placed on `markets`, optionally only those owned by `owner`.
///
/// Results are grouped by market in the given order, then by block.
pub async fn bet_history(
    reader: &dyn ProtocolReader,
    markets: &[Address],
    from_block: u64,
    owner: Option<Address>,
) -> PaddockResult<Vec<BetHistory>> {
    let owner = owner.map(|owner| checksum(&owner));
    let mut history = Vec::new();
    for market in markets {
        let mut bets = reader.placed_bets(*market, from_block).await?;
        if let Some(owner) = &owner {
            bets.retain(|bet| &bet.owner == owner);
        }
        bets.sort_by_key(|bet| (bet.block_number, bet.index));
        history.extend(bets);
    }
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use paddock_core::{ChainError, MarketDetails, VaultDetails};
    use std::collections::HashSet;
    use std::sync::Mutex;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    /// Registry with `count` entries; entry `i` is address `i + 1`.
    #[derive(Default)]
    struct Fake {
        count: u64,
        reads: Mutex<Vec<u64>>,
        failing_index: Option<u64>,
        failing_vaults: HashSet<Address>,
        bets: Vec<BetHistory>,
    }

    #[async_trait]
    impl ProtocolReader for Fake {
        async fn registry_count(&self, _kind: RegistryKind) -> PaddockResult<u64> {
            Ok(self.count)
        }

        async fn registry_address_at(&self, _kind: RegistryKind, index: u64) -> PaddockResult<Address> {
            self.reads.lock().unwrap().push(index);
            if Some(index) == self.failing_index || index >= self.count {
                return Err(ChainError::Rpc {
                    reason: "execution reverted".to_string(),
                }
                .into());
            }
            Ok(addr(index + 1))
        }

        async fn market_details(&self, _market: Address) -> PaddockResult<MarketDetails> {
            unimplemented!()
        }

        async fn vault_details(&self, _vault: Address) -> PaddockResult<VaultDetails> {
            unimplemented!()
        }

        async fn vault_performance(&self, vault: Address) -> PaddockResult<U256> {
            if self.failing_vaults.contains(&vault) {
                return Err(ChainError::Rpc {
                    reason: "timeout".to_string(),
                }
                .into());
            }
            Ok(U256::from(vault.to_low_u64_be() * 100))
        }

        async fn vault_total_assets(&self, vault: Address) -> PaddockResult<U256> {
            self.vault_performance(vault).await
        }

        async fn placed_bets(&self, market: Address, _from_block: u64) -> PaddockResult<Vec<BetHistory>> {
            Ok(self
                .bets
                .iter()
                .filter(|bet| bet.market == checksum(&market))
                .cloned()
                .collect())
        }

        async fn block_number(&self) -> PaddockResult<u64> {
            Ok(1)
        }
    }

    fn bet(market: Address, owner: Address, index: u64, block: u64) -> BetHistory {
        BetHistory {
            market: checksum(&market),
            index,
            proposition_id: "R20220514_DOO_1_W1".to_string(),
            market_id: "20220514_DOO_1".to_string(),
            amount: "100".to_string(),
            payout: "250".to_string(),
            owner: checksum(&owner),
            tx_hash: format!("0x{:064x}", index),
            block_number: block,
        }
    }

    #[tokio::test]
    async fn test_list_addresses_exact_reads_every_index_in_order() {
        let fake = Fake {
            count: 4,
            ..Default::default()
        };
        let addresses = list_addresses(&fake, RegistryKind::Markets, CountBound::Exact).await.unwrap();

        assert_eq!(addresses, vec![addr(1), addr(2), addr(3), addr(4)]);
        assert_eq!(*fake.reads.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_list_addresses_skip_last_drops_final_index() {
        let fake = Fake {
            count: 4,
            ..Default::default()
        };
        let addresses = list_addresses(&fake, RegistryKind::Vaults, CountBound::SkipLast).await.unwrap();

        assert_eq!(addresses, vec![addr(1), addr(2), addr(3)]);
        assert_eq!(*fake.reads.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_list_addresses_empty_registry() {
        let fake = Fake::default();
        for bound in [CountBound::Exact, CountBound::SkipLast] {
            let addresses = list_addresses(&fake, RegistryKind::Markets, bound).await.unwrap();
            assert!(addresses.is_empty());
        }
    }

    #[tokio::test]
    async fn test_list_addresses_aborts_on_failed_read() {
        let fake = Fake {
            count: 5,
            failing_index: Some(2),
            ..Default::default()
        };
        let result = list_addresses(&fake, RegistryKind::Markets, CountBound::Exact).await;

        assert!(result.is_err());
        assert_eq!(*fake.reads.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_list_addresses_huge_count_does_not_preallocate() {
        let fake = Fake {
            count: u64::MAX,
            failing_index: Some(0),
            ..Default::default()
        };
        let result = list_addresses(&fake, RegistryKind::Markets, CountBound::Exact).await;

        assert!(result.is_err());
        assert_eq!(*fake.reads.lock().unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn test_vault_performance_substitutes_zero() {
        let fake = Fake {
            failing_vaults: [addr(2)].into_iter().collect(),
            ..Default::default()
        };
        let results = vault_performance_all(&fake, &[addr(1), addr(2), addr(3)]).await;

        let values: Vec<&str> = results.iter().map(|r| r.performance.as_str()).collect();
        assert_eq!(values, vec!["100", "0", "300"]);
        assert_eq!(results[1].address, checksum(&addr(2)));
    }

    #[tokio::test]
    async fn test_liquidity_sums_and_aborts_on_failure() {
        let fake = Fake::default();
        let liquidity = liquidity(&fake, &[addr(1), addr(2)]).await.unwrap();
        assert_eq!(liquidity.total, "300");
        assert_eq!(liquidity.vaults.len(), 2);

        let failing = Fake {
            failing_vaults: [addr(2)].into_iter().collect(),
            ..Default::default()
        };
        assert!(super::liquidity(&failing, &[addr(1), addr(2)]).await.is_err());
    }

    #[tokio::test]
    async fn test_bet_history_filters_by_owner() {
        let (m1, m2) = (addr(10), addr(11));
        let (alice, bob) = (addr(20), addr(21));
        let fake = Fake {
            bets: vec![
                bet(m1, alice, 1, 7),
                bet(m1, bob, 0, 5),
                bet(m2, alice, 0, 6),
            ],
            ..Default::default()
        };

        let all = bet_history(&fake, &[m1, m2], 0, None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].block_number, 5);
        assert_eq!(all[1].block_number, 7);
        assert_eq!(all[2].market, checksum(&m2));

        let mine = bet_history(&fake, &[m1, m2], 0, Some(alice)).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|b| b.owner == checksum(&alice)));
    }
}
