//! Test-token faucet
//!
//! Transfers a fixed whole-token amount of each configured ERC-20 to a
//! recipient, one transaction per token, waiting for each receipt before
//! sending the next so nonces stay ordered.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, U256, U64};
use paddock_core::{ChainError, FaucetReceipt, FaucetTransfer, PaddockResult};

use crate::bindings::Erc20;
use crate::util::{bounded_call, checksum};

type FaucetClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Sends faucet tokens to an address.
#[async_trait]
pub trait TokenFaucet: Send + Sync {
    async fn drip(&self, to: Address) -> PaddockResult<FaucetReceipt>;
}

/// [`TokenFaucet`] that signs ERC-20 transfers with the service wallet.
pub struct EthersFaucet {
    client: Arc<FaucetClient>,
    tokens: Vec<Address>,
    /// Whole tokens per transfer, scaled by each token's decimals.
    amount: u64,
    call_timeout: Duration,
    confirm_timeout: Duration,
}

impl EthersFaucet {
    /// Bind `wallet` to the provider's chain id and build the faucet.
    pub async fn connect(
        provider: Arc<Provider<Http>>,
        wallet: LocalWallet,
        tokens: Vec<Address>,
        amount: u64,
        call_timeout: Duration,
        confirm_timeout: Duration,
    ) -> PaddockResult<Self> {
        let chain_id = match tokio::time::timeout(call_timeout, provider.get_chainid()).await {
            Ok(Ok(id)) => id.as_u64(),
            Ok(Err(e)) => return Err(ChainError::Rpc { reason: e.to_string() }.into()),
            Err(_) => {
                return Err(ChainError::Timeout {
                    operation: "eth_chainId".to_string(),
                    elapsed: call_timeout,
                }
                .into())
            }
        };

        let client = SignerMiddleware::new(provider.as_ref().clone(), wallet.with_chain_id(chain_id));
        tracing::info!(chain_id, tokens = tokens.len(), amount, "Faucet ready");

        Ok(Self {
            client: Arc::new(client),
            tokens,
            amount,
            call_timeout,
            confirm_timeout,
        })
    }

    async fn transfer(&self, token: Address, to: Address) -> Result<FaucetTransfer, ChainError> {
        let erc20 = Erc20::new(token, Arc::clone(&self.client));
        let t = self.call_timeout;

        let symbol = bounded_call(t, &token, "symbol", erc20.symbol().call()).await?;
        let decimals = bounded_call(t, &token, "decimals", erc20.decimals().call()).await?;
        let value = scaled_amount(self.amount, decimals)?;

        let call = erc20.transfer(to, value);
        let pending = bounded_call(t, &token, "transfer", call.send()).await?;
        let tx_hash = format!("{:#x}", pending.tx_hash());
        tracing::info!(token = %checksum(&token), to = %checksum(&to), tx_hash = %tx_hash, "Faucet transfer sent");

        let receipt = bounded_call(self.confirm_timeout, &token, "transfer.receipt", pending).await?;
        match receipt {
            Some(receipt) if receipt.status == Some(U64::from(1)) => Ok(FaucetTransfer {
                token: checksum(&token),
                symbol,
                amount: value.to_string(),
                tx_hash,
            }),
            Some(_) => Err(ChainError::TransactionFailed {
                tx_hash,
                reason: "reverted".to_string(),
            }),
            None => Err(ChainError::TransactionFailed {
                tx_hash,
                reason: "dropped from mempool".to_string(),
            }),
        }
    }
}

/// `amount * 10^decimals`, failing on overflow.
pub fn scaled_amount(amount: u64, decimals: u8) -> Result<U256, ChainError> {
    U256::from(10u8)
        .checked_pow(U256::from(decimals))
        .and_then(|unit| unit.checked_mul(U256::from(amount)))
        .ok_or(ChainError::AmountOverflow { amount, decimals })
}

#[async_trait]
impl TokenFaucet for EthersFaucet {
    async fn drip(&self, to: Address) -> PaddockResult<FaucetReceipt> {
        let mut transfers = Vec::with_capacity(self.tokens.len());
        for token in &self.tokens {
            transfers.push(self.transfer(*token, to).await?);
        }
        Ok(FaucetReceipt {
            to: checksum(&to),
            transfers,
        })
    }
}

impl std::fmt::Debug for EthersFaucet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthersFaucet")
            .field("sender", &checksum(&self.client.address()))
            .field("tokens", &self.tokens.iter().map(checksum).collect::<Vec<_>>())
            .field("amount", &self.amount)
            .finish()
    }
}
