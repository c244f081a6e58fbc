//! Registry listings shared by the market, vault and history routes.

use paddock_cache::CacheKey;
use paddock_chain::{checksum, list_addresses, parse_address, Address};
use paddock_core::{AddressList, PaddockError, PaddockResult, RegistryKind};

use crate::routes::CHAIN_SERVICE;
use crate::state::AppState;
use crate::telemetry::observe_upstream;

/// The registry's `kind` list, cached under the listings TTL.
pub async fn listing(state: &AppState, kind: RegistryKind) -> PaddockResult<AddressList> {
    let chain = state.chain.as_ref();
    let bound = state.settings.count_bound;
    let read = state
        .cached(&CacheKey::registry(kind), move || {
            observe_upstream(CHAIN_SERVICE, async move {
                let addresses = list_addresses(chain, kind, bound).await?;
                Ok(AddressList {
                    kind,
                    addresses: addresses.iter().map(checksum).collect(),
                })
            })
        })
        .await?;
    Ok(read.into_value())
}

/// [`listing`] as parsed addresses.
pub async fn addresses(state: &AppState, kind: RegistryKind) -> PaddockResult<Vec<Address>> {
    listing(state, kind)
        .await?
        .addresses
        .iter()
        .map(|address| parse_address(address).map_err(PaddockError::from))
        .collect()
}
