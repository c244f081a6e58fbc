//! OpenAPI Specification for the Paddock API
//!
//! Generated by utoipa from the handler annotations and the `ToSchema`
//! derives on the response types.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::{faucet, health, history, markets, meetings, root, runners, vaults};
use crate::telemetry::metrics;

use paddock_core::{
    AddressList, BetHistory, BetHistoryList, FaucetReceipt, FaucetRequest, FaucetTransfer, Liquidity,
    MarketDetails, Meeting, MeetingsResponse, OddsPayload, Race, RegistryKind, Runner, RunnerOdds,
    RunnersPayload, VaultDetails, VaultLiquidity, VaultPerformance, VaultPerformanceList,
};

/// OpenAPI document for the Paddock API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Paddock API",
        version = "0.3.0",
        description = "Racing data and on-chain market, vault and bet reads for the Horse Link protocol",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
        contact(name = "Horse Link", url = "https://horse.link")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Racing", description = "Meetings, runners and signed odds from the racing API"),
        (name = "Protocol", description = "Registry, market, vault and bet history reads"),
        (name = "Faucet", description = "Test-token faucet"),
        (name = "Health", description = "Liveness and readiness"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        root::greeting,
        meetings::today,
        meetings::by_date,
        runners::runners,
        runners::odds,
        markets::list_markets,
        markets::market_details,
        vaults::list_vaults,
        vaults::performance,
        vaults::total_liquidity,
        vaults::vault_details,
        history::all_bets,
        history::account_bets,
        faucet::drip,
        health::ping,
        health::liveness,
        health::readiness,
        metrics::metrics_handler,
    ),
    components(schemas(
        ApiError,
        ErrorCode,
        root::Greeting,
        health::HealthResponse,
        health::HealthStatus,
        health::HealthDetails,
        health::ComponentHealth,
        health::CacheStatsSummary,
        MeetingsResponse,
        Meeting,
        Race,
        Runner,
        RunnerOdds,
        RunnersPayload,
        OddsPayload,
        RegistryKind,
        AddressList,
        MarketDetails,
        VaultDetails,
        VaultPerformance,
        VaultPerformanceList,
        VaultLiquidity,
        Liquidity,
        BetHistory,
        BetHistoryList,
        FaucetRequest,
        FaucetTransfer,
        FaucetReceipt,
    ))
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }

    /// Generate OpenAPI spec as YAML string.
    pub fn to_yaml() -> Result<String, String> {
        serde_yaml::to_string(&Self::openapi()).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/",
            "/meetings",
            "/meetings/{date}",
            "/runners/{track}/{race}/win",
            "/odds/{track}/{race}/win",
            "/markets",
            "/markets/{address}",
            "/vaults",
            "/vaults/performance",
            "/vaults/liquidity",
            "/vaults/{address}",
            "/history",
            "/history/{account}",
            "/faucet",
            "/health/ready",
            "/metrics",
        ] {
            assert!(paths.iter().any(|p| p.as_str() == expected), "missing path {}", expected);
        }
    }

    #[test]
    fn test_openapi_serializes() -> Result<(), String> {
        let json = ApiDoc::to_json().map_err(|e| e.to_string())?;
        assert!(json.contains("Paddock API"));
        let yaml = ApiDoc::to_yaml()?;
        assert!(yaml.contains("openapi:"));
        Ok(())
    }
}
