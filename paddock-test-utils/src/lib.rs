//! Paddock Test Utilities
//!
//! Shared test infrastructure for the Paddock workspace:
//! - In-memory fakes for the racing source, protocol reader and faucet
//! - Proptest generators for racing entities
//! - Fixtures for the 2022-05-14 race day
//! - Assertions over mapped meetings

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

pub use paddock_chain::{Address, ProtocolReader, TokenFaucet, U256};
pub use paddock_core::{
    BetHistory, ChainError, FaucetReceipt, FaucetTransfer, MarketDetails, Meeting, PaddockError, PaddockResult,
    Race, RegistryKind, Runner, UpstreamError, VaultDetails,
};
pub use paddock_racing::RacingSource;

use paddock_chain::checksum;

/// First Hardhat/Anvil development account. Never holds real funds.
pub const DEV_PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Checksummed address of [`DEV_PRIVATE_KEY`].
pub const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

// ============================================================================
// FAKE RACING SOURCE
// ============================================================================

/// In-memory [`RacingSource`] that counts upstream calls.
///
/// Unknown dates have no meetings; unknown races are `NotFound`.
#[derive(Debug, Default)]
pub struct FakeRacingSource {
    meetings: HashMap<NaiveDate, Vec<Meeting>>,
    runners: HashMap<(NaiveDate, String, u32), Vec<Runner>>,
    failing: AtomicBool,
    meeting_calls: AtomicUsize,
    runner_calls: AtomicUsize,
}

impl FakeRacingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_meetings(mut self, date: NaiveDate, meetings: Vec<Meeting>) -> Self {
        self.meetings.insert(date, meetings);
        self
    }

    pub fn with_runners(mut self, date: NaiveDate, track: &str, race: u32, runners: Vec<Runner>) -> Self {
        self.runners.insert((date, track.to_uppercase(), race), runners);
        self
    }

    /// Make every subsequent call fail with a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn meeting_calls(&self) -> usize {
        self.meeting_calls.load(Ordering::SeqCst)
    }

    pub fn runner_calls(&self) -> usize {
        self.runner_calls.load(Ordering::SeqCst)
    }

    fn check_failing(&self) -> PaddockResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(UpstreamError::Transport {
                service: "racing".to_string(),
                reason: "connection refused".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl RacingSource for FakeRacingSource {
    async fn meetings(&self, date: NaiveDate) -> PaddockResult<Vec<Meeting>> {
        self.meeting_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        Ok(self.meetings.get(&date).cloned().unwrap_or_default())
    }

    async fn runners(&self, date: NaiveDate, track: &str, race: u32) -> PaddockResult<Vec<Runner>> {
        self.runner_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        self.runners
            .get(&(date, track.to_uppercase(), race))
            .cloned()
            .ok_or_else(|| {
                UpstreamError::NotFound {
                    service: "racing".to_string(),
                    what: "race".to_string(),
                    key: format!("{}/{}/{}", date, track.to_uppercase(), race),
                }
                .into()
            })
    }
}

// ============================================================================
// FAKE PROTOCOL
// ============================================================================

/// In-memory [`ProtocolReader`].
///
/// The registry reports `markets.len()` / `vaults.len()` unless a count is
/// overridden, and reading past the stored list reverts.
#[derive(Debug, Default)]
pub struct FakeProtocol {
    markets: Vec<Address>,
    vaults: Vec<Address>,
    count_override: HashMap<RegistryKind, u64>,
    market_details: HashMap<Address, MarketDetails>,
    vault_details: HashMap<Address, VaultDetails>,
    performance: HashMap<Address, U256>,
    total_assets: HashMap<Address, U256>,
    failing_vaults: HashSet<Address>,
    bets: Vec<BetHistory>,
    block: u64,
    rpc_down: AtomicBool,
    registry_reads: AtomicUsize,
}

impl FakeProtocol {
    pub fn new() -> Self {
        Self {
            block: 1,
            ..Self::default()
        }
    }

    pub fn with_market(mut self, details: MarketDetails) -> Self {
        let address = parse(&details.address);
        self.markets.push(address);
        self.market_details.insert(address, details);
        self
    }

    pub fn with_vault(mut self, details: VaultDetails) -> Self {
        let address = parse(&details.address);
        self.vaults.push(address);
        self.performance
            .insert(address, U256::from_dec_str(&details.performance).unwrap_or_default());
        self.total_assets
            .insert(address, U256::from_dec_str(&details.total_assets).unwrap_or_default());
        self.vault_details.insert(address, details);
        self
    }

    pub fn with_count(mut self, kind: RegistryKind, count: u64) -> Self {
        self.count_override.insert(kind, count);
        self
    }

    /// Reads of this vault's performance and assets fail.
    pub fn with_failing_vault(mut self, vault: Address) -> Self {
        self.failing_vaults.insert(vault);
        self
    }

    pub fn with_bet(mut self, bet: BetHistory) -> Self {
        self.bets.push(bet);
        self
    }

    pub fn with_block(mut self, block: u64) -> Self {
        self.block = block;
        self
    }

    pub fn set_rpc_down(&self, down: bool) {
        self.rpc_down.store(down, Ordering::SeqCst);
    }

    /// Number of registry index reads so far.
    pub fn registry_reads(&self) -> usize {
        self.registry_reads.load(Ordering::SeqCst)
    }

    fn list(&self, kind: RegistryKind) -> &[Address] {
        match kind {
            RegistryKind::Markets => &self.markets,
            RegistryKind::Vaults => &self.vaults,
        }
    }

    fn check_rpc(&self) -> PaddockResult<()> {
        if self.rpc_down.load(Ordering::SeqCst) {
            return Err(ChainError::Rpc {
                reason: "connection refused".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn vault_read(&self, vault: Address, method: &str, values: &HashMap<Address, U256>) -> PaddockResult<U256> {
        self.check_rpc()?;
        if self.failing_vaults.contains(&vault) {
            return Err(reverted(vault, method));
        }
        values.get(&vault).copied().ok_or_else(|| reverted(vault, method))
    }
}

fn parse(address: &str) -> Address {
    address.parse().unwrap_or_default()
}

fn reverted(contract: Address, method: &str) -> PaddockError {
    ChainError::ContractCall {
        contract: checksum(&contract),
        method: method.to_string(),
        reason: "execution reverted".to_string(),
    }
    .into()
}

#[async_trait]
impl ProtocolReader for FakeProtocol {
    async fn registry_count(&self, kind: RegistryKind) -> PaddockResult<u64> {
        self.check_rpc()?;
        Ok(self
            .count_override
            .get(&kind)
            .copied()
            .unwrap_or(self.list(kind).len() as u64))
    }

    async fn registry_address_at(&self, kind: RegistryKind, index: u64) -> PaddockResult<Address> {
        self.check_rpc()?;
        self.registry_reads.fetch_add(1, Ordering::SeqCst);
        self.list(kind)
            .get(index as usize)
            .copied()
            .ok_or_else(|| reverted(Address::zero(), kind.as_str()))
    }

    async fn market_details(&self, market: Address) -> PaddockResult<MarketDetails> {
        self.check_rpc()?;
        self.market_details
            .get(&market)
            .cloned()
            .ok_or_else(|| reverted(market, "getVaultAddress"))
    }

    async fn vault_details(&self, vault: Address) -> PaddockResult<VaultDetails> {
        self.check_rpc()?;
        if self.failing_vaults.contains(&vault) {
            return Err(reverted(vault, "name"));
        }
        self.vault_details
            .get(&vault)
            .cloned()
            .ok_or_else(|| reverted(vault, "name"))
    }

    async fn vault_performance(&self, vault: Address) -> PaddockResult<U256> {
        self.vault_read(vault, "getPerformance", &self.performance)
    }

    async fn vault_total_assets(&self, vault: Address) -> PaddockResult<U256> {
        self.vault_read(vault, "totalAssets", &self.total_assets)
    }

    async fn placed_bets(&self, market: Address, from_block: u64) -> PaddockResult<Vec<BetHistory>> {
        self.check_rpc()?;
        let market = checksum(&market);
        Ok(self
            .bets
            .iter()
            .filter(|bet| bet.market == market && bet.block_number >= from_block)
            .cloned()
            .collect())
    }

    async fn block_number(&self) -> PaddockResult<u64> {
        self.check_rpc()?;
        Ok(self.block)
    }
}

// ============================================================================
// FAKE FAUCET
// ============================================================================

/// [`TokenFaucet`] that records recipients and fabricates transaction hashes.
#[derive(Debug)]
pub struct FakeFaucet {
    tokens: Vec<(Address, String)>,
    amount: String,
    recipients: Mutex<Vec<Address>>,
}

impl FakeFaucet {
    pub fn new(tokens: Vec<(Address, String)>, amount: impl Into<String>) -> Self {
        Self {
            tokens,
            amount: amount.into(),
            recipients: Mutex::new(Vec::new()),
        }
    }

    pub fn recipients(&self) -> Vec<Address> {
        self.recipients.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TokenFaucet for FakeFaucet {
    async fn drip(&self, to: Address) -> PaddockResult<FaucetReceipt> {
        let sequence = {
            let mut recipients = self.recipients.lock().map_err(|_| ChainError::Rpc {
                reason: "faucet state poisoned".to_string(),
            })?;
            recipients.push(to);
            recipients.len()
        };

        let transfers = self
            .tokens
            .iter()
            .enumerate()
            .map(|(i, (token, symbol))| FaucetTransfer {
                token: checksum(token),
                symbol: symbol.clone(),
                amount: self.amount.clone(),
                tx_hash: format!("0x{:064x}", sequence * 100 + i),
            })
            .collect();

        Ok(FaucetReceipt {
            to: checksum(&to),
            transfers,
        })
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest generators for racing entities.

    use super::*;
    use paddock_core::RaceTimes;
    use proptest::prelude::*;

    pub fn arb_race(number: u32) -> impl Strategy<Value = Race> {
        (0i64..4_000_000_000, 800u32..3200, "[A-Za-z ]{1,20}").prop_map(move |(start, distance, name)| {
            let times = RaceTimes::from_start(start);
            Race {
                number,
                name,
                distance,
                status: "Open".to_string(),
                start_unix: times.start_unix,
                end_unix: times.end_unix,
                close_unix: times.close_unix,
            }
        })
    }

    pub fn arb_runner(date: NaiveDate, track: &'static str, race: u32) -> impl Strategy<Value = Runner> {
        (1u32..24, "[A-Z ]{1,20}", 1u32..24, any::<bool>(), 1.0f64..200.0).prop_map(
            move |(number, name, barrier, vacant, odds)| Runner {
                number,
                name,
                barrier,
                vacant,
                odds,
                odds_scaled: paddock_core::scale_odds(odds),
                proposition_id: paddock_core::proposition_id(date, track, race, number),
            },
        )
    }

    pub fn arb_address() -> impl Strategy<Value = Address> {
        any::<[u8; 20]>().prop_map(Address::from)
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! The 2022-05-14 race day as served by the racing API, plus chain
    //! fixtures built around deterministic addresses.

    use super::*;
    use paddock_racing::types::{MeetingsEnvelope, RaceEnvelope};
    use serde_json::{json, Value};

    pub fn race_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 5, 14).unwrap_or_default()
    }

    /// Racing API meetings body for 2022-05-14.
    pub fn raw_meetings() -> Value {
        json!({
            "meetings": [
                {
                    "meetingName": "Doomben",
                    "location": "Qld",
                    "raceType": "R",
                    "meetingDate": "2022-05-14",
                    "venueMnemonic": "DOO",
                    "weatherCondition": "FINE",
                    "races": [
                        {"raceNumber": 1, "raceName": "Hyland Race Colours Maiden", "raceStartTime": "2022-05-14T02:35:00.000Z", "raceStatus": "Paying", "raceDistance": 1200},
                        {"raceNumber": 2, "raceName": "Sky Racing Handicap", "raceStartTime": "2022-05-14T03:10:00.000Z", "raceStatus": "Paying", "raceDistance": 1350},
                        {"raceNumber": 3, "raceName": "Doomben Cup", "raceStartTime": "2022-05-14T03:45:00.000Z", "raceStatus": "Open", "raceDistance": 2000}
                    ]
                },
                {
                    "meetingName": "Randwick",
                    "location": "nsw",
                    "raceType": "R",
                    "meetingDate": "2022-05-14",
                    "venueMnemonic": "RAN",
                    "races": [
                        {"raceNumber": 1, "raceName": "Schweppes Handicap", "raceStartTime": "2022-05-14T02:20:00.000Z", "raceStatus": "Paying", "raceDistance": 1400},
                        {"raceNumber": 2, "raceName": "Provincial Cup", "raceStartTime": "2022-05-14T02:55:00.000Z", "raceStatus": "Open", "raceDistance": 1600}
                    ]
                }
            ]
        })
    }

    /// Racing API race body for DOO race 3 on 2022-05-14.
    pub fn raw_race() -> Value {
        json!({
            "raceNumber": 3,
            "raceName": "Doomben Cup",
            "runners": [
                {"runnerName": "Zaaki", "runnerNumber": 1, "barrierNumber": 6, "vacantFlag": false,
                 "fixedOdds": {"returnWin": 2.6, "returnPlace": 1.3, "bettingStatus": "Open"}},
                {"runnerName": "Mo'unga", "runnerNumber": 2, "barrierNumber": 3, "vacantFlag": false,
                 "fixedOdds": {"returnWin": 4.8, "returnPlace": 1.8, "bettingStatus": "Open"}},
                {"runnerName": "Scratched Runner", "runnerNumber": 3, "vacantFlag": true}
            ]
        })
    }

    /// [`raw_meetings`] mapped through the production mapper.
    pub fn meetings() -> Vec<Meeting> {
        serde_json::from_value::<MeetingsEnvelope>(raw_meetings())
            .ok()
            .and_then(|raw| paddock_racing::map_meetings(&raw).ok())
            .unwrap_or_default()
    }

    /// [`raw_race`] mapped through the production mapper.
    pub fn runners() -> Vec<Runner> {
        serde_json::from_value::<RaceEnvelope>(raw_race())
            .ok()
            .and_then(|raw| paddock_racing::map_runners(&raw, race_day(), "DOO", 3).ok())
            .unwrap_or_default()
    }

    /// Racing source serving the 2022-05-14 fixtures.
    pub fn racing_source() -> FakeRacingSource {
        FakeRacingSource::new()
            .with_meetings(race_day(), meetings())
            .with_runners(race_day(), "DOO", 3, runners())
    }

    pub fn address(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    pub fn market(n: u64, vault: Address) -> MarketDetails {
        MarketDetails {
            address: checksum(&address(n)),
            vault_address: checksum(&vault),
            margin: "100".to_string(),
            total_in_play: (n * 1_000).to_string(),
            in_play_count: n.to_string(),
            total_exposure: (n * 2_500).to_string(),
            bet_count: (n * 3).to_string(),
        }
    }

    pub fn vault(n: u64) -> VaultDetails {
        VaultDetails {
            address: checksum(&address(n)),
            name: format!("Vault {}", n),
            symbol: format!("HLV{}", n),
            decimals: 18,
            asset: checksum(&address(999)),
            total_assets: (n * 1_000_000).to_string(),
            total_supply: (n * 900_000).to_string(),
            performance: (n * 10).to_string(),
        }
    }

    pub fn bet(market: Address, owner: Address, index: u64, block: u64) -> BetHistory {
        BetHistory {
            market: checksum(&market),
            index,
            proposition_id: paddock_core::proposition_id(race_day(), "DOO", 3, 1),
            market_id: "20220514_DOO_3".to_string(),
            amount: "1000000".to_string(),
            payout: "2600000".to_string(),
            owner: checksum(&owner),
            tx_hash: format!("0x{:064x}", block * 1_000 + index),
            block_number: block,
        }
    }

    /// Two vaults (101, 102), one market per vault (201, 202) and three bets.
    pub fn protocol() -> FakeProtocol {
        FakeProtocol::new()
            .with_vault(vault(101))
            .with_vault(vault(102))
            .with_market(market(201, address(101)))
            .with_market(market(202, address(102)))
            .with_bet(bet(address(201), address(301), 0, 10))
            .with_bet(bet(address(201), address(302), 1, 11))
            .with_bet(bet(address(202), address(301), 0, 12))
            .with_block(42)
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over normalized racing data.

    use super::*;

    /// Names and locations are uppercase.
    pub fn assert_meetings_uppercase(meetings: &[Meeting]) {
        for meeting in meetings {
            assert_eq!(meeting.name, meeting.name.to_uppercase(), "meeting name not uppercase");
            assert_eq!(meeting.location, meeting.location.to_uppercase(), "location not uppercase");
        }
    }

    /// Race start times strictly increase within each meeting.
    pub fn assert_races_increasing(meeting: &Meeting) {
        for pair in meeting.races.windows(2) {
            assert!(
                pair[0].start_unix < pair[1].start_unix,
                "race {} starts at or after race {} in {}",
                pair[0].number,
                pair[1].number,
                meeting.name
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_meeting_fixtures_map_cleanly() {
        let meetings = fixtures::meetings();
        assert_eq!(meetings.len(), 2);
        assert_eq!(meetings[0].name, "DOOMBEN");
        assert_eq!(meetings[1].location, "NSW");
        assertions::assert_meetings_uppercase(&meetings);
        for meeting in &meetings {
            assertions::assert_races_increasing(meeting);
        }
    }

    #[test]
    fn test_runner_fixtures_map_cleanly() {
        let runners = fixtures::runners();
        assert_eq!(runners.len(), 3);
        assert_eq!(runners[0].proposition_id, "R20220514_DOO_3_W1");
        assert!(runners[2].vacant);
    }

    #[tokio::test]
    async fn test_fake_racing_source_counts_and_fails() {
        let source = fixtures::racing_source();
        assert_eq!(source.meetings(fixtures::race_day()).await.unwrap().len(), 2);
        assert!(matches!(
            source.runners(fixtures::race_day(), "DOO", 9).await,
            Err(PaddockError::Upstream(UpstreamError::NotFound { .. }))
        ));

        source.set_failing(true);
        assert!(source.meetings(fixtures::race_day()).await.is_err());
        assert_eq!(source.meeting_calls(), 2);
        assert_eq!(source.runner_calls(), 1);
    }

    #[tokio::test]
    async fn test_fake_protocol_registry() {
        let protocol = fixtures::protocol();
        assert_eq!(protocol.registry_count(RegistryKind::Vaults).await.unwrap(), 2);
        assert_eq!(
            protocol.registry_address_at(RegistryKind::Markets, 1).await.unwrap(),
            fixtures::address(202)
        );
        assert!(protocol.registry_address_at(RegistryKind::Markets, 2).await.is_err());
    }

    #[tokio::test]
    async fn test_fake_faucet_records_recipients() {
        let faucet = FakeFaucet::new(vec![(fixtures::address(900), "USDT".to_string())], "100");
        let receipt = faucet.drip(fixtures::address(301)).await.unwrap();
        assert_eq!(receipt.transfers.len(), 1);
        assert_eq!(faucet.recipients(), vec![fixtures::address(301)]);
    }

    proptest! {
        #[test]
        fn prop_generated_race_times_are_consistent(race in generators::arb_race(1)) {
            prop_assert_eq!(race.end_unix - race.start_unix, 1800);
            prop_assert_eq!(race.start_unix - race.close_unix, 120);
        }

        #[test]
        fn prop_generated_runner_proposition_ids(runner in generators::arb_runner(fixtures::race_day(), "DOO", 3)) {
            let expected = format!("R20220514_DOO_3_W{}", runner.number);
            prop_assert_eq!(runner.proposition_id, expected);
        }
    }
}
