//! Cache keys.
//!
//! Keys are only built through the constructors below so every route agrees
//! on the layout. Track mnemonics are uppercased and addresses lowercased
//! before they become part of a key, so `0xAbC` and `0xabc` share an entry.

use chrono::NaiveDate;
use paddock_core::RegistryKind;
use std::fmt;

/// Groups of cached data that share a TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCategory {
    Meetings,
    Race,
    Listings,
    Details,
    Performance,
    Liquidity,
    History,
}

impl CacheCategory {
    pub const ALL: [CacheCategory; 7] = [
        Self::Meetings,
        Self::Race,
        Self::Listings,
        Self::Details,
        Self::Performance,
        Self::Liquidity,
        Self::History,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Meetings => "meetings",
            Self::Race => "race",
            Self::Listings => "listings",
            Self::Details => "details",
            Self::Performance => "performance",
            Self::Liquidity => "liquidity",
            Self::History => "history",
        }
    }
}

/// A cache key tagged with the category that decides its TTL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    category: CacheCategory,
    key: String,
}

impl CacheKey {
    fn new(category: CacheCategory, key: String) -> Self {
        Self { category, key }
    }

    pub fn meetings(date: NaiveDate) -> Self {
        Self::new(CacheCategory::Meetings, format!("meetings:{}", date))
    }

    pub fn race(date: NaiveDate, track: &str, race: u32) -> Self {
        Self::new(
            CacheCategory::Race,
            format!("race:{}:{}:{}", date, track.to_uppercase(), race),
        )
    }

    pub fn registry(kind: RegistryKind) -> Self {
        Self::new(CacheCategory::Listings, format!("registry:{}", kind))
    }

    pub fn registry_markets() -> Self {
        Self::registry(RegistryKind::Markets)
    }

    pub fn market(address: &str) -> Self {
        Self::new(CacheCategory::Details, format!("market:{}", address.to_lowercase()))
    }

    pub fn vault(address: &str) -> Self {
        Self::new(CacheCategory::Details, format!("vault:{}", address.to_lowercase()))
    }

    pub fn vault_performance() -> Self {
        Self::new(CacheCategory::Performance, "vaults:performance".to_string())
    }

    pub fn vault_liquidity() -> Self {
        Self::new(CacheCategory::Liquidity, "vaults:liquidity".to_string())
    }

    /// Bet history for one owner, or for everyone when `account` is `None`.
    pub fn history(account: Option<&str>) -> Self {
        let key = match account {
            Some(account) => format!("history:{}", account.to_lowercase()),
            None => "history:all".to_string(),
        };
        Self::new(CacheCategory::History, key)
    }

    pub fn category(&self) -> CacheCategory {
        self.category
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Key prefixed with a namespace, as stored in shared backends.
    pub fn namespaced(&self, namespace: &str) -> String {
        format!("{}:{}", namespace, self.key)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}
