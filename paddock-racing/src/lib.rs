//! Paddock Racing - racing data source
//!
//! Fetches meetings and race fields from the racing REST API and maps them
//! into [`paddock_core`] entities. Handlers depend on the [`RacingSource`]
//! trait so tests can substitute an in-memory source.

use async_trait::async_trait;
use chrono::NaiveDate;
use paddock_core::{Meeting, PaddockResult, Runner};

pub mod client;
pub mod mapper;
pub mod types;

pub use client::{RacingClient, RacingClientConfig, DEFAULT_BASE_URL};
pub use mapper::{map_meetings, map_runners};

/// Service name used in errors, logs and metrics.
pub const SERVICE: &str = "racing";

/// Source of normalized racing data.
#[async_trait]
pub trait RacingSource: Send + Sync {
    /// All meetings on `date`, in upstream order.
    async fn meetings(&self, date: NaiveDate) -> PaddockResult<Vec<Meeting>>;

    /// Runners and win odds for race number `race` at `track` on `date`.
    async fn runners(&self, date: NaiveDate, track: &str, race: u32) -> PaddockResult<Vec<Runner>>;
}
