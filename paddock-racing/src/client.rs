//! Racing API HTTP client with bounded retries

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use paddock_core::{ConfigError, Meeting, PaddockResult, RetryPolicy, Runner, UpstreamError};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::mapper::{map_meetings, map_runners};
use crate::types::{ApiErrorBody, MeetingsEnvelope, RaceEnvelope};
use crate::{RacingSource, SERVICE};

/// Default public endpoint of the racing info service.
pub const DEFAULT_BASE_URL: &str = "https://api.beta.tab.com.au/v1/tab-info-service/racing";

/// Settings for [`RacingClient`].
#[derive(Debug, Clone)]
pub struct RacingClientConfig {
    pub base_url: String,
    pub jurisdiction: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for RacingClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            jurisdiction: "QLD".to_string(),
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

/// Racing API client.
///
/// Every request carries the configured jurisdiction and a request timeout.
/// Transport failures, 429 and 5xx responses are retried per the retry
/// policy; 4xx responses and undecodable bodies are not.
#[derive(Clone)]
pub struct RacingClient {
    client: Client,
    base_url: String,
    jurisdiction: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl RacingClient {
    pub fn new(config: RacingClientConfig) -> PaddockResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("paddock/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "racing_http_client".to_string(),
                value: config.base_url.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            jurisdiction: config.jurisdiction,
            timeout: config.timeout,
            retry: config.retry,
        })
    }

    pub fn meetings_url(&self, date: NaiveDate) -> String {
        format!("{}/dates/{}/meetings", self.base_url, date)
    }

    pub fn race_url(&self, date: NaiveDate, track: &str, race: u32) -> String {
        format!(
            "{}/dates/{}/meetings/R/{}/races/{}",
            self.base_url,
            date,
            track.to_uppercase(),
            race
        )
    }

    /// GET `url` and decode its JSON body, retrying transient failures.
    async fn get_json<T: DeserializeOwned>(&self, operation: &str, url: &str, what: &str) -> Result<T, UpstreamError> {
        self.retry
            .run(operation, UpstreamError::is_retryable, || self.get_once(url, what))
            .await
    }

    async fn get_once<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T, UpstreamError> {
        let response = self
            .client
            .get(url)
            .query(&[("jurisdiction", self.jurisdiction.as_str())])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                if e.is_timeout() {
                    self.transport_error(e)
                } else {
                    UpstreamError::MalformedPayload {
                        service: SERVICE.to_string(),
                        reason: e.to_string(),
                    }
                }
            });
        }

        let retry_after_ms = parse_retry_after_ms(response.headers()).unwrap_or(0);
        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, &body, retry_after_ms, what, url))
    }

    fn transport_error(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout {
                service: SERVICE.to_string(),
                elapsed: self.timeout,
            }
        } else {
            UpstreamError::Transport {
                service: SERVICE.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

/// Turn a non-success status into the matching upstream error.
pub(crate) fn classify_status(
    status: StatusCode,
    body: &str,
    retry_after_ms: u64,
    what: &str,
    key: &str,
) -> UpstreamError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => UpstreamError::RateLimited {
            service: SERVICE.to_string(),
            retry_after_ms,
        },
        StatusCode::NOT_FOUND => UpstreamError::NotFound {
            service: SERVICE.to_string(),
            what: what.to_string(),
            key: key.to_string(),
        },
        _ => {
            let message = serde_json::from_str::<ApiErrorBody>(body)
                .map(|parsed| parsed.error.message)
                .unwrap_or_else(|_| body.chars().take(256).collect());
            UpstreamError::RequestFailed {
                service: SERVICE.to_string(),
                status: status.as_u16(),
                message,
            }
        }
    }
}

fn parse_retry_after_ms(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
        .map(|seconds| (seconds * 1000.0) as u64)
}

#[async_trait]
impl RacingSource for RacingClient {
    async fn meetings(&self, date: NaiveDate) -> PaddockResult<Vec<Meeting>> {
        let url = self.meetings_url(date);
        tracing::debug!(%date, url = %url, "Fetching meetings");
        let raw: MeetingsEnvelope = self.get_json("racing.meetings", &url, "meetings").await?;
        Ok(map_meetings(&raw)?)
    }

    async fn runners(&self, date: NaiveDate, track: &str, race: u32) -> PaddockResult<Vec<Runner>> {
        let url = self.race_url(date, track, race);
        tracing::debug!(%date, track, race, url = %url, "Fetching race");
        let raw: RaceEnvelope = self.get_json("racing.race", &url, "race").await?;
        Ok(map_runners(&raw, date, track, race)?)
    }
}

impl std::fmt::Debug for RacingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RacingClient")
            .field("base_url", &self.base_url)
            .field("jurisdiction", &self.jurisdiction)
            .field("timeout", &self.timeout)
            .finish()
    }
}
