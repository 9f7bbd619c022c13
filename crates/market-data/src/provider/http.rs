//! Shared HTTP helper for vendor adapters.
//!
//! Wraps a `reqwest::Client` with the behavior every adapter needs:
//! - per-request timeout and a bounded retry budget with backoff
//! - optional client-side throttling from the configured quota
//! - mapping HTTP failures onto the [`MarketDataError`] taxonomy
//! - capture of `X-RateLimit-*` headers into a [`RateLimitInfo`] snapshot
//!
//! Only transport failures and 5xx responses are retried. Every other
//! classified failure is returned on the first attempt.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::RateLimitInfo;

use super::backoff::Backoff;
use super::config::ProviderConfig;
use super::throttle::Throttle;

const HEADER_LIMIT: &str = "x-ratelimit-limit";
const HEADER_REMAINING: &str = "x-ratelimit-remaining";
const HEADER_RESET: &str = "x-ratelimit-reset";

/// Query parameters that identify the looked-up resource in errors.
const RESOURCE_PARAMS: [&str; 3] = ["symbol", "q", "query"];

/// HTTP client bound to one provider.
#[derive(Debug)]
pub struct ProviderHttpClient {
    provider: String,
    base_url: String,
    client: Client,
    headers: HeaderMap,
    retries: u32,
    backoff: Backoff,
    throttle: Option<Throttle>,
    rate_limit: RwLock<Option<RateLimitInfo>>,
}

impl ProviderHttpClient {
    /// Build a client from the provider's timeout, retry and quota settings.
    pub fn new(config: &ProviderConfig) -> Result<Self, MarketDataError> {
        let client = Client::builder()
            .timeout(config.effective_timeout())
            .build()
            .map_err(|e| {
                MarketDataError::InvalidConfiguration(format!(
                    "{}: failed to build HTTP client: {}",
                    config.name, e
                ))
            })?;

        Ok(Self {
            provider: config.name.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            headers: HeaderMap::new(),
            retries: config.effective_retries(),
            backoff: Backoff::default(),
            throttle: config
                .rate_limit
                .map(|limit| Throttle::per_minute(limit.requests_per_minute)),
            rate_limit: RwLock::new(None),
        })
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Send `value` as header `name` on every request.
    ///
    /// The value is marked sensitive so it never shows up in logs.
    pub fn with_header(mut self, name: &'static str, value: &str) -> Result<Self, MarketDataError> {
        let mut header_value = HeaderValue::from_str(value).map_err(|_| {
            MarketDataError::InvalidConfiguration(format!(
                "{}: invalid value for header '{}'",
                self.provider, name
            ))
        })?;
        header_value.set_sensitive(true);
        self.headers
            .insert(HeaderName::from_static(name), header_value);
        Ok(self)
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Most recent quota snapshot reported by the vendor.
    pub fn rate_limit(&self) -> Option<RateLimitInfo> {
        self.read_rate_limit().clone()
    }

    fn read_rate_limit(&self) -> RwLockReadGuard<'_, Option<RateLimitInfo>> {
        self.rate_limit.read().unwrap_or_else(|poisoned| {
            warn!("Rate limit snapshot lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_rate_limit(&self) -> RwLockWriteGuard<'_, Option<RateLimitInfo>> {
        self.rate_limit.write().unwrap_or_else(|poisoned| {
            warn!("Rate limit snapshot lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// GET `path` relative to the base URL and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, MarketDataError> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt: u32 = 0;

        loop {
            match self.send_once(&url, query).await {
                Ok(body) => return self.decode(path, &body),
                Err(err) if is_transient(&err) && attempt < self.retries => {
                    let delay = self.backoff.delay(attempt);
                    attempt += 1;
                    warn!(
                        "{} {} failed ({}), retry {}/{} in {:?}",
                        self.provider, path, err, attempt, self.retries, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(self.finalize(err)),
            }
        }
    }

    async fn send_once(&self, url: &str, query: &[(&str, &str)]) -> Result<String, MarketDataError> {
        if let Some(throttle) = &self.throttle {
            throttle.acquire(&self.provider).await;
        }

        debug!("{} request: {} with {} params", self.provider, url, query.len());

        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();

        if status.is_success() || status == StatusCode::TOO_MANY_REQUESTS {
            if let Some(info) = parse_rate_limit_headers(&headers) {
                *self.write_rate_limit() = Some(info);
            }
        }

        if status.is_success() {
            return Ok(response.text().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_status(
            &self.provider,
            status,
            &headers,
            &body,
            resource_hint(url, query),
        ))
    }

    fn decode<T: DeserializeOwned>(&self, path: &str, body: &str) -> Result<T, MarketDataError> {
        serde_json::from_str(body).map_err(|e| MarketDataError::Provider {
            provider: self.provider.clone(),
            message: format!("Failed to parse response from {}: {}", path, e),
        })
    }

    /// Transport errors that outlived the retry budget mean the vendor is
    /// unreachable.
    fn finalize(&self, err: MarketDataError) -> MarketDataError {
        match err {
            MarketDataError::Network(e) => MarketDataError::ProviderUnavailable {
                provider: self.provider.clone(),
                message: if e.is_timeout() {
                    format!("request timed out: {}", e)
                } else {
                    e.to_string()
                },
            },
            other => other,
        }
    }
}

fn is_transient(err: &MarketDataError) -> bool {
    matches!(
        err,
        MarketDataError::Network(_) | MarketDataError::ProviderUnavailable { .. }
    )
}

fn resource_hint<'a>(url: &'a str, query: &[(&str, &'a str)]) -> &'a str {
    query
        .iter()
        .find(|(key, _)| RESOURCE_PARAMS.contains(key))
        .map(|(_, value)| *value)
        .unwrap_or(url)
}

/// Map a non-success HTTP status onto the error taxonomy.
pub fn classify_status(
    provider: &str,
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
    resource: &str,
) -> MarketDataError {
    let provider = provider.to_string();
    match status {
        StatusCode::TOO_MANY_REQUESTS => MarketDataError::RateLimitExceeded {
            provider,
            reset_at: parse_reset_at(headers, Utc::now()),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => MarketDataError::AuthenticationFailed {
            provider,
            message: error_message(status, body),
        },
        StatusCode::NOT_FOUND => MarketDataError::InvalidSymbol {
            provider,
            query: resource.to_string(),
        },
        s if s.is_server_error() => MarketDataError::ProviderUnavailable {
            provider,
            message: error_message(status, body),
        },
        _ => MarketDataError::Provider {
            provider,
            message: error_message(status, body),
        },
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: Option<String>,
        message: Option<String>,
    }

    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .unwrap_or_else(|| body.trim().chars().take(200).collect());

    if detail.is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("HTTP {} - {}", status, detail)
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Reset time from `Retry-After` (seconds) or `X-RateLimit-Reset` (epoch seconds).
pub fn parse_reset_at(headers: &HeaderMap, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if let Some(seconds) = header_u64(headers, RETRY_AFTER.as_str()) {
        let seconds = i64::try_from(seconds).ok()?;
        return Some(now + ChronoDuration::seconds(seconds));
    }
    header_u64(headers, HEADER_RESET)
        .and_then(|epoch| i64::try_from(epoch).ok())
        .and_then(|epoch| Utc.timestamp_opt(epoch, 0).single())
}

/// Quota snapshot from `X-RateLimit-*` headers, if any are present.
pub fn parse_rate_limit_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let info = RateLimitInfo {
        limit: header_u64(headers, HEADER_LIMIT).and_then(|v| u32::try_from(v).ok()),
        remaining: header_u64(headers, HEADER_REMAINING).and_then(|v| u32::try_from(v).ok()),
        reset_at: header_u64(headers, HEADER_RESET)
            .and_then(|epoch| i64::try_from(epoch).ok())
            .and_then(|epoch| Utc.timestamp_opt(epoch, 0).single()),
    };
    if info.is_empty() {
        None
    } else {
        Some(info)
    }
}
