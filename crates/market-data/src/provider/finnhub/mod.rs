//! Finnhub market data provider implementation.
//!
//! This module provides market data from the Finnhub API:
//! - Quotes via /quote (one call per symbol)
//! - Daily candles via /stock/candle
//! - Company profiles via /stock/profile2
//! - Earnings via /stock/earnings
//! - News via /company-news and /news
//! - Symbol search via /search
//!
//! Finnhub free tier is limited to 60 API calls per minute.
//! API documentation: https://finnhub.io/docs/api

mod models;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::{
    rank_search_results, CompanyProfile, CompanyProfileRequest, CorporateActionsRequest,
    Earnings, HistoricalDataRequest, HistoricalPrice, NewsItem, NewsRequest, ProviderResponse,
    Quote, QuotesRequest, RateLimitInfo, SearchRequest, SearchResult,
};
use crate::provider::{
    MarketDataProvider, Operation, ProviderCapabilities, ProviderConfig, ProviderHttpClient,
    RateLimit,
};

use models::{
    CandleResponse, EarningsItem, NewsArticle, ProfileResponse, QuoteResponse, SearchItem,
    SearchResponse,
};

pub const PROVIDER_NAME: &str = "finnhub";
pub const BASE_URL: &str = "https://finnhub.io/api/v1";
const TOKEN_HEADER: &str = "x-finnhub-token";

/// Company news lookback when the request carries no range.
const NEWS_LOOKBACK_DAYS: i64 = 7;

/// Finnhub market data provider.
pub struct FinnhubProvider {
    config: ProviderConfig,
    http: ProviderHttpClient,
}

impl FinnhubProvider {
    /// Default configuration for the given API key: public endpoint,
    /// free-tier quota of 60 requests per minute.
    pub fn default_config(api_key: impl Into<String>) -> ProviderConfig {
        ProviderConfig::new(PROVIDER_NAME, BASE_URL)
            .with_api_key(api_key)
            .with_rate_limit(RateLimit::per_minute(60))
    }

    pub fn new(api_key: impl Into<String>) -> Result<Self, MarketDataError> {
        Self::from_config(Self::default_config(api_key))
    }

    pub fn from_config(config: ProviderConfig) -> Result<Self, MarketDataError> {
        config.validate()?;
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                MarketDataError::InvalidConfiguration(format!(
                    "{}: API key is required",
                    config.name
                ))
            })?;
        let http = ProviderHttpClient::new(&config)?.with_header(TOKEN_HEADER, api_key)?;
        Ok(Self { config, http })
    }

    /// Replace the HTTP helper; lets tests shorten backoff.
    pub fn with_http_client(mut self, http: ProviderHttpClient) -> Self {
        self.http = http;
        self
    }

    fn respond<T>(&self, data: T) -> ProviderResponse<T> {
        ProviderResponse::new(data, self.name()).with_rate_limit(self.http.rate_limit())
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let response: QuoteResponse = self.http.get_json("/quote", &[("symbol", symbol)]).await?;
        map_quote(self.name(), symbol, response)
    }
}

#[async_trait]
impl MarketDataProvider for FinnhubProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            earnings: true,
            news: true,
            search: true,
            realtime: true,
            international_markets: true,
            ..ProviderCapabilities::core()
        }
    }

    async fn get_quotes(
        &self,
        request: &QuotesRequest,
    ) -> Result<ProviderResponse<Vec<Quote>>, MarketDataError> {
        let mut quotes = Vec::with_capacity(request.symbols().len());
        for symbol in request.symbols() {
            match self.fetch_quote(symbol).await {
                Ok(quote) => quotes.push(quote),
                // One unknown ticker shouldn't sink a batch
                Err(MarketDataError::InvalidSymbol { .. }) if request.symbols().len() > 1 => {
                    warn!("Finnhub has no quote for {}, skipping", symbol);
                }
                Err(e) => return Err(e),
            }
        }

        if quotes.is_empty() {
            return Err(MarketDataError::InvalidSymbol {
                provider: self.name().to_string(),
                query: request.symbols().join(","),
            });
        }

        Ok(self.respond(quotes))
    }

    async fn get_historical_data(
        &self,
        request: &HistoricalDataRequest,
    ) -> Result<ProviderResponse<Vec<HistoricalPrice>>, MarketDataError> {
        let range = request.effective_range(Utc::now().date_naive());
        let from = start_of_day(range.start).timestamp().to_string();
        let to = start_of_day(range.end + Duration::days(1)).timestamp().to_string();

        debug!(
            "Fetching Finnhub candles for {} from {} to {}",
            request.symbol(),
            range.start,
            range.end
        );

        let response: CandleResponse = self
            .http
            .get_json(
                "/stock/candle",
                &[
                    ("symbol", request.symbol()),
                    ("resolution", "D"),
                    ("from", &from),
                    ("to", &to),
                ],
            )
            .await?;

        let bars = map_candles(self.name(), request.symbol(), response)?;
        Ok(self.respond(bars))
    }

    async fn get_company_profile(
        &self,
        request: &CompanyProfileRequest,
    ) -> Result<ProviderResponse<CompanyProfile>, MarketDataError> {
        let response: ProfileResponse = self
            .http
            .get_json("/stock/profile2", &[("symbol", request.symbol())])
            .await?;
        let profile = map_profile(self.name(), request.symbol(), response)?;
        Ok(self.respond(profile))
    }

    async fn get_earnings(
        &self,
        request: &CorporateActionsRequest,
    ) -> Result<ProviderResponse<Vec<Earnings>>, MarketDataError> {
        self.ensure_capability(Operation::Earnings)?;

        let items: Vec<EarningsItem> = self
            .http
            .get_json("/stock/earnings", &[("symbol", request.symbol())])
            .await?;

        let mut earnings: Vec<Earnings> = items
            .into_iter()
            .filter_map(|item| map_earnings(request.symbol(), item))
            .filter(|e| request.date_range().map_or(true, |r| r.contains(e.period)))
            .collect();
        earnings.sort_by(|a, b| a.period.cmp(&b.period));

        Ok(self.respond(earnings))
    }

    async fn get_news(
        &self,
        request: &NewsRequest,
    ) -> Result<ProviderResponse<Vec<NewsItem>>, MarketDataError> {
        self.ensure_capability(Operation::News)?;

        let mut articles: Vec<NewsArticle> = Vec::new();

        match request.symbols() {
            None => {
                articles = self
                    .http
                    .get_json("/news", &[("category", "general")])
                    .await?;
            }
            Some(symbols) => {
                let today = Utc::now().date_naive();
                let from = (today - Duration::days(NEWS_LOOKBACK_DAYS)).to_string();
                let to = today.to_string();
                for symbol in symbols {
                    let batch: Vec<NewsArticle> = self
                        .http
                        .get_json(
                            "/company-news",
                            &[("symbol", symbol.as_str()), ("from", &from), ("to", &to)],
                        )
                        .await?;
                    articles.extend(batch);
                }
            }
        }

        let mut seen = HashSet::new();
        let mut items: Vec<NewsItem> = articles
            .into_iter()
            .filter(|a| seen.insert(a.id))
            .filter_map(map_article)
            .collect();
        items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        if let Some(limit) = request.limit() {
            items.truncate(limit);
        }

        Ok(self.respond(items))
    }

    async fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<ProviderResponse<Vec<SearchResult>>, MarketDataError> {
        self.ensure_capability(Operation::Search)?;

        let response: SearchResponse = self
            .http
            .get_json("/search", &[("q", request.query())])
            .await?;

        let mut results: Vec<SearchResult> =
            response.result.into_iter().map(map_search_item).collect();
        rank_search_results(&mut results, request.query());
        if let Some(limit) = request.limit() {
            results.truncate(limit);
        }

        debug!(
            "Finnhub: found {} search results for '{}'",
            results.len(),
            request.query()
        );
        Ok(self.respond(results))
    }

    fn get_rate_limit(&self) -> Option<RateLimitInfo> {
        self.http.rate_limit()
    }
}

// ============================================================================
// Mapping
// ============================================================================

fn to_decimal(value: f64) -> Option<Decimal> {
    if value.is_finite() {
        Decimal::try_from(value).ok()
    } else {
        None
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn map_quote(provider: &str, symbol: &str, response: QuoteResponse) -> Result<Quote, MarketDataError> {
    let not_found = || MarketDataError::InvalidSymbol {
        provider: provider.to_string(),
        query: symbol.to_string(),
    };

    // Unknown symbols come back as all zeros rather than an error
    let close = response.c.filter(|c| *c != 0.0).ok_or_else(not_found)?;
    let price = to_decimal(close).ok_or_else(|| MarketDataError::Provider {
        provider: provider.to_string(),
        message: format!("Invalid price for {}: {}", symbol, close),
    })?;

    let timestamp = response
        .t
        .filter(|ts| *ts > 0)
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .unwrap_or_else(Utc::now);

    let mut quote = Quote::new(symbol, price, timestamp);
    if let (Some(o), Some(h), Some(l)) = (
        response.o.and_then(to_decimal),
        response.h.and_then(to_decimal),
        response.l.and_then(to_decimal),
    ) {
        quote = quote.with_range(o, h, l);
    }
    if let Some(pc) = response.pc.and_then(to_decimal) {
        quote = quote.with_previous_close(pc);
    }
    // Prefer the vendor's own change figures when present
    if let Some(d) = response.d.and_then(to_decimal) {
        quote.change = Some(d);
    }
    if let Some(dp) = response.dp.and_then(to_decimal) {
        quote.change_percent = Some(dp);
    }
    Ok(quote)
}

fn map_candles(
    provider: &str,
    symbol: &str,
    response: CandleResponse,
) -> Result<Vec<HistoricalPrice>, MarketDataError> {
    if response.s == "no_data" {
        return Ok(Vec::new());
    }
    if response.s != "ok" {
        return Err(MarketDataError::Provider {
            provider: provider.to_string(),
            message: format!("Unexpected candle status for {}: {}", symbol, response.s),
        });
    }

    let len = response.t.len();
    if [response.c.len(), response.o.len(), response.h.len(), response.l.len()]
        .iter()
        .any(|n| *n != len)
    {
        return Err(MarketDataError::Provider {
            provider: provider.to_string(),
            message: "Mismatched array lengths in candle response".to_string(),
        });
    }

    let mut bars = Vec::with_capacity(len);
    for i in 0..len {
        let Some(date) = Utc
            .timestamp_opt(response.t[i], 0)
            .single()
            .map(|ts| ts.date_naive())
        else {
            warn!("Invalid timestamp at index {}: {}", i, response.t[i]);
            continue;
        };

        let (Some(open), Some(high), Some(low), Some(close)) = (
            to_decimal(response.o[i]),
            to_decimal(response.h[i]),
            to_decimal(response.l[i]),
            to_decimal(response.c[i]),
        ) else {
            warn!("Invalid prices at index {} for {}", i, symbol);
            continue;
        };

        let volume = response
            .v
            .get(i)
            .filter(|v| v.is_finite() && **v >= 0.0)
            .map(|v| *v as u64)
            .unwrap_or(0);

        bars.push(HistoricalPrice {
            date,
            open,
            high,
            low,
            close,
            adjusted_close: None,
            volume,
        });
    }

    bars.sort_by(|a, b| a.date.cmp(&b.date));
    Ok(bars)
}

fn map_profile(
    provider: &str,
    symbol: &str,
    response: ProfileResponse,
) -> Result<CompanyProfile, MarketDataError> {
    let Some(name) = response.name.clone().or_else(|| response.ticker.clone()) else {
        return Err(MarketDataError::InvalidSymbol {
            provider: provider.to_string(),
            query: symbol.to_string(),
        });
    };

    Ok(CompanyProfile {
        symbol: response.ticker.unwrap_or_else(|| symbol.to_string()),
        name,
        description: None,
        // Finnhub only exposes one industry classification
        sector: response.finnhub_industry.clone(),
        industry: response.finnhub_industry,
        exchange: response.exchange,
        currency: response.currency,
        country: response.country,
        website: response.weburl.filter(|s| !s.is_empty()),
        logo_url: response.logo.filter(|s| !s.is_empty()),
        ipo_date: response
            .ipo
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        employees: response
            .employee_total
            .filter(|e| e.is_finite() && *e > 0.0)
            .map(|e| e as u64),
        market_cap: response
            .market_capitalization
            .and_then(to_decimal)
            .and_then(|mc| mc.checked_mul(Decimal::from(1_000_000))),
    })
}

fn map_earnings(symbol: &str, item: EarningsItem) -> Option<Earnings> {
    let period = NaiveDate::parse_from_str(&item.period, "%Y-%m-%d").ok()?;
    Some(Earnings {
        symbol: item.symbol.unwrap_or_else(|| symbol.to_string()),
        period,
        fiscal_year: item.year,
        fiscal_quarter: item.quarter,
        eps_actual: item.actual.and_then(to_decimal),
        eps_estimate: item.estimate.and_then(to_decimal),
        revenue_actual: None,
        revenue_estimate: None,
    })
}

fn map_article(article: NewsArticle) -> Option<NewsItem> {
    let published_at = Utc.timestamp_opt(article.datetime, 0).single()?;
    let non_empty = |s: String| if s.trim().is_empty() { None } else { Some(s) };
    Some(NewsItem {
        id: article.id.to_string(),
        title: article.headline,
        summary: non_empty(article.summary),
        url: article.url,
        source: article.source,
        published_at,
        symbols: article
            .related
            .split(',')
            .map(crate::provider::normalize_symbol)
            .filter(|s| !s.is_empty())
            .collect(),
        image_url: non_empty(article.image),
    })
}

fn map_search_item(item: SearchItem) -> SearchResult {
    let asset_type = map_security_type(&item.security_type);
    let mut result = SearchResult::new(item.symbol, item.description, asset_type);
    // Suffix after the dot in displaySymbol is the exchange code (e.g., SHOP.TO)
    if let Some((_, exchange)) = item.display_symbol.rsplit_once('.') {
        result = result.with_exchange(exchange);
    }
    result
}

/// Map Finnhub security type to our asset type.
fn map_security_type(finnhub_type: &str) -> String {
    match finnhub_type.to_lowercase().as_str() {
        "common stock" | "stock" => "Stock".to_string(),
        "etf" | "etp" => "ETF".to_string(),
        "mutual fund" | "fund" => "Mutual Fund".to_string(),
        "adr" | "american depositary receipt" => "ADR".to_string(),
        "reit" => "REIT".to_string(),
        "preferred stock" | "preferred" => "Preferred Stock".to_string(),
        _ => finnhub_type.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
