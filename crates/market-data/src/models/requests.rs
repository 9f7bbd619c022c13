//! Normalized request payloads.
//!
//! Constructors are the single place where symbols get normalized, so every
//! adapter (and every cache key) sees the same canonical form.

use chrono::NaiveDate;
use serde::Serialize;

use super::historical::{DateRange, HistoricalPeriod};
use crate::errors::MarketDataError;
use crate::provider::normalize_symbol;

fn normalized(symbol: &str) -> Result<String, MarketDataError> {
    let symbol = normalize_symbol(symbol);
    if symbol.is_empty() {
        return Err(MarketDataError::InvalidRequest(
            "symbol must not be empty".to_string(),
        ));
    }
    Ok(symbol)
}

fn normalized_list<I, S>(symbols: I) -> Result<Vec<String>, MarketDataError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut output: Vec<String> = Vec::new();
    for symbol in symbols {
        let symbol = normalized(symbol.as_ref())?;
        if !output.contains(&symbol) {
            output.push(symbol);
        }
    }
    Ok(output)
}

fn positive_limit(limit: usize) -> Result<usize, MarketDataError> {
    if limit == 0 {
        return Err(MarketDataError::InvalidRequest(
            "limit must be greater than zero".to_string(),
        ));
    }
    Ok(limit)
}

/// Request payload for quote lookups.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct QuotesRequest {
    symbols: Vec<String>,
}

impl QuotesRequest {
    /// Normalizes and de-duplicates `symbols`, keeping first-seen order.
    pub fn new<I, S>(symbols: I) -> Result<Self, MarketDataError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let symbols = normalized_list(symbols)?;
        if symbols.is_empty() {
            return Err(MarketDataError::InvalidRequest(
                "quote request must include at least one symbol".to_string(),
            ));
        }
        Ok(Self { symbols })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }
}

/// Request payload for historical price series.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalDataRequest {
    symbol: String,
    period: HistoricalPeriod,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_range: Option<DateRange>,
}

impl HistoricalDataRequest {
    pub fn new(symbol: &str, period: HistoricalPeriod) -> Result<Self, MarketDataError> {
        Ok(Self {
            symbol: normalized(symbol)?,
            period,
            date_range: None,
        })
    }

    /// An explicit range takes precedence over the period.
    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn period(&self) -> HistoricalPeriod {
        self.period
    }

    pub fn date_range(&self) -> Option<DateRange> {
        self.date_range
    }

    /// The range to fetch: the explicit one, or the period ending `today`.
    pub fn effective_range(&self, today: NaiveDate) -> DateRange {
        self.date_range
            .unwrap_or_else(|| self.period.to_date_range(today))
    }
}

/// Request payload for company profiles.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct CompanyProfileRequest {
    symbol: String,
}

impl CompanyProfileRequest {
    pub fn new(symbol: &str) -> Result<Self, MarketDataError> {
        Ok(Self {
            symbol: normalized(symbol)?,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

/// Request payload shared by dividends, splits and earnings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorporateActionsRequest {
    symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_range: Option<DateRange>,
}

impl CorporateActionsRequest {
    pub fn new(symbol: &str) -> Result<Self, MarketDataError> {
        Ok(Self {
            symbol: normalized(symbol)?,
            date_range: None,
        })
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn date_range(&self) -> Option<DateRange> {
        self.date_range
    }
}

/// Request payload for news. No symbols means general market news.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct NewsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    symbols: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
}

impl NewsRequest {
    /// General market news.
    pub fn general() -> Self {
        Self::default()
    }

    pub fn for_symbols<I, S>(symbols: I) -> Result<Self, MarketDataError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let symbols = normalized_list(symbols)?;
        Ok(Self {
            symbols: if symbols.is_empty() {
                None
            } else {
                Some(symbols)
            },
            limit: None,
        })
    }

    pub fn with_limit(mut self, limit: usize) -> Result<Self, MarketDataError> {
        self.limit = Some(positive_limit(limit)?);
        Ok(self)
    }

    pub fn symbols(&self) -> Option<&[String]> {
        self.symbols.as_deref()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

/// Request payload for symbol search.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SearchRequest {
    query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
}

impl SearchRequest {
    /// The query is trimmed but keeps its case; names are searched too.
    pub fn new(query: &str) -> Result<Self, MarketDataError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MarketDataError::InvalidRequest(
                "search query must not be empty".to_string(),
            ));
        }
        Ok(Self {
            query: query.to_string(),
            limit: None,
        })
    }

    pub fn with_limit(mut self, limit: usize) -> Result<Self, MarketDataError> {
        self.limit = Some(positive_limit(limit)?);
        Ok(self)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}
