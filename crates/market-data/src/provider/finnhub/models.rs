//! Finnhub API response structures.

use serde::Deserialize;

/// Response from /quote
#[derive(Debug, Deserialize)]
pub struct QuoteResponse {
    /// Current price
    pub c: Option<f64>,
    /// Change
    pub d: Option<f64>,
    /// Percent change
    pub dp: Option<f64>,
    pub h: Option<f64>,
    pub l: Option<f64>,
    pub o: Option<f64>,
    /// Previous close
    pub pc: Option<f64>,
    /// Unix timestamp
    pub t: Option<i64>,
}

/// Response from /stock/candle
#[derive(Debug, Deserialize)]
pub struct CandleResponse {
    /// "ok" or "no_data"
    pub s: String,
    #[serde(default)]
    pub c: Vec<f64>,
    #[serde(default)]
    pub h: Vec<f64>,
    #[serde(default)]
    pub l: Vec<f64>,
    #[serde(default)]
    pub o: Vec<f64>,
    #[serde(default)]
    pub v: Vec<f64>,
    #[serde(default)]
    pub t: Vec<i64>,
}

/// Response from /stock/profile2. Unknown symbols return `{}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub name: Option<String>,
    pub ticker: Option<String>,
    pub exchange: Option<String>,
    pub currency: Option<String>,
    pub country: Option<String>,
    pub finnhub_industry: Option<String>,
    pub weburl: Option<String>,
    pub logo: Option<String>,
    /// `YYYY-MM-DD`
    pub ipo: Option<String>,
    /// In millions of `currency`
    pub market_capitalization: Option<f64>,
    pub employee_total: Option<f64>,
}

/// One row of /stock/earnings
#[derive(Debug, Deserialize)]
pub struct EarningsItem {
    pub actual: Option<f64>,
    pub estimate: Option<f64>,
    /// Fiscal period end, `YYYY-MM-DD`
    pub period: String,
    pub quarter: Option<u8>,
    pub year: Option<i32>,
    pub symbol: Option<String>,
}

/// One row of /company-news and /news
#[derive(Debug, Deserialize)]
pub struct NewsArticle {
    pub id: i64,
    pub datetime: i64,
    pub headline: String,
    #[serde(default)]
    pub summary: String,
    pub url: String,
    pub source: String,
    #[serde(default)]
    pub image: String,
    /// Comma separated tickers
    #[serde(default)]
    pub related: String,
}

/// Response from /search
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub result: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    pub description: String,
    pub display_symbol: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub security_type: String,
}
