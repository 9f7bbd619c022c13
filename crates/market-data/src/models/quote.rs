use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Normalized market data quote
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Normalized ticker (uppercase, trimmed)
    pub symbol: String,

    /// Last traded/current price (required)
    pub price: Decimal,

    /// Absolute change versus previous close
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<Decimal>,

    /// Percent change versus previous close
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<Decimal>,

    /// Opening price of the session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<Decimal>,

    /// Session high
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<Decimal>,

    /// Session low
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<Decimal>,

    /// Previous session close
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<Decimal>,

    /// Traded volume
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,

    /// Market capitalization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<Decimal>,

    /// Quote currency
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    /// Exchange the quote came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,

    /// Timestamp of the quote
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Create a new quote with minimal required fields
    pub fn new(symbol: impl Into<String>, price: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            change: None,
            change_percent: None,
            open: None,
            high: None,
            low: None,
            previous_close: None,
            volume: None,
            market_cap: None,
            currency: None,
            exchange: None,
            timestamp,
        }
    }

    /// Set session open/high/low.
    pub fn with_range(mut self, open: Decimal, high: Decimal, low: Decimal) -> Self {
        self.open = Some(open);
        self.high = Some(high);
        self.low = Some(low);
        self
    }

    /// Set previous close and derive change fields from it.
    ///
    /// Derived fields are left empty when they fall outside `Decimal` range.
    pub fn with_previous_close(mut self, previous_close: Decimal) -> Self {
        let change = self.price.checked_sub(previous_close);
        self.previous_close = Some(previous_close);
        self.change = change;
        self.change_percent = change
            .filter(|_| !previous_close.is_zero())
            .and_then(|c| c.checked_div(previous_close))
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map(|pct| pct.round_dp(4));
        self
    }

    /// Set the quote currency.
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }
}
