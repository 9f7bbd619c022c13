//! Provider capabilities and the logical operations they gate.
//!
//! Capability flags are checked before any network call: callers and the
//! manager never invoke an operation whose flag is false.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical market data operations.
///
/// `as_str` is the stable name used in cache keys, logs and errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Quotes,
    HistoricalData,
    CompanyProfile,
    Dividends,
    Splits,
    Earnings,
    News,
    Search,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::Quotes,
        Operation::HistoricalData,
        Operation::CompanyProfile,
        Operation::Dividends,
        Operation::Splits,
        Operation::Earnings,
        Operation::News,
        Operation::Search,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quotes => "get_quotes",
            Self::HistoricalData => "get_historical_data",
            Self::CompanyProfile => "get_company_profile",
            Self::Dividends => "get_dividends",
            Self::Splits => "get_splits",
            Self::Earnings => "get_earnings",
            Self::News => "get_news",
            Self::Search => "search",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes what a market data provider can do.
///
/// The first eight flags gate [`Operation`]s. The remaining flags describe
/// coverage and are informational only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCapabilities {
    pub quotes: bool,
    pub historical_data: bool,
    pub company_profile: bool,
    pub dividends: bool,
    pub splits: bool,
    pub earnings: bool,
    pub news: bool,
    pub search: bool,
    pub realtime: bool,
    pub extended_hours: bool,
    pub international_markets: bool,
    pub crypto_currency: bool,
    pub forex: bool,
    pub commodities: bool,
}

impl ProviderCapabilities {
    /// The three operations every provider has to implement.
    pub fn core() -> Self {
        Self {
            quotes: true,
            historical_data: true,
            company_profile: true,
            ..Self::default()
        }
    }

    /// Every operation flag set; coverage flags untouched.
    pub fn all_operations() -> Self {
        Self {
            dividends: true,
            splits: true,
            earnings: true,
            news: true,
            search: true,
            ..Self::core()
        }
    }

    pub fn supports(&self, operation: Operation) -> bool {
        match operation {
            Operation::Quotes => self.quotes,
            Operation::HistoricalData => self.historical_data,
            Operation::CompanyProfile => self.company_profile,
            Operation::Dividends => self.dividends,
            Operation::Splits => self.splits,
            Operation::Earnings => self.earnings,
            Operation::News => self.news,
            Operation::Search => self.search,
        }
    }

    /// Toggle the flag gating `operation`.
    pub fn with(mut self, operation: Operation, enabled: bool) -> Self {
        let flag = match operation {
            Operation::Quotes => &mut self.quotes,
            Operation::HistoricalData => &mut self.historical_data,
            Operation::CompanyProfile => &mut self.company_profile,
            Operation::Dividends => &mut self.dividends,
            Operation::Splits => &mut self.splits,
            Operation::Earnings => &mut self.earnings,
            Operation::News => &mut self.news,
            Operation::Search => &mut self.search,
        };
        *flag = enabled;
        self
    }

    /// Operations this provider can serve, in declaration order.
    pub fn operations(&self) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| self.supports(*op))
            .collect()
    }
}
