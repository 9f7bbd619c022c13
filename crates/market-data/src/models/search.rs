//! Symbol search results.

use serde::{Deserialize, Serialize};

/// One match from a symbol search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Ticker as the vendor lists it, e.g. `SHOP.TO`
    pub symbol: String,
    pub name: String,
    /// Normalized security type: `EQUITY`, `ETF`, `FUND`, ...
    pub asset_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Vendor relevance, higher is better
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl SearchResult {
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        asset_type: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            asset_type: asset_type.into(),
            exchange: None,
            currency: None,
            score: None,
        }
    }

    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    /// 0 for an exact ticker match, 1 for a ticker prefix match, 2 otherwise.
    fn match_rank(&self, query: &str) -> u8 {
        let symbol = self.symbol.to_ascii_uppercase();
        let query = query.trim().to_ascii_uppercase();
        if symbol == query {
            0
        } else if symbol.starts_with(&query) {
            1
        } else {
            2
        }
    }
}

/// Move ticker matches for `query` ahead of name-only matches, keeping the
/// vendor's order within each group.
pub fn rank_search_results(results: &mut [SearchResult], query: &str) {
    results.sort_by_key(|result| result.match_rank(query));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_prefers_exact_then_prefix_matches() {
        let mut results = vec![
            SearchResult::new("APLE", "Apple Hospitality REIT", "EQUITY"),
            SearchResult::new("AAPL.MX", "Apple Inc", "EQUITY"),
            SearchResult::new("PINE", "Pineapple Energy", "EQUITY"),
            SearchResult::new("AAPL", "Apple Inc", "EQUITY"),
        ];

        rank_search_results(&mut results, " aapl");

        let symbols: Vec<&str> = results.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "AAPL.MX", "APLE", "PINE"]);
    }

    #[test]
    fn test_rank_keeps_vendor_order_for_name_queries() {
        let mut results = vec![
            SearchResult::new("AAPL", "Apple Inc", "EQUITY"),
            SearchResult::new("APLE", "Apple Hospitality REIT", "EQUITY"),
        ];

        rank_search_results(&mut results, "apple");

        assert_eq!(results[0].symbol, "AAPL");
        assert_eq!(results[1].symbol, "APLE");
    }
}
