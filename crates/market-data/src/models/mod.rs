//! Market data models
//!
//! This module contains the normalized data types every adapter produces:
//! - `quote` - Latest quote (Quote)
//! - `historical` - Historical bars and lookback periods (HistoricalPrice, HistoricalPeriod, DateRange)
//! - `profile` - Company profile data (CompanyProfile)
//! - `corporate_actions` - Dividends, splits and earnings
//! - `news` - News headlines (NewsItem)
//! - `search` - Search result data (SearchResult)
//! - `requests` - Normalized request payloads
//! - `response` - The envelope returned by providers and the manager (ProviderResponse)

mod corporate_actions;
mod historical;
mod news;
mod profile;
mod quote;
mod requests;
mod response;
mod search;

pub use corporate_actions::{Dividend, Earnings, Split};
pub use historical::{DateRange, HistoricalPeriod, HistoricalPrice};
pub use news::NewsItem;
pub use profile::CompanyProfile;
pub use quote::Quote;
pub use requests::{
    CompanyProfileRequest, CorporateActionsRequest, HistoricalDataRequest, NewsRequest,
    QuotesRequest, SearchRequest,
};
pub use response::{ProviderResponse, RateLimitInfo};
pub use search::{rank_search_results, SearchResult};
