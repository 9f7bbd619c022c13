use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// News headline related to one or more symbols.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    /// Vendor-assigned identifier
    pub id: String,

    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    pub url: String,

    /// Publisher (e.g., "Reuters")
    pub source: String,

    pub published_at: DateTime<Utc>,

    /// Related tickers, normalized
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub symbols: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}
