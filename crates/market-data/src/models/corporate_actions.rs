//! Dividends, splits and earnings.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Cash dividend event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dividend {
    pub symbol: String,
    pub ex_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_date: Option<NaiveDate>,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// Stock split, expressed as `to_factor`-for-`from_factor` (a 4:1 split is 4 / 1)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Split {
    pub symbol: String,
    pub date: NaiveDate,
    pub from_factor: Decimal,
    pub to_factor: Decimal,
}

impl Split {
    /// Shares held after the split per share held before.
    pub fn ratio(&self) -> Option<Decimal> {
        if self.from_factor.is_zero() {
            None
        } else {
            Some(self.to_factor / self.from_factor)
        }
    }
}

/// Reported or expected earnings for one fiscal period
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Earnings {
    pub symbol: String,
    pub period: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiscal_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiscal_quarter: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eps_actual: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eps_estimate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_actual: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_estimate: Option<Decimal>,
}

impl Earnings {
    /// Actual minus estimated EPS, when both are known.
    pub fn eps_surprise(&self) -> Option<Decimal> {
        Some(self.eps_actual? - self.eps_estimate?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_split_ratio() {
        let split = Split {
            symbol: "NVDA".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            from_factor: dec!(1),
            to_factor: dec!(10),
        };
        assert_eq!(split.ratio(), Some(dec!(10)));
    }

    #[test]
    fn test_eps_surprise_requires_both_sides() {
        let mut earnings = Earnings {
            symbol: "AAPL".to_string(),
            period: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            fiscal_year: Some(2024),
            fiscal_quarter: Some(2),
            eps_actual: Some(dec!(1.53)),
            eps_estimate: Some(dec!(1.50)),
            revenue_actual: None,
            revenue_estimate: None,
        };
        assert_eq!(earnings.eps_surprise(), Some(dec!(0.03)));

        earnings.eps_estimate = None;
        assert_eq!(earnings.eps_surprise(), None);
    }
}
