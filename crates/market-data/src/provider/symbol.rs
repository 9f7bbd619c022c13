/// Canonical form of a ticker: surrounding whitespace removed, uppercased.
///
/// ```
/// use quoteline_market_data::provider::normalize_symbol;
///
/// assert_eq!(normalize_symbol("  brk.b "), "BRK.B");
/// ```
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}
