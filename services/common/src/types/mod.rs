//! Typed wire records served by an exchange adapter
//!
//! Records are built only after the raw JSON passed its conformance
//! assertions, so optional wire fields map directly to `Option<T>`.

pub mod candle;
pub mod info;
pub mod market;
pub mod orderbook;
pub mod ticker;
pub mod trade;

pub use candle::*;
pub use info::*;
pub use market::*;
pub use orderbook::*;
pub use ticker::*;
pub use trade::*;

/// Parse a numeric string the way adapters are required to format them.
///
/// The whole trimmed string must be a finite decimal number.
pub fn parse_numeric(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse an optional numeric field, treating absence and garbage alike
pub fn parse_optional_numeric(s: Option<&str>) -> Option<f64> {
    s.and_then(parse_numeric)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_numeric("100.00"), Some(100.0));
        assert_eq!(parse_numeric(" 1e3 "), Some(1000.0));
        assert_eq!(parse_numeric("-0.5"), Some(-0.5));
        assert_eq!(parse_numeric(""), None);
        assert_eq!(parse_numeric("abc"), None);
        assert_eq!(parse_numeric("12abc"), None);
        assert_eq!(parse_numeric("NaN"), None);
        assert_eq!(parse_numeric("inf"), None);
    }
}
