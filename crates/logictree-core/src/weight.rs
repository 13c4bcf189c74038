//! Exact branch weights.
//!
//! Weights are [`rust_decimal::Decimal`] values: a 96-bit integer mantissa
//! with a decimal scale of up to 28 digits. Document weights such as `0.3`
//! are represented exactly, so "weights sum to one" is checked with `==`
//! rather than an epsilon. Products of path weights stay exact as long as the
//! combined scale fits in 28 digits, which covers any realistic tree depth
//! for weights written with a handful of decimals.

use rust_decimal::Decimal;

/// Exact decimal weight of a branch or of a whole path.
pub type Weight = Decimal;

/// Error produced when weight text is not an exact decimal in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeightParseError {
    /// Text is not a decimal number representable without rounding.
    Malformed(String),
    /// Decimal lies outside the closed unit interval.
    OutOfRange(Decimal),
}

impl std::fmt::Display for WeightParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeightParseError::Malformed(text) => write!(f, "invalid weight {text:?}"),
            WeightParseError::OutOfRange(w) => write!(f, "weight {w} is not in [0, 1]"),
        }
    }
}

impl std::error::Error for WeightParseError {}

/// Parses the text of an `uncertaintyWeight` element.
///
/// # Examples
///
/// ```
/// use logictree_core::weight::parse_weight;
/// use rust_decimal::Decimal;
///
/// assert_eq!(parse_weight(" 0.3 ").unwrap(), Decimal::new(3, 1));
/// assert!(parse_weight("1.5").is_err());
/// assert!(parse_weight("abc").is_err());
/// ```
pub fn parse_weight(text: &str) -> Result<Weight, WeightParseError> {
    let text = text.trim();
    let weight = Decimal::from_str_exact(text)
        .map_err(|_| WeightParseError::Malformed(text.to_string()))?;
    if weight < Decimal::ZERO || weight > Decimal::ONE {
        return Err(WeightParseError::OutOfRange(weight));
    }
    Ok(weight)
}

/// Returns true when the weights add up to exactly one.
pub fn sums_to_one<'a>(weights: impl IntoIterator<Item = &'a Weight>) -> bool {
    weights.into_iter().copied().sum::<Decimal>() == Decimal::ONE
}

/// Multiplies a sequence of weights, starting from one.
pub fn product(weights: impl IntoIterator<Item = Weight>) -> Weight {
    weights.into_iter().fold(Decimal::ONE, |acc, weight| acc * weight)
}
