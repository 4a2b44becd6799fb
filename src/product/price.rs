use serde::{Deserialize, Serialize};
use std::fmt;

/// A listed price
///
/// Shop listings render prices as free text (`₹1,299.00`, `Rs. 450`). Text that
/// reduces to a plain decimal amount with at most two fractional digits becomes
/// an `Amount`; anything else is kept verbatim as `Unparseable` so a product is
/// never dropped just because its price could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Price {
    /// Amount in hundredths of the currency unit
    Amount { minor_units: i64 },

    /// Original text that did not parse as an amount
    Unparseable { raw: String },
}

impl Price {
    /// Parses listing text into a price
    ///
    /// Whitespace and grouping commas are ignored, as are any non-digit
    /// characters before the first digit or after the last one (currency
    /// symbols and codes).
    ///
    /// # Example
    ///
    /// ```
    /// use shelf_scraper::product::Price;
    ///
    /// assert_eq!(Price::parse("₹1,299.50"), Price::Amount { minor_units: 129_950 });
    /// assert!(!Price::parse("Call for price").is_amount());
    /// ```
    pub fn parse(raw: &str) -> Self {
        match parse_minor_units(raw) {
            Some(minor_units) => Self::Amount { minor_units },
            None => Self::Unparseable {
                raw: raw.trim().to_string(),
            },
        }
    }

    pub fn is_amount(&self) -> bool {
        matches!(self, Self::Amount { .. })
    }

    /// Amount in minor units, if the price parsed
    pub fn minor_units(&self) -> Option<i64> {
        match self {
            Self::Amount { minor_units } => Some(*minor_units),
            Self::Unparseable { .. } => None,
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amount { minor_units } => {
                write!(f, "{}.{:02}", minor_units / 100, minor_units % 100)
            }
            Self::Unparseable { raw } => f.write_str(raw),
        }
    }
}

fn parse_minor_units(raw: &str) -> Option<i64> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();

    let number = compact
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .trim_end_matches(|c: char| !c.is_ascii_digit());

    if number.is_empty() {
        return None;
    }

    let (whole, fraction) = match number.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (number, ""),
    };

    if whole.is_empty()
        || fraction.len() > 2
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let whole: i64 = whole.parse().ok()?;
    let cents: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction.parse().ok()?,
    };

    whole.checked_mul(100)?.checked_add(cents)
}
