//! Per-name value statistics
//!
//! Values seen for a name (attribute values, leaf element text) are typed
//! on the fly. The kind only ever widens:
//!
//! ```text
//! None -> Integer -> Double -> Category -> Text
//! ```
//!
//! Distinct values are tracked until more than `max_categories` have been
//! seen. Numeric kinds keep a min/max range even after that.

use crate::error::CapacityError;
use crate::hash::TokenSet;

/// Inferred type of the values of a name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValueKind {
    /// No non-blank value seen
    None,
    /// All values are integers
    Integer,
    /// All values are numbers
    Double,
    /// Few distinct values
    Category,
    /// Anything else
    Text,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::None => "none",
            ValueKind::Integer => "integer",
            ValueKind::Double => "double",
            ValueKind::Category => "category",
            ValueKind::Text => "text",
        }
    }

    fn is_numeric(self) -> bool {
        matches!(self, ValueKind::Integer | ValueKind::Double)
    }
}

/// Statistics of one interned name
#[derive(Debug, Clone)]
pub struct NameStats {
    /// Occurrences of the name
    pub count: u32,
    /// Sum of value byte lengths
    pub len: u64,
    /// Inferred value kind
    pub kind: ValueKind,
    /// Smallest numeric value (numeric kinds only)
    pub min: f64,
    /// Largest numeric value (numeric kinds only)
    pub max: f64,
    /// Distinct values; None once the limit was exceeded
    categories: Option<TokenSet>,
}

impl Default for NameStats {
    fn default() -> Self {
        NameStats {
            count: 0,
            len: 0,
            kind: ValueKind::None,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            categories: Some(TokenSet::with_capacity(4)),
        }
    }
}

impl NameStats {
    /// Fold a value into the statistics.
    pub fn add(&mut self, value: &[u8], max_categories: usize) -> Result<(), CapacityError> {
        self.len += value.len() as u64;

        let trimmed = value.trim_ascii();
        if trimmed.is_empty() {
            return Ok(());
        }

        if let Some(cats) = self.categories.as_mut() {
            cats.intern(trimmed)?;
            if cats.len() > max_categories {
                self.categories = None;
            }
        }

        let number = parse_number(trimmed);
        self.kind = match (self.kind, number) {
            (ValueKind::None | ValueKind::Integer, Some(Number::Integer(_))) => ValueKind::Integer,
            (ValueKind::None | ValueKind::Integer | ValueKind::Double, Some(_)) => ValueKind::Double,
            (ValueKind::Text, _) => ValueKind::Text,
            _ if self.categories.is_some() => ValueKind::Category,
            _ => ValueKind::Text,
        };

        if self.kind.is_numeric() {
            if let Some(n) = number {
                let v = n.as_f64();
                self.min = self.min.min(v);
                self.max = self.max.max(v);
            }
        }
        Ok(())
    }

    /// Number of distinct values, if still tracked
    pub fn distinct(&self) -> Option<usize> {
        self.categories.as_ref().map(TokenSet::len)
    }

    /// Distinct values, if still tracked
    pub fn categories(&self) -> Option<&TokenSet> {
        self.categories.as_ref()
    }

    /// Numeric range, for numeric kinds
    pub fn range(&self) -> Option<(f64, f64)> {
        if self.kind.is_numeric() {
            Some((self.min, self.max))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Integer(i64),
    Double(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Integer(i) => i as f64,
            Number::Double(d) => d,
        }
    }
}

fn parse_number(value: &[u8]) -> Option<Number> {
    // Reject "inf", "NaN" and friends up front
    if !value.iter().any(u8::is_ascii_digit) {
        return None;
    }
    let s = std::str::from_utf8(value).ok()?;
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::Integer(i));
    }
    s.parse::<f64>()
        .ok()
        .filter(|d| d.is_finite())
        .map(Number::Double)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(values: &[&str], max: usize) -> NameStats {
        let mut stats = NameStats::default();
        for v in values {
            stats.add(v.as_bytes(), max).unwrap();
        }
        stats
    }

    #[test]
    fn test_integer_range() {
        let stats = feed(&["3", " 10 ", "-2"], 50);
        assert_eq!(stats.kind, ValueKind::Integer);
        assert_eq!(stats.range(), Some((-2.0, 10.0)));
        assert_eq!(stats.len, 7);
    }

    #[test]
    fn test_widens_to_double() {
        let stats = feed(&["1", "2.5"], 50);
        assert_eq!(stats.kind, ValueKind::Double);
        assert_eq!(stats.range(), Some((1.0, 2.5)));
    }

    #[test]
    fn test_category_then_text() {
        let stats = feed(&["red", "green", "red"], 50);
        assert_eq!(stats.kind, ValueKind::Category);
        assert_eq!(stats.distinct(), Some(2));

        let stats = feed(&["a", "b", "c"], 2);
        assert_eq!(stats.kind, ValueKind::Text);
        assert_eq!(stats.distinct(), None);
    }

    #[test]
    fn test_numeric_survives_many_distinct() {
        let values: Vec<String> = (0..100).map(|i| i.to_string()).collect();
        let refs: Vec<&str> = values.iter().map(String::as_str).collect();
        let stats = feed(&refs, 10);
        assert_eq!(stats.kind, ValueKind::Integer);
        assert_eq!(stats.range(), Some((0.0, 99.0)));
    }

    #[test]
    fn test_number_then_word_is_category() {
        let stats = feed(&["1", "one"], 50);
        assert_eq!(stats.kind, ValueKind::Category);
        assert_eq!(stats.range(), None);
    }

    #[test]
    fn test_blank_values() {
        let stats = feed(&["  ", ""], 50);
        assert_eq!(stats.kind, ValueKind::None);
        assert_eq!(stats.len, 2);
    }

    #[test]
    fn test_special_floats_are_text() {
        let stats = feed(&["inf", "NaN"], 50);
        assert_eq!(stats.kind, ValueKind::Category);
    }
}
