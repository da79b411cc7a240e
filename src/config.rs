//! Rebuild configuration
//!
//! Defaults suit bulk rebuilds of typical documents. Environment variables
//! override individual settings without recompiling:
//!
//! - `XMLSKEL_STACK_CHECK`: `trust` or `validate`
//! - `XMLSKEL_MAX_CATEGORIES`: distinct values kept per name
//! - `XMLSKEL_PROGRESS_INTERVAL`: positions between progress log lines

/// How the rebuilder treats the ancestor stack discipline of its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StackCheck {
    /// Assume the encoder upheld the invariant; inconsistencies are logged.
    Trust,
    /// Reject positions whose parent is not on the open ancestor stack.
    #[default]
    Validate,
}

impl StackCheck {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trust" => Some(StackCheck::Trust),
            "validate" => Some(StackCheck::Validate),
            _ => None,
        }
    }
}

/// Settings for dictionaries and the statistics rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsConfig {
    /// Initial bucket count of name dictionaries (rounded to a power of two)
    pub initial_capacity: usize,
    /// Distinct values tracked per name before it stops being a category
    pub max_categories: usize,
    /// Input validation mode
    pub stack_check: StackCheck,
    /// Positions between two progress log lines (0 disables them)
    pub progress_interval: u32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        StatsConfig {
            initial_capacity: 8,
            max_categories: 50,
            stack_check: StackCheck::Validate,
            progress_interval: 1 << 16,
        }
    }
}

impl StatsConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from a key lookup; unparsable values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(check) = lookup("XMLSKEL_STACK_CHECK").and_then(|v| StackCheck::parse(&v)) {
            self.stack_check = check;
        }
        if let Some(n) = lookup("XMLSKEL_MAX_CATEGORIES").and_then(|v| v.trim().parse().ok()) {
            self.max_categories = n;
        }
        if let Some(n) = lookup("XMLSKEL_PROGRESS_INTERVAL").and_then(|v| v.trim().parse().ok()) {
            self.progress_interval = n;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StatsConfig::default();
        assert_eq!(config.stack_check, StackCheck::Validate);
        assert_eq!(config.max_categories, 50);
    }

    #[test]
    fn test_overrides() {
        let config = StatsConfig::default().with_overrides(|key| match key {
            "XMLSKEL_STACK_CHECK" => Some("Trust".to_string()),
            "XMLSKEL_MAX_CATEGORIES" => Some(" 7 ".to_string()),
            "XMLSKEL_PROGRESS_INTERVAL" => Some("abc".to_string()),
            _ => None,
        });
        assert_eq!(config.stack_check, StackCheck::Trust);
        assert_eq!(config.max_categories, 7);
        assert_eq!(config.progress_interval, 1 << 16);
    }
}
