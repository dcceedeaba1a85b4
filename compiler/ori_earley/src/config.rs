//! Parser configuration.

/// Environment variable overriding [`ParserConfig::max_penalty`].
pub const MAX_PENALTY_ENV: &str = "ORI_EARLEY_MAX_PENALTY";

/// Environment variable overriding [`ParserConfig::max_trees`].
pub const MAX_TREES_ENV: &str = "ORI_EARLEY_MAX_TREES";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ParserConfig {
    /// Trees costlier than this are discarded while building.
    pub max_penalty: u32,
    /// Upper bound on trees returned by [`Parser::forest`](crate::Parser::forest).
    /// The cheapest are kept.
    pub max_trees: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            max_penalty: 8,
            max_trees: 256,
        }
    }
}

impl ParserConfig {
    /// Only trees that needed no repair.
    pub fn exact() -> Self {
        ParserConfig {
            max_penalty: 0,
            ..ParserConfig::default()
        }
    }

    #[must_use]
    pub fn with_max_penalty(mut self, max_penalty: u32) -> Self {
        self.max_penalty = max_penalty;
        self
    }

    #[must_use]
    pub fn with_max_trees(mut self, max_trees: usize) -> Self {
        self.max_trees = max_trees.max(1);
        self
    }

    /// Defaults, overridden by `ORI_EARLEY_MAX_PENALTY` and
    /// `ORI_EARLEY_MAX_TREES` when set to valid numbers.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = ParserConfig::default();
        if let Some(value) = lookup(MAX_PENALTY_ENV).and_then(|v| v.trim().parse().ok()) {
            config.max_penalty = value;
        }
        if let Some(value) = lookup(MAX_TREES_ENV).and_then(|v| v.trim().parse().ok()) {
            config = config.with_max_trees(value);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_overrides_defaults() {
        let config = ParserConfig::from_lookup(|name| match name {
            MAX_PENALTY_ENV => Some(" 3 ".to_string()),
            MAX_TREES_ENV => Some("0".to_string()),
            _ => None,
        });
        assert_eq!(config.max_penalty, 3);
        assert_eq!(config.max_trees, 1);
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let config = ParserConfig::from_lookup(|_| Some("lots".to_string()));
        assert_eq!(config, ParserConfig::default());
    }
}
