use crate::profile::TimingRecord;
use std::str::FromStr;

/// Error returned when parsing a category pattern.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum PatternError {
    #[error("wildcard is only allowed at the end of a pattern: {0:?}")]
    InteriorWildcard(String),
}

/// One category pattern: either an exact dotted category, or a prefix
/// followed by `*`.
///
/// `"db.*"` matches `"db.query"` and `"db.execute"` but not `"cache.get"`;
/// `"db"` matches only the category `"db"` itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryPattern {
    Exact(String),
    Prefix(String),
}

impl CategoryPattern {
    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryPattern::Exact(exact) => category == exact,
            CategoryPattern::Prefix(prefix) => category.starts_with(prefix),
        }
    }
}

impl FromStr for CategoryPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.find('*') {
            Some(pos) if pos == s.len() - 1 => {
                Ok(CategoryPattern::Prefix(s[..pos].to_string()))
            }
            Some(_) => Err(PatternError::InteriorWildcard(s.to_string())),
            None => Ok(CategoryPattern::Exact(s.to_string())),
        }
    }
}

/// Inclusion/exclusion filter over profiling results.
///
/// A record passes when it matches the inclusion side (an empty
/// inclusion list matches everything) and matches no exclusion
/// pattern. Filtering preserves the relative order of its input.
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    include: Vec<CategoryPattern>,
    exclude: Vec<CategoryPattern>,
}

impl CategoryFilter {
    /// Match-all filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a filter from pattern strings.
    pub fn from_patterns(include: &[&str], exclude: &[&str]) -> Result<Self, PatternError> {
        Ok(Self {
            include: include
                .iter()
                .map(|s| s.parse())
                .collect::<Result<_, _>>()?,
            exclude: exclude
                .iter()
                .map(|s| s.parse())
                .collect::<Result<_, _>>()?,
        })
    }

    pub fn include(mut self, pattern: CategoryPattern) -> Self {
        self.include.push(pattern);
        self
    }

    pub fn exclude(mut self, pattern: CategoryPattern) -> Self {
        self.exclude.push(pattern);
        self
    }

    /// Whether a single category passes this filter.
    pub fn accepts(&self, category: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| p.matches(category));
        included && !self.exclude.iter().any(|p| p.matches(category))
    }

    /// Apply the filter to a sequence of timing records, preserving
    /// their relative order.
    pub fn apply(&self, timings: Vec<TimingRecord>) -> Vec<TimingRecord> {
        timings
            .into_iter()
            .filter(|t| self.accepts(&t.category))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Payload;
    use chrono::Utc;

    fn timing(category: &str) -> TimingRecord {
        TimingRecord {
            info: Payload::from(category),
            category: category.to_string(),
            timestamp: Utc::now(),
            trace: Vec::new(),
            depth: 0,
            duration: 0.0,
        }
    }

    #[test]
    fn wildcard_pattern_is_a_prefix_match() {
        let pattern: CategoryPattern = "db.*".parse().unwrap();
        assert!(pattern.matches("db.query"));
        assert!(pattern.matches("db.execute"));
        assert!(!pattern.matches("cache.get"));
    }

    #[test]
    fn plain_pattern_is_exact() {
        let pattern: CategoryPattern = "db".parse().unwrap();
        assert!(pattern.matches("db"));
        assert!(!pattern.matches("db.query"));
    }

    #[test]
    fn interior_wildcard_is_rejected() {
        let err = "db.*.query".parse::<CategoryPattern>().unwrap_err();
        assert_eq!(err, PatternError::InteriorWildcard("db.*.query".into()));
    }

    #[test]
    fn include_prefix_keeps_order() {
        let filter = CategoryFilter::from_patterns(&["db.*"], &[]).unwrap();
        let result = filter.apply(vec![
            timing("db.query"),
            timing("db.execute"),
            timing("cache.get"),
        ]);
        let categories: Vec<_> = result.iter().map(|t| t.category.as_str()).collect();
        assert_eq!(categories, ["db.query", "db.execute"]);
    }

    #[test]
    fn empty_include_matches_all() {
        let filter = CategoryFilter::new();
        assert!(filter.accepts("anything.at.all"));
    }

    #[test]
    fn exclusion_wins_over_inclusion() {
        let filter = CategoryFilter::from_patterns(&["db.*"], &["db.execute"]).unwrap();
        assert!(filter.accepts("db.query"));
        assert!(!filter.accepts("db.execute"));
    }

    #[test]
    fn exclusion_applies_without_includes() {
        let filter = CategoryFilter::from_patterns(&[], &["cache.*"]).unwrap();
        assert!(filter.accepts("db.query"));
        assert!(!filter.accepts("cache.get"));
    }
}
