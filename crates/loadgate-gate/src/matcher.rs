//! Path matching — which requests are subject to throttling at all.
//!
//! Each configured pattern is a regular expression that must match the
//! whole path. Plain paths without metacharacters therefore act as exact
//! matches.

use regex::Regex;

use loadgate_core::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Default)]
pub struct PathMatcher {
    patterns: Vec<String>,
    compiled: Vec<Regex>,
}

impl PathMatcher {
    /// Compile the given patterns. Fails on the first invalid one.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> ConfigResult<Self> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let re = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
                ConfigError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                }
            })?;
            compiled.push(re);
        }
        Ok(Self {
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
            compiled,
        })
    }

    /// A matcher that matches nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True iff `path` matches at least one pattern.
    pub fn matches(&self, path: &str) -> bool {
        self.compiled.iter().any(|re| re.is_match(path))
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}
