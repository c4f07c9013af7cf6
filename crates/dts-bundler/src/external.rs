//! The external-module predicate.

use crate::BundleError;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

type ExternalFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Decides which import specifiers stay imports instead of being inlined.
///
/// An id matches itself and its sub-paths (`vue` matches `vue/jsx`); an entry
/// written as `/pattern/` is a regular expression.
#[derive(Clone, Default)]
pub struct ExternalPredicate {
    ids: Vec<String>,
    patterns: Vec<Regex>,
    custom: Option<ExternalFn>,
}

impl ExternalPredicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_list<S: AsRef<str>>(items: &[S]) -> Result<Self, BundleError> {
        let mut predicate = Self::new();
        for item in items {
            let item = item.as_ref().trim();
            match item
                .strip_prefix('/')
                .and_then(|rest| rest.strip_suffix('/'))
                .filter(|pattern| !pattern.is_empty())
            {
                Some(pattern) => {
                    let regex = Regex::new(pattern).map_err(|source| {
                        BundleError::ExternalPattern {
                            pattern: pattern.to_string(),
                            source,
                        }
                    })?;
                    predicate.patterns.push(regex);
                }
                None if !item.is_empty() => predicate.ids.push(item.to_string()),
                None => {}
            }
        }
        Ok(predicate)
    }

    /// Adds a caller-supplied test, consulted after the ids and patterns.
    pub fn with_fn(mut self, f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.custom = Some(Arc::new(f));
        self
    }

    pub fn is_external(&self, specifier: &str) -> bool {
        self.ids.iter().any(|id| {
            specifier == id
                || specifier
                    .strip_prefix(id.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        }) || self.patterns.iter().any(|regex| regex.is_match(specifier))
            || self.custom.as_ref().is_some_and(|f| f(specifier))
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.patterns.is_empty() && self.custom.is_none()
    }
}

impl fmt::Debug for ExternalPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalPredicate")
            .field("ids", &self.ids)
            .field("patterns", &self.patterns)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}
