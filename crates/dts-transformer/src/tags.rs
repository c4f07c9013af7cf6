//! Doc-comment tag matching.

use crate::TransformError;
use regex::Regex;

/// The tags one transformer removes, each with its `@tag\b` pattern.
#[derive(Debug, Clone)]
pub(crate) struct TagSet {
    tags: Vec<(String, Regex)>,
}

impl TagSet {
    pub(crate) fn new(names: &[String]) -> Result<Self, TransformError> {
        let tags = names
            .iter()
            .map(|name| name.trim().trim_start_matches('@'))
            .filter(|name| !name.is_empty())
            .map(|name| {
                Regex::new(&format!(r"@{}\b", regex::escape(name)))
                    .map(|regex| (name.to_string(), regex))
                    .map_err(|source| TransformError::InvalidTag {
                        tag: name.to_string(),
                        source,
                    })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { tags })
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// The first tag found in `comment`.
    pub(crate) fn find(&self, comment: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(_, regex)| regex.is_match(comment))
            .map(|(name, _)| name.as_str())
    }

    /// Tags that still occur anywhere in `code`.
    pub(crate) fn remaining(&self, code: &str) -> Vec<String> {
        self.tags
            .iter()
            .filter(|(_, regex)| regex.is_match(code))
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_matches_whole_word() {
        let tags = TagSet::new(&["internal".to_string()]).unwrap();
        assert_eq!(tags.find("/** @internal */"), Some("internal"));
        assert_eq!(tags.find("/** @internalized */"), None);
        assert_eq!(tags.find("/** internal */"), None);
    }

    #[test]
    fn test_tag_names_are_normalised() {
        let tags = TagSet::new(&["@alpha".to_string(), " ".to_string()]).unwrap();
        assert!(!tags.is_empty());
        assert_eq!(tags.find("// @alpha"), Some("alpha"));
        assert_eq!(tags.remaining("x @alpha y"), vec!["alpha".to_string()]);
    }
}
