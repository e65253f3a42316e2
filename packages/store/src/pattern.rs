//! Pattern records and the description manifest.
//!
//! A pattern is a named text template. The backend record carries the body;
//! description and tags come from a static manifest fetched separately,
//! because the server-side records predate that metadata.

use serde::{Deserialize, Serialize};

/// A named text template with display metadata.
///
/// Field names map to the wire form the backend uses (`Name`, `Pattern`).
/// Identity key is `name`; uniqueness is enforced by the backend, not here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pattern {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Description", default)]
    pub description: String,

    /// The template body.
    #[serde(rename = "Pattern", default)]
    pub body: String,

    #[serde(default)]
    pub tags: Vec<String>,
}

/// One manifest entry enriching a backend record with display metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatternDescription {
    #[serde(rename = "patternName")]
    pub pattern_name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: Vec<String>,
}

/// Wire form of the static `pattern_descriptions.json` resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescriptionManifest {
    #[serde(default)]
    pub patterns: Vec<PatternDescription>,
}

impl DescriptionManifest {
    /// Look up the entry for a pattern name.
    pub fn find(&self, name: &str) -> Option<&PatternDescription> {
        self.patterns.iter().find(|d| d.pattern_name == name)
    }
}

/// Extract the two-letter language prefix from a name like `de_summarize`.
///
/// A prefix is exactly two ASCII lowercase letters followed by an
/// underscore; anything else means the name is unprefixed.
pub fn language_prefix(name: &str) -> Option<&str> {
    let bytes = name.as_bytes();
    if bytes.len() >= 3
        && bytes[0].is_ascii_lowercase()
        && bytes[1].is_ascii_lowercase()
        && bytes[2] == b'_'
    {
        Some(&name[..2])
    } else {
        None
    }
}

/// Apply a language filter to a snapshot of patterns.
///
/// With no active language every pattern is kept. With one, patterns whose
/// prefix matches are kept, unprefixed patterns are always kept, and
/// patterns with a different prefix are dropped. Pure: the input snapshot
/// is never mutated.
pub fn filter_by_language(patterns: &[Pattern], language: Option<&str>) -> Vec<Pattern> {
    let Some(language) = language else {
        return patterns.to_vec();
    };

    patterns
        .iter()
        .filter(|p| match language_prefix(&p.name) {
            Some(prefix) => prefix == language,
            None => true,
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Pattern {
        Pattern {
            name: name.to_string(),
            description: String::new(),
            body: String::new(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn language_prefix_requires_two_letters_and_underscore() {
        assert_eq!(language_prefix("de_summarize"), Some("de"));
        assert_eq!(language_prefix("xx_a"), Some("xx"));
        assert_eq!(language_prefix("summarize"), None);
        assert_eq!(language_prefix("abc_name"), None);
        assert_eq!(language_prefix("d_name"), None);
        assert_eq!(language_prefix("DE_name"), None);
        assert_eq!(language_prefix("de"), None);
        assert_eq!(language_prefix(""), None);
    }

    #[test]
    fn filter_without_language_keeps_everything() {
        let patterns = vec![named("xx_a"), named("yy_b"), named("c")];
        assert_eq!(filter_by_language(&patterns, None), patterns);
    }

    #[test]
    fn filter_keeps_matching_and_unprefixed_names() {
        let patterns = vec![named("xx_a"), named("yy_b"), named("c")];
        let filtered = filter_by_language(&patterns, Some("xx"));
        let names: Vec<&str> = filtered.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["xx_a", "c"]);
    }

    #[test]
    fn pattern_wire_form_uses_backend_field_names() {
        let json = serde_json::json!({
            "Name": "summarize",
            "Description": "Summarize text",
            "Pattern": "You are a summarizer.",
            "tags": ["writing"]
        });

        let pattern: Pattern = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(pattern.name, "summarize");
        assert_eq!(pattern.body, "You are a summarizer.");
        assert_eq!(serde_json::to_value(&pattern).unwrap(), json);
    }

    #[test]
    fn pattern_tolerates_missing_metadata_fields() {
        let pattern: Pattern = serde_json::from_value(serde_json::json!({
            "Name": "bare"
        }))
        .unwrap();

        assert_eq!(pattern.name, "bare");
        assert!(pattern.description.is_empty());
        assert!(pattern.body.is_empty());
        assert!(pattern.tags.is_empty());
    }

    #[test]
    fn manifest_lookup_by_pattern_name() {
        let manifest: DescriptionManifest = serde_json::from_value(serde_json::json!({
            "patterns": [
                {"patternName": "summarize", "description": "Summarize text", "tags": ["writing"]}
            ]
        }))
        .unwrap();

        assert_eq!(
            manifest.find("summarize").map(|d| d.description.as_str()),
            Some("Summarize text")
        );
        assert!(manifest.find("missing").is_none());
    }
}
