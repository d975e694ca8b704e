//! Document metadata
//!
//! A flat record describing the article. Every field is optional on
//! input; defaulting happens at render time so the raw record always
//! reflects what the parser actually found.

use serde::{Deserialize, Serialize};

/// Document metadata
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Metadata {
    /// Full title
    pub title: Option<String>,
    /// Short title for running heads
    pub short_title: Option<String>,
    /// Ordered author list
    pub authors: Vec<Author>,
    /// Publication date, free-form
    pub date: Option<String>,
    /// Keywords
    pub keywords: Vec<String>,
}

/// A single author
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Author {
    /// Display name
    pub name: String,
    /// Institutional affiliation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
}

impl Author {
    /// Create an author without affiliation
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            affiliation: None,
        }
    }

    /// Set the affiliation
    pub fn with_affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliation = Some(affiliation.into());
        self
    }
}

impl Metadata {
    /// Create metadata with just a title
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Add an author
    pub fn add_author(&mut self, author: Author) {
        self.authors.push(author);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_from_json() {
        let json = r#"{
            "title": "On Trees",
            "shortTitle": "Trees",
            "authors": [{ "name": "Ada", "affiliation": "Lab" }, { "name": "Bo" }],
            "keywords": ["a", "b"]
        }"#;
        let meta: Metadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.short_title.as_deref(), Some("Trees"));
        assert_eq!(meta.authors.len(), 2);
        assert_eq!(meta.authors[1].affiliation, None);
        assert_eq!(meta.date, None);
    }

    #[test]
    fn test_empty_metadata() {
        let meta: Metadata = serde_json::from_str("{}").unwrap();
        assert_eq!(meta, Metadata::default());
    }

    #[test]
    fn test_add_author() {
        let mut meta = Metadata::with_title("T");
        meta.add_author(Author::new("Ada").with_affiliation("Lab"));
        assert_eq!(meta.authors[0].affiliation.as_deref(), Some("Lab"));
    }
}
