//! Artifacts as served by the review backend.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::nullable::{null_as_default, nullable_scores};

/// Per-criterion scores keyed by criterion key.
pub type Scores = BTreeMap<String, f64>;

/// Backend identifier of an artifact (`_id` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(pub String);

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ArtifactId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ArtifactId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Backend identifier of a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A reviewable artifact with its last committed review.
///
/// Content fields (text, description, diagram URLs, linked items, ...) are
/// kept verbatim in `content` and only inspected by rubric applicability
/// filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(rename = "_id")]
    pub id: ArtifactId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub reviewed: bool,

    /// Last committed overall score (0-5).
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub comment: String,

    #[serde(default, deserialize_with = "nullable_scores")]
    pub scores: Scores,

    #[serde(flatten)]
    pub content: serde_json::Map<String, serde_json::Value>,
}

impl Artifact {
    /// Create an unreviewed artifact with no content fields.
    pub fn new(id: impl Into<ArtifactId>) -> Self {
        Self {
            id: id.into(),
            seq: None,
            title: None,
            reviewed: false,
            rating: 0.0,
            comment: String::new(),
            scores: Scores::new(),
            content: serde_json::Map::new(),
        }
    }

    /// Builder-style setter for an opaque content field.
    pub fn with_field(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.content.insert(name.to_string(), value.into());
        self
    }

    /// String value of a content field, if present and a string.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.content.get(name).and_then(|v| v.as_str())
    }

    /// Title for listings: `title`, then requirement `text`, then `#seq`, then the id.
    pub fn display_name(&self) -> String {
        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            return title.to_string();
        }
        if let Some(text) = self.field_str("text") {
            return text.to_string();
        }
        match self.seq {
            Some(seq) => format!("#{seq}"),
            None => self.id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_defaults_missing_review_fields() {
        let artifact: Artifact = serde_json::from_value(json!({
            "_id": "r1",
            "seq": 29,
            "text": "The user must be able to pay in-app.",
            "type": "Functional"
        }))
        .unwrap();

        assert_eq!(artifact.id, ArtifactId::from("r1"));
        assert!(!artifact.reviewed);
        assert_eq!(artifact.rating, 0.0);
        assert!(artifact.comment.is_empty());
        assert!(artifact.scores.is_empty());
        assert_eq!(artifact.field_str("type"), Some("Functional"));
    }

    #[test]
    fn null_review_fields_read_as_unreviewed() {
        let artifact: Artifact = serde_json::from_value(json!({
            "_id": "a1",
            "reviewed": null,
            "comment": null,
            "rating": null,
            "scores": null,
            "title": null
        }))
        .unwrap();

        assert!(!artifact.reviewed);
        assert_eq!(artifact.rating, 0.0);
        assert_eq!(artifact.comment, "");
        assert!(artifact.scores.is_empty());
        assert_eq!(artifact.title, None);
    }

    #[test]
    fn content_fields_survive_serialization() {
        let artifact = Artifact::new("d1")
            .with_field("url", "https://example.org/d1.png")
            .with_field("mimetype", "image/png");
        let value = serde_json::to_value(&artifact).unwrap();

        assert_eq!(value["_id"], "d1");
        assert_eq!(value["url"], "https://example.org/d1.png");
        assert_eq!(value["reviewed"], false);
    }

    #[test]
    fn display_name_falls_back_in_order() {
        let mut a = Artifact::new("x1");
        assert_eq!(a.display_name(), "x1");
        a.seq = Some(7);
        assert_eq!(a.display_name(), "#7");
        a = a.with_field("text", "Requirement text");
        assert_eq!(a.display_name(), "Requirement text");
        a.title = Some("Login screen".into());
        assert_eq!(a.display_name(), "Login screen");
    }
}
