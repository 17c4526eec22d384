//! Artifact kinds and their wire/route names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of course artifact under review.
///
/// The serialized form is the plural camelCase name the backend uses for
/// general comments and review-data payloads (e.g. `useCaseDiagrams`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArtifactType {
    Requirements,
    Stories,
    UseCaseDiagrams,
    ActivityDiagrams,
    SequenceDiagrams,
    ClassDiagrams,
    DesignPatterns,
    Mockups,
}

impl ArtifactType {
    /// Every artifact type, in dashboard order.
    pub const ALL: [ArtifactType; 8] = [
        ArtifactType::Requirements,
        ArtifactType::Stories,
        ArtifactType::UseCaseDiagrams,
        ArtifactType::ActivityDiagrams,
        ArtifactType::SequenceDiagrams,
        ArtifactType::ClassDiagrams,
        ArtifactType::DesignPatterns,
        ArtifactType::Mockups,
    ];

    /// Plural camelCase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::Requirements => "requirements",
            ArtifactType::Stories => "stories",
            ArtifactType::UseCaseDiagrams => "useCaseDiagrams",
            ArtifactType::ActivityDiagrams => "activityDiagrams",
            ArtifactType::SequenceDiagrams => "sequenceDiagrams",
            ArtifactType::ClassDiagrams => "classDiagrams",
            ArtifactType::DesignPatterns => "designPatterns",
            ArtifactType::Mockups => "mockups",
        }
    }

    /// Singular name sent as `artifactType` on review submission.
    ///
    /// This is the plural name with its trailing `s` removed, which is what
    /// the review endpoint keys on (`storie` included).
    pub fn singular(&self) -> &'static str {
        let plural = self.as_str();
        &plural[..plural.len() - 1]
    }

    /// Kebab-case REST route segment (`/api/use-case-diagrams/...`).
    pub fn route_segment(&self) -> &'static str {
        match self {
            ArtifactType::Requirements => "requirements",
            ArtifactType::Stories => "stories",
            ArtifactType::UseCaseDiagrams => "use-case-diagrams",
            ArtifactType::ActivityDiagrams => "activity-diagrams",
            ArtifactType::SequenceDiagrams => "sequence-diagrams",
            ArtifactType::ClassDiagrams => "class-diagrams",
            ArtifactType::DesignPatterns => "design-patterns",
            ArtifactType::Mockups => "mockups",
        }
    }

    /// Human-readable label ("Use Case Diagrams").
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactType::Requirements => "Requirements",
            ArtifactType::Stories => "Stories",
            ArtifactType::UseCaseDiagrams => "Use Case Diagrams",
            ArtifactType::ActivityDiagrams => "Activity Diagrams",
            ArtifactType::SequenceDiagrams => "Sequence Diagrams",
            ArtifactType::ClassDiagrams => "Class Diagrams",
            ArtifactType::DesignPatterns => "Design Patterns",
            ArtifactType::Mockups => "Mockups",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactType {
    type Err = String;

    /// Accepts the wire name or the route segment.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArtifactType::ALL
            .into_iter()
            .find(|t| t.as_str() == s || t.route_segment() == s)
            .ok_or_else(|| format!("unknown artifact type: {s}"))
    }
}
