//! Project listings as returned by `/api/projects`.

use serde::{Deserialize, Serialize};

use rubricdash_core::domain::null_as_default;
use rubricdash_core::{Artifact, ArtifactType, ProjectId, ReviewProgress};

/// A student project with its embedded artifact lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: ProjectId,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    /// Artifact arrays keyed by plural type name, plus anything else.
    #[serde(flatten)]
    pub content: serde_json::Map<String, serde_json::Value>,
}

impl Project {
    /// Artifacts of one type embedded in the project document.
    ///
    /// Entries that are bare ids or otherwise undecodable are skipped.
    pub fn artifacts(&self, artifact_type: ArtifactType) -> Vec<Artifact> {
        match self.content.get(artifact_type.as_str()) {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| serde_json::from_value(v.clone()).ok())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Number of embedded entries of one type, decodable or not.
    pub fn artifact_count(&self, artifact_type: ArtifactType) -> usize {
        match self.content.get(artifact_type.as_str()) {
            Some(serde_json::Value::Array(items)) => items.len(),
            _ => 0,
        }
    }

    pub fn progress(&self, artifact_type: ArtifactType) -> ReviewProgress {
        let artifacts = self.artifacts(artifact_type);
        ReviewProgress {
            reviewed: artifacts.iter().filter(|a| a.reviewed).count(),
            total: self.artifact_count(artifact_type),
        }
    }
}

/// `GET /api/projects` answers either a bare array or `{ "projects": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum ProjectList {
    Bare(Vec<Project>),
    Wrapped { projects: Vec<Project> },
    Single { projects: Project },
}

impl From<ProjectList> for Vec<Project> {
    fn from(list: ProjectList) -> Self {
        match list {
            ProjectList::Bare(projects) | ProjectList::Wrapped { projects } => projects,
            ProjectList::Single { projects } => vec![projects],
        }
    }
}

/// `GET /api/projects/{id}` answers either the project or `{ "project": {...} }`.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum ProjectEnvelope {
    Wrapped { project: Project },
    Bare(Project),
}

impl From<ProjectEnvelope> for Project {
    fn from(envelope: ProjectEnvelope) -> Self {
        match envelope {
            ProjectEnvelope::Wrapped { project } | ProjectEnvelope::Bare(project) => project,
        }
    }
}
