//! Domain models for rubricdash.
//!
//! Canonical definitions for the core entities:
//! - `Artifact`: A reviewable unit as served by the backend
//! - `ArtifactType`: The kind of artifact (requirement, story, diagram, ...)
//! - `AggregateRubric`: Server-computed cross-artifact averages

pub mod aggregate;
pub mod artifact;
pub mod artifact_type;
pub mod error;
pub mod nullable;

// Re-export main types and errors
pub use aggregate::AggregateRubric;
pub use artifact::{Artifact, ArtifactId, ProjectId, Scores};
pub use artifact_type::ArtifactType;
pub use error::{GatewayError, GatewayResult, SessionError};
pub use nullable::{null_as_default, nullable_scores};
