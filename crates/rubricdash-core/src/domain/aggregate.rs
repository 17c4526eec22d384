//! Server-computed rubric aggregate for a project and artifact type.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::nullable::{null_as_default, nullable_scores};

/// Cross-artifact averages, as computed by the backend.
///
/// Read-only to the core: it is replaced wholesale on refresh and never
/// patched locally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRubric {
    #[serde(default, deserialize_with = "nullable_scores")]
    pub criteria_averages: BTreeMap<String, f64>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub overall_score: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub review_count: u64,
}

impl AggregateRubric {
    /// Average for one criterion, 0 when the backend has none.
    pub fn average(&self, key: &str) -> f64 {
        self.criteria_averages.get(key).copied().unwrap_or(0.0)
    }
}
