//! Rubric model: the scoring criteria for each artifact type.
//!
//! Criteria are static data. Some criteria only apply to a subset of
//! artifacts of a type (for example, testability is only scored for
//! functional requirements), so every place that seeds, averages or displays
//! scores goes through [`Rubric::applicable_keys`].

use serde::Serialize;
use std::collections::BTreeSet;

use crate::domain::{Artifact, ArtifactType};

/// When a criterion applies to an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Applicability {
    /// Applies to every artifact of the type.
    Always,
    /// Applies only when a content field of the artifact equals `value`.
    FieldEquals {
        field: &'static str,
        value: &'static str,
    },
}

impl Applicability {
    pub fn applies_to(&self, artifact: &Artifact) -> bool {
        match self {
            Applicability::Always => true,
            Applicability::FieldEquals { field, value } => {
                artifact.field_str(field) == Some(*value)
            }
        }
    }
}

/// One named, independently scored evaluation dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CriterionDefinition {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub applicability: Applicability,
}

impl CriterionDefinition {
    const fn always(key: &'static str, name: &'static str, description: &'static str) -> Self {
        Self {
            key,
            name,
            description,
            applicability: Applicability::Always,
        }
    }
}

/// The ordered criteria list for one artifact type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rubric {
    pub artifact_type: ArtifactType,
    pub criteria: &'static [CriterionDefinition],
}

impl Rubric {
    /// The rubric used for `artifact_type`.
    pub fn for_type(artifact_type: ArtifactType) -> Rubric {
        let criteria = match artifact_type {
            ArtifactType::Requirements => REQUIREMENT_CRITERIA,
            ArtifactType::Stories => STORY_CRITERIA,
            ArtifactType::UseCaseDiagrams => USE_CASE_DIAGRAM_CRITERIA,
            ArtifactType::ActivityDiagrams => ACTIVITY_DIAGRAM_CRITERIA,
            ArtifactType::SequenceDiagrams => SEQUENCE_DIAGRAM_CRITERIA,
            ArtifactType::ClassDiagrams => CLASS_DIAGRAM_CRITERIA,
            ArtifactType::DesignPatterns => DESIGN_PATTERN_CRITERIA,
            ArtifactType::Mockups => MOCKUP_CRITERIA,
        };
        Rubric {
            artifact_type,
            criteria,
        }
    }

    /// Look up a criterion by key.
    pub fn criterion(&self, key: &str) -> Option<&'static CriterionDefinition> {
        self.criteria.iter().find(|c| c.key == key)
    }

    /// Criteria that apply to `artifact`, in rubric order.
    pub fn applicable_criteria<'a>(
        &self,
        artifact: &'a Artifact,
    ) -> impl Iterator<Item = &'static CriterionDefinition> + 'a {
        let criteria: &'static [CriterionDefinition] = self.criteria;
        criteria
            .iter()
            .filter(move |c| c.applicability.applies_to(artifact))
    }

    /// Keys of the criteria that apply to `artifact`.
    pub fn applicable_keys(&self, artifact: &Artifact) -> BTreeSet<&'static str> {
        self.applicable_criteria(artifact).map(|c| c.key).collect()
    }
}

const REQUIREMENT_CRITERIA: &[CriterionDefinition] = &[
    CriterionDefinition::always(
        "clarityScore",
        "Clarity",
        "Requirements are clear and unambiguous",
    ),
    CriterionDefinition {
        key: "testabilityScore",
        name: "Testability",
        description: "Requirements can be verified through testing",
        applicability: Applicability::FieldEquals {
            field: "type",
            value: "Functional",
        },
    },
    CriterionDefinition::always(
        "feasibilityScore",
        "Feasibility",
        "Requirements are technically and operationally feasible",
    ),
    CriterionDefinition::always(
        "necessityScore",
        "Necessity",
        "Each requirement is essential to the system",
    ),
    CriterionDefinition::always(
        "prioritizationScore",
        "Prioritization",
        "Requirements are properly prioritized",
    ),
];

const STORY_CRITERIA: &[CriterionDefinition] = &[
    CriterionDefinition::always(
        "userFocusScore",
        "User Focus",
        "Story clearly identifies the user role",
    ),
    CriterionDefinition::always(
        "valuePropositionScore",
        "Value Proposition",
        "Story clearly states the benefit to the user",
    ),
    CriterionDefinition::always(
        "acceptanceCriteriaScore",
        "Acceptance Criteria",
        "Clear criteria for when the story is complete",
    ),
    CriterionDefinition::always(
        "sizeScopeScore",
        "Size/Scope",
        "Story is appropriately sized for implementation",
    ),
    CriterionDefinition::always(
        "independenceScore",
        "Independence",
        "Story can be implemented independently",
    ),
];

const USE_CASE_DIAGRAM_CRITERIA: &[CriterionDefinition] = &[
    CriterionDefinition::always(
        "actorIdentificationScore",
        "Actor Identification",
        "Correctly identifies external actors",
    ),
    CriterionDefinition::always(
        "useCaseDefinitionScore",
        "Use Case Definition",
        "Use cases represent valuable user goals",
    ),
    CriterionDefinition::always(
        "relationshipsScore",
        "Relationships",
        "Proper use of include/extend relationships",
    ),
    CriterionDefinition::always(
        "systemBoundaryScore",
        "System Boundary",
        "Clear system boundaries",
    ),
    CriterionDefinition::always(
        "completenessScore",
        "Completeness",
        "Covers all user interactions with the system",
    ),
];

const ACTIVITY_DIAGRAM_CRITERIA: &[CriterionDefinition] = &[
    CriterionDefinition::always(
        "flowLogicScore",
        "Flow Logic",
        "Correctly shows the flow of activities",
    ),
    CriterionDefinition::always(
        "decisionPointsScore",
        "Decision Points",
        "Properly represents decision points and conditions",
    ),
    CriterionDefinition::always(
        "parallelActivitiesScore",
        "Parallel Activities",
        "Correctly shows concurrent activities",
    ),
    CriterionDefinition::always(
        "startEndPointsScore",
        "Start/End Points",
        "Clear entry and exit points",
    ),
    CriterionDefinition::always("clarityScore", "Clarity", "Easy to follow and understand"),
];

const SEQUENCE_DIAGRAM_CRITERIA: &[CriterionDefinition] = &[
    CriterionDefinition::always(
        "messageFlowScore",
        "Message Flow",
        "Proper sequence of messages",
    ),
    CriterionDefinition::always(
        "completenessScore",
        "Completeness",
        "Covers all necessary interactions",
    ),
    CriterionDefinition::always(
        "umlCorrectnessScore",
        "UML Correctness",
        "Follows UML sequence diagram standards and notation",
    ),
];

const CLASS_DIAGRAM_CRITERIA: &[CriterionDefinition] = &[
    CriterionDefinition::always(
        "boundaryObjectsScore",
        "Boundary Objects",
        "Attributes have scope/name/datatype, methods have return type/name/parameters. \
         UI classes include event handlers. Proper relationships with other boundary objects.",
    ),
    CriterionDefinition::always(
        "controlObjectsScore",
        "Control Objects",
        "No attributes (except business logic). Contains only control-related methods \
         (no UI event handlers, no setters/getters).",
    ),
    CriterionDefinition::always(
        "entityObjectsScore",
        "Entity Objects",
        "Has proper attributes with corresponding getter/setter methods and appropriate data \
         types. No other methods except getters/setters and constructors.",
    ),
    CriterionDefinition::always(
        "umlNotationScore",
        "UML Notation",
        "Correctly uses UML symbols, notations, and conventions in the class diagram.",
    ),
    CriterionDefinition::always(
        "architecturalDesignScore",
        "Architectural Design",
        "UI connects only with controllers, Proxies connect only with controllers, Entities \
         connect only with controllers. No direct UI/Proxy to Entity connections.",
    ),
];

const DESIGN_PATTERN_CRITERIA: &[CriterionDefinition] = &[
    CriterionDefinition::always(
        "patternSelectionScore",
        "Pattern Selection",
        "Appropriate pattern for the problem",
    ),
    CriterionDefinition::always(
        "implementationScore",
        "Implementation",
        "Correctly implements the pattern",
    ),
    CriterionDefinition::always(
        "flexibilityScore",
        "Flexibility",
        "Solution is flexible and extensible",
    ),
    CriterionDefinition::always(
        "complexityScore",
        "Complexity",
        "Appropriate level of complexity",
    ),
    CriterionDefinition::always(
        "documentationScore",
        "Documentation",
        "Well-documented rationale for pattern use",
    ),
];

const MOCKUP_CRITERIA: &[CriterionDefinition] = &[
    CriterionDefinition::always("uiUxDesignScore", "UI/UX Design", "Follows UI/UX best practices"),
    CriterionDefinition::always(
        "consistencyScore",
        "Consistency",
        "Consistent design patterns and elements",
    ),
    CriterionDefinition::always("flowScore", "Flow", "Logical flow between screens"),
    CriterionDefinition::always(
        "completenessScore",
        "Completeness",
        "Covers all required functionality",
    ),
    CriterionDefinition::always(
        "userFriendlinessScore",
        "User-Friendliness",
        "Intuitive and easy to use",
    ),
];
