//! Score aggregation: pure functions, no I/O.

use std::collections::BTreeSet;

use crate::domain::{AggregateRubric, Artifact, Scores};
use crate::rubric::Rubric;

/// Arithmetic mean of `scores` over the applicable keys.
///
/// With `applicable = None` every key present in `scores` counts. Keys that
/// are applicable but absent from `scores`, and non-finite values, count as
/// 0. An empty key set yields 0.
pub fn overall_score(scores: &Scores, applicable: Option<&BTreeSet<&str>>) -> f64 {
    let (sum, count) = match applicable {
        Some(keys) => keys
            .iter()
            .map(|k| finite_or_zero(scores.get(*k).copied()))
            .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1)),
        None => scores
            .values()
            .map(|v| finite_or_zero(Some(*v)))
            .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1)),
    };

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Round to the nearest half point, for star rendering only.
pub fn round_half(x: f64) -> f64 {
    if !x.is_finite() {
        return 0.0;
    }
    (x * 2.0).round() / 2.0
}

/// Average committed scores across the reviewed artifacts of a board.
///
/// Each artifact contributes only to the criteria that apply to it. The
/// overall score is the mean of the artifacts' committed ratings. The
/// backend aggregate stays authoritative; this is a local display fallback.
pub fn criteria_averages<'a, I>(artifacts: I, rubric: &Rubric) -> AggregateRubric
where
    I: IntoIterator<Item = &'a Artifact>,
{
    let mut totals: Vec<(f64, u64)> = vec![(0.0, 0); rubric.criteria.len()];
    let mut rating_total = 0.0;
    let mut review_count = 0u64;

    for artifact in artifacts.into_iter().filter(|a| a.reviewed) {
        review_count += 1;
        rating_total += finite_or_zero(Some(artifact.rating));

        for (slot, criterion) in totals.iter_mut().zip(rubric.criteria) {
            if criterion.applicability.applies_to(artifact) {
                slot.0 += finite_or_zero(artifact.scores.get(criterion.key).copied());
                slot.1 += 1;
            }
        }
    }

    let criteria_averages = rubric
        .criteria
        .iter()
        .zip(totals)
        .filter(|(_, (_, n))| *n > 0)
        .map(|(c, (sum, n))| (c.key.to_string(), sum / n as f64))
        .collect();

    AggregateRubric {
        criteria_averages,
        overall_score: if review_count == 0 {
            0.0
        } else {
            rating_total / review_count as f64
        },
        review_count,
    }
}

fn finite_or_zero(v: Option<f64>) -> f64 {
    match v {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}
