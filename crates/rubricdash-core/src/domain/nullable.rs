//! Serde helpers for backend fields that may arrive as `null`.
//!
//! `#[serde(default)]` only covers a missing key. The backend also sends
//! explicit `null` for review fields it has never written, so those fields
//! pair `default` with [`null_as_default`].

use serde::{Deserialize, Deserializer};

use super::artifact::Scores;

/// Decode `T`, mapping `null` to `T::default()`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode a score map, dropping entries whose value is `null`.
///
/// A dropped score reads as 0 everywhere scores are consumed.
pub fn nullable_scores<'de, D>(deserializer: D) -> Result<Scores, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<std::collections::BTreeMap<String, Option<f64>>> =
        Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect())
}
