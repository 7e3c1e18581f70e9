use std::cmp::Reverse;

use crate::{
    catalog::model::{Catalog, QuizResult, result_ordinal},
    foundation::error::{NyangError, NyangResult},
    quiz::engine::Session,
};

/// Minimum score used when neither the catalog nor the caller picks one.
pub const DEFAULT_MATCH_THRESHOLD: usize = 6;

/// How a profile is scored against a result's tag set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMode {
    /// Every occurrence of a matching tag in the profile counts.
    #[default]
    Multiset,
    /// Each distinct matching tag counts once.
    Set,
}

/// Threshold and scoring rule for picking a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MatchPolicy {
    /// Minimum score a result needs to be eligible.
    pub threshold: usize,
    /// Scoring rule.
    #[serde(default)]
    pub scoring: ScoreMode,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
            scoring: ScoreMode::Multiset,
        }
    }
}

impl MatchPolicy {
    /// Default policy with the catalog's threshold override applied.
    pub fn for_catalog(catalog: &Catalog) -> Self {
        let mut policy = Self::default();
        if let Some(t) = catalog.settings().match_threshold {
            policy.threshold = t;
        }
        policy
    }
}

/// A result that reached the threshold, with its score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RankedResult<'c> {
    /// Matched result.
    pub result: &'c QuizResult,
    /// Overlap score.
    pub score: usize,
}

/// Overlap between a profile and a result's tags under `mode`.
pub fn score(profile: &[String], result: &QuizResult, mode: ScoreMode) -> usize {
    match mode {
        ScoreMode::Multiset => profile.iter().filter(|t| result.tags.contains(*t)).count(),
        ScoreMode::Set => result
            .tags
            .iter()
            .filter(|t| profile.contains(*t))
            .count(),
    }
}

/// All non-fallback results scoring at or above the threshold, best first.
///
/// Ties are ordered by the numeric suffix of the result id (`result3` before `result10`); ids
/// without a suffix sort after numbered ones, by id.
pub fn rank<'c>(
    profile: &[String],
    catalog: &'c Catalog,
    policy: &MatchPolicy,
) -> Vec<RankedResult<'c>> {
    let mut ranked: Vec<RankedResult<'c>> = catalog
        .candidates()
        .map(|result| RankedResult {
            result,
            score: score(profile, result, policy.scoring),
        })
        .filter(|r| r.score >= policy.threshold)
        .collect();

    ranked.sort_by(|a, b| {
        let key = |r: &RankedResult<'_>| {
            let ordinal = result_ordinal(&r.result.id);
            (Reverse(r.score), ordinal.is_none(), ordinal.unwrap_or(0))
        };
        key(a)
            .cmp(&key(b))
            .then_with(|| a.result.id.cmp(&b.result.id))
    });
    ranked
}

/// Pick exactly one result for `profile`; the fallback when nothing qualifies.
#[tracing::instrument(skip(profile, catalog), fields(profile_len = profile.len()))]
pub fn resolve<'c>(profile: &[String], catalog: &'c Catalog, policy: &MatchPolicy) -> &'c QuizResult {
    match rank(profile, catalog, policy).first() {
        Some(best) => {
            tracing::debug!(result = %best.result.id, score = best.score, "matched result");
            best.result
        }
        None => {
            tracing::debug!("no result reached the threshold, using fallback");
            catalog.fallback()
        }
    }
}

/// Resolve the profile of a completed session.
pub fn resolve_session<'c>(
    session: &Session,
    catalog: &'c Catalog,
    policy: &MatchPolicy,
) -> NyangResult<&'c QuizResult> {
    if !session.is_complete() {
        return Err(NyangError::validation(format!(
            "quiz is not complete: {} of {} questions answered",
            session.selected_tags().len(),
            catalog.question_count()
        )));
    }
    Ok(resolve(session.selected_tags(), catalog, policy))
}

#[cfg(test)]
#[path = "../../tests/unit/matching/matcher.rs"]
mod tests;
