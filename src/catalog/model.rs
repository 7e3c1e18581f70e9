use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{NyangError, NyangResult};

/// Id of the reserved result returned when nothing reaches the match threshold.
pub const FALLBACK_RESULT_ID: &str = "result-not-found";

/// One selectable answer of a [`Question`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuizOption {
    /// Option id, unique within its question.
    pub id: String,
    /// Button label.
    pub text: String,
    /// Profile tag contributed when this option is chosen.
    pub tag: String,
}

/// A quiz question. Ids are dense, 1-based and follow catalog order.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    /// 1-based position in the quiz.
    pub id: u32,
    /// Question prompt.
    pub text: String,
    /// Answers in display order.
    pub options: Vec<QuizOption>,
}

/// A "past life" result the matcher can land on.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuizResult {
    /// Result id, e.g. `result7`. Its numeric suffix breaks score ties.
    pub id: String,
    /// Headline drawn on the exported card and used as the download file name.
    pub title: String,
    /// Body text drawn under the title.
    pub description: String,
    /// Asset reference of the result photo, relative to the asset root.
    pub image: String,
    /// Tags this result matches against.
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

/// Optional tuning carried by the catalog document.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CatalogSettings {
    /// Overrides the default minimum score a result needs to be picked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_threshold: Option<usize>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct CatalogDoc {
    #[serde(default)]
    settings: CatalogSettings,
    questions: Vec<Question>,
    results: Vec<QuizResult>,
}

/// Light view of a result for the gallery screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GalleryCard<'a> {
    /// Result id.
    pub id: &'a str,
    /// Result title.
    pub title: &'a str,
    /// Result image reference.
    pub image: &'a str,
}

/// Immutable, validated question and result dataset.
///
/// A catalog is loaded once and shared by reference with the quiz engine and matcher; there is no
/// mutation API.
#[derive(Clone, Debug)]
pub struct Catalog {
    settings: CatalogSettings,
    questions: Vec<Question>,
    results: Vec<QuizResult>,
    question_count: u32,
    fallback_index: usize,
}

impl Catalog {
    /// Build a catalog from parts and validate it.
    pub fn new(
        questions: Vec<Question>,
        results: Vec<QuizResult>,
        settings: CatalogSettings,
    ) -> NyangResult<Self> {
        validate_questions(&questions)?;
        let fallback_index = validate_results(&results)?;
        if settings.match_threshold == Some(0) {
            return Err(NyangError::validation("settings.match_threshold must be > 0"));
        }
        let question_count = u32::try_from(questions.len())
            .map_err(|_| NyangError::validation("too many questions"))?;
        Ok(Self {
            settings,
            questions,
            results,
            question_count,
            fallback_index,
        })
    }

    /// Parse and validate a catalog JSON document.
    #[tracing::instrument(skip(json), fields(len = json.len()))]
    pub fn from_json_str(json: &str) -> NyangResult<Self> {
        let doc: CatalogDoc =
            serde_json::from_str(json).map_err(|e| NyangError::serde(e.to_string()))?;
        let catalog = Self::new(doc.questions, doc.results, doc.settings)?;
        tracing::debug!(
            questions = catalog.question_count,
            results = catalog.results.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Read, parse and validate a catalog JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> NyangResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read catalog '{}'", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Serialize back into the catalog JSON document shape.
    pub fn to_json_string_pretty(&self) -> NyangResult<String> {
        let doc = CatalogDoc {
            settings: self.settings.clone(),
            questions: self.questions.clone(),
            results: self.results.clone(),
        };
        serde_json::to_string_pretty(&doc).map_err(|e| NyangError::serde(e.to_string()))
    }

    /// Re-run the well-formedness checks.
    pub fn validate(&self) -> NyangResult<()> {
        validate_questions(&self.questions)?;
        validate_results(&self.results).map(|_| ())
    }

    /// Number of questions; the terminal question has this id.
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    /// All questions in order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// All results in catalog order, fallback included.
    pub fn results(&self) -> &[QuizResult] {
        &self.results
    }

    /// Catalog-level tuning.
    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    /// Look up a question by its 1-based id.
    pub fn question(&self, id: u32) -> Option<&Question> {
        let idx = usize::try_from(id.checked_sub(1)?).ok()?;
        self.questions.get(idx)
    }

    /// Look up a result by id.
    pub fn result(&self, id: &str) -> Option<&QuizResult> {
        self.results.iter().find(|r| r.id == id)
    }

    /// The reserved `result-not-found` entry.
    pub fn fallback(&self) -> &QuizResult {
        &self.results[self.fallback_index]
    }

    /// Results eligible for matching, in catalog order.
    pub fn candidates(&self) -> impl Iterator<Item = &QuizResult> + '_ {
        self.results.iter().filter(|r| r.id != FALLBACK_RESULT_ID)
    }

    /// Cards for the "all results" gallery screen.
    pub fn gallery(&self) -> Vec<GalleryCard<'_>> {
        self.candidates()
            .map(|r| GalleryCard {
                id: &r.id,
                title: &r.title,
                image: &r.image,
            })
            .collect()
    }
}

/// Numeric suffix of a result id: `result10` → `10`. `None` when the id ends in a non-digit.
pub fn result_ordinal(id: &str) -> Option<u64> {
    let digits_start = id
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    id[digits_start..].parse().ok()
}

fn validate_questions(questions: &[Question]) -> NyangResult<()> {
    if questions.is_empty() {
        return Err(NyangError::validation("catalog must contain at least one question"));
    }
    for (idx, q) in questions.iter().enumerate() {
        let expected = idx + 1;
        if usize::try_from(q.id).ok() != Some(expected) {
            return Err(NyangError::validation(format!(
                "question ids must be dense and 1-based: position {expected} has id {}",
                q.id
            )));
        }
        if q.options.is_empty() {
            return Err(NyangError::validation(format!(
                "question {} has no options",
                q.id
            )));
        }
        let mut seen = HashSet::new();
        for opt in &q.options {
            if !seen.insert(opt.id.as_str()) {
                return Err(NyangError::validation(format!(
                    "question {} has duplicate option id '{}'",
                    q.id, opt.id
                )));
            }
            if opt.tag.trim().is_empty() {
                return Err(NyangError::validation(format!(
                    "question {} option '{}' has an empty tag",
                    q.id, opt.id
                )));
            }
        }
    }
    Ok(())
}

/// Returns the index of the fallback result.
fn validate_results(results: &[QuizResult]) -> NyangResult<usize> {
    let mut ids = HashSet::new();
    let mut ordinals = HashMap::<u64, &str>::new();
    let mut fallback = None;
    for (idx, r) in results.iter().enumerate() {
        if !ids.insert(r.id.as_str()) {
            return Err(NyangError::validation(format!(
                "duplicate result id '{}'",
                r.id
            )));
        }
        if r.id == FALLBACK_RESULT_ID {
            fallback = Some(idx);
            continue;
        }
        if let Some(n) = result_ordinal(&r.id)
            && let Some(prev) = ordinals.insert(n, r.id.as_str())
        {
            return Err(NyangError::validation(format!(
                "result ids '{prev}' and '{}' share numeric suffix {n}",
                r.id
            )));
        }
    }
    fallback.ok_or_else(|| {
        NyangError::validation(format!("catalog is missing the '{FALLBACK_RESULT_ID}' result"))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/model.rs"]
mod tests;
