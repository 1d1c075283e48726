use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};

/// One multiple-choice question and the style each answer votes for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// option -> style label
    pub styles: BTreeMap<String, String>,
}

impl QuizQuestion {
    pub fn style_for(&self, answer: &str) -> Option<&str> {
        self.styles.get(answer).map(String::as_str)
    }
}

/// Ordered answers, positionally aligned with the catalog's questions.
/// `None` and the empty string both mean "unanswered".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSubmission {
    pub answers: Vec<Option<String>>,
}

impl QuizSubmission {
    pub fn new(answers: Vec<Option<String>>) -> Self {
        Self { answers }
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn answered_count(&self) -> usize {
        self.answers
            .iter()
            .filter(|a| a.as_deref().is_some_and(|s| !s.is_empty()))
            .count()
    }
}

impl<S: Into<String>> FromIterator<S> for QuizSubmission {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|s| Some(s.into())).collect())
    }
}

/// Vote count for one style
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleVotes {
    pub style: String,
    pub votes: u32,
}

/// Per-submission vote counts, kept in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleTally {
    entries: Vec<StyleVotes>,
}

impl StyleTally {
    pub fn record(&mut self, style: &str) {
        match self.entries.iter_mut().find(|e| e.style == style) {
            Some(entry) => entry.votes += 1,
            None => self.entries.push(StyleVotes {
                style: style.to_string(),
                votes: 1,
            }),
        }
    }

    pub fn votes(&self, style: &str) -> u32 {
        self.entries
            .iter()
            .find(|e| e.style == style)
            .map_or(0, |e| e.votes)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in the order their style was first tallied
    pub fn iter(&self) -> impl Iterator<Item = &StyleVotes> {
        self.entries.iter()
    }

    /// Style with the most votes. On a tie the style tallied first wins.
    pub fn winner(&self) -> Option<&StyleVotes> {
        self.entries.iter().fold(None, |best, entry| match best {
            Some(b) if b.votes >= entry.votes => Some(b),
            _ => Some(entry),
        })
    }

    /// Descending by votes, ties alphabetical by style
    pub fn ranked(&self) -> Vec<&StyleVotes> {
        let mut ranked: Vec<_> = self.entries.iter().collect();
        ranked.sort_by(|a, b| b.votes.cmp(&a.votes).then_with(|| a.style.cmp(&b.style)));
        ranked
    }

    /// One `• Style: N matches` line per style, in ranked order
    pub fn breakdown(&self) -> String {
        self.ranked()
            .iter()
            .map(|e| {
                let noun = if e.votes == 1 { "match" } else { "matches" };
                format!("• {}: {} {}", e.style, e.votes, noun)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleRecommendation {
    pub style: String,
    pub breakdown: String,
    pub tally: StyleTally,
}

/// Result of scoring a complete submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuizOutcome {
    Recommendation(StyleRecommendation),
    /// No answer mapped onto any style
    NoPreference,
}

impl QuizOutcome {
    /// Headline shown where the winning style would go
    pub fn title(&self) -> &str {
        match self {
            Self::Recommendation(rec) => &rec.style,
            Self::NoPreference => "Error",
        }
    }

    /// Detail text shown under the headline
    pub fn message(&self) -> &str {
        match self {
            Self::Recommendation(rec) => &rec.breakdown,
            Self::NoPreference => "Unable to determine style preferences. Please try again.",
        }
    }
}

/// Immutable, validated question table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QuizCatalog {
    questions: Vec<QuizQuestion>,
}

impl QuizCatalog {
    /// Validate and wrap a question list.
    ///
    /// Rejects an empty list, duplicate options within a question, and any
    /// option with no style mapping.
    pub fn new(questions: Vec<QuizQuestion>) -> EngineResult<Self> {
        if questions.is_empty() {
            return Err(EngineError::InvalidCatalog("quiz has no questions".to_string()));
        }

        for (idx, question) in questions.iter().enumerate() {
            if question.options.is_empty() {
                return Err(EngineError::InvalidCatalog(format!(
                    "question {} has no options",
                    idx + 1
                )));
            }

            let mut seen = HashSet::new();
            for option in &question.options {
                if !seen.insert(option.as_str()) {
                    return Err(EngineError::InvalidCatalog(format!(
                        "question {} lists option '{}' twice",
                        idx + 1,
                        option
                    )));
                }
                if !question.styles.contains_key(option) {
                    return Err(EngineError::InvalidCatalog(format!(
                        "question {} option '{}' has no style",
                        idx + 1,
                        option
                    )));
                }
            }

            if question.styles.len() > question.options.len() {
                warn!("Question {} maps styles for answers it does not offer", idx + 1);
            }
        }

        Ok(Self { questions })
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        let questions: Vec<QuizQuestion> = serde_json::from_str(json)
            .map_err(|e| EngineError::InvalidCatalog(format!("failed to parse questions: {}", e)))?;
        Self::new(questions)
    }

    pub fn from_path(path: &Path) -> EngineResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            EngineError::InvalidCatalog(format!("failed to read {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_json(&json)?;
        info!("Loaded {} quiz questions from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Tally one vote per answered question and pick a style.
    ///
    /// Any unanswered question or a length mismatch is `IncompleteSubmission`.
    /// Answers a question does not map are skipped without error; if nothing
    /// maps, the outcome is `NoPreference`.
    pub fn evaluate(&self, submission: &QuizSubmission) -> EngineResult<QuizOutcome> {
        let answered = submission.answered_count();
        if submission.len() != self.len() || answered != self.len() {
            warn!(
                "Rejecting quiz submission: {} answers, {} answered, {} questions",
                submission.len(),
                answered,
                self.len()
            );
            return Err(EngineError::IncompleteSubmission {
                answered,
                expected: self.len(),
            });
        }

        let mut tally = StyleTally::default();
        for (idx, (question, answer)) in self.questions.iter().zip(&submission.answers).enumerate() {
            let answer = answer.as_deref().unwrap_or_default();
            match question.style_for(answer) {
                Some(style) => tally.record(style),
                None => debug!("Skipping unrecognized answer '{}' for question {}", answer, idx + 1),
            }
        }

        let Some(winner) = tally.winner() else {
            info!("No answer mapped to a style");
            return Ok(QuizOutcome::NoPreference);
        };

        let style = winner.style.clone();
        info!("Quiz winner: {} with {} votes", style, winner.votes);

        Ok(QuizOutcome::Recommendation(StyleRecommendation {
            style,
            breakdown: tally.breakdown(),
            tally,
        }))
    }
}
