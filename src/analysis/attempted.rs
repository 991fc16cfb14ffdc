use serde::Serialize;

use super::similarity::similarity;
use crate::config::AnalysisConfig;
use crate::transcript::{Role, TranscriptEntry};

/// Heuristic knobs for the attempted-question scan
#[derive(Debug, Clone)]
pub struct AnalysisPolicy {
    /// An assistant entry scoring above this is treated as the question
    /// being asked
    pub similarity_threshold: f64,

    /// A user reply counts as an answer once its trimmed length exceeds
    /// this many characters
    pub min_answer_chars: usize,
}

impl Default for AnalysisPolicy {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.5,
            min_answer_chars: 3,
        }
    }
}

impl From<&AnalysisConfig> for AnalysisPolicy {
    fn from(cfg: &AnalysisConfig) -> Self {
        Self {
            similarity_threshold: cfg.similarity_threshold,
            min_answer_chars: cfg.min_answer_chars,
        }
    }
}

/// Per-question outcome of the post-call scan
#[derive(Debug, Clone, Serialize)]
pub struct AttemptedQuestion {
    pub question: String,

    /// The agent asked something recognizably close to this question
    pub asked: bool,

    /// The candidate produced a non-trivial utterance in the reply window
    pub answered: bool,
}

/// Judge, per question, whether it was asked and substantively answered.
///
/// For each question the transcript is scanned from the beginning for the
/// first assistant entry scoring above the similarity threshold. The reply
/// window runs from just after that match up to the next assistant entry
/// (exclusive) or the end of the transcript; the question counts as
/// answered if any user entry in the window exceeds the minimum length
/// after trimming.
///
/// Questions are matched independently — two questions may match the same
/// assistant entry, and no deduplication is applied. The result is an
/// upper-bound participation heuristic, not a correctness judgment.
pub fn analyze(
    transcript: &[TranscriptEntry],
    questions: &[String],
    policy: &AnalysisPolicy,
) -> Vec<AttemptedQuestion> {
    questions
        .iter()
        .map(|question| {
            let asked_at = transcript.iter().position(|entry| {
                entry.role == Role::Assistant
                    && similarity(&entry.content, question) > policy.similarity_threshold
            });

            let answered = match asked_at {
                None => false,
                Some(index) => transcript[index + 1..]
                    .iter()
                    .take_while(|entry| entry.role != Role::Assistant)
                    .any(|entry| {
                        entry.role == Role::User
                            && entry.content.trim().chars().count() > policy.min_answer_chars
                    }),
            };

            AttemptedQuestion {
                question: question.clone(),
                asked: asked_at.is_some(),
                answered,
            }
        })
        .collect()
}

/// Number of answered questions; always within `0..=questions.len()`
pub fn attempted_count(results: &[AttemptedQuestion]) -> usize {
    results.iter().filter(|r| r.answered).count()
}
