// src/scoring/matcher.rs

use crate::models::{
    quiz::{Question, QuestionKind},
    response::SubmittedAnswer,
};

/// Correctness verdict for one answer.
///
/// `Ungraded` is a real third state, not a fancy `false`: a short-text
/// question with no answer key configured cannot be graded, and the public
/// results view renders it as such. Only ranking folds it into "not
/// correct".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
    Ungraded,
}

impl Verdict {
    pub fn is_correct(self) -> bool {
        matches!(self, Verdict::Correct)
    }

    /// Wire representation: `true` / `false` / `null`.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Verdict::Correct => Some(true),
            Verdict::Incorrect => Some(false),
            Verdict::Ungraded => None,
        }
    }
}

/// Grades one submitted answer against its question.
///
/// Total over its input domain: malformed payloads (missing field, option
/// id that belongs to no option of the question) come back `Incorrect`, so
/// one bad row can never halt leaderboard computation.
pub fn grade(question: &Question, answer: &SubmittedAnswer) -> Verdict {
    match question.kind {
        QuestionKind::SingleChoice => grade_single_choice(question, answer),
        QuestionKind::ShortText => grade_short_text(question, answer),
    }
}

fn grade_single_choice(question: &Question, answer: &SubmittedAnswer) -> Verdict {
    let Some(selected) = answer.selected_option_id else {
        return Verdict::Incorrect;
    };
    let correct = question
        .options
        .iter()
        .any(|opt| opt.is_correct && opt.id == selected);
    if correct { Verdict::Correct } else { Verdict::Incorrect }
}

fn grade_short_text(question: &Question, answer: &SubmittedAnswer) -> Verdict {
    // No answer key configured: the question cannot be graded at all.
    let keywords = match question.correct_answer.as_deref() {
        None | Some("") => return Verdict::Ungraded,
        Some(key) => key,
    };

    let text = answer
        .free_text
        .as_deref()
        .unwrap_or("")
        .trim()
        .to_lowercase();
    if text.is_empty() {
        return Verdict::Incorrect;
    }

    // Plain substring search against each comma-separated keyword, both
    // sides trimmed and lowercased. Not exact match, not word-boundary.
    let hit = keywords
        .split(',')
        .map(|k| k.trim().to_lowercase())
        .any(|k| text.contains(&k));
    if hit { Verdict::Correct } else { Verdict::Incorrect }
}
