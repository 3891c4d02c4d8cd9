// src/models/response.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'responses' table in the database: one submitted answer
/// to one question, tagged with the submitter's identity token.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ResponseRow {
    pub id: uuid::Uuid,

    /// Submitter identity token ("display:uuid" or bare uuid).
    /// Grouping key for the leaderboard; raw string equality, no
    /// normalization.
    pub name: String,

    pub quiz_id: uuid::Uuid,
    pub question_id: uuid::Uuid,

    /// Selected option id. Present only for single-choice answers.
    pub answer: Option<uuid::Uuid>,

    /// Free text. Present only for short-text answers.
    pub text_answer: Option<String>,

    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

impl ResponseRow {
    /// The answer payload as seen by the scoring engine.
    pub fn as_submitted(&self) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id: self.question_id,
            selected_option_id: self.answer,
            free_text: self.text_answer.clone(),
        }
    }
}

/// One answer as fed to the answer matcher. Exactly one of
/// `selected_option_id` / `free_text` is populated for well-formed input;
/// the matcher treats a missing payload as incorrect rather than erroring.
#[derive(Debug, Clone)]
pub struct SubmittedAnswer {
    pub question_id: uuid::Uuid,
    pub selected_option_id: Option<uuid::Uuid>,
    pub free_text: Option<String>,
}

/// DTO for one answer inside a submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_id: uuid::Uuid,
    /// Option id, for single-choice questions.
    pub answer: Option<uuid::Uuid>,
    /// Free text, for short-text questions.
    pub text_answer: Option<String>,
}

/// DTO for submitting a full quiz response.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitResponseRequest {
    pub quiz_id: uuid::Uuid,
    /// Optional display name; folded into the generated identity token.
    #[validate(length(max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "A non-empty answers array is required."))]
    pub answers: Vec<SubmitAnswerRequest>,
}

/// A respondent's stored answer echoed back in the public results view,
/// with its tri-state verdict (`true` / `false` / `null` = ungraded).
#[derive(Debug, Serialize)]
pub struct UserResponseView {
    pub response_id: uuid::Uuid,
    pub answer: Option<uuid::Uuid>,
    pub text_answer: Option<String>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub is_correct: Option<bool>,
}

/// One question of the public results view, paired with the submitter's
/// answer when one exists.
#[derive(Debug, Serialize)]
pub struct PublicQuestionResult {
    pub question_id: uuid::Uuid,
    #[serde(rename = "type")]
    pub kind: crate::models::quiz::QuestionKind,
    pub question_text: String,
    pub options: Vec<crate::models::quiz::QuestionOption>,
    pub correct_answer: Option<String>,
    pub user_response: Option<UserResponseView>,
}

/// Envelope for `GET /api/responses/public/{quiz_id}/{name}`.
#[derive(Debug, Serialize)]
pub struct PublicResultsResponse {
    pub quiz_id: uuid::Uuid,
    pub quiz_title: String,
    pub questions: Vec<PublicQuestionResult>,
}
