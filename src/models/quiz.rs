// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

use crate::error::AppError;

/// Question kind. Closed set: anything else in the database is a data
/// integrity bug and is rejected when rows are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionKind {
    #[serde(rename = "single-choice")]
    SingleChoice,
    #[serde(rename = "short-text")]
    ShortText,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::SingleChoice => "single-choice",
            QuestionKind::ShortText => "short-text",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "single-choice" => Ok(QuestionKind::SingleChoice),
            "short-text" => Ok(QuestionKind::ShortText),
            other => Err(AppError::InternalServerError(format!(
                "unknown question kind '{other}' in database"
            ))),
        }
    }
}

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: uuid::Uuid,
    #[serde(skip)]
    pub user_id: uuid::Uuid,
    pub title: String,
    pub public_url: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// One option of a single-choice question ('question_options' table).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: uuid::Uuid,
    #[serde(skip)]
    pub question_id: uuid::Uuid,
    pub option_text: String,
    pub is_correct: bool,
}

/// A question together with its options, as served to clients and fed to
/// the scoring engine. A single-choice question never carries
/// `correct_answer`; a short-text question never carries options.
#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: uuid::Uuid,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub question_text: String,
    pub correct_answer: Option<String>,
    #[serde(rename = "question_options")]
    pub options: Vec<QuestionOption>,
}

/// Raw row from the 'questions' table. Converted into [`Question`] once
/// the kind string is validated and options are attached.
#[derive(Debug, FromRow)]
pub struct QuestionRow {
    pub id: uuid::Uuid,
    pub quiz_id: uuid::Uuid,
    pub kind: String,
    pub question_text: String,
    pub correct_answer: Option<String>,
}

impl QuestionRow {
    pub fn into_question(self, options: Vec<QuestionOption>) -> Result<Question, AppError> {
        Ok(Question {
            id: self.id,
            kind: QuestionKind::parse(&self.kind)?,
            question_text: self.question_text,
            correct_answer: self.correct_answer,
            options,
        })
    }
}

/// Full quiz detail returned by `GET /api/quizzes/{id}`.
#[derive(Debug, Serialize)]
pub struct QuizDetail {
    pub id: uuid::Uuid,
    pub title: String,
    pub public_url: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub questions: Vec<Question>,
}

/// DTO for one option of a new single-choice question.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateOptionRequest {
    #[validate(length(min = 1, max = 500))]
    pub text: String,
    pub is_correct: bool,
}

/// DTO for one question of a new quiz.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[validate(length(min = 1, max = 1000))]
    pub question_text: String,
    #[validate(nested)]
    pub options: Option<Vec<CreateOptionRequest>>,
    #[validate(length(max = 500))]
    pub correct_answer: Option<String>,
}

/// DTO for creating a new quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, message = "A quiz needs at least one question."), nested)]
    pub questions: Vec<CreateQuestionRequest>,
}

/// Summary row for the creator's quiz list.
#[derive(Debug, Serialize, FromRow)]
pub struct QuizSummary {
    pub id: uuid::Uuid,
    pub title: String,
    pub public_url: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}
