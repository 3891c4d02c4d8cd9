// src/handlers/response.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        quiz::{Question, QuestionKind, Quiz},
        response::{
            PublicQuestionResult, PublicResultsResponse, ResponseRow, SubmitResponseRequest,
            UserResponseView,
        },
    },
    scoring::{self, identity},
    state::AppState,
    utils::jwt::Claims,
};

use super::quiz::load_questions;

async fn find_quiz(state: &AppState, quiz_id: uuid::Uuid) -> Result<Option<Quiz>, AppError> {
    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, user_id, title, public_url, created_at
        FROM quizzes
        WHERE id = $1
        "#,
    )
    .bind(quiz_id)
    .fetch_optional(&state.pool)
    .await?;

    Ok(quiz)
}

async fn load_response_rows(
    state: &AppState,
    quiz_id: uuid::Uuid,
) -> Result<Vec<ResponseRow>, AppError> {
    let rows = sqlx::query_as::<_, ResponseRow>(
        r#"
        SELECT id, name, quiz_id, question_id, answer, text_answer, submitted_at
        FROM responses
        WHERE quiz_id = $1
        ORDER BY submitted_at DESC
        "#,
    )
    .bind(quiz_id)
    .fetch_all(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch responses: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(rows)
}

/// Checks every submitted answer against its question before anything is
/// written: the question must belong to the quiz, and the payload must
/// match the question's kind. The scoring engine never sees rows that
/// violate these invariants.
fn validate_submission(
    payload: &SubmitResponseRequest,
    questions_by_id: &HashMap<uuid::Uuid, Question>,
) -> Result<(), AppError> {
    for answer in &payload.answers {
        let question = questions_by_id.get(&answer.question_id).ok_or_else(|| {
            AppError::BadRequest(format!("Invalid question ID: {}", answer.question_id))
        })?;

        match question.kind {
            QuestionKind::SingleChoice => {
                if answer.text_answer.is_some() {
                    return Err(AppError::BadRequest(format!(
                        "Single-choice question {} requires an option id and no text answer",
                        question.id
                    )));
                }
                let selected = answer.answer.ok_or_else(|| {
                    AppError::BadRequest(format!(
                        "Single-choice question {} requires an option id and no text answer",
                        question.id
                    ))
                })?;
                if !question.options.iter().any(|opt| opt.id == selected) {
                    return Err(AppError::BadRequest(format!(
                        "Invalid option ID: {selected}"
                    )));
                }
            }
            QuestionKind::ShortText => {
                if answer.answer.is_some()
                    || answer
                        .text_answer
                        .as_deref()
                        .is_none_or(|t| t.trim().is_empty())
                {
                    return Err(AppError::BadRequest(format!(
                        "Short-text question {} requires a non-empty text answer and no option id",
                        question.id
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Stores one quiz submission under a freshly generated identity token.
///
/// No account needed: the returned token is the respondent's only handle
/// on their results, and a repeat submission gets a brand-new one.
pub async fn submit_response(
    State(state): State<AppState>,
    Json(payload): Json<SubmitResponseRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if find_quiz(&state, payload.quiz_id).await?.is_none() {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    let questions_by_id: HashMap<uuid::Uuid, Question> =
        load_questions(&state.pool, payload.quiz_id)
            .await?
            .into_iter()
            .map(|q| (q.id, q))
            .collect();

    validate_submission(&payload, &questions_by_id)?;

    let suffix = uuid::Uuid::new_v4().to_string();
    let token = identity::encode(payload.name.as_deref().unwrap_or(""), &suffix);
    let submitted_at = Utc::now();

    let mut tx = state.pool.begin().await?;
    for answer in &payload.answers {
        let kind = questions_by_id[&answer.question_id].kind;
        sqlx::query(
            r#"
            INSERT INTO responses (id, name, quiz_id, question_id, answer, text_answer, submitted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(uuid::Uuid::new_v4())
        .bind(&token)
        .bind(payload.quiz_id)
        .bind(answer.question_id)
        .bind(match kind {
            QuestionKind::SingleChoice => answer.answer,
            QuestionKind::ShortText => None,
        })
        .bind(match kind {
            QuestionKind::ShortText => answer.text_answer.as_deref(),
            QuestionKind::SingleChoice => None,
        })
        .bind(submitted_at)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    tracing::info!(quiz_id = %payload.quiz_id, "quiz response submitted");

    Ok(Json(serde_json::json!({
        "userid": token,
        "message": "Quiz response submitted successfully"
    })))
}

/// Creator-only leaderboard for one quiz: every submission grouped by
/// identity token, graded, and ranked.
pub async fn view_responses(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let quiz = find_quiz(&state, quiz_id).await?;
    if quiz.map(|q| q.user_id) != Some(user_id) {
        return Err(AppError::NotFound(
            "Quiz not found or you are not the creator".to_string(),
        ));
    }

    let questions_by_id: HashMap<uuid::Uuid, Question> = load_questions(&state.pool, quiz_id)
        .await?
        .into_iter()
        .map(|q| (q.id, q))
        .collect();

    let rows = load_response_rows(&state, quiz_id).await?;
    let groups = scoring::group_by_identity(rows);
    let leaderboard = scoring::rank(groups, &questions_by_id);

    Ok(Json(leaderboard))
}

/// Per-question scored results for one identity token.
///
/// Public: this is the "view my results" page a respondent lands on after
/// submitting. Verdicts are tri-state; a short-text question with no
/// answer key comes back with `is_correct: null`.
pub async fn public_results(
    State(state): State<AppState>,
    Path((quiz_id, name)): Path<(uuid::Uuid, String)>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = find_quiz(&state, quiz_id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let questions = load_questions(&state.pool, quiz_id).await?;

    let rows = sqlx::query_as::<_, ResponseRow>(
        r#"
        SELECT id, name, quiz_id, question_id, answer, text_answer, submitted_at
        FROM responses
        WHERE quiz_id = $1 AND name = $2
        "#,
    )
    .bind(quiz_id)
    .bind(&name)
    .fetch_all(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch public responses: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let rows_by_question: HashMap<uuid::Uuid, ResponseRow> =
        rows.into_iter().map(|row| (row.question_id, row)).collect();

    let questions = questions
        .into_iter()
        .map(|question| {
            let user_response = rows_by_question.get(&question.id).map(|row| {
                let verdict = scoring::grade(&question, &row.as_submitted());
                UserResponseView {
                    response_id: row.id,
                    answer: row.answer,
                    text_answer: row.text_answer.clone(),
                    submitted_at: row.submitted_at,
                    is_correct: verdict.as_bool(),
                }
            });
            PublicQuestionResult {
                question_id: question.id,
                kind: question.kind,
                question_text: question.question_text,
                options: question.options,
                correct_answer: question.correct_answer,
                user_response,
            }
        })
        .collect();

    Ok(Json(PublicResultsResponse {
        quiz_id: quiz.id,
        quiz_title: quiz.title,
        questions,
    }))
}
