// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::quiz::{
        CreateQuizRequest, Question, QuestionKind, QuestionOption, QuestionRow, Quiz, QuizDetail,
        QuizSummary,
    },
    state::AppState,
    utils::jwt::Claims,
};

/// Loads all questions of a quiz with their options attached, in insertion
/// order. Shared with the response handlers, which feed the result to the
/// scoring engine.
pub(crate) async fn load_questions(
    pool: &PgPool,
    quiz_id: uuid::Uuid,
) -> Result<Vec<Question>, AppError> {
    let rows = sqlx::query_as::<_, QuestionRow>(
        r#"
        SELECT id, quiz_id, kind, question_text, correct_answer
        FROM questions
        WHERE quiz_id = $1
        ORDER BY created_at, id
        "#,
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch questions: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let question_ids: Vec<uuid::Uuid> = rows.iter().map(|r| r.id).collect();
    let mut options = sqlx::query_as::<_, QuestionOption>(
        r#"
        SELECT id, question_id, option_text, is_correct
        FROM question_options
        WHERE question_id = ANY($1)
        ORDER BY created_at, id
        "#,
    )
    .bind(&question_ids)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch question options: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    rows.into_iter()
        .map(|row| {
            let mut own: Vec<QuestionOption> = Vec::new();
            options.retain(|opt| {
                if opt.question_id == row.id {
                    own.push(opt.clone());
                    false
                } else {
                    true
                }
            });
            row.into_question(own)
        })
        .collect()
}

fn validate_new_questions(payload: &CreateQuizRequest) -> Result<(), AppError> {
    for question in &payload.questions {
        match question.kind {
            QuestionKind::SingleChoice => {
                let options = question.options.as_deref().unwrap_or(&[]);
                if options.is_empty() {
                    return Err(AppError::BadRequest(
                        "Single-choice questions require options".to_string(),
                    ));
                }
                let correct = options.iter().filter(|o| o.is_correct).count();
                if correct != 1 {
                    return Err(AppError::BadRequest(
                        "Single-choice questions require exactly one correct option".to_string(),
                    ));
                }
            }
            QuestionKind::ShortText => {
                if question.options.as_deref().is_some_and(|o| !o.is_empty()) {
                    return Err(AppError::BadRequest(
                        "Short-text questions should not have options".to_string(),
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Creates a quiz with its questions and options in one transaction and
/// hands back the public share URL.
pub async fn create_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    validate_new_questions(&payload)?;

    let user_id = claims.user_id()?;
    let quiz_id = uuid::Uuid::new_v4();
    let public_url = format!(
        "{}/quiz/{}",
        state.config.app_url.trim_end_matches('/'),
        quiz_id
    );

    let mut tx = state.pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO quizzes (id, user_id, title, public_url)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(quiz_id)
    .bind(user_id)
    .bind(&payload.title)
    .bind(&public_url)
    .execute(&mut *tx)
    .await?;

    for question in &payload.questions {
        let question_id = uuid::Uuid::new_v4();
        // The answer key column only exists for short-text questions;
        // single-choice correctness lives on the options.
        let correct_answer = match question.kind {
            QuestionKind::ShortText => question.correct_answer.as_deref(),
            QuestionKind::SingleChoice => None,
        };

        sqlx::query(
            r#"
            INSERT INTO questions (id, quiz_id, kind, question_text, correct_answer)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(question_id)
        .bind(quiz_id)
        .bind(question.kind.as_str())
        .bind(&question.question_text)
        .bind(correct_answer)
        .execute(&mut *tx)
        .await?;

        for option in question.options.as_deref().unwrap_or(&[]) {
            sqlx::query(
                r#"
                INSERT INTO question_options (id, question_id, option_text, is_correct)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(uuid::Uuid::new_v4())
            .bind(question_id)
            .bind(&option.text)
            .bind(option.is_correct)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    tracing::info!(%quiz_id, "quiz created");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": quiz_id,
            "public_url": public_url
        })),
    ))
}

/// Lists the authenticated creator's quizzes, newest first.
pub async fn list_quizzes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let quizzes = sqlx::query_as::<_, QuizSummary>(
        r#"
        SELECT id, title, public_url, created_at
        FROM quizzes
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch quizzes: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(quizzes))
}

/// Fetches one quiz with all questions and options.
///
/// Public: this is what the take-quiz page loads via the share link.
pub async fn get_quiz(
    State(state): State<AppState>,
    Path(quiz_id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, user_id, title, public_url, created_at
        FROM quizzes
        WHERE id = $1
        "#,
    )
    .bind(quiz_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let questions = load_questions(&state.pool, quiz_id).await?;

    Ok(Json(QuizDetail {
        id: quiz.id,
        title: quiz.title,
        public_url: quiz.public_url,
        created_at: quiz.created_at,
        questions,
    }))
}
