// src/handlers/auth.rs

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{
        LoginRequest, RequestOtpRequest, RequestPasswordResetRequest, ResetPasswordRequest,
        SignupRequest, User, VerifyOtpRequest,
    },
    otp::{self, OtpPurpose},
    state::AppState,
    utils::{
        hash::{hash_password, verify_password},
        jwt::{sign_jwt, verify_jwt},
    },
};

async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, first_name, middle_name, last_name, email, phone,
               password_hash, role, is_email_verified, created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to look up user by email: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(user)
}

/// Sends a signup OTP to a not-yet-registered email.
///
/// The code lands in the TTL-bounded OTP store and goes out through the
/// mailer collaborator.
pub async fn request_otp(
    State(state): State<AppState>,
    Json(payload): Json<RequestOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if find_by_email(&state.pool, &payload.email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let code = otp::generate_code();
    state
        .otp_store
        .put(OtpPurpose::Signup, &payload.email, code.clone())
        .await;

    state.mailer.send_otp(&payload.email, &code).await?;

    Ok(Json(json!({ "message": "OTP sent to email" })))
}

/// Confirms a signup OTP, unlocking /signup for that email.
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let entry = state
        .otp_store
        .get(OtpPurpose::Signup, &payload.email)
        .await;

    match entry {
        Some(entry) if entry.code == payload.otp => {
            state
                .otp_store
                .mark_verified(OtpPurpose::Signup, &payload.email)
                .await;
            Ok(Json(json!({
                "message": "Email verified successfully",
                "verified": true
            })))
        }
        _ => Err(AppError::BadRequest("Invalid OTP".to_string())),
    }
}

/// Creates a creator account.
///
/// Requires accepted terms, a matching password confirmation and a
/// previously verified OTP for the email. The OTP entry is consumed on
/// success.
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if !payload.terms_accepted {
        return Err(AppError::BadRequest("Terms must be accepted".to_string()));
    }

    if payload.password != payload.confirm_password {
        return Err(AppError::BadRequest("Passwords do not match".to_string()));
    }

    if find_by_email(&state.pool, &payload.email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let verified = state
        .otp_store
        .get(OtpPurpose::Signup, &payload.email)
        .await
        .map(|entry| entry.verified)
        .unwrap_or(false);
    if !verified {
        return Err(AppError::BadRequest("Email not verified".to_string()));
    }

    let password_hash = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (first_name, middle_name, last_name, email, phone,
                           password_hash, role, is_email_verified)
        VALUES ($1, $2, $3, $4, $5, $6, 'creator', TRUE)
        RETURNING id, first_name, middle_name, last_name, email, phone,
                  password_hash, role, is_email_verified, created_at
        "#,
    )
    .bind(&payload.first_name)
    .bind(&payload.middle_name)
    .bind(&payload.last_name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&password_hash)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict("User already exists".to_string())
        } else {
            tracing::error!("Failed to create user: {:?}", e);
            AppError::from(e)
        }
    })?;

    state
        .otp_store
        .remove(OtpPurpose::Signup, &payload.email)
        .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": user
        })),
    ))
}

/// Authenticates a creator and returns a JWT token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = find_by_email(&state.pool, &payload.email)
        .await?
        .ok_or(AppError::AuthError("No user found".to_string()))?;

    let is_valid = verify_password(&payload.password, &user.password_hash)?;
    if !is_valid {
        return Err(AppError::AuthError("Invalid email or password".to_string()));
    }

    let token = sign_jwt(
        user.id,
        &user.email,
        &user.role,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "type": "Bearer",
        "user": {
            "id": user.id,
            "first_name": user.first_name,
            "last_name": user.last_name,
            "email": user.email,
            "phone": user.phone,
            "role": user.role,
        }
    })))
}

/// Sends a password-reset OTP to an existing account's email.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<RequestPasswordResetRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if find_by_email(&state.pool, &payload.email).await?.is_none() {
        return Err(AppError::NotFound(
            "No account associated with this email".to_string(),
        ));
    }

    let code = otp::generate_code();
    state
        .otp_store
        .put(OtpPurpose::PasswordReset, &payload.email, code.clone())
        .await;

    state.mailer.send_otp(&payload.email, &code).await?;

    Ok(Json(json!({
        "message": "OTP sent to your email for password reset"
    })))
}

/// Completes a password reset: valid OTP, new password differing from the
/// old one.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if payload.new_password != payload.confirm_password {
        return Err(AppError::BadRequest("Passwords do not match".to_string()));
    }

    let entry = state
        .otp_store
        .get(OtpPurpose::PasswordReset, &payload.email)
        .await;
    if entry.map(|e| e.code) != Some(payload.otp.clone()) {
        return Err(AppError::BadRequest("Invalid or expired OTP".to_string()));
    }

    let user = find_by_email(&state.pool, &payload.email)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    if verify_password(&payload.new_password, &user.password_hash)? {
        return Err(AppError::BadRequest(
            "New password cannot be the same as the old password".to_string(),
        ));
    }

    let password_hash = hash_password(&payload.new_password)?;
    sqlx::query("UPDATE users SET password_hash = $1 WHERE email = $2")
        .bind(&password_hash)
        .bind(&payload.email)
        .execute(&state.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update password: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    state
        .otp_store
        .remove(OtpPurpose::PasswordReset, &payload.email)
        .await;

    Ok(Json(json!({ "message": "Password reset successful" })))
}

/// Decodes the caller's bearer token and echoes the claims back.
/// Used by the frontend to gate protected pages.
pub async fn verify_token(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AppError::AuthError("Token missing".to_string()))?;

    let claims = verify_jwt(token, &state.config.jwt_secret)?;

    Ok(Json(json!({ "valid": true, "user": claims })))
}
