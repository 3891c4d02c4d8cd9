// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: uuid::Uuid,

    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,

    /// Unique email, doubles as the login name.
    pub email: String,

    pub phone: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: String,

    /// Account role. Quiz creators get 'creator'.
    pub role: String,

    /// Whether the signup OTP was confirmed for this email.
    pub is_email_verified: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for requesting a signup OTP.
#[derive(Debug, Deserialize, Validate)]
pub struct RequestOtpRequest {
    #[validate(email(message = "A valid email is required."))]
    pub email: String,
}

/// DTO for confirming a signup OTP.
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(equal = 6, message = "OTP must be 6 digits."))]
    pub otp: String,
}

/// DTO for creating a creator account.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(max = 100))]
    pub middle_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 30))]
    pub phone: String,
    #[validate(length(
        min = 8,
        max = 128,
        message = "Password length must be between 8 and 128 characters."
    ))]
    pub password: String,
    pub confirm_password: String,
    pub terms_accepted: bool,
}

/// DTO for logging in.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for requesting a password-reset OTP.
#[derive(Debug, Deserialize, Validate)]
pub struct RequestPasswordResetRequest {
    #[validate(email)]
    pub email: String,
}

/// DTO for completing a password reset.
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(equal = 6))]
    pub otp: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
    pub confirm_password: String,
}
