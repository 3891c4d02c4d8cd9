// src/config.rs

use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// JWT lifetime in seconds.
    pub jwt_expiration: u64,
    /// Base URL prepended to public quiz links, e.g. "https://quiz.example.com".
    pub app_url: String,
    /// Seconds a signup / password-reset OTP stays usable.
    pub otp_ttl_seconds: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            // 300 hours, matching how long creator dashboards stay logged in.
            .unwrap_or(300 * 3600);

        let app_url = env::var("APP_URL").unwrap_or_else(|_| "http://localhost:5000".to_string());

        let otp_ttl_seconds = env::var("OTP_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(600);

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            app_url,
            otp_ttl_seconds,
            port,
            rust_log,
        }
    }
}
