// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Minutes allotted to an exam when the teacher does not set a duration.
pub const DEFAULT_EXAM_DURATION: i32 = 60;

/// Weight given to a question created without explicit points.
pub const DEFAULT_QUESTION_POINTS: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    pub teacher_username: Option<String>,
    pub teacher_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            port,
            teacher_username: env::var("TEACHER_USERNAME").ok(),
            teacher_password: env::var("TEACHER_PASSWORD").ok(),
        }
    }
}
