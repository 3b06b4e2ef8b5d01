// src/models/teacher.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'teachers' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Teacher {
    pub id: i64,

    pub username: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// Display name.
    pub name: String,
}

/// DTO for teacher login.
#[derive(Debug, Deserialize, Validate)]
pub struct TeacherLoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}
