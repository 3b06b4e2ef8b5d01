// src/models/student.rs

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Login codes are short alphanumeric identifiers, e.g. "HS10A-023".
static STUDENT_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{1,31}$").unwrap());

/// Represents the 'students' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,

    /// Unique code the student logs in with.
    pub student_code: String,

    pub name: String,

    /// School class, e.g. '10A1'.
    pub class: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating or replacing a student.
#[derive(Debug, Deserialize, Validate)]
pub struct StudentRequest {
    #[validate(regex(path = *STUDENT_CODE, message = "Invalid student code."))]
    pub student_code: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 20))]
    #[serde(default)]
    pub class: String,
}

/// DTO for student login.
#[derive(Debug, Deserialize, Validate)]
pub struct StudentLoginRequest {
    #[validate(length(min = 1, max = 32))]
    pub student_code: String,
}
