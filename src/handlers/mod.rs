// src/handlers/mod.rs

pub mod auth;
pub mod exams;
pub mod folders;
pub mod results;
pub mod students;
