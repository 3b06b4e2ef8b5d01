// src/models/mod.rs

pub mod answer;
pub mod exam;
pub mod folder;
pub mod question;
pub mod result;
pub mod student;
pub mod teacher;
