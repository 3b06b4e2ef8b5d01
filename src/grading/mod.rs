// src/grading/mod.rs

//! Exam scoring core: attempt policy, answer normalization, scoring and
//! manual grading. Everything except `service` is pure.

pub mod engine;
pub mod error;
pub mod normalize;
pub mod policy;
pub mod reconcile;
pub mod service;

pub use error::GradingError;
