//! Top-level command orchestration.
pub mod provision;
