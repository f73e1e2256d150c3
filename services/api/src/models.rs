//! API models for request and response payloads

pub mod catalog;
pub mod recipe;
