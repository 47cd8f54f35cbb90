//! Common API utilities and shared types

use serde::{Deserialize, Serialize};

/// Request carrying a single record id
#[derive(Debug, Deserialize)]
pub struct IdRequest {
    #[serde(default)]
    pub id: String,
}

/// Body of a successful delete
#[derive(Debug, Default, Serialize)]
pub struct EmptyResponse {}

/// Wire patch fields are plain strings; empty means "not supplied"
pub fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
