//! SRM Types - Pure type definitions for the company registry
//!
//! This crate contains only data types with no async runtime dependencies,
//! so it can be shared by the server and any future frontend crate.

pub mod empresa;
pub mod stats;

pub use empresa::*;
pub use stats::*;

use serde::{Deserialize, Serialize};

/// Generic acknowledgment body returned by mutating endpoints.
///
/// Creation deliberately does not echo the stored record back; callers that
/// need the assigned id must re-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Acknowledgment {
    pub success: bool,
    pub message: String,
}

impl Acknowledgment {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Body of the administrative bulk-erase request.
#[derive(Debug, Clone, Deserialize)]
pub struct ClearRequest {
    pub key: String,
}
