//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - IDs are serialised as hex strings.
//! - Field names are camelCase.
//! - Credentials and ballots never appear in responses.

pub mod candidate;
pub mod user;

use serde::{Deserialize, Serialize};

/// Body of both visibility endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    pub visible: bool,
}
