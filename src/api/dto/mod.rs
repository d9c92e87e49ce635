//! Data Transfer Objects for API requests and responses.
//!
//! Request bodies are deserialized with Serde and checked with validator
//! before they are converted into domain inputs. Every failed check ends up
//! in a single `400 Invalid input data. ...` response.

pub mod envelope;
pub mod health;
pub mod review;
pub mod tour;
pub mod user;

use serde::{Deserialize, Deserializer};

/// Deserializes an optional string with surrounding whitespace removed.
pub(crate) fn trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(|s| s.trim().to_string()))
}
