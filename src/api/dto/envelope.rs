//! Success response envelopes.
//!
//! Every successful response has the shape
//! `{ "status": "success", ..., "data": { ... } }`. Listings add `results`
//! (items on this page) and `total` (items matching the filters).

use serde::Serialize;

use crate::domain::entities::User;

pub const SUCCESS: &str = "success";

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            status: SUCCESS,
            results: None,
            total: None,
            data,
        }
    }
}

impl<T: Serialize> ApiResponse<Data<Vec<T>>> {
    pub fn list(items: Vec<T>, total: i64) -> Self {
        Self {
            status: SUCCESS,
            results: Some(items.len()),
            total: Some(total),
            data: Data { data: items },
        }
    }
}

/// `{ "data": ... }` wrapper used by document endpoints.
#[derive(Debug, Serialize)]
pub struct Data<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> Data<T> {
    pub fn wrap(data: T) -> ApiResponse<Self> {
        ApiResponse::new(Self { data })
    }
}

#[derive(Debug, Serialize)]
pub struct UserData {
    pub user: User,
}

/// Body of every response that issues a session token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub status: &'static str,
    pub token: String,
    pub data: UserData,
}

impl AuthResponse {
    pub fn new(token: String, user: User) -> Self {
        Self {
            status: SUCCESS,
            token,
            data: UserData { user },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub status: &'static str,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: SUCCESS,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_envelope() {
        let body = serde_json::to_value(ApiResponse::list(vec![json!({"id": 1})], 7)).unwrap();
        assert_eq!(
            body,
            json!({
                "status": "success",
                "results": 1,
                "total": 7,
                "data": { "data": [{ "id": 1 }] }
            })
        );
    }

    #[test]
    fn test_document_envelope_omits_counts() {
        let body = serde_json::to_value(Data::wrap(json!({"id": 1}))).unwrap();
        assert_eq!(body, json!({ "status": "success", "data": { "data": { "id": 1 } } }));
    }
}
