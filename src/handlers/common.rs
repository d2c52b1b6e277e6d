use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Deserializer};
use validator::Validate;

use crate::errors::ApiError;

/// 200 OK with a JSON body.
pub fn success_response<T: serde::Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::OK, Json(data))
}

/// 201 Created with a JSON body.
pub fn created_response<T: serde::Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::CREATED, Json(data))
}

/// 204 No Content.
pub fn no_content_response() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

/// Validates a request payload, mapping failures to a 400 response.
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))
}

/// Distinguishes an absent JSON field from an explicit `null`, so PATCH-style
/// updates can clear a nullable column. Pair with `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Page-number pagination shared by the list endpoints.
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationParams {
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.per_page
    }
}
