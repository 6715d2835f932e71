//! Helpers shared across route modules.

use std::str::FromStr;

use axum::http::StatusCode;

use epitrack_core::DomainError;

use crate::app::errors;

/// Parse a path identifier; failures become a 400 in the envelope.
pub fn parse_id<T>(raw: &str, what: &'static str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse().map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_id",
            format!("invalid {what} id"),
        )
    })
}
