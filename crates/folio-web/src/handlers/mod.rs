pub mod admin;
pub mod seo;
pub mod site;

use axum::response::{IntoResponse, Response};

use crate::error::Error;

/// Fallback for unmatched routes.
pub async fn not_found() -> Response { Error::NotFound.into_response() }
