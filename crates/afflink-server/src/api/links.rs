//! `POST /api/v1/links`: affiliate link generation without fetching.

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct LinkRequest {
    pub url: String,
    /// Overrides `AFFLINK_AFFILIATE_TAG` for this link.
    pub tag: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct LinkData {
    pub asin: String,
    pub canonical_url: String,
    pub affiliate_url: String,
}

pub(super) async fn create_link(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<LinkRequest>,
) -> Result<Json<ApiResponse<LinkData>>, ApiError> {
    let tag = body
        .tag
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or_else(|| state.scraper.affiliate_tag())
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.as_str(),
                "validation_error",
                "no affiliate tag given and AFFLINK_AFFILIATE_TAG is not set",
            )
        })?;

    let link = state
        .scraper
        .resolve_link(&body.url)
        .map_err(|e| ApiError::new(req_id.0.as_str(), "validation_error", e.to_string()))?;
    let affiliate_url = link
        .affiliate_url(tag)
        .map_err(|e| ApiError::new(req_id.0.as_str(), "validation_error", e.to_string()))?;

    Ok(Json(ApiResponse::new(
        LinkData {
            asin: link.asin().to_owned(),
            canonical_url: link.canonical_url(),
            affiliate_url,
        },
        req_id.0,
    )))
}
