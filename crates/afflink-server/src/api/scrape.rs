//! `POST /api/v1/scrape`: fetch and extract one product.

use afflink_core::ScrapedProduct;
use afflink_scraper::ScraperError;
use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

/// Message shown for every upstream fetch failure; details stay in the logs.
pub(super) const UPSTREAM_UNAVAILABLE_MESSAGE: &str = "temporarily unavailable, try again later";

#[derive(Debug, Deserialize)]
pub(super) struct ScrapeRequest {
    pub url: String,
}

pub(super) async fn scrape_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ScrapeRequest>,
) -> Result<Json<ApiResponse<ScrapedProduct>>, ApiError> {
    let scraped = state
        .scraper
        .scrape(&body.url, &state.rotation)
        .await
        .map_err(|e| map_scraper_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(scraped, req_id.0)))
}

pub(super) fn map_scraper_error(request_id: String, error: &ScraperError) -> ApiError {
    match error {
        ScraperError::InvalidProductUrl(e) => {
            ApiError::new(request_id, "validation_error", e.to_string())
        }
        ScraperError::Configuration(detail) => {
            tracing::error!(error = %detail, "scrape rejected: fetch paths misconfigured");
            ApiError::new(request_id, "configuration_error", "scraping is not configured")
        }
        other => {
            tracing::warn!(error = %other, "scrape failed upstream");
            ApiError::new(request_id, "upstream_unavailable", UPSTREAM_UNAVAILABLE_MESSAGE)
        }
    }
}
