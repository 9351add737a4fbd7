//! Compare endpoint.

use std::time::Instant;

use axum::{extract::State, Json};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use strata::{compare_reports, ComparisonReport, ProfileReport, RecordView};

use crate::server::error::ApiError;
use crate::server::state::{request_id, AppState};

use super::REQUEST_TIMEOUT;

/// Request body for POST /api/compare. Both datasets arrive as
/// already-parsed record arrays.
#[derive(Deserialize)]
pub struct CompareRequest {
    pub dataset1: Option<Vec<IndexMap<String, Value>>>,
    pub dataset2: Option<Vec<IndexMap<String, Value>>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    pub success: bool,
    pub request_id: String,
    pub data: CompareData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareData {
    pub comparison: ComparisonReport,
    pub profiles: ProfilePair,
    pub timing: CompareTiming,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePair {
    pub before: ProfileReport,
    pub after: ProfileReport,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareTiming {
    pub total_ms: u64,
}

/// POST /api/compare
pub async fn compare(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> Result<Json<CompareResponse>, ApiError> {
    let request_id = request_id();
    let started = Instant::now();

    let dataset1 = request
        .dataset1
        .ok_or_else(|| ApiError::bad_request("dataset1 is required", &request_id))?;
    let dataset2 = request
        .dataset2
        .ok_or_else(|| ApiError::bad_request("dataset2 is required", &request_id))?;

    let view1 = RecordView::from_records(&dataset1)
        .map_err(|e| ApiError::bad_request(format!("dataset1: {}", e), &request_id))?;
    let view2 = RecordView::from_records(&dataset2)
        .map_err(|e| ApiError::bad_request(format!("dataset2: {}", e), &request_id))?;

    tracing::debug!(
        request_id,
        rows1 = view1.len(),
        rows2 = view2.len(),
        "compare request"
    );

    // The two profiles are independent requests; run them in parallel.
    let engine1 = state.engine.clone();
    let engine2 = state.engine.clone();
    let job1 = tokio::task::spawn_blocking(move || engine1.profile_view(&view1));
    let job2 = tokio::task::spawn_blocking(move || engine2.profile_view(&view2));

    let joined = tokio::time::timeout(REQUEST_TIMEOUT, async { tokio::join!(job1, job2) })
        .await
        .map_err(|_| ApiError::timeout("Request timed out", &request_id))?;

    let before = joined
        .0
        .map_err(|e| ApiError::internal(e.to_string(), &request_id))?
        .map_err(|e| ApiError::from_engine(e, &request_id))?;
    let after = joined
        .1
        .map_err(|e| ApiError::internal(e.to_string(), &request_id))?
        .map_err(|e| ApiError::from_engine(e, &request_id))?;

    let comparison = compare_reports(&before, &after);

    Ok(Json(CompareResponse {
        success: true,
        request_id,
        data: CompareData {
            comparison,
            profiles: ProfilePair { before, after },
            timing: CompareTiming {
                total_ms: started.elapsed().as_millis() as u64,
            },
        },
    }))
}
