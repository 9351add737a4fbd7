//! Profile endpoint.

use axum::{extract::State, Json};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use strata::{ProfileOptions, ProfileOutcome, SampleMetadata};

use crate::server::error::ApiError;
use crate::server::state::{request_id, AppState};

use super::REQUEST_TIMEOUT;

/// Request body for POST /api/profile.
#[derive(Deserialize)]
pub struct ProfileRequest {
    /// The raw delimited document. Validated here so a missing or
    /// mis-typed field yields an actionable 400 instead of a parse error.
    pub csv: Option<Value>,
    #[serde(default)]
    pub options: Option<OptionsDto>,
}

/// Wire form of the per-request options.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionsDto {
    pub delimiter: Option<String>,
    pub skip_empty_lines: Option<bool>,
    pub enable_sampling: Option<bool>,
    pub sample_size: Option<usize>,
    pub full_analysis: Option<bool>,
    pub use_cache: Option<bool>,
}

impl OptionsDto {
    pub fn into_options(self, request_id: &str) -> Result<ProfileOptions, ApiError> {
        let defaults = ProfileOptions::default();

        let delimiter = match self.delimiter {
            None => None,
            Some(d) => {
                let mut chars = d.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => {
                        return Err(ApiError::bad_request(
                            "options.delimiter must be a single character",
                            request_id,
                        ))
                    }
                }
            }
        };

        Ok(ProfileOptions {
            delimiter,
            skip_empty_lines: self.skip_empty_lines.unwrap_or(defaults.skip_empty_lines),
            enable_sampling: self.enable_sampling.unwrap_or(defaults.enable_sampling),
            sample_size: self.sample_size.unwrap_or(defaults.sample_size),
            full_analysis: self.full_analysis.unwrap_or(defaults.full_analysis),
            use_cache: self.use_cache.unwrap_or(defaults.use_cache),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub success: bool,
    pub request_id: String,
    pub from_cache: bool,
    pub data: ProfileData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    pub summary: strata::profile::ReportSummary,
    pub columns: indexmap::IndexMap<String, strata::ColumnStats>,
    pub correlations: strata::CorrelationSet,
    pub insights: Vec<strata::Insight>,
    pub metadata: ProfileMetadata,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMetadata {
    pub parse_errors: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<SampleMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored: Option<bool>,
}

/// POST /api/profile
pub async fn profile(
    State(state): State<AppState>,
    Json(request): Json<ProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let request_id = request_id();

    let csv = match request.csv {
        None | Some(Value::Null) => {
            return Err(ApiError::bad_request("CSV data is required", &request_id))
        }
        Some(Value::String(s)) => s,
        Some(_) => {
            return Err(ApiError::bad_request("csv must be a string", &request_id))
        }
    };

    let options = request
        .options
        .unwrap_or_default()
        .into_options(&request_id)?;

    tracing::debug!(request_id, bytes = csv.len(), "profile request");

    let engine = state.engine.clone();
    let job = tokio::task::spawn_blocking(move || engine.profile_csv(&csv, &options));

    let outcome = tokio::time::timeout(REQUEST_TIMEOUT, job)
        .await
        .map_err(|_| ApiError::timeout("Request timed out", &request_id))?
        .map_err(|e| ApiError::internal(e.to_string(), &request_id))?
        .map_err(|e| ApiError::from_engine(e, &request_id))?;

    Ok(Json(into_response(outcome, request_id)))
}

fn into_response(outcome: ProfileOutcome, request_id: String) -> ProfileResponse {
    let ProfileOutcome {
        report,
        from_cache,
        stored,
        parse_errors,
        sampling,
    } = outcome;

    ProfileResponse {
        success: true,
        request_id,
        from_cache,
        data: ProfileData {
            summary: report.summary,
            columns: report.column_stats,
            correlations: report.correlations,
            insights: report.insights,
            metadata: ProfileMetadata {
                parse_errors,
                sampling,
                stored,
            },
        },
    }
}

/// Self-describing usage document for GET /api/profile.
static USAGE: Lazy<Value> = Lazy::new(|| {
    serde_json::json!({
        "endpoint": "/api/profile",
        "method": "POST",
        "body": {
            "csv": "string (required, 10 bytes to 50 MiB)",
            "options": {
                "delimiter": "string, single character (default: auto-detect)",
                "skipEmptyLines": "boolean (default: true)",
                "enableSampling": "boolean (default: true)",
                "sampleSize": "number (default: 5000)",
                "fullAnalysis": "boolean (default: false)",
                "useCache": "boolean (default: true)"
            }
        },
        "response": {
            "success": "boolean",
            "requestId": "string",
            "fromCache": "boolean",
            "data": "summary, columns, correlations, insights, metadata"
        }
    })
});

/// GET /api/profile
pub async fn usage() -> Json<Value> {
    Json(USAGE.clone())
}
