#![forbid(unsafe_code)]

//! HTTP surface of the survey: submission intake, aggregate statistics and
//! a liveness probe, backed by any `SurveyRepo`.

pub mod config;
pub mod error;
pub mod rate_limiter;
pub mod validation;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{ConnectInfo, DefaultBodyLimit, Request, State};
use axum::http::header::{CONTENT_TYPE, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::{from_fn, from_fn_with_state, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use survey_kernel_contracts::submission::{
    ApiResponse, FieldError, HealthResponse, SubmitResultData, SurveyStatsData,
    COMPLETION_STATUS_COMPLETED,
};
use survey_storage::repo::{record_survey_submission, SurveyRepo};
use survey_storage::survey_db::InMemorySurveyStore;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, info, warn};

use crate::config::AdapterConfig;
use crate::error::ApiError;
use crate::rate_limiter::{RateDecision, RateLimitConfig, RateLimiter};

pub const SUBMIT_ROUTE: &str = "/api/survey/submit";
pub const STATS_ROUTE: &str = "/api/survey/stats";
pub const HEALTH_ROUTE: &str = "/api/health";

pub const HEALTH_MESSAGE: &str = "Survey API is running";
pub const SUBMIT_SUCCESS_MESSAGE: &str = "Survey submitted successfully";

pub type SharedRepo = Arc<Mutex<Box<dyn SurveyRepo + Send>>>;

#[derive(Clone)]
pub struct AppState {
    repo: SharedRepo,
    limiter: Arc<RateLimiter>,
    rate_limit: RateLimitConfig,
}

impl AppState {
    pub fn new(repo: Box<dyn SurveyRepo + Send>, rate_limit: RateLimitConfig) -> Self {
        Self {
            repo: Arc::new(Mutex::new(repo)),
            limiter: Arc::new(RateLimiter::default()),
            rate_limit,
        }
    }

    pub fn in_memory(rate_limit: RateLimitConfig) -> Self {
        Self::new(Box::new(InMemorySurveyStore::new_in_memory()), rate_limit)
    }

    pub fn repo(&self) -> &SharedRepo {
        &self.repo
    }

    fn lock_repo(&self) -> Result<MutexGuard<'_, Box<dyn SurveyRepo + Send>>, ApiError> {
        self.repo.lock().map_err(|_| {
            warn!("survey repository lock poisoned");
            ApiError::Internal("Internal server error")
        })
    }
}

pub fn build_router(state: AppState, config: &AdapterConfig) -> Router {
    Router::new()
        .route(HEALTH_ROUTE, get(health))
        .route(SUBMIT_ROUTE, post(submit_survey))
        .route(STATS_ROUTE, get(survey_stats))
        .fallback(not_found)
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&config.cors_origins))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: HEALTH_MESSAGE.to_string(),
        timestamp: now_rfc3339(),
    })
}

async fn submit_survey(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<ApiResponse<SubmitResultData>>), ApiError> {
    let body = body.map_err(|rejection| ApiError::UnreadableBody {
        status: rejection.status(),
        message: rejection.body_text(),
    })?;
    let value: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        debug!(error = %e, "submit body is not JSON");
        ApiError::Validation(vec![FieldError::new(
            "body",
            format!("request body is not valid JSON: {e}"),
        )])
    })?;
    let request = validation::validate_submission(&value).map_err(ApiError::Validation)?;

    let now = now_rfc3339();
    let result = {
        let mut repo = state.lock_repo()?;
        record_survey_submission(&mut **repo, &request, &now)?
    };
    info!(
        submission_id = %result.submission_id,
        responses = result.responses_count,
        "survey submission accepted"
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            Some(SUBMIT_SUCCESS_MESSAGE.to_string()),
            result,
        )),
    ))
}

async fn survey_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SurveyStatsData>>, ApiError> {
    let repo = state.lock_repo()?;
    let participants = repo
        .participant_count()
        .map_err(|e| ApiError::from_storage(&e, "Failed to fetch participant count"))?;
    let submissions = repo
        .submission_count()
        .map_err(|e| ApiError::from_storage(&e, "Failed to fetch submission count"))?;
    let completed = repo
        .submission_count_by_status(COMPLETION_STATUS_COMPLETED)
        .map_err(|e| ApiError::from_storage(&e, "Failed to fetch completed count"))?;
    Ok(Json(ApiResponse::ok(
        None,
        SurveyStatsData::from_counts(participants, submissions, completed),
    )))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let key = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    match state
        .limiter
        .check(&key, &state.rate_limit, Instant::now())
        .await
    {
        RateDecision::Allowed { .. } => next.run(req).await,
        RateDecision::Limited { retry_after } => {
            warn!(client = %key, "rate limit exceeded");
            ApiError::RateLimited {
                retry_after_secs: retry_after.as_secs().max(1),
            }
            .into_response()
        }
    }
}

async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    response
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
