#![forbid(unsafe_code)]

use std::env;
use std::time::Duration;

use serde::de::DeserializeOwned;
use survey_kernel_contracts::role::CreditRole;
use survey_kernel_contracts::session::ParticipantInfo;
use survey_kernel_contracts::submission::{
    ApiResponse, HealthResponse, ParticipantPayload, SubmitResultData, SurveyResponsePayload,
    SurveyStatsData, SurveySubmissionRequest, SURVEY_VERSION_DEFAULT,
};
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001";
pub const GENERIC_SUBMIT_FAILURE: &str =
    "Failed to submit survey. Please try again or contact support.";

const SUBMIT_PATH: &str = "/api/survey/submit";
const STATS_PATH: &str = "/api/survey/stats";
const HEALTH_PATH: &str = "/api/health";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionClientConfig {
    pub base_url: String,
    /// `None` keeps the transport's own defaults.
    pub timeout_ms: Option<u32>,
    pub user_agent: String,
}

impl SubmissionClientConfig {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_ms: None,
            user_agent: concat!("survey-engines/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn from_env() -> Self {
        let base_url = env::var("SURVEY_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let mut config = Self::with_base_url(base_url.trim());
        config.timeout_ms = env::var("SURVEY_API_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|v| *v > 0);
        config
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub participant_id: String,
    pub submission_id: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// Non-2xx or `success:false`; carries the server's message or a generic one.
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unreadable response: {0}")]
    MalformedResponse(String),
}

impl SubmissionError {
    /// Text suitable for an alert shown to the participant.
    pub fn user_message(&self) -> String {
        match self {
            Self::Server { message, .. } => message.clone(),
            Self::Transport(_) | Self::MalformedResponse(_) => GENERIC_SUBMIT_FAILURE.to_string(),
        }
    }
}

/// Seam between the page flow and the network.
pub trait SurveySubmitter {
    fn submit(
        &self,
        participant: &ParticipantInfo,
        roles: &[CreditRole],
    ) -> Result<SubmitReceipt, SubmissionError>;
}

/// Wire request from the roles in display order. Roles without an icon are
/// skipped; `response_order` stays contiguous from 0.
pub fn build_submission(participant: &ParticipantInfo, roles: &[CreditRole]) -> SurveySubmissionRequest {
    let responses = roles
        .iter()
        .filter(|role| role.is_assigned())
        .enumerate()
        .map(|(order, role)| SurveyResponsePayload {
            role_title: role.title.clone(),
            assigned_icon: role.assigned_icon.clone().unwrap_or_default(),
            response_order: order as u32,
        })
        .collect();
    SurveySubmissionRequest {
        participant: ParticipantPayload::from(participant),
        responses,
        survey_version: Some(SURVEY_VERSION_DEFAULT.to_string()),
    }
}

#[derive(Debug, Clone)]
pub struct SubmissionClient {
    base_url: String,
    agent: ureq::Agent,
}

impl SubmissionClient {
    pub fn new(config: SubmissionClientConfig) -> Self {
        let mut builder = ureq::AgentBuilder::new().user_agent(&config.user_agent);
        if let Some(timeout_ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(u64::from(timeout_ms)));
        }
        Self {
            base_url: config.base_url,
            agent: builder.build(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn submit_request(
        &self,
        request: &SurveySubmissionRequest,
    ) -> Result<SubmitReceipt, SubmissionError> {
        let url = format!("{}{}", self.base_url, SUBMIT_PATH);
        let result = self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .set("Accept", "application/json")
            .send_json(request);
        let body: ApiResponse<SubmitResultData> = read_envelope(result)?;
        let data = body.data.ok_or_else(|| {
            SubmissionError::MalformedResponse("missing data in submit response".to_string())
        })?;
        info!(
            participant_id = %data.participant_id,
            submission_id = %data.submission_id,
            responses = data.responses_count,
            "survey submitted"
        );
        Ok(SubmitReceipt {
            participant_id: data.participant_id,
            submission_id: data.submission_id,
            count: data.responses_count,
        })
    }

    pub fn stats(&self) -> Result<SurveyStatsData, SubmissionError> {
        let url = format!("{}{}", self.base_url, STATS_PATH);
        let result = self.agent.get(&url).set("Accept", "application/json").call();
        let body: ApiResponse<SurveyStatsData> = read_envelope(result)?;
        body.data.ok_or_else(|| {
            SubmissionError::MalformedResponse("missing data in stats response".to_string())
        })
    }

    pub fn health(&self) -> Result<HealthResponse, SubmissionError> {
        let url = format!("{}{}", self.base_url, HEALTH_PATH);
        match self.agent.get(&url).set("Accept", "application/json").call() {
            Ok(response) => response
                .into_json::<HealthResponse>()
                .map_err(|e| SubmissionError::MalformedResponse(e.to_string())),
            Err(err) => Err(submission_error_from_ureq(err)),
        }
    }
}

impl SurveySubmitter for SubmissionClient {
    fn submit(
        &self,
        participant: &ParticipantInfo,
        roles: &[CreditRole],
    ) -> Result<SubmitReceipt, SubmissionError> {
        self.submit_request(&build_submission(participant, roles))
    }
}

fn read_envelope<T: DeserializeOwned>(
    result: Result<ureq::Response, ureq::Error>,
) -> Result<ApiResponse<T>, SubmissionError> {
    let response = result.map_err(submission_error_from_ureq)?;
    let status = response.status();
    let body: ApiResponse<T> = response
        .into_json()
        .map_err(|e| SubmissionError::MalformedResponse(e.to_string()))?;
    if !body.success {
        return Err(SubmissionError::Server {
            status,
            message: body
                .error
                .unwrap_or_else(|| format!("HTTP error! status: {status}")),
        });
    }
    Ok(body)
}

fn submission_error_from_ureq(err: ureq::Error) -> SubmissionError {
    match err {
        ureq::Error::Status(status, response) => {
            let message = response
                .into_json::<ApiResponse<serde_json::Value>>()
                .ok()
                .and_then(|body| body.error)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| format!("HTTP error! status: {status}"));
            warn!(status, %message, "survey api rejected request");
            SubmissionError::Server { status, message }
        }
        ureq::Error::Transport(transport) => {
            warn!(kind = ?transport.kind(), "survey api unreachable");
            SubmissionError::Transport(transport.to_string())
        }
    }
}
