#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::common::char_len;
use crate::session::{ParticipantInfo, PARTICIPANT_MAX_AGE, PARTICIPANT_MIN_AGE};
use crate::{ContractViolation, Validate};

pub const SURVEY_VERSION_DEFAULT: &str = "1.0";
pub const TEXT_FIELD_MIN_CHARS: usize = 2;
pub const TEXT_FIELD_MAX_CHARS: usize = 100;
pub const RESPONSES_MIN: usize = 1;
pub const RESPONSES_MAX: usize = 20;
pub const COMPLETION_STATUS_COMPLETED: &str = "completed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantPayload {
    pub age: u32,
    pub field_of_study: String,
}

impl From<&ParticipantInfo> for ParticipantPayload {
    fn from(info: &ParticipantInfo) -> Self {
        Self {
            age: info.age,
            field_of_study: info.field_of_study.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyResponsePayload {
    pub role_title: String,
    pub assigned_icon: String,
    pub response_order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveySubmissionRequest {
    pub participant: ParticipantPayload,
    pub responses: Vec<SurveyResponsePayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survey_version: Option<String>,
}

impl SurveySubmissionRequest {
    pub fn survey_version_or_default(&self) -> &str {
        self.survey_version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(SURVEY_VERSION_DEFAULT)
    }
}

fn text_in_bounds(value: &str) -> bool {
    (TEXT_FIELD_MIN_CHARS..=TEXT_FIELD_MAX_CHARS).contains(&char_len(value.trim()))
}

impl Validate for SurveySubmissionRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        if !(PARTICIPANT_MIN_AGE..=PARTICIPANT_MAX_AGE).contains(&self.participant.age) {
            return Err(ContractViolation::InvalidRange {
                field: "participant.age",
                min: f64::from(PARTICIPANT_MIN_AGE),
                max: f64::from(PARTICIPANT_MAX_AGE),
                got: f64::from(self.participant.age),
            });
        }
        if !text_in_bounds(&self.participant.field_of_study) {
            return Err(ContractViolation::InvalidValue {
                field: "participant.field_of_study",
                reason: "must be 2..=100 characters",
            });
        }
        if !(RESPONSES_MIN..=RESPONSES_MAX).contains(&self.responses.len()) {
            return Err(ContractViolation::InvalidRange {
                field: "responses",
                min: RESPONSES_MIN as f64,
                max: RESPONSES_MAX as f64,
                got: self.responses.len() as f64,
            });
        }
        for response in &self.responses {
            if !text_in_bounds(&response.role_title) {
                return Err(ContractViolation::InvalidValue {
                    field: "responses.role_title",
                    reason: "must be 2..=100 characters",
                });
            }
            if !text_in_bounds(&response.assigned_icon) {
                return Err(ContractViolation::InvalidValue {
                    field: "responses.assigned_icon",
                    reason: "must be 2..=100 characters",
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    InvalidReference,
    InternalError,
    NotFound,
    RateLimited,
    UnhandledError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Envelope shared by every endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ApiErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: Option<String>, data: T) -> Self {
        Self {
            success: true,
            message,
            data: Some(data),
            error: None,
            code: None,
            details: None,
        }
    }

    pub fn failure(error: String, code: Option<ApiErrorCode>, details: Option<Vec<FieldError>>) -> Self {
        Self {
            success: false,
            message: None,
            data: None,
            error: Some(error),
            code,
            details,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResultData {
    pub participant_id: String,
    pub submission_id: String,
    pub responses_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyStatsData {
    pub total_participants: u64,
    pub total_submissions: u64,
    pub completed_submissions: u64,
    pub completion_rate: String,
}

impl SurveyStatsData {
    pub fn from_counts(total_participants: u64, total_submissions: u64, completed: u64) -> Self {
        Self {
            total_participants,
            total_submissions,
            completed_submissions: completed,
            completion_rate: format_completion_rate(completed, total_submissions),
        }
    }
}

/// Percentage with two decimals; `"0.00"` when nothing was submitted.
pub fn format_completion_rate(completed: u64, total: u64) -> String {
    if total == 0 {
        return "0.00".to_string();
    }
    format!("{:.2}", completed as f64 / total as f64 * 100.0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
}
