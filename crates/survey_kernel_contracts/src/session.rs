#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::assignment::AssignmentSnapshot;
use crate::role::CreditRole;
use crate::{ContractViolation, Validate};

pub const PARTICIPANT_MIN_AGE: u32 = 18;
pub const PARTICIPANT_MAX_AGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyPage {
    #[default]
    Intake,
    Education,
    Assignment,
    Completed,
}

impl SurveyPage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::Education => "education",
            Self::Assignment => "assignment",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NavigationState {
    pub current_page: SurveyPage,
    pub is_submitted: bool,
    #[serde(default)]
    pub history: Vec<Vec<CreditRole>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub age: u32,
    pub field_of_study: String,
}

impl Validate for ParticipantInfo {
    fn validate(&self) -> Result<(), ContractViolation> {
        if !(PARTICIPANT_MIN_AGE..=PARTICIPANT_MAX_AGE).contains(&self.age) {
            return Err(ContractViolation::InvalidRange {
                field: "participant.age",
                min: f64::from(PARTICIPANT_MIN_AGE),
                max: f64::from(PARTICIPANT_MAX_AGE),
                got: f64::from(self.age),
            });
        }
        if self.field_of_study.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "participant.field_of_study",
                reason: "must not be empty",
            });
        }
        Ok(())
    }
}

/// The full local session as it is rebuilt at startup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersistedSession {
    pub navigation: NavigationState,
    pub participant: Option<ParticipantInfo>,
    pub assignment_snapshot: Option<AssignmentSnapshot>,
}
