#![forbid(unsafe_code)]

//! Participant intake form as typed by the user, before it becomes a
//! `ParticipantInfo`.

use std::fmt;

use survey_engines::catalog::FIELD_OTHER;
use survey_kernel_contracts::session::{ParticipantInfo, PARTICIPANT_MAX_AGE, PARTICIPANT_MIN_AGE};

pub const AGE_MESSAGE: &str = "Please enter a valid age between 18 and 100";
pub const FIELD_OF_STUDY_MESSAGE: &str = "Please select or enter your field of study";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeForm {
    pub age: String,
    /// One of the catalog fields, or `"Other"` to use `custom_field`.
    pub field_of_study: String,
    pub custom_field: String,
}

/// Per-field messages; both fields are always checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeErrors {
    pub age: Option<&'static str>,
    pub field_of_study: Option<&'static str>,
}

impl IntakeErrors {
    pub fn is_empty(&self) -> bool {
        self.age.is_none() && self.field_of_study.is_none()
    }
}

impl fmt::Display for IntakeErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = [self.age, self.field_of_study].into_iter().flatten().collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl IntakeForm {
    pub fn new(age: &str, field_of_study: &str) -> Self {
        Self {
            age: age.to_string(),
            field_of_study: field_of_study.to_string(),
            custom_field: String::new(),
        }
    }

    pub fn with_custom_field(mut self, custom_field: &str) -> Self {
        self.field_of_study = FIELD_OTHER.to_string();
        self.custom_field = custom_field.to_string();
        self
    }

    pub fn resolved_field(&self) -> &str {
        if self.field_of_study == FIELD_OTHER {
            self.custom_field.trim()
        } else {
            self.field_of_study.trim()
        }
    }

    pub fn validate(&self) -> Result<ParticipantInfo, IntakeErrors> {
        let age = self
            .age
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|age| (PARTICIPANT_MIN_AGE..=PARTICIPANT_MAX_AGE).contains(age));
        let field = self.resolved_field();

        let errors = IntakeErrors {
            age: age.is_none().then_some(AGE_MESSAGE),
            field_of_study: field.is_empty().then_some(FIELD_OF_STUDY_MESSAGE),
        };
        match age {
            Some(age) if errors.is_empty() => Ok(ParticipantInfo {
                age,
                field_of_study: field.to_string(),
            }),
            _ => Err(errors),
        }
    }
}
