#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use survey_kernel_contracts::submission::SurveyResponsePayload;
use survey_kernel_contracts::ContractViolation;
use thiserror::Error;

pub const TABLE_PARTICIPANTS: &str = "survey_participants";
pub const TABLE_SUBMISSIONS: &str = "survey_submissions";
pub const TABLE_RESPONSES: &str = "survey_responses";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    #[error("foreign key violation on {table}: {key}")]
    ForeignKeyViolation { table: &'static str, key: String },
    #[error("duplicate key on {table}: {key}")]
    DuplicateKey { table: &'static str, key: String },
    #[error("contract violation: {0}")]
    ContractViolation(ContractViolation),
    #[error("backend failure: {0}")]
    Backend(String),
}

impl From<ContractViolation> for StorageError {
    fn from(v: ContractViolation) -> Self {
        StorageError::ContractViolation(v)
    }
}

impl StorageError {
    /// Broken relational link, reported to API clients as `INVALID_REFERENCE`.
    pub fn is_invalid_reference(&self) -> bool {
        matches!(self, Self::ForeignKeyViolation { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRecord {
    pub id: String,
    pub age: u32,
    pub field_of_study: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub id: String,
    pub participant_id: String,
    pub survey_version: String,
    pub completion_status: String,
    pub submitted_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRecord {
    pub id: String,
    pub submission_id: String,
    pub role_title: String,
    pub assigned_icon: String,
    pub response_order: u32,
}

pub(crate) fn new_row_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// In-memory tables with the same key rules as the SQLite schema.
#[derive(Debug, Clone, Default)]
pub struct InMemorySurveyStore {
    participants: BTreeMap<String, ParticipantRecord>,
    submissions: BTreeMap<String, SubmissionRecord>,
    responses: Vec<ResponseRecord>,
}

impl InMemorySurveyStore {
    pub fn new_in_memory() -> Self {
        Self::default()
    }

    pub(crate) fn insert_participant_row(
        &mut self,
        record: ParticipantRecord,
    ) -> Result<(), StorageError> {
        if self.participants.contains_key(&record.id) {
            return Err(StorageError::DuplicateKey {
                table: TABLE_PARTICIPANTS,
                key: record.id,
            });
        }
        self.participants.insert(record.id.clone(), record);
        Ok(())
    }

    pub(crate) fn insert_submission_row(
        &mut self,
        record: SubmissionRecord,
    ) -> Result<(), StorageError> {
        if !self.participants.contains_key(&record.participant_id) {
            return Err(StorageError::ForeignKeyViolation {
                table: TABLE_SUBMISSIONS,
                key: record.participant_id,
            });
        }
        if self.submissions.contains_key(&record.id) {
            return Err(StorageError::DuplicateKey {
                table: TABLE_SUBMISSIONS,
                key: record.id,
            });
        }
        self.submissions.insert(record.id.clone(), record);
        Ok(())
    }

    /// All-or-nothing: a bad submission id stores none of the rows.
    pub(crate) fn insert_response_rows(
        &mut self,
        submission_id: &str,
        responses: &[SurveyResponsePayload],
    ) -> Result<usize, StorageError> {
        if !self.submissions.contains_key(submission_id) {
            return Err(StorageError::ForeignKeyViolation {
                table: TABLE_RESPONSES,
                key: submission_id.to_string(),
            });
        }
        self.responses
            .extend(responses.iter().map(|response| ResponseRecord {
                id: new_row_id(),
                submission_id: submission_id.to_string(),
                role_title: response.role_title.clone(),
                assigned_icon: response.assigned_icon.clone(),
                response_order: response.response_order,
            }));
        Ok(responses.len())
    }

    pub fn participant_rows(&self) -> impl Iterator<Item = &ParticipantRecord> {
        self.participants.values()
    }

    pub fn submission_rows(&self) -> impl Iterator<Item = &SubmissionRecord> {
        self.submissions.values()
    }

    pub fn response_rows(&self) -> &[ResponseRecord] {
        &self.responses
    }
}
