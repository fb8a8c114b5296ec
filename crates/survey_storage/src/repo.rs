#![forbid(unsafe_code)]

use survey_kernel_contracts::submission::{
    SubmitResultData, SurveyResponsePayload, SurveySubmissionRequest,
    COMPLETION_STATUS_COMPLETED,
};
use survey_kernel_contracts::Validate;
use thiserror::Error;
use tracing::info;

use crate::survey_db::{
    new_row_id, InMemorySurveyStore, ParticipantRecord, ResponseRecord, StorageError,
    SubmissionRecord,
};

/// Table access used by the HTTP API. Implemented by the in-memory store and
/// the SQLite store.
pub trait SurveyRepo {
    fn insert_participant(
        &mut self,
        age: u32,
        field_of_study: &str,
        created_at: &str,
    ) -> Result<ParticipantRecord, StorageError>;

    fn insert_submission(
        &mut self,
        participant_id: &str,
        survey_version: &str,
        completion_status: &str,
        submitted_at: &str,
    ) -> Result<SubmissionRecord, StorageError>;

    fn insert_responses(
        &mut self,
        submission_id: &str,
        responses: &[SurveyResponsePayload],
    ) -> Result<usize, StorageError>;

    fn participant_count(&self) -> Result<u64, StorageError>;

    fn submission_count(&self) -> Result<u64, StorageError>;

    fn submission_count_by_status(&self, completion_status: &str) -> Result<u64, StorageError>;

    fn responses_for_submission(
        &self,
        submission_id: &str,
    ) -> Result<Vec<ResponseRecord>, StorageError>;
}

/// Step of `record_survey_submission` that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    Validate,
    Participant,
    Submission,
    Responses,
}

impl WriteStage {
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Validate => "Failed to submit survey",
            Self::Participant => "Failed to create participant",
            Self::Submission => "Failed to create submission",
            Self::Responses => "Failed to create responses",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}: {source}", .stage.failure_message())]
pub struct SubmissionWriteError {
    pub stage: WriteStage,
    #[source]
    pub source: StorageError,
}

impl SubmissionWriteError {
    fn at(stage: WriteStage) -> impl FnOnce(StorageError) -> Self {
        move |source| Self { stage, source }
    }
}

/// Persists one validated submission as participant, submission and
/// response rows, in that order. Each step depends on the id produced by
/// the one before it; earlier rows stay in place when a later step fails.
pub fn record_survey_submission<R: SurveyRepo + ?Sized>(
    repo: &mut R,
    request: &SurveySubmissionRequest,
    now_rfc3339: &str,
) -> Result<SubmitResultData, SubmissionWriteError> {
    request.validate().map_err(|v| SubmissionWriteError {
        stage: WriteStage::Validate,
        source: v.into(),
    })?;
    let participant = repo
        .insert_participant(
            request.participant.age,
            request.participant.field_of_study.trim(),
            now_rfc3339,
        )
        .map_err(SubmissionWriteError::at(WriteStage::Participant))?;
    let submission = repo
        .insert_submission(
            &participant.id,
            request.survey_version_or_default(),
            COMPLETION_STATUS_COMPLETED,
            now_rfc3339,
        )
        .map_err(SubmissionWriteError::at(WriteStage::Submission))?;
    let responses_count = repo
        .insert_responses(&submission.id, &request.responses)
        .map_err(SubmissionWriteError::at(WriteStage::Responses))?;
    info!(
        participant_id = %participant.id,
        submission_id = %submission.id,
        responses_count,
        "survey submission stored"
    );
    Ok(SubmitResultData {
        participant_id: participant.id,
        submission_id: submission.id,
        responses_count,
    })
}

impl SurveyRepo for InMemorySurveyStore {
    fn insert_participant(
        &mut self,
        age: u32,
        field_of_study: &str,
        created_at: &str,
    ) -> Result<ParticipantRecord, StorageError> {
        let record = ParticipantRecord {
            id: new_row_id(),
            age,
            field_of_study: field_of_study.to_string(),
            created_at: created_at.to_string(),
        };
        self.insert_participant_row(record.clone())?;
        Ok(record)
    }

    fn insert_submission(
        &mut self,
        participant_id: &str,
        survey_version: &str,
        completion_status: &str,
        submitted_at: &str,
    ) -> Result<SubmissionRecord, StorageError> {
        let record = SubmissionRecord {
            id: new_row_id(),
            participant_id: participant_id.to_string(),
            survey_version: survey_version.to_string(),
            completion_status: completion_status.to_string(),
            submitted_at: submitted_at.to_string(),
        };
        self.insert_submission_row(record.clone())?;
        Ok(record)
    }

    fn insert_responses(
        &mut self,
        submission_id: &str,
        responses: &[SurveyResponsePayload],
    ) -> Result<usize, StorageError> {
        self.insert_response_rows(submission_id, responses)
    }

    fn participant_count(&self) -> Result<u64, StorageError> {
        Ok(self.participant_rows().count() as u64)
    }

    fn submission_count(&self) -> Result<u64, StorageError> {
        Ok(self.submission_rows().count() as u64)
    }

    fn submission_count_by_status(&self, completion_status: &str) -> Result<u64, StorageError> {
        Ok(self
            .submission_rows()
            .filter(|s| s.completion_status == completion_status)
            .count() as u64)
    }

    fn responses_for_submission(
        &self,
        submission_id: &str,
    ) -> Result<Vec<ResponseRecord>, StorageError> {
        let mut rows: Vec<ResponseRecord> = self
            .response_rows()
            .iter()
            .filter(|r| r.submission_id == submission_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.response_order);
        Ok(rows)
    }
}
