#![forbid(unsafe_code)]

use survey_kernel_contracts::submission::{
    ParticipantPayload, SurveyResponsePayload, SurveySubmissionRequest,
};
use survey_storage::repo::{record_survey_submission, SurveyRepo, WriteStage};
use survey_storage::sqlite::SqliteSurveyStore;
use survey_storage::survey_db::{InMemorySurveyStore, StorageError, TABLE_SUBMISSIONS};

const NOW: &str = "2026-03-01T12:00:00Z";

fn request(responses: usize) -> SurveySubmissionRequest {
    SurveySubmissionRequest {
        participant: ParticipantPayload {
            age: 29,
            field_of_study: "  Neuroscience ".to_string(),
        },
        responses: (0..responses)
            .map(|i| SurveyResponsePayload {
                role_title: format!("Role {i}"),
                assigned_icon: format!("Icon {i}"),
                response_order: i as u32,
            })
            .collect(),
        survey_version: None,
    }
}

fn stores() -> Vec<(&'static str, Box<dyn SurveyRepo>)> {
    let memory: Box<dyn SurveyRepo> = Box::new(InMemorySurveyStore::new_in_memory());
    let sqlite: Box<dyn SurveyRepo> = Box::new(SqliteSurveyStore::open_in_memory().unwrap());
    vec![("memory", memory), ("sqlite", sqlite)]
}

#[test]
fn at_survey_db_01_record_submission_writes_all_three_tables() {
    for (name, mut repo) in stores() {
        let result = record_survey_submission(repo.as_mut(), &request(14), NOW).unwrap();
        assert_eq!(result.responses_count, 14, "{name}");
        assert_eq!(repo.participant_count().unwrap(), 1, "{name}");
        assert_eq!(repo.submission_count().unwrap(), 1, "{name}");
        assert_eq!(repo.submission_count_by_status("completed").unwrap(), 1, "{name}");

        let rows = repo.responses_for_submission(&result.submission_id).unwrap();
        assert_eq!(rows.len(), 14, "{name}");
        assert!(rows.iter().enumerate().all(|(i, r)| r.response_order == i as u32));
        assert_ne!(result.participant_id, result.submission_id);
    }
}

#[test]
fn at_survey_db_02_invalid_request_writes_nothing() {
    for (name, mut repo) in stores() {
        let mut bad = request(3);
        bad.participant.age = 17;
        let err = record_survey_submission(repo.as_mut(), &bad, NOW).unwrap_err();
        assert_eq!(err.stage, WriteStage::Validate, "{name}");
        assert!(matches!(err.source, StorageError::ContractViolation(_)), "{name}");
        assert_eq!(repo.participant_count().unwrap(), 0, "{name}");

        let err = record_survey_submission(repo.as_mut(), &request(0), NOW).unwrap_err();
        assert!(matches!(err.source, StorageError::ContractViolation(_)), "{name}");
        assert_eq!(repo.submission_count().unwrap(), 0, "{name}");
    }
}

#[test]
fn at_survey_db_03_foreign_keys_are_enforced_by_both_backends() {
    for (name, mut repo) in stores() {
        let err = repo
            .insert_submission("no-such-participant", "1.0", "completed", NOW)
            .unwrap_err();
        assert!(err.is_invalid_reference(), "{name}");
        assert!(
            matches!(err, StorageError::ForeignKeyViolation { table: TABLE_SUBMISSIONS, .. }),
            "{name}"
        );

        let err = repo
            .insert_responses("no-such-submission", &request(2).responses)
            .unwrap_err();
        assert!(err.is_invalid_reference(), "{name}");
    }
}

#[test]
fn at_survey_db_04_version_defaults_and_field_is_trimmed() {
    let mut repo = InMemorySurveyStore::new_in_memory();
    record_survey_submission(&mut repo, &request(1), NOW).unwrap();
    let participant = repo.participant_rows().next().unwrap();
    assert_eq!(participant.field_of_study, "Neuroscience");
    assert_eq!(participant.created_at, NOW);
    let submission = repo.submission_rows().next().unwrap();
    assert_eq!(submission.survey_version, "1.0");
    assert_eq!(submission.completion_status, "completed");

    let mut versioned = request(1);
    versioned.survey_version = Some("2.1".to_string());
    record_survey_submission(&mut repo, &versioned, NOW).unwrap();
    assert!(repo.submission_rows().any(|s| s.survey_version == "2.1"));
}

#[test]
fn at_survey_db_05_participants_accumulate_across_submissions() {
    for (name, mut repo) in stores() {
        for _ in 0..3 {
            record_survey_submission(repo.as_mut(), &request(2), NOW).unwrap();
        }
        assert_eq!(repo.participant_count().unwrap(), 3, "{name}");
        assert_eq!(repo.submission_count().unwrap(), 3, "{name}");
    }
}
