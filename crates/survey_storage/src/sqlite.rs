#![forbid(unsafe_code)]

//! SQLite-backed survey tables. Foreign keys are switched on for every
//! connection so broken links surface as `StorageError::ForeignKeyViolation`.

use std::path::Path;

use rusqlite::{params, Connection};
use survey_kernel_contracts::submission::SurveyResponsePayload;
use tracing::info;

use crate::repo::SurveyRepo;
use crate::survey_db::{
    new_row_id, ParticipantRecord, ResponseRecord, StorageError, SubmissionRecord,
    TABLE_PARTICIPANTS, TABLE_RESPONSES, TABLE_SUBMISSIONS,
};

#[derive(Debug)]
pub struct SqliteSurveyStore {
    conn: Connection,
}

impl SqliteSurveyStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(backend_error)?;
        info!(path = %path.display(), "opened survey database");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(backend_error)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(backend_error)?;
        Self::init_schema(&conn).map_err(backend_error)?;
        Ok(Self { conn })
    }

    pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS survey_participants (
                id TEXT PRIMARY KEY,
                age INTEGER NOT NULL CHECK (age BETWEEN 18 AND 100),
                field_of_study TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS survey_submissions (
                id TEXT PRIMARY KEY,
                participant_id TEXT NOT NULL REFERENCES survey_participants(id),
                survey_version TEXT NOT NULL,
                completion_status TEXT NOT NULL,
                submitted_at TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS survey_responses (
                id TEXT PRIMARY KEY,
                submission_id TEXT NOT NULL REFERENCES survey_submissions(id),
                role_title TEXT NOT NULL,
                assigned_icon TEXT NOT NULL,
                response_order INTEGER NOT NULL CHECK (response_order >= 0)
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_survey_responses_submission
             ON survey_responses(submission_id)",
            [],
        )?;
        Ok(())
    }

    fn count(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<u64, StorageError> {
        let count: i64 = self
            .conn
            .query_row(sql, args, |row| row.get(0))
            .map_err(backend_error)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

impl SurveyRepo for SqliteSurveyStore {
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
        self.conn
            .execute(
                "INSERT INTO survey_participants (id, age, field_of_study, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![record.id, record.age, record.field_of_study, record.created_at],
            )
            .map_err(|e| classify(e, TABLE_PARTICIPANTS, &record.id))?;
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
        self.conn
            .execute(
                "INSERT INTO survey_submissions
                 (id, participant_id, survey_version, completion_status, submitted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    record.participant_id,
                    record.survey_version,
                    record.completion_status,
                    record.submitted_at
                ],
            )
            .map_err(|e| classify(e, TABLE_SUBMISSIONS, participant_id))?;
        Ok(record)
    }

    fn insert_responses(
        &mut self,
        submission_id: &str,
        responses: &[SurveyResponsePayload],
    ) -> Result<usize, StorageError> {
        let tx = self.conn.transaction().map_err(backend_error)?;
        for response in responses {
            tx.execute(
                "INSERT INTO survey_responses
                 (id, submission_id, role_title, assigned_icon, response_order)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    new_row_id(),
                    submission_id,
                    response.role_title,
                    response.assigned_icon,
                    response.response_order
                ],
            )
            .map_err(|e| classify(e, TABLE_RESPONSES, submission_id))?;
        }
        tx.commit().map_err(backend_error)?;
        Ok(responses.len())
    }

    fn participant_count(&self) -> Result<u64, StorageError> {
        self.count("SELECT COUNT(*) FROM survey_participants", &[])
    }

    fn submission_count(&self) -> Result<u64, StorageError> {
        self.count("SELECT COUNT(*) FROM survey_submissions", &[])
    }

    fn submission_count_by_status(&self, completion_status: &str) -> Result<u64, StorageError> {
        self.count(
            "SELECT COUNT(*) FROM survey_submissions WHERE completion_status = ?1",
            &[&completion_status],
        )
    }

    fn responses_for_submission(
        &self,
        submission_id: &str,
    ) -> Result<Vec<ResponseRecord>, StorageError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, submission_id, role_title, assigned_icon, response_order
                 FROM survey_responses WHERE submission_id = ?1
                 ORDER BY response_order",
            )
            .map_err(backend_error)?;
        let rows = stmt
            .query_map(params![submission_id], |row| {
                Ok(ResponseRecord {
                    id: row.get(0)?,
                    submission_id: row.get(1)?,
                    role_title: row.get(2)?,
                    assigned_icon: row.get(3)?,
                    response_order: row.get(4)?,
                })
            })
            .map_err(backend_error)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(backend_error)
    }
}

fn backend_error(err: rusqlite::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

fn classify(err: rusqlite::Error, table: &'static str, key: &str) -> StorageError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        match failure.extended_code {
            rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                return StorageError::ForeignKeyViolation {
                    table,
                    key: key.to_string(),
                }
            }
            rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            | rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE => {
                return StorageError::DuplicateKey {
                    table,
                    key: key.to_string(),
                }
            }
            _ => {}
        }
    }
    backend_error(err)
}
