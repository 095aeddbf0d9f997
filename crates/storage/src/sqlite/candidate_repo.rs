use chrono::{DateTime, Utc};
use interview_core::model::{Candidate, CandidateId, FinalAssessment};
use sqlx::Row;

use super::{SqliteRepository, conn, ser};
use crate::repository::{CandidateRecord, CandidateRepository, CandidateResult, StorageError};

fn map_candidate_row(row: &sqlx::sqlite::SqliteRow) -> Result<CandidateRecord, StorageError> {
    let id: CandidateId = row
        .try_get::<String, _>("id")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let candidate = Candidate::from_persisted(
        id,
        row.try_get("name").map_err(ser)?,
        row.try_get("email").map_err(ser)?,
        row.try_get("phone").map_err(ser)?,
        row.try_get("resume_text").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)?;

    let final_score: Option<i64> = row.try_get("final_score").map_err(ser)?;
    let summary: Option<String> = row.try_get("summary").map_err(ser)?;
    let completed_at: Option<DateTime<Utc>> = row.try_get("completed_at").map_err(ser)?;

    let result = match (final_score, summary, completed_at) {
        (Some(score), Some(summary), Some(completed_at)) => Some(CandidateResult {
            final_score: u8::try_from(score)
                .map_err(|_| StorageError::Serialization(format!("invalid final_score: {score}")))?,
            summary,
            completed_at,
        }),
        (None, None, None) => None,
        _ => {
            return Err(StorageError::Serialization(
                "partially recorded candidate result".into(),
            ));
        }
    };

    Ok(CandidateRecord { candidate, result })
}

#[async_trait::async_trait]
impl CandidateRepository for SqliteRepository {
    async fn upsert_candidate(&self, candidate: &Candidate) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO candidates (id, name, email, phone, resume_text, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    email = excluded.email,
                    phone = excluded.phone,
                    resume_text = excluded.resume_text
            ",
        )
        .bind(candidate.id().to_string())
        .bind(candidate.name())
        .bind(candidate.email())
        .bind(candidate.phone())
        .bind(candidate.resume_text())
        .bind(candidate.created_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_candidate(&self, id: CandidateId) -> Result<CandidateRecord, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    id, name, email, phone, resume_text, created_at,
                    final_score, summary, completed_at
                FROM candidates
                WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_candidate_row(&row)
    }

    async fn record_result(
        &self,
        id: CandidateId,
        assessment: &FinalAssessment,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
                UPDATE candidates
                SET final_score = ?2, summary = ?3, completed_at = ?4
                WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .bind(i64::from(assessment.final_score()))
        .bind(assessment.summary())
        .bind(completed_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
