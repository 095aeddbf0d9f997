use interview_core::model::{CandidateId, SessionSnapshot};
use sqlx::Row;
use tracing::warn;

use super::{SqliteRepository, conn, ser};
use crate::repository::{SessionRepository, StorageError};

fn decode(payload: &str) -> Result<SessionSnapshot, StorageError> {
    serde_json::from_str(payload).map_err(ser)
}

#[async_trait::async_trait]
impl SessionRepository for SqliteRepository {
    async fn save_snapshot(&self, snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        let payload = serde_json::to_string(snapshot).map_err(ser)?;

        sqlx::query(
            r"
                INSERT INTO session_snapshots (candidate_id, phase, payload, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(candidate_id) DO UPDATE SET
                    phase = excluded.phase,
                    payload = excluded.payload,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(snapshot.candidate_id().to_string())
        .bind(snapshot.phase.as_str())
        .bind(payload)
        .bind(snapshot.updated_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn load_snapshot(
        &self,
        candidate_id: CandidateId,
    ) -> Result<Option<SessionSnapshot>, StorageError> {
        let row = sqlx::query("SELECT payload FROM session_snapshots WHERE candidate_id = ?1")
            .bind(candidate_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.map(|r| decode(&r.try_get::<String, _>("payload").map_err(ser)?))
            .transpose()
    }

    async fn delete_snapshot(&self, candidate_id: CandidateId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM session_snapshots WHERE candidate_id = ?1")
            .bind(candidate_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }

    async fn list_unfinished(&self) -> Result<Vec<SessionSnapshot>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT candidate_id, payload
                FROM session_snapshots
                WHERE phase IN ('active', 'paused')
                ORDER BY updated_at DESC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let payload: String = row.try_get("payload").map_err(ser)?;
            match decode(&payload) {
                Ok(snapshot) => out.push(snapshot),
                Err(err) => {
                    let candidate_id: String = row.try_get("candidate_id").map_err(ser)?;
                    warn!(%candidate_id, error = %err, "skipping undecodable session snapshot");
                }
            }
        }
        Ok(out)
    }
}
