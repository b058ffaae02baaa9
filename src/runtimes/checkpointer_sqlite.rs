/*!
SQLite-backed checkpointer.

Durable [`Checkpointer`] implementation on top of a sqlx `SqlitePool`.
One row per thread in the `threads` table:

- `threads.id`         ← thread id
- `threads.state_json` ← serialized [`PersistedThread`]
- `threads.version`    ← optimistic concurrency token
- `threads.updated_at` ← RFC3339 timestamp of the last save

Optimistic concurrency is enforced in SQL rather than in application code:
the insert path uses `ON CONFLICT DO NOTHING` and the update path a
`WHERE version = ?` guard, so a stale writer changes zero rows and is
reported as a [`CheckpointerError::VersionConflict`]. Each save is a single
statement, which makes it atomic per thread id.

When the `sqlite-migrations` feature is enabled (default), embedded
migrations (`sqlx::migrate!("./migrations")`) run on connect; disabling the
feature assumes external migration orchestration.
*/

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use crate::runtimes::checkpointer::{
    Checkpointer, CheckpointerError, Result, ThreadCheckpoint,
};
use crate::runtimes::persistence::PersistedThread;
use crate::state::ConversationState;

/// Durable checkpointer backed by SQLite.
pub struct SqliteCheckpointer {
    pool: Arc<SqlitePool>,
}

impl std::fmt::Debug for SqliteCheckpointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCheckpointer").finish()
    }
}

impl SqliteCheckpointer {
    /// Connect to a SQLite database at `database_url`.
    /// Example URL: `"sqlite://threads.db"`.
    #[must_use = "checkpointer must be used to persist state"]
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str) -> std::result::Result<Self, CheckpointerError> {
        let pool = SqlitePool::connect(database_url)
            .await
            .map_err(|e| CheckpointerError::Backend {
                message: format!("connect error: {e}"),
            })?;
        #[cfg(feature = "sqlite-migrations")]
        {
            if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
                return Err(CheckpointerError::Backend {
                    message: format!("migration failure: {e}"),
                });
            }
        }
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    async fn stored_version(&self, thread_id: &str) -> Result<u64> {
        let row = sqlx::query("SELECT version FROM threads WHERE id = ?1")
            .bind(thread_id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| CheckpointerError::Backend {
                message: format!("select version: {e}"),
            })?;
        Ok(row.map(|r| r.get::<i64, _>("version") as u64).unwrap_or(0))
    }
}

#[async_trait::async_trait]
impl Checkpointer for SqliteCheckpointer {
    #[instrument(skip(self), err)]
    async fn load(&self, thread_id: &str) -> Result<Option<ThreadCheckpoint>> {
        let row = sqlx::query("SELECT state_json, version, updated_at FROM threads WHERE id = ?1")
            .bind(thread_id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| CheckpointerError::Backend {
                message: format!("select thread: {e}"),
            })?;

        let Some(row) = row else {
            return Ok(None);
        };

        let state_json: String = row.get("state_json");
        let version: i64 = row.get("version");
        let updated_at_raw: String = row.get("updated_at");

        let state = PersistedThread::from_json_str(&state_json)?
            .into_state(thread_id, version as u64);
        let updated_at = DateTime::parse_from_rfc3339(&updated_at_raw)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Some(ThreadCheckpoint {
            thread_id: thread_id.to_string(),
            state,
            updated_at,
        }))
    }

    #[instrument(skip(self, state), err)]
    async fn save(&self, state: &ConversationState, expected_version: u64) -> Result<u64> {
        let state_json = PersistedThread::from(state).to_json_string()?;
        let version = expected_version + 1;
        let now = Utc::now().to_rfc3339();

        let affected = if expected_version == 0 {
            sqlx::query(
                r#"
                INSERT INTO threads (id, state_json, version, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO NOTHING
                "#,
            )
            .bind(state.thread_id())
            .bind(&state_json)
            .bind(version as i64)
            .bind(&now)
            .execute(&*self.pool)
            .await
            .map_err(|e| CheckpointerError::Backend {
                message: format!("insert thread: {e}"),
            })?
            .rows_affected()
        } else {
            sqlx::query(
                r#"
                UPDATE threads
                SET state_json = ?2, version = ?3, updated_at = ?4
                WHERE id = ?1 AND version = ?5
                "#,
            )
            .bind(state.thread_id())
            .bind(&state_json)
            .bind(version as i64)
            .bind(&now)
            .bind(expected_version as i64)
            .execute(&*self.pool)
            .await
            .map_err(|e| CheckpointerError::Backend {
                message: format!("update thread: {e}"),
            })?
            .rows_affected()
        };

        if affected == 0 {
            let actual = self.stored_version(state.thread_id()).await?;
            return Err(CheckpointerError::VersionConflict {
                thread_id: state.thread_id().to_string(),
                expected: expected_version,
                actual,
            });
        }

        Ok(version)
    }

    #[instrument(skip(self), err)]
    async fn list_threads(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT id FROM threads ORDER BY id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| CheckpointerError::Backend {
                message: format!("list threads: {e}"),
            })?;
        Ok(rows.iter().map(|r| r.get::<String, _>("id")).collect())
    }
}
