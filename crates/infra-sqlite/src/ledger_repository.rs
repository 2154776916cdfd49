// SQLite AssignmentLedger + live LoadSource

use async_trait::async_trait;
use sqlx::SqlitePool;
use switchboard_core::domain::AgentType;
use switchboard_core::error::{AppError, Result};
use switchboard_core::port::{AssignmentLedger, LedgerEntry, LedgerState, LoadSource};

// Helper to convert sqlx::Error to AppError with structured information
fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            // SQLite error codes: https://www.sqlite.org/rescode.html
            Some(code @ ("2067" | "1555")) => AppError::Conflict(format!(
                "Unique constraint violation: {} ({})",
                db_err.message(),
                code
            )),
            Some("5") => AppError::Database(format!(
                "Database locked (SQLITE_BUSY): {}",
                db_err.message()
            )),
            Some("13") => AppError::Database(format!("Database full: {}", db_err.message())),
            Some(code) => AppError::Database(format!(
                "Database error [{}]: {}",
                code,
                db_err.message()
            )),
            None => AppError::Database(format!("Database error: {}", db_err.message())),
        },
        sqlx::Error::RowNotFound => AppError::NotFound("Row not found".to_string()),
        sqlx::Error::PoolTimedOut => {
            AppError::Database("Timed out waiting for a database connection".to_string())
        }
        _ => AppError::Database(err.to_string()),
    }
}

pub struct SqliteAssignmentLedger {
    pool: SqlitePool,
}

impl SqliteAssignmentLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssignmentLedger for SqliteAssignmentLedger {
    async fn record_started(&self, entry: &LedgerEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO assignments (
                request_id, client_id, category, priority, agent,
                state, started_at, finished_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.request_id)
        .bind(&entry.client_id)
        .bind(entry.category.code())
        .bind(entry.priority.code())
        .bind(entry.agent.code())
        .bind(entry.state.to_string())
        .bind(entry.started_at)
        .bind(entry.finished_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn record_finished(&self, request_id: &str, finished_at: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE assignments
            SET state = ?, finished_at = ?
            WHERE request_id = ? AND state = ?
            "#,
        )
        .bind(LedgerState::Done.to_string())
        .bind(finished_at)
        .bind(request_id)
        .bind(LedgerState::InProgress.to_string())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_in_progress(&self, agent: AgentType) -> Result<u32> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM assignments WHERE agent = ? AND state = ?")
                .bind(agent.code())
                .bind(LedgerState::InProgress.to_string())
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        u32::try_from(count).map_err(|_| AppError::Internal(format!("count out of range: {}", count)))
    }

    async fn find(&self, request_id: &str) -> Result<Option<LedgerEntry>> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            "SELECT * FROM assignments WHERE request_id = ?",
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(AssignmentRow::into_entry).transpose()
    }
}

/// Live load figures: in-progress ledger rows per agent
pub struct SqliteLoadSource {
    ledger: SqliteAssignmentLedger,
}

impl SqliteLoadSource {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            ledger: SqliteAssignmentLedger::new(pool),
        }
    }
}

#[async_trait]
impl LoadSource for SqliteLoadSource {
    async fn current_load(&self, agent: AgentType) -> Result<u32> {
        self.ledger
            .count_in_progress(agent)
            .await
            .map_err(|e| AppError::load_source(agent, e.to_string()))
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct AssignmentRow {
    request_id: String,
    client_id: String,
    category: String,
    priority: String,
    agent: String,
    state: String,
    started_at: i64,
    finished_at: Option<i64>,
}

impl AssignmentRow {
    fn into_entry(self) -> Result<LedgerEntry> {
        let state = match self.state.as_str() {
            "IN_PROGRESS" => LedgerState::InProgress,
            "DONE" => LedgerState::Done,
            other => {
                return Err(AppError::Database(format!(
                    "unexpected ledger state {} for {}",
                    other, self.request_id
                )))
            }
        };

        Ok(LedgerEntry {
            category: self.category.parse()?,
            priority: self.priority.parse()?,
            agent: self.agent.parse()?,
            request_id: self.request_id,
            client_id: self.client_id,
            state,
            started_at: self.started_at,
            finished_at: self.finished_at,
        })
    }
}
