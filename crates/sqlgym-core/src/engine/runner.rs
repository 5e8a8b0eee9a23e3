use crate::engine::pool::{InstancePool, PooledInstance};
use crate::errors::GymError;
use crate::model::{ColumnMatching, PlaygroundResult, RunOutcome, SchemaId, Settings, TableResult};
use crate::normalize::compare_tables;
use std::time::Instant;
use tokio::time::{timeout, Duration};

#[derive(Debug, Clone)]
pub struct RunPolicy {
    /// `None` lets a statement run until it finishes.
    pub statement_timeout: Option<Duration>,
    pub column_matching: ColumnMatching,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl RunPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            statement_timeout: settings.statement_timeout(),
            column_matching: settings.column_matching,
        }
    }
}

/// Runs learner SQL against pooled engines and grades it against a solution.
///
/// Every engine failure becomes the failure side of the returned outcome;
/// nothing is raised past these entry points.
#[derive(Clone)]
pub struct Runner {
    pub pool: InstancePool,
    pub policy: RunPolicy,
}

impl Runner {
    pub fn new(pool: InstancePool, policy: RunPolicy) -> Self {
        Self { pool, policy }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            InstancePool::new(settings.pool.clone()),
            RunPolicy::from_settings(settings),
        )
    }

    /// Run `user_sql` and `solution_sql` side by side and compare their last results.
    pub async fn run_validated(
        &self,
        schema: SchemaId,
        solution_sql: &str,
        user_sql: &str,
    ) -> RunOutcome {
        let start = Instant::now();
        match self.validate(schema, solution_sql, user_sql).await {
            Ok((actual, expected, matches)) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                tracing::info!(
                    event = "run.validated",
                    schema = %schema,
                    matches = matches,
                    actual_rows = actual.rows.len(),
                    expected_rows = expected.rows.len(),
                    duration_ms = duration_ms
                );
                RunOutcome::Completed {
                    matches,
                    actual,
                    expected,
                    duration_ms,
                }
            }
            Err(e) => {
                tracing::info!(event = "run.validated", schema = %schema, error = %e);
                RunOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn validate(
        &self,
        schema: SchemaId,
        solution_sql: &str,
        user_sql: &str,
    ) -> Result<(TableResult, TableResult, bool), GymError> {
        // a lease obtained before the other side fails is dropped here, and released
        let (user_lease, solution_lease) =
            tokio::join!(self.pool.acquire(schema), self.pool.acquire(schema));
        let user_lease = user_lease?;
        let solution_lease = solution_lease?;

        // both executions run to completion before either error is looked at
        let (actual, expected) = tokio::join!(
            self.execute(user_lease, user_sql),
            self.execute(solution_lease, solution_sql)
        );
        let actual = actual?;
        let expected = expected?;

        let matches = compare_tables(&actual, &expected, self.policy.column_matching);
        Ok((actual, expected, matches))
    }

    /// Run `sql` without grading.
    pub async fn run_freeform(&self, schema: SchemaId, sql: &str) -> PlaygroundResult {
        let start = Instant::now();
        let result = match self.pool.acquire(schema).await {
            Ok(lease) => self.execute(lease, sql).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(table) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                tracing::info!(
                    event = "run.freeform",
                    schema = %schema,
                    rows = table.rows.len(),
                    duration_ms = duration_ms
                );
                PlaygroundResult {
                    sql: sql.to_string(),
                    result: Some(table),
                    error: None,
                    duration_ms: Some(duration_ms),
                }
            }
            Err(e) => {
                tracing::info!(event = "run.freeform", schema = %schema, error = %e);
                PlaygroundResult {
                    sql: sql.to_string(),
                    result: None,
                    error: Some(e.to_string()),
                    duration_ms: None,
                }
            }
        }
    }

    /// Execute on the blocking pool.
    ///
    /// The task hands the lease back with its result, so the instance stays
    /// checked out until any timeout interrupt has been issued. If this future
    /// is dropped, the lease is released when the detached task finishes.
    async fn execute(&self, lease: PooledInstance, sql: &str) -> Result<TableResult, GymError> {
        let sql = sql.to_string();
        let interrupt = lease.interrupt_handle();
        let mut task = tokio::task::spawn_blocking(move || {
            let result = lease.execute_last(&sql);
            (lease, result)
        });

        let Some(limit) = self.policy.statement_timeout else {
            let (_lease, result) = task.await?;
            return result;
        };

        match timeout(limit, &mut task).await {
            Ok(joined) => {
                let (_lease, result) = joined?;
                result
            }
            Err(_) => {
                interrupt.interrupt();
                drop(task.await);
                let ms = limit.as_millis() as u64;
                tracing::warn!(event = "run.timeout", timeout_ms = ms, "statement interrupted");
                Err(GymError::Timeout(ms))
            }
        }
    }
}
