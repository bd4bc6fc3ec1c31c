use std::time::Instant;

use crate::builder::QueryAndParams;

const STATEMENT_TARGET: &str = "sql_session::statement";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Incomplete,
    Ok,
    Error,
}

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Outcome::Incomplete => "incomplete",
            Outcome::Ok => "ok",
            Outcome::Error => "error",
        }
    }
}

/// Emits one dev-mode log line per statement when dropped.
///
/// Dropping happens on every exit path, so a statement whose future is cancelled is
/// still reported (as `incomplete`).
pub(crate) struct QueryLog<'a> {
    statement: Option<&'a QueryAndParams>,
    started: Instant,
    outcome: Outcome,
}

impl<'a> QueryLog<'a> {
    pub(crate) fn start(dev_mode: bool, statement: &'a QueryAndParams) -> Self {
        Self {
            statement: dev_mode.then_some(statement),
            started: Instant::now(),
            outcome: Outcome::Incomplete,
        }
    }

    pub(crate) fn finish<T, E>(&mut self, result: &Result<T, E>) {
        self.outcome = if result.is_ok() {
            Outcome::Ok
        } else {
            Outcome::Error
        };
    }
}

impl Drop for QueryLog<'_> {
    fn drop(&mut self) {
        let Some(statement) = self.statement else {
            return;
        };
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(
            target: STATEMENT_TARGET,
            sql = %statement.query.trim_end(),
            params = ?statement.params,
            outcome = self.outcome.as_str(),
            elapsed_ms,
            "statement"
        );
    }
}
