use crate::case::{TestCase, Verdict};
use crate::config::SharedConfig;
use crate::executor::{DynExecutor, Outcome};
use crate::report::{CaseResult, Report};
use time::OffsetDateTime;
use tracing::Instrument;

/// Runs test cases one after another through an [`Executor`][crate::executor::Executor].
#[derive(Clone)]
pub struct Runner {
    config: SharedConfig,
    executor: DynExecutor,
    filter: Option<String>,
    fail_fast: bool,
}

impl Runner {
    #[must_use]
    pub fn new(config: SharedConfig, executor: DynExecutor) -> Self {
        Runner {
            config,
            executor,
            filter: None,
            fail_fast: false,
        }
    }

    /// Only run cases whose name contains `filter`.
    #[must_use]
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter.filter(|f| !f.is_empty());
        self
    }

    /// Stop after the first case that does not pass.
    #[must_use]
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// The cases a [`run`][Self::run] would execute, in order.
    #[must_use]
    pub fn selected<'a>(&self, cases: &'a [TestCase]) -> Vec<&'a TestCase> {
        cases
            .iter()
            .filter(|case| {
                self.filter
                    .as_ref()
                    .map_or(true, |filter| case.name.contains(filter.as_str()))
            })
            .collect()
    }

    pub async fn run(&self, cases: &[TestCase]) -> Report {
        let selected = self.selected(cases);
        tracing::info!(
            "running {} of {} cases against {}",
            selected.len(),
            cases.len(),
            self.config.binary
        );
        let mut report = Report::new(OffsetDateTime::now_utc());
        for case in selected {
            let span = tracing::info_span!("case", name = %case.name);
            let result = self.run_case(case).instrument(span).await;
            let stop = self.fail_fast && !result.verdict.is_pass();
            report.push(result);
            if stop {
                tracing::info!("stopping after first failure");
                break;
            }
        }
        report.finish(OffsetDateTime::now_utc());
        report
    }

    async fn run_case(&self, case: &TestCase) -> CaseResult {
        tracing::debug!("$ {}", case.command);
        let (outcome, verdict) = match self
            .executor
            .execute(&case.command, self.config.timeout)
            .await
        {
            Ok(outcome) => {
                let verdict = case.expect.check(&outcome);
                log_outcome(&outcome);
                (Some(outcome), verdict)
            }
            Err(err) => {
                let reason = match std::error::Error::source(&err) {
                    Some(source) => format!("{err}: {source}"),
                    None => err.to_string(),
                };
                (None, Verdict::Error(reason))
            }
        };
        match &verdict {
            Verdict::Pass => tracing::info!("ok"),
            Verdict::Fail(reason) => tracing::warn!("FAIL: {reason}"),
            Verdict::Error(reason) => tracing::error!("ERROR: {reason}"),
        }
        CaseResult {
            case: case.clone(),
            outcome,
            verdict,
        }
    }
}

fn log_outcome(outcome: &Outcome) {
    if outcome.timed_out {
        tracing::warn!("timed out after {:?}", outcome.elapsed);
    }
    tracing::debug!(
        exit_code = outcome.exit_code,
        elapsed = ?outcome.elapsed,
        stdout = %outcome.stdout.trim_end(),
        stderr = %outcome.stderr.trim_end(),
        "finished"
    );
}
