//! Run results and their text and JSON renderings.

use crate::case::{TestCase, Verdict};
use crate::executor::Outcome;
use lazy_static::lazy_static;
use serde::{Serialize, Serializer};
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::OffsetDateTime;

lazy_static! {
    static ref HEADER_FORMATTER: &'static [time::format_description::FormatItem<'static>] =
        format_description!(version = 2, "[year]-[month]-[day] [hour]:[minute]:[second] UTC");
}

const RULE_HEAVY: &str =
    "======================================================================";
const RULE_LIGHT: &str =
    "----------------------------------------------------------------------";

/// One executed case.
#[derive(Serialize, Debug, Clone)]
pub struct CaseResult {
    #[serde(flatten)]
    pub case: TestCase,
    /// Absent when the case could not be started.
    pub outcome: Option<Outcome>,
    #[serde(flatten)]
    pub verdict: Verdict,
}

#[derive(Serialize, Debug, Clone)]
pub struct Report {
    #[serde(serialize_with = "rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(serialize_with = "rfc3339")]
    pub finished_at: OffsetDateTime,
    pub results: Vec<CaseResult>,
}

fn rfc3339<S: Serializer>(at: &OffsetDateTime, s: S) -> Result<S::Ok, S::Error> {
    let formatted = at.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
    s.serialize_str(&formatted)
}

impl Report {
    #[must_use]
    pub fn new(started_at: OffsetDateTime) -> Self {
        Report {
            started_at,
            finished_at: started_at,
            results: Vec::default(),
        }
    }

    pub fn push(&mut self, result: CaseResult) {
        self.results.push(result);
    }

    pub fn finish(&mut self, finished_at: OffsetDateTime) {
        self.finished_at = finished_at;
    }

    #[must_use]
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.verdict.is_pass()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|v| matches!(v, Verdict::Fail(_)))
    }

    #[must_use]
    pub fn errors(&self) -> usize {
        self.count(|v| matches!(v, Verdict::Error(_)))
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.passed() == self.results.len()
    }

    fn count(&self, pred: impl Fn(&Verdict) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.verdict)).count()
    }

    /// # Errors
    ///
    /// Returns an error if the report can't be serialized, which only happens for timestamps
    /// outside the RFC 3339 range.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Render in the layout of a `unittest` text runner, with ANSI colour when `color` is set.
    #[must_use]
    pub fn render_text(&self, color: bool) -> String {
        TextReport {
            report: self,
            color,
        }
        .to_string()
    }
}

/// Plain text rendering, without colour.
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = TextReport {
            report: self,
            color: false,
        };
        fmt::Display::fmt(&text, f)
    }
}

struct TextReport<'a> {
    report: &'a Report,
    color: bool,
}

impl TextReport<'_> {
    fn paint(&self, code: &str, s: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{s}\x1b[0m")
        } else {
            s.to_string()
        }
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        if let Ok(started) = report.started_at.format(*HEADER_FORMATTER) {
            writeln!(f, "run started {started}")?;
        }
        for r in &report.results {
            let status = match r.verdict {
                Verdict::Pass => self.paint("32", "ok"),
                Verdict::Fail(_) => self.paint("31", "FAIL"),
                Verdict::Error(_) => self.paint("31;1", "ERROR"),
            };
            writeln!(f, "{} ({}) ... {status}", r.case.name, r.case.description)?;
        }

        for r in &report.results {
            let (label, reason) = match &r.verdict {
                Verdict::Fail(reason) => ("FAIL", reason),
                Verdict::Error(reason) => ("ERROR", reason),
                Verdict::Pass => continue,
            };
            writeln!(f, "\n{RULE_HEAVY}")?;
            writeln!(f, "{label}: {} ({})", r.case.name, r.case.description)?;
            writeln!(f, "{RULE_LIGHT}")?;
            writeln!(f, "command: {}", r.case.command)?;
            writeln!(f, "{reason}")?;
            if let Some(outcome) = &r.outcome {
                write_stream(f, "stdout", &outcome.stdout)?;
                write_stream(f, "stderr", &outcome.stderr)?;
            }
        }

        let elapsed = (report.finished_at - report.started_at).as_seconds_f64();
        writeln!(f, "\n{RULE_LIGHT}")?;
        writeln!(f, "Ran {} tests in {elapsed:.3}s\n", report.results.len())?;
        if report.is_success() {
            writeln!(f, "{}", self.paint("32", "OK"))
        } else {
            let summary = format!(
                "FAILED (failures={}, errors={})",
                report.failed(),
                report.errors()
            );
            writeln!(f, "{}", self.paint("31", &summary))
        }
    }
}

fn write_stream(f: &mut fmt::Formatter<'_>, label: &str, content: &str) -> fmt::Result {
    let content = content.trim_end();
    if content.is_empty() {
        return Ok(());
    }
    writeln!(f, "{label}:\n{content}")
}
