//! Handles all user-facing report output for the CLI.
//!
//! Two [`ReportFormat`]s live here: colored human-readable lines written through
//! `termcolor`, and one JSON object per line for CI tooling.

use std::io::{self, Write};

use serde::Serialize;
use termcolor::{Color, ColorSpec, StandardStream, WriteColor};

use crate::compare::{line_diff, DiffLine, Outcome};
use crate::config::{HarnessConfig, OutputFormat};
use crate::report::{CaseRecord, ReportFormat, RunSummary, SkipPolicy};

const RULE_WIDTH: usize = 40;

/// Builds the format selected by `config`, writing to stdout.
pub fn format_for(config: &HarnessConfig) -> Box<dyn ReportFormat> {
    match config.format {
        OutputFormat::Human => Box::new(HumanFormat::new(
            StandardStream::stdout(config.color.choice()),
            config.max_diff_lines,
            config.show_full,
        )),
        OutputFormat::Json => Box::new(JsonFormat::new(io::stdout(), config.max_diff_lines)),
    }
}

// ============================================================================
// HUMAN FORMAT
// ============================================================================

pub struct HumanFormat<W> {
    out: W,
    max_diff_lines: usize,
    show_full: bool,
}

impl<W: WriteColor> HumanFormat<W> {
    pub fn new(out: W, max_diff_lines: usize, show_full: bool) -> Self {
        Self {
            out,
            max_diff_lines,
            show_full,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn colored(&mut self, text: &str, color: Color, bold: bool) -> io::Result<()> {
        self.out
            .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold))?;
        write!(self.out, "{text}")?;
        self.out.reset()
    }

    fn diff(&mut self, expected: &str, actual: &str) -> io::Result<()> {
        writeln!(self.out, "  --- expected")?;
        writeln!(self.out, "  +++ actual")?;
        for line in line_diff(expected, actual, self.max_diff_lines) {
            write!(self.out, "  ")?;
            match &line {
                DiffLine::Removed(_) => self.colored(&line.to_string(), Color::Red, false)?,
                DiffLine::Added(_) => self.colored(&line.to_string(), Color::Green, false)?,
                DiffLine::Unchanged(_) | DiffLine::Elided(_) => {
                    self.colored(&line.to_string(), Color::Cyan, false)?
                }
                DiffLine::Same(_) => write!(self.out, "{line}")?,
            }
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn full(&mut self, expected: &str, actual: &str) -> io::Result<()> {
        self.colored("Expected:", Color::White, true)?;
        writeln!(self.out, "\n{expected}")?;
        self.colored("Got:", Color::White, true)?;
        writeln!(self.out, "\n{actual}")
    }
}

impl<W: WriteColor> ReportFormat for HumanFormat<W> {
    fn start(&mut self, total: usize) -> io::Result<()> {
        writeln!(self.out, "Found {total} test case(s).")?;
        writeln!(self.out, "{}", "-".repeat(RULE_WIDTH))
    }

    fn case(&mut self, record: &CaseRecord) -> io::Result<()> {
        let label = format!("{:<5}", record.outcome.label());
        match &record.outcome {
            Outcome::Pass => {
                self.colored(&label, Color::Green, true)?;
                writeln!(self.out, " {}", record.name)
            }
            Outcome::Skip { reason } => {
                self.colored(&label, Color::Yellow, true)?;
                writeln!(self.out, " {} ({reason})", record.name)
            }
            Outcome::ExecutionError { message } => {
                self.colored(&label, Color::Red, true)?;
                writeln!(self.out, " {}: {message}", record.name)
            }
            Outcome::Fail { expected, actual } => {
                self.colored(&label, Color::Red, true)?;
                writeln!(self.out, " {}", record.name)?;
                self.diff(expected, actual)?;
                if self.show_full {
                    self.full(expected, actual)?;
                }
                Ok(())
            }
        }
    }

    fn summary(&mut self, summary: &RunSummary, policy: SkipPolicy) -> io::Result<()> {
        writeln!(self.out, "{}", "-".repeat(RULE_WIDTH))?;
        write!(self.out, "Test summary: total {}, ", summary.total())?;
        self.colored("passed", Color::Green, false)?;
        write!(self.out, " {}, ", summary.passed)?;
        self.colored("failed", Color::Red, false)?;
        write!(self.out, " {}, ", summary.failed)?;
        self.colored("skipped", Color::Yellow, false)?;
        writeln!(self.out, " {}", summary.skipped)?;

        if summary.failed > 0 {
            writeln!(self.out, "\nFailed cases:")?;
            for name in summary.failed_names() {
                writeln!(self.out, "  - {name}")?;
            }
        }
        if policy == SkipPolicy::Fail && summary.skipped > 0 {
            writeln!(self.out, "\nSkipped cases fail this run (skip policy: fail).")?;
        }
        Ok(())
    }
}

// ============================================================================
// JSON FORMAT
// ============================================================================

#[derive(Serialize)]
struct StartEvent {
    event: &'static str,
    total: usize,
}

#[derive(Serialize)]
struct CaseEvent<'a> {
    event: &'static str,
    #[serde(flatten)]
    record: &'a CaseRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    diff: Option<Vec<DiffLine>>,
}

#[derive(Serialize)]
struct SummaryEvent {
    event: &'static str,
    total: usize,
    passed: usize,
    failed: usize,
    skipped: usize,
    success: bool,
}

pub struct JsonFormat<W> {
    out: W,
    max_diff_lines: usize,
}

impl<W: Write> JsonFormat<W> {
    pub fn new(out: W, max_diff_lines: usize) -> Self {
        Self {
            out,
            max_diff_lines,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit<T: Serialize>(&mut self, event: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

impl<W: Write> ReportFormat for JsonFormat<W> {
    fn start(&mut self, total: usize) -> io::Result<()> {
        self.emit(&StartEvent {
            event: "start",
            total,
        })
    }

    fn case(&mut self, record: &CaseRecord) -> io::Result<()> {
        let diff = match &record.outcome {
            Outcome::Fail { expected, actual } => {
                Some(line_diff(expected, actual, self.max_diff_lines))
            }
            _ => None,
        };
        self.emit(&CaseEvent {
            event: "case",
            record,
            diff,
        })
    }

    fn summary(&mut self, summary: &RunSummary, policy: SkipPolicy) -> io::Result<()> {
        self.emit(&SummaryEvent {
            event: "summary",
            total: summary.total(),
            passed: summary.passed,
            failed: summary.failed,
            skipped: summary.skipped,
            success: summary.is_success(policy),
        })
    }
}
