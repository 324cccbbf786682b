//! Terminal rendering of review progress and results

use drhp_core::{AnalysisReport, MatchSet, Query};
use drhp_retrieval::SearchTrace;
use drhp_review::{ReviewError, ReviewObserver, ReviewOutcome};
use std::fmt;
use std::io::{self, Write};

/// Longest excerpt prefix shown in the match preview, in characters
pub const PREVIEW_CHARS: usize = 1000;

pub const REPORT_HEADING: &str = "Gemini AI Output";

/// First `limit` characters of `text` with a trailing ellipsis
///
/// The ellipsis is always appended, even when nothing was cut.
pub fn preview_text(text: &str, limit: usize) -> String {
    let end = text
        .char_indices()
        .nth(limit)
        .map_or(text.len(), |(idx, _)| idx);
    format!("{}...", &text[..end])
}

/// Writes pipeline progress and outcomes to a terminal stream
///
/// Observer callbacks cannot fail, so the first write error is held until
/// [`TerminalRenderer::finish`].
pub struct TerminalRenderer<W: Write + Send> {
    out: W,
    show_trace: bool,
    io_error: Option<io::Error>,
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W, show_trace: bool) -> Self {
        Self {
            out,
            show_trace,
            io_error: None,
        }
    }

    fn emit(&mut self, args: fmt::Arguments<'_>) {
        if self.io_error.is_some() {
            return;
        }
        if let Err(e) = self.out.write_fmt(args).and_then(|()| self.out.write_all(b"\n")) {
            self.io_error = Some(e);
        }
    }

    pub fn render_matches(&mut self, matches: &MatchSet) {
        self.emit(format_args!(
            "Retrieved {} relevant documents from AutoRAG.",
            matches.len()
        ));
        self.emit(format_args!("\nRetrieved context:"));
        for (i, m) in matches.iter().enumerate() {
            self.emit(format_args!(
                "\nResult {}\nScore: {}\n\n{}\n\n---",
                i + 1,
                m.score,
                preview_text(&m.text, PREVIEW_CHARS)
            ));
        }
    }

    pub fn render_trace(&mut self, trace: &SearchTrace) {
        let payload = serde_json::to_string_pretty(&trace.payload)
            .unwrap_or_else(|_| trace.payload.to_string());

        self.emit(format_args!("\n=== Search request ==="));
        self.emit(format_args!("POST {}", trace.url));
        for (name, value) in &trace.headers {
            self.emit(format_args!("{name}: {value}"));
        }
        self.emit(format_args!("\n{payload}"));
        self.emit(format_args!("\n=== Search response ==="));
        match trace.status {
            Some(status) => self.emit(format_args!("Status: {status}")),
            None => self.emit(format_args!("Status: <no response>")),
        }
        if let Some(body) = &trace.response_body {
            self.emit(format_args!("{body}"));
        }
        self.emit(format_args!("======================\n"));
    }

    pub fn render_report(&mut self, report: &AnalysisReport) {
        self.emit(format_args!("\n{REPORT_HEADING}"));
        self.emit(format_args!("{}", "=".repeat(REPORT_HEADING.len())));
        self.emit(format_args!("{report}"));
    }

    /// Render the terminal state of a successful run
    pub fn render_outcome(&mut self, outcome: &ReviewOutcome) {
        match outcome {
            ReviewOutcome::Completed { report, .. } => self.render_report(report),
            other => {
                if let Some(notice) = other.notice() {
                    self.emit(format_args!("{notice}"));
                }
            }
        }
    }

    pub fn render_error(&mut self, error: &ReviewError) {
        self.emit(format_args!("Error: {}", error.user_message()));
    }

    /// Flush output and surface any write error seen while rendering
    pub fn finish(&mut self) -> io::Result<()> {
        if let Some(e) = self.io_error.take() {
            return Err(e);
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> ReviewObserver for TerminalRenderer<W> {
    fn search_started(&mut self, _query: &Query) {
        self.emit(format_args!("Searching AutoRAG..."));
    }

    fn search_traced(&mut self, trace: &SearchTrace) {
        if self.show_trace {
            self.render_trace(trace);
        }
    }

    fn matches_retrieved(&mut self, matches: &MatchSet) {
        self.render_matches(matches);
    }

    fn analysis_started(&mut self) {
        self.emit(format_args!("\nAnalyzing with Gemini AI..."));
    }
}
