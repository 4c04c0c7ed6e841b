// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print pipeline: validate → lay out → write → cut (or draw a cut line).
//
// Every failure comes back as a `PrintOutcome`; nothing here panics or
// aborts the host process.  Cut problems are cosmetic and never fail a print.

use std::num::NonZeroUsize;

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use pi2printer_core::PrinterConfig;
use pi2printer_core::error::Pi2PrinterError;
use pi2printer_core::types::MissionRecord;

use crate::layout::{self, BriefingDocument};
use crate::sink::{CutOutcome, Sink, StyleOutcome, TextStyle};

/// Separator written under the self-test page when the paper is not cut.
pub const CUT_HERE_LINE: &str = "---------- CUT HERE ----------";

/// Printed when the formatting check cannot use bold or centring.
pub const FORMATTING_FALLBACK: &str = "FORMATTING TEST COMPLETE";

/// Result of one print request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintOutcome {
    pub success: bool,
    /// What happened, suitable for logs and status output.
    pub diagnostic: String,
    /// How the paper was finished, when anything was printed.
    pub cut: Option<CutOutcome>,
}

impl PrintOutcome {
    fn printed(cut: CutOutcome) -> Self {
        let diagnostic = match &cut {
            CutOutcome::Cut => "printed".to_string(),
            CutOutcome::Unsupported => "printed (auto-cut not supported, added cut line)".into(),
            CutOutcome::Failed(reason) => format!("printed (cut failed: {reason}, added cut line)"),
        };
        Self {
            success: true,
            diagnostic,
            cut: Some(cut),
        }
    }

    fn failed(err: &Pi2PrinterError) -> Self {
        Self {
            success: false,
            diagnostic: err.to_string(),
            cut: None,
        }
    }
}

/// Formats and prints briefings through a caller-owned sink.
///
/// Holds only formatting settings; every call is independent.
#[derive(Debug, Clone)]
pub struct PrintPipeline {
    column_width: NonZeroUsize,
    agent_label: String,
}

impl PrintPipeline {
    pub fn new(column_width: NonZeroUsize, agent_label: impl Into<String>) -> Self {
        Self {
            column_width,
            agent_label: agent_label.into(),
        }
    }

    pub fn from_config(config: &PrinterConfig) -> Self {
        Self::new(config.column_width, config.agent_label.clone())
    }

    /// Print a mission briefing.
    pub fn print(&self, record: &MissionRecord, sink: &mut Sink, now: NaiveDateTime) -> PrintOutcome {
        if let Err(e) = record.validate() {
            info!(reason = %e, "no actionable mission to print");
            return PrintOutcome::failed(&e);
        }
        let Some(briefing) = layout::render(record, self.column_width, &self.agent_label, now)
        else {
            info!("no actionable mission to print");
            return PrintOutcome::failed(&Pi2PrinterError::NoActionableContent);
        };

        info!(mission_id = %record.id, sink = %sink.describe(), "printing mission briefing");
        if let Err(e) = write_document(&briefing, sink) {
            return PrintOutcome::failed(&e);
        }
        let outcome = finish(sink, &format!("{}\n\n", self.cut_line()));
        if outcome.success {
            info!(mission_id = %record.id, "mission briefing printed");
        }
        outcome
    }

    /// Print the self-test page.
    pub fn print_test_page(&self, sink: &mut Sink, now: NaiveDateTime) -> PrintOutcome {
        info!(sink = %sink.describe(), "testing printer");
        let page = layout::test_page(self.column_width, now);
        if let Err(e) = write_document(&page, sink) {
            return PrintOutcome::failed(&e);
        }
        check_formatting(sink);
        finish(sink, &format!("\n{CUT_HERE_LINE}\n\n"))
    }

    /// Separator printed in place of a paper cut.
    pub fn cut_line(&self) -> String {
        "-".repeat(self.column_width.get())
    }
}

fn write_document(doc: &BriefingDocument, sink: &mut Sink) -> Result<(), Pi2PrinterError> {
    let mut text = doc.to_text();
    text.push('\n');
    sink.write(&text).inspect_err(|e| warn!(error = %e, "print failed"))
}

/// Print a bold line and a centred line, or a plain note when the sink
/// cannot style text.
fn check_formatting(sink: &mut Sink) {
    let mut outcome = sink.write_styled("BOLD TEXT TEST\n", TextStyle::bold());
    if outcome == StyleOutcome::Applied {
        outcome = sink.write_styled("CENTERED TEXT\n", TextStyle::centered());
    }
    if outcome != StyleOutcome::Applied {
        debug!(?outcome, "formatting not available");
        if let Err(e) = sink.write(&format!("{FORMATTING_FALLBACK}\n")) {
            warn!(error = %e, "writing formatting note failed");
        }
    }
}

/// Cut the paper, or write `separator` when the sink cannot cut.
fn finish(sink: &mut Sink, separator: &str) -> PrintOutcome {
    let cut = sink.cut();
    match &cut {
        CutOutcome::Cut => {}
        CutOutcome::Unsupported | CutOutcome::Failed(_) => {
            warn!(?cut, "auto-cut unavailable, adding cut line");
            if let Err(e) = sink.write(separator) {
                warn!(error = %e, "writing cut line failed");
            }
        }
    }
    PrintOutcome::printed(cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::sink::tests::{MemoryLink, epson};

    fn pipeline() -> PrintPipeline {
        PrintPipeline::new(NonZeroUsize::new(32).unwrap(), "Agent Roshin")
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn mission() -> MissionRecord {
        MissionRecord {
            id: "MI-TEST001".into(),
            title: "Verify Unauthorized Login".into(),
            urgency: "HIGH".into(),
            deadline: None,
            context: "An unauthorized attempt to sign into your account has been detected.".into(),
            people_involved: Some(vec!["security@example.com".into()]),
            action_required: "Confirm the login or report suspicious activity.".into(),
            has_task: true,
        }
    }

    #[test]
    fn prints_and_cuts_on_hardware() {
        let (link, recorded) = MemoryLink::new(true);
        let mut sink = Sink::hardware(epson(), Box::new(link));

        let outcome = pipeline().print(&mission(), &mut sink, now());
        assert!(outcome.success, "{outcome:?}");
        assert_eq!(outcome.cut, Some(CutOutcome::Cut));

        let text = recorded.text();
        assert!(text.contains("MISSION ID: MI-TEST001"));
        assert!(text.contains("DEADLINE: ASAP"));
        assert!(text.contains("PEOPLE INVOLVED:\nsecurity@example.com"));
        assert!(!text.contains(&"-".repeat(32)));
    }

    #[test]
    fn inactive_record_never_touches_sink() {
        let (link, recorded) = MemoryLink::new(true);
        let mut sink = Sink::hardware(epson(), Box::new(link));
        let mut record = mission();
        record.has_task = false;

        let outcome = pipeline().print(&record, &mut sink, now());
        assert!(!outcome.success);
        assert_eq!(outcome.diagnostic, "no actionable content");
        assert!(recorded.bytes().is_empty());
    }

    #[test]
    fn malformed_record_is_rejected_before_io() {
        let (link, recorded) = MemoryLink::new(true);
        let mut sink = Sink::hardware(epson(), Box::new(link));
        let mut record = mission();
        record.action_required = String::new();

        let outcome = pipeline().print(&record, &mut sink, now());
        assert!(!outcome.success);
        assert!(outcome.diagnostic.contains("action_required"));
        assert!(recorded.bytes().is_empty());
    }

    #[test]
    fn unsupported_cut_adds_separator_and_succeeds() {
        let (link, recorded) = MemoryLink::new(false);
        let mut sink = Sink::hardware(epson(), Box::new(link));

        let outcome = pipeline().print(&mission(), &mut sink, now());
        assert!(outcome.success);
        assert_eq!(outcome.cut, Some(CutOutcome::Unsupported));
        assert!(recorded.text().ends_with(&format!("{}\n\n", "-".repeat(32))));
    }

    #[test]
    fn write_failure_is_reported_and_pipeline_stays_usable() {
        let (mut link, _) = MemoryLink::new(true);
        link.fail_writes = true;
        let broken_recorded = link.recorded.clone();
        let mut broken = Sink::hardware(epson(), Box::new(link));

        let p = pipeline();
        let outcome = p.print(&mission(), &mut broken, now());
        assert!(!outcome.success);
        assert!(outcome.diagnostic.contains("printer went away"));

        broken.close();
        drop(broken);
        assert_eq!(broken_recorded.closes(), 1);

        let (link, recorded) = MemoryLink::new(true);
        let mut healthy = Sink::hardware(epson(), Box::new(link));
        assert!(p.print(&mission(), &mut healthy, now()).success);
        assert!(recorded.text().contains("MISSION ID: MI-TEST001"));
    }

    #[test]
    fn file_sink_gets_briefing_and_cut_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("printed_missions.txt");
        let mut sink = Sink::file(&path);

        let outcome = pipeline().print(&mission(), &mut sink, now());
        sink.close();
        assert!(outcome.success);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("AGENT: Agent Roshin"));
        assert!(written.contains("TIME: 09:30 01/01/2024"));
        assert!(written.lines().any(|l| l == "-".repeat(32)));
    }

    #[test]
    fn noop_sink_reports_success() {
        let mut sink = Sink::noop();
        let outcome = pipeline().print(&mission(), &mut sink, now());
        assert!(outcome.success);
        assert_eq!(outcome.cut, Some(CutOutcome::Cut));
    }

    #[test]
    fn test_page_uses_labelled_cut_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selftest.txt");
        let mut sink = Sink::file(&path);

        assert!(pipeline().print_test_page(&mut sink, now()).success);
        sink.close();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("PI2PRINTER SYSTEM CHECK"));
        assert!(written.ends_with("\n\n---------- CUT HERE ----------\n\n"));
    }

    #[test]
    fn test_page_on_file_notes_formatting_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selftest.txt");
        let mut sink = Sink::file(&path);

        assert!(pipeline().print_test_page(&mut sink, now()).success);
        sink.close();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("FORMATTING TEST COMPLETE\n"));
        assert!(!written.contains("BOLD TEXT TEST"));
    }

    #[test]
    fn test_page_on_hardware_prints_bold_and_centered_lines() {
        let (link, recorded) = MemoryLink::new(true);
        let mut sink = Sink::hardware(epson(), Box::new(link));

        let outcome = pipeline().print_test_page(&mut sink, now());
        assert_eq!(outcome.cut, Some(CutOutcome::Cut));
        let bytes = recorded.bytes();
        let bold = [0x1b, 0x45, 1, 0x1b, 0x61, 0];
        let centered = [0x1b, 0x45, 0, 0x1b, 0x61, 1];
        assert!(bytes.windows(bold.len()).any(|w| w == bold));
        assert!(bytes.windows(centered.len()).any(|w| w == centered));
        let text = recorded.text();
        assert!(text.contains("BOLD TEXT TEST"));
        assert!(text.contains("CENTERED TEXT"));
        assert!(!text.contains("FORMATTING TEST COMPLETE"));
        assert!(!text.contains("CUT HERE"));
    }

    #[test]
    fn test_page_without_styling_falls_back_to_plain_note() {
        let (mut link, recorded) = MemoryLink::new(false);
        link.styling = false;
        let mut sink = Sink::hardware(epson(), Box::new(link));

        let outcome = pipeline().print_test_page(&mut sink, now());
        assert!(outcome.success);
        let text = recorded.text();
        assert!(text.contains("FORMATTING TEST COMPLETE\n"));
        assert!(text.ends_with(&format!("\n{CUT_HERE_LINE}\n\n")));
    }
}
