// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mission briefing layout.
//
// Turns a `MissionRecord` into column-bounded lines for narrow thermal paper.
// Pure: the clock is passed in, nothing is read or written.

use std::num::NonZeroUsize;

use chrono::NaiveDateTime;

use pi2printer_core::types::MissionRecord;

/// Timestamp format on the `TIME:` line.
pub const TIME_FORMAT: &str = "%H:%M %d/%m/%Y";

/// Rendered briefing, one entry per printed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BriefingDocument {
    lines: Vec<String>,
}

impl BriefingDocument {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Newline-joined text as handed to a sink.
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn contains_line(&self, line: &str) -> bool {
        self.lines.iter().any(|l| l == line)
    }
}

/// Word-wrap `text` to `width` columns.
///
/// Each `\n`-separated paragraph is reflowed on its own; blank paragraphs
/// stay as blank lines. Words are never split, so a single word wider than
/// the column gets a line to itself.
pub fn wrap_text(text: &str, width: NonZeroUsize) -> Vec<String> {
    let width = width.get();
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = String::new();
        let mut current_len = 0;
        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if current_len > 0 && current_len + 1 + word_len > width {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
        }
        lines.push(current);
    }
    lines
}

/// Lay out a mission briefing.
///
/// Returns `None` when the record carries no task; callers must not print
/// anything in that case.
pub fn render(
    record: &MissionRecord,
    column_width: NonZeroUsize,
    agent_label: &str,
    now: NaiveDateTime,
) -> Option<BriefingDocument> {
    if !record.has_task {
        return None;
    }

    let mut doc = Builder::new(column_width);

    doc.rule();
    doc.centered("MISSION BRIEFING");
    doc.rule();
    doc.blank();

    doc.fixed(&format!("AGENT: {agent_label}"));
    doc.fixed(&format!("URGENCY: {}", record.urgency));
    doc.fixed(&format!("TIME: {}", now.format(TIME_FORMAT)));
    doc.blank();

    doc.fixed("MISSION:");
    doc.wrapped(&record.title);
    doc.blank();

    doc.fixed("INTELLIGENCE REPORT:");
    doc.wrapped(&record.context);
    doc.blank();

    if let Some(people) = record.people_involved.as_ref().filter(|p| !p.is_empty()) {
        doc.fixed("PEOPLE INVOLVED:");
        doc.wrapped(&people.join(", "));
        doc.blank();
    }

    doc.fixed("YOUR MISSION, SHOULD YOU");
    doc.fixed("CHOOSE TO ACCEPT IT:");
    doc.wrapped(&record.action_required);
    doc.blank();

    doc.fixed("THIS MESSAGE WILL");
    doc.fixed("    SELF-DESTRUCT");
    doc.blank();
    doc.fixed(&format!("DEADLINE: {}", record.deadline_display()));
    doc.blank();

    doc.rule();
    doc.fixed(&format!("MISSION ID: {}", record.id));
    doc.rule();

    Some(doc.finish())
}

/// Printer self-test page.
pub fn test_page(column_width: NonZeroUsize, now: NaiveDateTime) -> BriefingDocument {
    let mut doc = Builder::new(column_width);
    doc.fixed("PRINTER TEST");
    doc.rule();
    doc.fixed("PI2PRINTER SYSTEM CHECK");
    doc.fixed(&format!("Date: {}", now.format("%Y-%m-%d %H:%M")));
    doc.line('-');
    doc.wrapped("If you can read this clearly, your thermal printer is working correctly!");
    doc.rule();
    doc.finish()
}

/// Collects lines, keeping each within the column width.
struct Builder {
    width: NonZeroUsize,
    lines: Vec<String>,
}

impl Builder {
    fn new(width: NonZeroUsize) -> Self {
        Self {
            width,
            lines: Vec::new(),
        }
    }

    fn line(&mut self, fill: char) {
        self.lines
            .push(std::iter::repeat_n(fill, self.width.get()).collect());
    }

    fn rule(&mut self) {
        self.line('=');
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }

    /// Template text: kept verbatim when it fits, reflowed otherwise.
    fn fixed(&mut self, text: &str) {
        if text.chars().count() <= self.width.get() {
            self.lines.push(text.to_string());
        } else {
            self.wrapped(text);
        }
    }

    fn centered(&mut self, text: &str) {
        let width = self.width.get();
        let centered = format!("{text:^width$}");
        self.fixed(centered.trim_end());
    }

    fn wrapped(&mut self, text: &str) {
        self.lines.extend(wrap_text(text, self.width));
    }

    fn finish(self) -> BriefingDocument {
        BriefingDocument { lines: self.lines }
    }
}
