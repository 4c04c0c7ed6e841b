// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output sinks: a USB thermal printer, a local file, or nowhere.
//
// Exactly one sink is live per process.  It is acquired once at startup by
// the resolver and released with `close()` at shutdown.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use pi2printer_core::error::{Pi2PrinterError, Result};
use pi2printer_core::types::DeviceDescriptor;

use crate::backend::DeviceLink;

/// ESC @: reset the printer to its power-on state.
pub const ESC_INIT: &[u8] = &[0x1b, 0x40];

/// ESC d 3: feed three lines so the text clears the cutter blade.
pub const ESC_FEED_3: &[u8] = &[0x1b, 0x64, 0x03];

/// GS V 0: full paper cut.
pub const GS_CUT_FULL: &[u8] = &[0x1d, 0x56, 0x00];

/// ESC E n: emphasized printing, on for n = 1 and off for n = 0.
pub const ESC_BOLD: [u8; 2] = [0x1b, 0x45];

/// ESC a n: justification, 0 left, 1 centre, 2 right.
pub const ESC_ALIGN: [u8; 2] = [0x1b, 0x61];

/// Horizontal justification of a styled line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    fn code(self) -> u8 {
        match self {
            Self::Left => 0,
            Self::Center => 1,
            Self::Right => 2,
        }
    }
}

/// Print attributes for [`Sink::write_styled`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStyle {
    pub bold: bool,
    pub align: Alignment,
}

impl TextStyle {
    pub const fn bold() -> Self {
        Self {
            bold: true,
            align: Alignment::Left,
        }
    }

    pub const fn centered() -> Self {
        Self {
            bold: false,
            align: Alignment::Center,
        }
    }

    /// Control bytes selecting this style.
    fn select(self) -> [u8; 6] {
        [
            ESC_BOLD[0],
            ESC_BOLD[1],
            u8::from(self.bold),
            ESC_ALIGN[0],
            ESC_ALIGN[1],
            self.align.code(),
        ]
    }
}

/// Which kind of sink was resolved, with what it is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkKind {
    Hardware { device: DeviceDescriptor },
    File { path: PathBuf },
    NoOp,
}

impl SinkKind {
    /// Status line for this kind of output.
    pub fn label(&self) -> String {
        match self {
            Self::Hardware { device } => format!("USB thermal printer: {device}"),
            Self::File { path } => format!("File output mode ({})", path.display()),
            Self::NoOp => "No printer connected (dummy mode)".into(),
        }
    }
}

/// Result of asking a sink to cut the paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CutOutcome {
    Cut,
    Unsupported,
    Failed(String),
}

/// Result of asking a sink to print styled text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleOutcome {
    Applied,
    /// Nothing was written; the caller decides on a plain fallback.
    Unsupported,
    Failed(String),
}

enum Target {
    Hardware {
        link: Box<dyn DeviceLink>,
        initialised: bool,
    },
    /// Opened on first write so an unwritable path surfaces as a write error.
    File {
        path: PathBuf,
        file: Option<File>,
    },
    NoOp,
}

/// A resolved output target.
pub struct Sink {
    kind: SinkKind,
    target: Target,
    closed: bool,
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink")
            .field("kind", &self.kind)
            .field("closed", &self.closed)
            .finish()
    }
}

impl Sink {
    pub fn hardware(device: DeviceDescriptor, link: Box<dyn DeviceLink>) -> Self {
        Self {
            kind: SinkKind::Hardware { device },
            target: Target::Hardware {
                link,
                initialised: false,
            },
            closed: false,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            kind: SinkKind::File { path: path.clone() },
            target: Target::File { path, file: None },
            closed: false,
        }
    }

    pub fn noop() -> Self {
        Self {
            kind: SinkKind::NoOp,
            target: Target::NoOp,
            closed: false,
        }
    }

    pub fn kind(&self) -> &SinkKind {
        &self.kind
    }

    /// Human-readable description for status reporting.
    pub fn describe(&self) -> String {
        self.kind.label()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Write text to the output.
    pub fn write(&mut self, text: &str) -> Result<()> {
        if self.closed {
            return Err(self.write_failure("sink is closed"));
        }
        let result = match &mut self.target {
            Target::Hardware { link, initialised } => {
                send(link.as_mut(), initialised, &encode_for_printer(text))
            }
            Target::File { path, file } => append(file, path, text),
            Target::NoOp => Ok(()),
        };
        result.map_err(|e| self.write_failure(&e.to_string()))?;
        debug!(sink = %self.kind.label(), bytes = text.len(), "wrote to sink");
        Ok(())
    }

    /// Print `text` with `style`, then return the printer to plain left-aligned text.
    ///
    /// Only hardware with styling support applies it. Other sinks write
    /// nothing and report `Unsupported`.
    pub fn write_styled(&mut self, text: &str, style: TextStyle) -> StyleOutcome {
        if self.closed {
            return StyleOutcome::Failed("sink is closed".into());
        }
        let Target::Hardware { link, initialised } = &mut self.target else {
            return StyleOutcome::Unsupported;
        };
        if !link.supports_styling() {
            return StyleOutcome::Unsupported;
        }
        let mut bytes = style.select().to_vec();
        bytes.extend(encode_for_printer(text));
        bytes.extend_from_slice(&TextStyle::default().select());
        match send(link.as_mut(), initialised, &bytes) {
            Ok(()) => StyleOutcome::Applied,
            Err(e) => StyleOutcome::Failed(e.to_string()),
        }
    }

    /// Cut the paper, if the output has a cutter.
    pub fn cut(&mut self) -> CutOutcome {
        if self.closed {
            return CutOutcome::Failed("sink is closed".into());
        }
        match &mut self.target {
            Target::Hardware { link, .. } => {
                if !link.supports_cut() {
                    return CutOutcome::Unsupported;
                }
                let mut bytes = ESC_FEED_3.to_vec();
                bytes.extend_from_slice(GS_CUT_FULL);
                match link.write_bytes(&bytes) {
                    Ok(()) => CutOutcome::Cut,
                    Err(e) => CutOutcome::Failed(e.to_string()),
                }
            }
            Target::File { .. } => CutOutcome::Unsupported,
            Target::NoOp => CutOutcome::Cut,
        }
    }

    /// Release the output. Safe to call more than once.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        match &mut self.target {
            Target::Hardware { link, .. } => link.close(),
            Target::File { file, .. } => {
                if let Some(mut f) = file.take() {
                    if let Err(e) = f.flush() {
                        warn!(error = %e, "flushing fallback file on close failed");
                    }
                }
            }
            Target::NoOp => {}
        }
        info!(sink = %self.kind.label(), "printer connection closed");
    }

    fn write_failure(&self, reason: &str) -> Pi2PrinterError {
        Pi2PrinterError::WriteFailure {
            sink: self.kind.label(),
            reason: reason.to_string(),
        }
    }
}

impl Drop for Sink {
    fn drop(&mut self) {
        self.close();
    }
}

/// Send `payload` to a printer, prefixed with `ESC @` on the first send.
fn send(link: &mut dyn DeviceLink, initialised: &mut bool, payload: &[u8]) -> io::Result<()> {
    let mut bytes = Vec::with_capacity(payload.len() + ESC_INIT.len());
    if !*initialised {
        bytes.extend_from_slice(ESC_INIT);
    }
    bytes.extend_from_slice(payload);
    link.write_bytes(&bytes)?;
    *initialised = true;
    Ok(())
}

fn append(file: &mut Option<File>, path: &Path, text: &str) -> io::Result<()> {
    if file.is_none() {
        let opened = OpenOptions::new().create(true).append(true).open(path)?;
        *file = Some(opened);
    }
    match file.as_mut() {
        Some(f) => {
            f.write_all(text.as_bytes())?;
            f.flush()
        }
        None => Ok(()),
    }
}

/// Map text onto what a stock ESC/POS code page can print: printable ASCII
/// and newlines pass through, everything else becomes `?`.
pub fn encode_for_printer(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\n' => b'\n',
            ' '..='~' => c as u8,
            _ => b'?',
        })
        .collect()
}
