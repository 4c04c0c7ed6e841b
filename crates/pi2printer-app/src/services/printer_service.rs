// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer service: resolves the sink once at startup, prints through it,
// and releases it on shutdown.
//
// The sink is owned here rather than in a global; callers that print from
// several threads wrap the whole service in a `Mutex`.

use chrono::Local;
use tracing::info;

use pi2printer_core::PrinterConfig;
use pi2printer_core::error::{Pi2PrinterError, Result};
use pi2printer_core::types::MissionRecord;
use pi2printer_print::devices;
use pi2printer_print::{DeviceResolver, PrintOutcome, PrintPipeline, ProbeAttempt, Sink};

pub struct PrinterService {
    pipeline: PrintPipeline,
    sink: Sink,
    attempts: Vec<ProbeAttempt>,
}

impl PrinterService {
    /// Resolve the printer described by `config`.
    pub fn init(config: &PrinterConfig) -> Result<Self> {
        let hint = config
            .preferred_usb_id()
            .map_err(|e| Pi2PrinterError::Config(e.to_string()))?
            .map(|(vid, pid)| devices::requested(vid, pid));

        let resolution =
            DeviceResolver::from_config(config).resolve_with_report(hint, config.allow_file_fallback);
        info!(status = %resolution.sink.describe(), "printer ready");

        Ok(Self {
            pipeline: PrintPipeline::from_config(config),
            sink: resolution.sink,
            attempts: resolution.attempts,
        })
    }

    pub fn print_mission(&mut self, record: &MissionRecord) -> PrintOutcome {
        let now = Local::now().naive_local();
        self.pipeline.print(record, &mut self.sink, now)
    }

    pub fn test_printer(&mut self) -> PrintOutcome {
        let now = Local::now().naive_local();
        self.pipeline.print_test_page(&mut self.sink, now)
    }

    /// Status line for the active output.
    pub fn printer_info(&self) -> String {
        self.sink.describe()
    }

    /// Candidates that were tried and rejected during resolution.
    pub fn attempts(&self) -> &[ProbeAttempt] {
        &self.attempts
    }

    pub fn is_open(&self) -> bool {
        !self.sink.is_closed()
    }

    /// Release the printer. Later calls are no-ops.
    pub fn shutdown(&mut self) {
        self.sink.close();
    }
}
