// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer resolution with graceful degradation.
//
// Tries, in order: the explicitly requested printer → every known thermal
// printer in table order → a local file → a dummy sink that discards
// everything.  Resolution always yields a usable sink; individual probe
// failures are logged and recorded, never returned.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use pi2printer_core::PrinterConfig;
use pi2printer_core::types::DeviceDescriptor;

use crate::backend::{self, DeviceBackend, ProbeError, UsbLpBackend};
use crate::devices::KNOWN_THERMAL_PRINTERS;
use crate::sink::Sink;

/// A candidate that could not be used, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeAttempt {
    pub device: DeviceDescriptor,
    pub error: ProbeError,
}

/// The resolved sink plus the diagnostics gathered on the way.
#[derive(Debug)]
pub struct Resolution {
    pub sink: Sink,
    pub attempts: Vec<ProbeAttempt>,
}

/// Picks the output sink for this process.
pub struct DeviceResolver {
    backend: Arc<dyn DeviceBackend>,
    candidates: Vec<DeviceDescriptor>,
    probe_timeout: Duration,
    fallback_path: PathBuf,
}

impl DeviceResolver {
    pub fn new(backend: Arc<dyn DeviceBackend>) -> Self {
        let defaults = PrinterConfig::default();
        Self {
            backend,
            candidates: KNOWN_THERMAL_PRINTERS.to_vec(),
            probe_timeout: defaults.probe_timeout(),
            fallback_path: defaults.fallback_path,
        }
    }

    /// Resolver over the usblp backend using the paths and timeouts in `config`.
    pub fn from_config(config: &PrinterConfig) -> Self {
        let backend = UsbLpBackend::new(&config.device_dir, &config.sysfs_dir);
        Self::new(Arc::new(backend))
            .with_probe_timeout(config.probe_timeout())
            .with_fallback_path(config.fallback_path.clone())
    }

    /// Replace the known-device table (order is probe priority).
    pub fn with_candidates(mut self, candidates: Vec<DeviceDescriptor>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_fallback_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallback_path = path.into();
        self
    }

    /// Resolve the output sink. Never fails.
    pub fn resolve(&self, hint: Option<DeviceDescriptor>, allow_file_fallback: bool) -> Sink {
        self.resolve_with_report(hint, allow_file_fallback).sink
    }

    /// Like [`resolve`](Self::resolve), also returning every failed attempt.
    pub fn resolve_with_report(
        &self,
        hint: Option<DeviceDescriptor>,
        allow_file_fallback: bool,
    ) -> Resolution {
        info!("connecting to USB thermal printer");
        let mut attempts = Vec::new();

        if let Some(device) = hint {
            match backend::open_with_timeout(&self.backend, &device, self.probe_timeout) {
                Ok(link) => {
                    info!(device = %device, "connected to requested printer");
                    return Resolution {
                        sink: Sink::hardware(device, link),
                        attempts,
                    };
                }
                Err(error) => {
                    warn!(device = %device, %error, "requested printer not found");
                    attempts.push(ProbeAttempt { device, error });
                }
            }
        }

        info!(candidates = self.candidates.len(), "auto-detecting thermal printer");
        for device in &self.candidates {
            let reopened = backend::probe(&self.backend, device, self.probe_timeout)
                .and_then(|()| {
                    backend::open_with_timeout(&self.backend, device, self.probe_timeout)
                });
            match reopened {
                Ok(link) => {
                    info!(device = %device, "connected to thermal printer");
                    return Resolution {
                        sink: Sink::hardware(*device, link),
                        attempts,
                    };
                }
                Err(error) => {
                    warn!(device = %device, %error, "printer not accessible");
                    attempts.push(ProbeAttempt {
                        device: *device,
                        error,
                    });
                }
            }
        }

        warn!(tried = attempts.len(), "no thermal printer detected via USB");
        let sink = if allow_file_fallback {
            info!(path = %self.fallback_path.display(), "falling back to file output");
            Sink::file(&self.fallback_path)
        } else {
            warn!("no printer available, using dummy printer");
            Sink::noop()
        };
        Resolution { sink, attempts }
    }
}
