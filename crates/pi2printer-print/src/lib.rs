// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PI2PRINTER Print: thermal printer resolution, briefing layout, and the
// print pipeline.  This crate turns the mission records defined in
// `pi2printer-core` into paper (or a file, or nowhere at all).

pub mod backend;
pub mod devices;
pub mod layout;
pub mod pipeline;
pub mod resolver;
pub mod sink;

pub use backend::{DeviceBackend, DeviceLink, ProbeError, UsbLpBackend};
pub use devices::KNOWN_THERMAL_PRINTERS;
pub use layout::{BriefingDocument, render, wrap_text};
pub use pipeline::{PrintOutcome, PrintPipeline};
pub use resolver::{DeviceResolver, ProbeAttempt, Resolution};
pub use sink::{Alignment, CutOutcome, Sink, SinkKind, StyleOutcome, TextStyle};
