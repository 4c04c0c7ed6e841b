// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for PI2PRINTER.

use thiserror::Error;

/// Top-level error type for all PI2PRINTER operations.
#[derive(Debug, Error)]
pub enum Pi2PrinterError {
    // -- Record errors --
    #[error("malformed mission record: {0}")]
    MalformedRecord(String),

    #[error("no actionable content")]
    NoActionableContent,

    // -- Output errors --
    #[error("write to {sink} failed: {reason}")]
    WriteFailure { sink: String, reason: String },

    #[error("invalid USB id {0:?} (expected VID:PID in hex, e.g. 04b8:0e15)")]
    InvalidUsbId(String),

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, Pi2PrinterError>;
