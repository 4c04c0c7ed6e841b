// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware configuration file location.

use std::path::PathBuf;

const CONFIG_FILE: &str = "config.json";

/// Default location of the JSON settings file.
pub fn config_path() -> PathBuf {
    config_base().join("pi2printer").join(CONFIG_FILE)
}

fn config_base() -> PathBuf {
    // Try XDG config dir, then fallback to home
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config");
    }
    // Last resort: alongside the working directory
    PathBuf::from(".")
}
