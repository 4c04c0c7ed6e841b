// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer configuration.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Characters per line on 58mm thermal paper.
pub const DEFAULT_COLUMN_WIDTH: NonZeroUsize = match NonZeroUsize::new(32) {
    Some(w) => w,
    None => unreachable!(),
};

/// Where the file fallback appends briefings.
pub const DEFAULT_FALLBACK_FILE: &str = "printed_missions.txt";

/// Printer and layout settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterConfig {
    /// Characters per printed line.
    pub column_width: NonZeroUsize,
    /// Name printed on the `AGENT:` line.
    pub agent_label: String,
    /// Fall back to a file when no printer answers (otherwise discard output).
    pub allow_file_fallback: bool,
    /// File used by the fallback sink.
    pub fallback_path: PathBuf,
    /// Printer to try before the known-device table, as `VID:PID` hex.
    pub preferred_device: Option<String>,
    /// Upper bound on a single device probe, in milliseconds.
    pub probe_timeout_ms: u64,
    /// Directory holding usblp character devices.
    pub device_dir: PathBuf,
    /// sysfs class directory describing usblp devices.
    pub sysfs_dir: PathBuf,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            column_width: DEFAULT_COLUMN_WIDTH,
            agent_label: "Agent".into(),
            allow_file_fallback: true,
            fallback_path: PathBuf::from(DEFAULT_FALLBACK_FILE),
            preferred_device: None,
            probe_timeout_ms: 2_000,
            device_dir: PathBuf::from("/dev/usb"),
            sysfs_dir: PathBuf::from("/sys/class/usbmisc"),
        }
    }
}

impl PrinterConfig {
    /// Load settings from a JSON file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Parsed `preferred_device`, if one is set.
    pub fn preferred_usb_id(&self) -> Result<Option<(u16, u16)>> {
        self.preferred_device
            .as_deref()
            .map(crate::types::parse_usb_id)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_58mm_paper() {
        let config = PrinterConfig::default();
        assert_eq!(config.column_width.get(), 32);
        assert!(config.allow_file_fallback);
        assert_eq!(config.fallback_path, PathBuf::from("printed_missions.txt"));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: PrinterConfig =
            serde_json::from_str(r#"{"column_width": 48, "agent_label": "Agent Roshin"}"#).unwrap();
        assert_eq!(config.column_width.get(), 48);
        assert_eq!(config.agent_label, "Agent Roshin");
        assert_eq!(config.probe_timeout_ms, 2_000);
    }

    #[test]
    fn zero_width_is_rejected() {
        assert!(serde_json::from_str::<PrinterConfig>(r#"{"column_width": 0}"#).is_err());
    }

    #[test]
    fn save_and_load_or_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pi2printer.json");
        assert_eq!(
            PrinterConfig::load_or_default(&path).unwrap(),
            PrinterConfig::default()
        );

        let config = PrinterConfig {
            preferred_device: Some("04b8:0e15".into()),
            ..PrinterConfig::default()
        };
        config.save(&path).unwrap();
        let loaded = PrinterConfig::load(&path).unwrap();
        assert_eq!(loaded.preferred_usb_id().unwrap(), Some((0x04b8, 0x0e15)));
    }
}
