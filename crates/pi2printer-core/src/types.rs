// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: printer identities and the mission records we print.

use serde::{Deserialize, Serialize};

use crate::error::{Pi2PrinterError, Result};

/// Deadline value meaning "as soon as possible".
pub const DEADLINE_ASAP: &str = "ASAP";

/// A USB thermal printer identity.
///
/// Descriptors are statically enumerated; the order of the known-device table
/// is the probe priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DeviceDescriptor {
    pub vendor_id: u16,
    pub product_id: u16,
    pub name: &'static str,
}

impl DeviceDescriptor {
    pub const fn new(vendor_id: u16, product_id: u16, name: &'static str) -> Self {
        Self {
            vendor_id,
            product_id,
            name,
        }
    }

    /// `lsusb`-style identifier, e.g. `04b8:0e15`.
    pub fn usb_id(&self) -> String {
        format!("{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

impl std::fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.usb_id())
    }
}

/// Parse a `VID:PID` pair written in hex (`04b8:0e15`, `0x04b8:0x0e15`).
pub fn parse_usb_id(text: &str) -> Result<(u16, u16)> {
    let invalid = || Pi2PrinterError::InvalidUsbId(text.to_string());
    let (vid, pid) = text.trim().split_once(':').ok_or_else(invalid)?;
    let hex = |part: &str| {
        let part = part.trim();
        let digits = part
            .strip_prefix("0x")
            .or_else(|| part.strip_prefix("0X"))
            .unwrap_or(part);
        u16::from_str_radix(digits, 16).map_err(|_| invalid())
    };
    Ok((hex(vid)?, hex(pid)?))
}

/// A structured notification ready to be rendered as a briefing.
///
/// Produced upstream (mail classifier, webhook handler). When `has_task` is
/// false nothing else in the record is looked at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionRecord {
    pub id: String,
    pub title: String,
    pub urgency: String,
    #[serde(default)]
    pub deadline: Option<String>,
    pub context: String,
    #[serde(default)]
    pub people_involved: Option<Vec<String>>,
    pub action_required: String,
    pub has_task: bool,
}

impl MissionRecord {
    /// A record that carries nothing to print.
    pub fn no_task() -> Self {
        Self::default()
    }

    /// Check that the record is actionable and its required fields are filled.
    pub fn validate(&self) -> Result<()> {
        if !self.has_task {
            return Err(Pi2PrinterError::NoActionableContent);
        }
        let required = [
            ("id", &self.id),
            ("title", &self.title),
            ("urgency", &self.urgency),
            ("context", &self.context),
            ("action_required", &self.action_required),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Pi2PrinterError::MalformedRecord(format!(
                    "required field `{field}` is empty"
                )));
            }
        }
        Ok(())
    }

    /// Deadline as printed: `ASAP` when absent or blank, the literal value otherwise.
    pub fn deadline_display(&self) -> &str {
        match self.deadline.as_deref() {
            Some(d) if !d.trim().is_empty() => d,
            _ => DEADLINE_ASAP,
        }
    }
}

/// The briefing payload inside a classifier analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionBriefing {
    #[serde(alias = "id")]
    pub mission_id: String,
    pub title: String,
    pub urgency: String,
    #[serde(default)]
    pub deadline: Option<String>,
    pub action_required: String,
    pub context: String,
    #[serde(default)]
    pub people_involved: Option<Vec<String>>,
}

/// The analysis envelope emitted by the message classifier:
/// `{"has_task": true, "mission_briefing": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionAnalysis {
    pub has_task: bool,
    #[serde(default)]
    pub mission_briefing: Option<MissionBriefing>,
}

impl From<MissionAnalysis> for MissionRecord {
    fn from(analysis: MissionAnalysis) -> Self {
        match analysis.mission_briefing {
            Some(b) if analysis.has_task => Self {
                id: b.mission_id,
                title: b.title,
                urgency: b.urgency,
                deadline: b.deadline,
                context: b.context,
                people_involved: b.people_involved,
                action_required: b.action_required,
                has_task: true,
            },
            _ => Self::no_task(),
        }
    }
}

/// Parse either a bare [`MissionRecord`] or a [`MissionAnalysis`] envelope.
pub fn parse_record_json(json: &str) -> Result<MissionRecord> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    if value.get("mission_briefing").is_some() {
        let analysis: MissionAnalysis = serde_json::from_value(value)?;
        return Ok(analysis.into());
    }
    if value.get("has_task") == Some(&serde_json::Value::Bool(false)) {
        return Ok(MissionRecord::no_task());
    }
    Ok(serde_json::from_value(value)?)
}
