//! Alert data model pushed from the classification backend.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Review status of an alert on the dispatcher side.
///
/// Starts at `PendingReview` and transitions to exactly one terminal state;
/// the backend is the sole writer of dispositions beyond the client's
/// optimistic removal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertStatus {
    #[default]
    #[serde(rename = "PENDING_REVIEW")]
    PendingReview,
    #[serde(rename = "CONFIRMED")]
    Confirmed,
    #[serde(rename = "REJECTED")]
    Rejected,
}

impl AlertStatus {
    /// Whether the status is a terminal disposition.
    pub fn is_terminal(self) -> bool {
        !matches!(self, AlertStatus::PendingReview)
    }
}

/// Emergency service that can be activated for an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    #[serde(rename = "FIRE")]
    Fire,
    #[serde(rename = "EMS")]
    Ems,
    #[serde(rename = "POLICE")]
    Police,
}

/// Classification block produced by the backend.
///
/// `severity` and `urgency` are open strings (`HIGH`, `IMMEDIATE`, ...)
/// rather than closed enums so backend vocabulary changes cannot break
/// decode of an otherwise valid alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub incident_type: String,
    pub severity: String,
    pub urgency: String,
    pub confidence: f64,
}

/// Per-service report attached to an alert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentReport {
    pub activated: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_facts: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hazards: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equipment: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknowns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Clip window and URL for an incident. All fields null until the camera
/// has produced the clip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipInfo {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub url: Option<String>,
}

/// One candidate incident pushed from the backend, pending human disposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Opaque stable identifier, unique per incident.
    pub id: String,
    /// ISO-8601 creation time.
    pub timestamp: String,
    pub camera_id: String,
    pub classification: Classification,
    pub summary: String,
    #[serde(default)]
    pub agents_activated: Vec<AgentKind>,
    /// Keyed by lowercase service name (`fire`, `ems`, `police`).
    #[serde(default)]
    pub agent_reports: HashMap<String, AgentReport>,
    #[serde(default)]
    pub clip: ClipInfo,
    #[serde(default)]
    pub status: AlertStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_context: Option<String>,
    /// Base64 still attached by the backend when the alert was built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<String>,
}
