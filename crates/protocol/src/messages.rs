//! Per-direction message unions for the two channel roles.

use serde::{Deserialize, Serialize};

use crate::alert::Alert;

/// Messages a camera client sends to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CameraOutbound {
    /// One scene description produced by the vision generator.
    OvershootResult {
        description: String,
        timestamp: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        snapshot: Option<String>,
    },
    /// Asks the backend to evaluate buffered descriptions immediately.
    ForceProcess,
    /// Clip URL for a previously requested incident clip.
    ClipReady { incident_id: String, url: String },
    /// Raw-frame relay, only used in frame-forwarding operating modes.
    VideoFrame { frame: String },
}

/// Messages the backend pushes to a camera client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CameraInbound {
    /// Asks the camera to produce and upload a clip for an incident.
    RequestClip { incident_id: String },
}

/// Events the backend pushes on the dispatcher channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatcherInbound {
    Alert {
        data: Alert,
    },
    CameraConnected {
        camera_id: String,
    },
    CameraDisconnected {
        camera_id: String,
    },
    /// Authoritative roster snapshot, sent on dispatcher connect.
    CameraList {
        cameras: Vec<String>,
    },
    VideoFrame {
        camera_id: String,
        frame: String,
    },
}

/// Operator disposition for an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Confirm,
    Reject,
}

/// Decision message sent on the dispatcher channel.
///
/// The decision kind doubles as the wire `type` discriminant, so a confirm
/// serializes as `{"type":"confirm", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionMessage {
    #[serde(rename = "type")]
    pub decision: Decision,
    pub incident_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub dispatcher_id: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overshoot_result_roundtrip() {
        let msg = CameraOutbound::OvershootResult {
            description: "two people arguing near the entrance".into(),
            timestamp: "2026-08-29T12:00:00Z".into(),
            snapshot: None,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"overshoot_result""#));
        assert!(!json.contains("snapshot"));
        let parsed: CameraOutbound = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, parsed);
    }

    #[test]
    fn overshoot_result_carries_snapshot_when_present() {
        let msg = CameraOutbound::OvershootResult {
            description: "empty street".into(),
            timestamp: "2026-08-29T12:00:00Z".into(),
            snapshot: Some("aGVsbG8=".into()),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""snapshot":"aGVsbG8=""#));
    }

    #[test]
    fn force_process_is_type_only() {
        let json = serde_json::to_string(&CameraOutbound::ForceProcess).unwrap();
        assert_eq!(json, r#"{"type":"force_process"}"#);
    }

    #[test]
    fn clip_ready_roundtrip() {
        let msg = CameraOutbound::ClipReady {
            incident_id: "INC_cam-1_1".into(),
            url: "https://clips.example/INC_cam-1_1.mp4".into(),
        };
        let parsed: CameraOutbound =
            serde_json::from_str(&serde_json::to_string(&msg).unwrap()).unwrap();
        assert_eq!(msg, parsed);
    }

    #[test]
    fn video_frame_roundtrips_on_both_channels() {
        let outbound = CameraOutbound::VideoFrame {
            frame: "aGVsbG8=".into(),
        };
        let json = serde_json::to_string(&outbound).unwrap();
        assert_eq!(json, r#"{"type":"video_frame","frame":"aGVsbG8="}"#);
        let parsed: CameraOutbound = serde_json::from_str(&json).unwrap();
        assert_eq!(outbound, parsed);

        let relayed = DispatcherInbound::VideoFrame {
            camera_id: "cam-1".into(),
            frame: "aGVsbG8=".into(),
        };
        let parsed: DispatcherInbound =
            serde_json::from_str(&serde_json::to_string(&relayed).unwrap()).unwrap();
        assert_eq!(relayed, parsed);
    }

    #[test]
    fn camera_disconnected_roundtrip() {
        let msg = DispatcherInbound::CameraDisconnected {
            camera_id: "cam-4".into(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"camera_disconnected","camera_id":"cam-4"}"#);
        let parsed: DispatcherInbound = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, parsed);
    }

    #[test]
    fn request_clip_decodes() {
        let msg: CameraInbound =
            serde_json::from_str(r#"{"type":"request_clip","incident_id":"INC_1"}"#).unwrap();
        assert_eq!(
            msg,
            CameraInbound::RequestClip {
                incident_id: "INC_1".into()
            }
        );
    }

    #[test]
    fn camera_inbound_rejects_dispatcher_types() {
        // `alert` is defined for the dispatcher role only.
        let result = serde_json::from_str::<CameraInbound>(r#"{"type":"alert","data":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn dispatcher_roster_events_decode() {
        let msg: DispatcherInbound =
            serde_json::from_str(r#"{"type":"camera_connected","camera_id":"cam-3"}"#).unwrap();
        assert_eq!(
            msg,
            DispatcherInbound::CameraConnected {
                camera_id: "cam-3".into()
            }
        );

        let msg: DispatcherInbound =
            serde_json::from_str(r#"{"type":"camera_list","cameras":["a","b"]}"#).unwrap();
        assert_eq!(
            msg,
            DispatcherInbound::CameraList {
                cameras: vec!["a".into(), "b".into()]
            }
        );
    }

    #[test]
    fn dispatcher_inbound_rejects_unknown_type() {
        let result =
            serde_json::from_str::<DispatcherInbound>(r#"{"type":"telemetry","load":0.5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn decision_message_wire_shape() {
        let msg = DecisionMessage {
            decision: Decision::Reject,
            incident_id: "INC_1".into(),
            reason: Some("false positive".into()),
            dispatcher_id: "dispatcher-1".into(),
            timestamp: "2026-08-29T12:00:00Z".into(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"reject""#));
        assert!(json.contains(r#""reason":"false positive""#));
        assert!(json.contains(r#""dispatcher_id":"dispatcher-1""#));
        let parsed: DecisionMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, parsed);
    }

    #[test]
    fn decision_message_omits_absent_reason() {
        let msg = DecisionMessage {
            decision: Decision::Confirm,
            incident_id: "INC_2".into(),
            reason: None,
            dispatcher_id: "dispatcher-1".into(),
            timestamp: "2026-08-29T12:00:00Z".into(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"confirm""#));
        assert!(!json.contains("reason"));
    }
}
