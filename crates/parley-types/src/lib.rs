//! Shared wire types for the Parley agent control plane.
//!
//! This crate holds the request and response bodies of the HTTP API and the
//! provider-kind sum types used to resolve pipeline requests. Both
//! `parley-voice` and `parley-server` depend on it; it depends on nothing
//! in the workspace.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod provider;

pub use provider::{
    LlmProvider, PipelineKind, ProviderCategory, RealtimeProvider, SttProvider, TtsProvider,
    UnknownProvider,
};

fn default_detection() -> Option<bool> {
    Some(true)
}

/// Request body for `POST /join-agent`.
#[derive(Clone, Serialize, Deserialize)]
pub struct JoinAgentRequest {
    /// Meeting (room) identifier to join.
    pub meeting_id: String,
    /// Meeting auth token handed to the agent runtime.
    pub token: String,
    /// `openai`, `google`, `aws` or `cascading`.
    pub pipeline_type: String,
    #[serde(default)]
    pub stt: Option<String>,
    #[serde(default)]
    pub tts: Option<String>,
    #[serde(default)]
    pub llm: Option<String>,
    pub personality: String,
    pub system_prompt: String,
    /// Attach VAD and turn detection to a cascading pipeline. Defaults to
    /// `true` when omitted; an explicit `null` disables it.
    #[serde(default = "default_detection")]
    pub detection: Option<bool>,
    #[serde(default)]
    pub mcp_url: Option<String>,
}

impl JoinAgentRequest {
    pub fn detection_enabled(&self) -> bool {
        self.detection.unwrap_or(false)
    }
}

impl fmt::Debug for JoinAgentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinAgentRequest")
            .field("meeting_id", &self.meeting_id)
            .field("token", &"[REDACTED]")
            .field("pipeline_type", &self.pipeline_type)
            .field("stt", &self.stt)
            .field("tts", &self.tts)
            .field("llm", &self.llm)
            .field("personality", &self.personality)
            .field("system_prompt", &self.system_prompt)
            .field("detection", &self.detection)
            .field("mcp_url", &self.mcp_url)
            .finish()
    }
}

/// Response body for `POST /join-agent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinAgentResponse {
    pub message: String,
}

impl JoinAgentResponse {
    pub fn initiated(meeting_id: &str) -> Self {
        Self {
            message: format!("AI agent joining process initiated for meeting {meeting_id}"),
        }
    }
}

/// Request body for `POST /leave-agent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveAgentRequest {
    pub meeting_id: String,
}

/// Outcome reported by `POST /leave-agent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    Success,
    NotFound,
    Error,
}

/// Response body for `POST /leave-agent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveAgentResponse {
    pub status: LeaveStatus,
    pub meeting_id: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_join() -> serde_json::Value {
        json!({
            "meeting_id": "abc-def-ghi",
            "token": "tok",
            "pipeline_type": "openai",
            "personality": "friendly",
            "system_prompt": "You are helpful."
        })
    }

    #[test]
    fn join_request_defaults() {
        let req: JoinAgentRequest = serde_json::from_value(minimal_join()).unwrap();
        assert_eq!(req.stt, None);
        assert_eq!(req.mcp_url, None);
        assert_eq!(req.detection, Some(true));
        assert!(req.detection_enabled());
    }

    #[test]
    fn join_request_explicit_null_detection_disables() {
        let mut body = minimal_join();
        body["detection"] = serde_json::Value::Null;
        let req: JoinAgentRequest = serde_json::from_value(body).unwrap();
        assert!(!req.detection_enabled());
    }

    #[test]
    fn join_request_requires_prompt() {
        let mut body = minimal_join();
        body.as_object_mut().unwrap().remove("system_prompt");
        assert!(serde_json::from_value::<JoinAgentRequest>(body).is_err());
    }

    #[test]
    fn join_request_debug_redacts_token() {
        let mut body = minimal_join();
        body["token"] = json!("very-secret-token");
        let req: JoinAgentRequest = serde_json::from_value(body).unwrap();
        let debug = format!("{:?}", req);
        assert!(!debug.contains("very-secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn leave_status_wire_names() {
        assert_eq!(serde_json::to_value(LeaveStatus::Success).unwrap(), "success");
        assert_eq!(serde_json::to_value(LeaveStatus::NotFound).unwrap(), "not_found");
        assert_eq!(serde_json::to_value(LeaveStatus::Error).unwrap(), "error");
    }

    #[test]
    fn join_ack_message() {
        assert_eq!(
            JoinAgentResponse::initiated("m-1").message,
            "AI agent joining process initiated for meeting m-1"
        );
    }
}
