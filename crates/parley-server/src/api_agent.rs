//! Agent join/leave handlers.

use crate::AppState;
use axum::{extract::Extension, Json};
use parley_types::{
    JoinAgentRequest, JoinAgentResponse, LeaveAgentRequest, LeaveAgentResponse, LeaveStatus,
};
use parley_voice::LeaveOutcome;
use std::sync::Arc;

/// Handler for `POST /join-agent`.
///
/// Acknowledges immediately; the join itself runs in the background and its
/// outcome is only visible in the logs.
pub async fn join_agent_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<JoinAgentRequest>,
) -> Json<JoinAgentResponse> {
    tracing::debug!(request = ?payload, "join-agent request");
    let response = JoinAgentResponse::initiated(&payload.meeting_id);
    // detached: the task owns its own cleanup
    drop(state.coordinator.join(payload));
    Json(response)
}

/// Handler for `POST /leave-agent`.
pub async fn leave_agent_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<LeaveAgentRequest>,
) -> Json<LeaveAgentResponse> {
    let meeting_id = payload.meeting_id;
    let outcome = state.coordinator.leave(&meeting_id).await;
    Json(leave_response(meeting_id, outcome))
}

fn leave_response(meeting_id: String, outcome: LeaveOutcome) -> LeaveAgentResponse {
    let (status, message) = match outcome {
        LeaveOutcome::Success => (
            LeaveStatus::Success,
            format!("Agent termination process initiated for meeting {meeting_id}."),
        ),
        LeaveOutcome::NotFound => (
            LeaveStatus::NotFound,
            format!("No active session found for meeting {meeting_id}."),
        ),
        LeaveOutcome::Error(e) => (
            LeaveStatus::Error,
            format!("An error occurred during agent leave process: {e}"),
        ),
    };
    LeaveAgentResponse {
        status,
        meeting_id,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leave_error_message_carries_cause() {
        let response = leave_response("m-9".to_string(), LeaveOutcome::Error("boom".to_string()));
        assert_eq!(response.status, LeaveStatus::Error);
        assert_eq!(response.meeting_id, "m-9");
        assert_eq!(response.message, "An error occurred during agent leave process: boom");
    }

    #[test]
    fn leave_not_found_message() {
        let response = leave_response("m-9".to_string(), LeaveOutcome::NotFound);
        assert_eq!(response.message, "No active session found for meeting m-9.");
    }
}
