//! Join/leave coordination.
//!
//! A join builds the agent, registers it under its meeting id and races the
//! session's `start()` against the record's cancellation token. A leave pops
//! the record, cancels the token and, if the session already holds a room
//! connection, asks it to exit.
//!
//! ```text
//! Idle -> Configuring -> Starting -> Completed | Cancelled | Failed -> CleanedUp
//! ```
//!
//! Cleanup runs from a drop guard, so the registry entry is released on every
//! exit path, including a panicking runtime or an aborted task.

use crate::agent::{AgentPersona, ConversationFlow};
use crate::config::ProviderCredentials;
use crate::error::VoiceError;
use crate::pipeline::build_pipeline;
use crate::registry::{SessionRecord, SessionRegistry};
use crate::runtime::{AgentRuntime, SessionContext, SessionSpec};
use parley_types::JoinAgentRequest;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// The cancellation side of a [`race`] won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Runs `operation` until it finishes or `cancel` fires, whichever is first.
///
/// The loser is dropped, not awaited. If both are ready at the same poll the
/// cancellation wins.
pub async fn race<F>(operation: F, cancel: &CancellationToken) -> Result<F::Output, Cancelled>
where
    F: Future,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Cancelled),
        output = operation => Ok(output),
    }
}

/// How a background join ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// `start()` returned successfully before any leave.
    Completed,
    /// A leave request cancelled the join first.
    Cancelled,
    /// Configuration or startup failed; carries the error message.
    Failed(String),
}

/// How a leave request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The session was signalled and, if connected, left cleanly.
    Success,
    /// Nothing was registered for the meeting.
    NotFound,
    /// The graceful exit failed; the record is gone regardless.
    Error(String),
}

/// Releases a join's registry entry when dropped.
struct RegistryCleanup<'a> {
    registry: &'a SessionRegistry,
    meeting_id: &'a str,
    record_id: Option<Uuid>,
}

impl Drop for RegistryCleanup<'_> {
    fn drop(&mut self) {
        if let Some(record_id) = self.record_id {
            if self.registry.remove_if_current(self.meeting_id, record_id) {
                info!(
                    meeting_id = self.meeting_id,
                    %record_id,
                    "cleaned up session from active list"
                );
            }
        }
        info!(meeting_id = self.meeting_id, "agent join task finished");
    }
}

/// Starts and stops agents, one registry entry per meeting.
#[derive(Clone)]
pub struct AgentCoordinator {
    registry: SessionRegistry,
    runtime: Arc<dyn AgentRuntime>,
    credentials: Arc<ProviderCredentials>,
    agent_name: String,
}

impl AgentCoordinator {
    pub fn new(
        registry: SessionRegistry,
        runtime: Arc<dyn AgentRuntime>,
        credentials: ProviderCredentials,
        agent_name: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            runtime,
            credentials: Arc::new(credentials),
            agent_name: agent_name.into(),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Spawns the join in the background and returns its handle.
    ///
    /// A join for a meeting that already has an agent is allowed: the new
    /// record replaces the old one and both joins run independently.
    pub fn join(&self, req: JoinAgentRequest) -> JoinHandle<JoinOutcome> {
        if self.registry.contains(&req.meeting_id) {
            warn!(
                meeting_id = %req.meeting_id,
                "agent joining meeting which might already have an active agent, a new one will be started"
            );
        }
        let coordinator = self.clone();
        tokio::spawn(async move { coordinator.run_join(req).await })
    }

    /// Runs a join to completion on the current task.
    pub async fn run_join(&self, req: JoinAgentRequest) -> JoinOutcome {
        info!(
            meeting_id = %req.meeting_id,
            pipeline_type = %req.pipeline_type,
            mcp_url = ?req.mcp_url,
            "initializing agent operations"
        );

        let mut cleanup = RegistryCleanup {
            registry: &self.registry,
            meeting_id: &req.meeting_id,
            record_id: None,
        };

        match self.start_session(&req, &mut cleanup).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(meeting_id = %req.meeting_id, error = %e, "agent session startup failed");
                JoinOutcome::Failed(e.to_string())
            }
        }
    }

    async fn start_session(
        &self,
        req: &JoinAgentRequest,
        cleanup: &mut RegistryCleanup<'_>,
    ) -> Result<JoinOutcome, VoiceError> {
        let cancel = CancellationToken::new();

        let persona = AgentPersona::new(&req.system_prompt, &req.personality, req.mcp_url.as_deref());
        let pipeline = build_pipeline(req, &self.credentials)?;
        let flow = ConversationFlow::new(&persona);

        let session = self.runtime.create_session(SessionSpec {
            context: SessionContext {
                meeting_id: req.meeting_id.clone(),
                name: self.agent_name.clone(),
                token: req.token.clone(),
            },
            persona,
            pipeline,
            flow,
        })?;

        let record = SessionRecord::new(Arc::clone(&session), cancel.clone());
        cleanup.record_id = Some(record.record_id);
        self.registry.insert(&req.meeting_id, record);
        info!(
            meeting_id = %req.meeting_id,
            active_sessions = ?self.registry.meeting_ids(),
            "agent session stored"
        );

        match race(session.start(), &cancel).await {
            Err(Cancelled) => {
                info!(meeting_id = %req.meeting_id, "startup cancelled by leave request");
                Ok(JoinOutcome::Cancelled)
            }
            Ok(result) => {
                result?;
                info!(meeting_id = %req.meeting_id, "agent session start completed normally");
                Ok(JoinOutcome::Completed)
            }
        }
    }

    /// Stops whatever agent is registered for `meeting_id`.
    pub async fn leave(&self, meeting_id: &str) -> LeaveOutcome {
        info!(meeting_id, "received leave request");

        let Some(record) = self.registry.take(meeting_id) else {
            info!(meeting_id, "no active session found for this meeting");
            return LeaveOutcome::NotFound;
        };

        info!(meeting_id, record_id = %record.record_id, "found active session, signalling termination");
        record.cancel.cancel();

        if !record.session.is_connected() {
            info!(
                meeting_id,
                "session was not fully initialized, cancellation signal sent, no explicit leave needed"
            );
            return LeaveOutcome::Success;
        }

        info!(meeting_id, "session is fully initialized, instructing agent to leave");
        match record.session.leave().await {
            Ok(()) => {
                info!(meeting_id, "agent successfully left the meeting");
                LeaveOutcome::Success
            }
            Err(e) => {
                error!(meeting_id, error = %e, "error during the leave process");
                LeaveOutcome::Error(e.to_string())
            }
        }
    }

    /// Cancels every registered join and leaves every connected session.
    pub async fn shutdown(&self) {
        let records = self.registry.drain();
        if records.is_empty() {
            return;
        }
        info!(count = records.len(), "stopping active agent sessions");
        for (meeting_id, record) in records {
            record.cancel.cancel();
            if record.session.is_connected() {
                if let Err(e) = record.session.leave().await {
                    warn!(meeting_id = %meeting_id, error = %e, "agent leave failed during shutdown");
                }
            }
        }
    }
}
