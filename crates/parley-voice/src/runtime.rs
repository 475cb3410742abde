//! The seam between the control plane and the agent runtime.
//!
//! [`AgentRuntime`] binds a persona, a pipeline and a conversation flow to a
//! meeting and hands back an [`AgentSession`]. The coordinator only ever
//! talks to these traits. [`LocalRuntime`] is the runtime the server ships
//! with; [`mock::ScriptedRuntime`] lets tests decide when and how sessions
//! start.

use crate::agent::{AgentPersona, ConversationFlow, END_CALL_TOOL, FAREWELL, GREETING};
use crate::config::LocalRuntimeConfig;
use crate::error::VoiceError;
use crate::pipeline::Pipeline;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Meeting context a session is bound to.
#[derive(Clone)]
pub struct SessionContext {
    pub meeting_id: String,
    /// Display name of the agent participant.
    pub name: String,
    /// Meeting auth token.
    pub token: String,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("meeting_id", &self.meeting_id)
            .field("name", &self.name)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Everything a runtime needs to create a session.
#[derive(Debug)]
pub struct SessionSpec {
    pub context: SessionContext,
    pub persona: AgentPersona,
    pub pipeline: Pipeline,
    pub flow: ConversationFlow,
}

/// Factory for agent sessions.
pub trait AgentRuntime: Send + Sync {
    fn create_session(&self, spec: SessionSpec) -> Result<Arc<dyn AgentSession>, VoiceError>;
}

/// A live (or starting) agent session.
#[async_trait::async_trait]
pub trait AgentSession: Send + Sync {
    /// Connects to the meeting and runs the session. Dropping the returned
    /// future abandons the start.
    async fn start(&self) -> Result<(), VoiceError>;

    /// True once the session holds a live room connection.
    fn is_connected(&self) -> bool;

    /// Asks a connected session to exit gracefully.
    async fn leave(&self) -> Result<(), VoiceError>;
}

/// Runtime that models the room connection in-process.
#[derive(Debug, Clone, Default)]
pub struct LocalRuntime {
    config: LocalRuntimeConfig,
}

impl LocalRuntime {
    pub fn new(config: LocalRuntimeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocalRuntimeConfig {
        &self.config
    }

    pub fn session(&self, spec: SessionSpec) -> LocalSession {
        LocalSession {
            context: spec.context,
            persona: spec.persona,
            pipeline: spec.pipeline,
            flow: Mutex::new(spec.flow),
            connected: AtomicBool::new(false),
            closed: CancellationToken::new(),
            connect_delay: self.config.connect_delay(),
            end_call_grace: self.config.end_call_grace(),
        }
    }
}

impl AgentRuntime for LocalRuntime {
    fn create_session(&self, spec: SessionSpec) -> Result<Arc<dyn AgentSession>, VoiceError> {
        Ok(Arc::new(self.session(spec)))
    }
}

#[derive(Debug)]
pub struct LocalSession {
    context: SessionContext,
    persona: AgentPersona,
    pipeline: Pipeline,
    flow: Mutex<ConversationFlow>,
    connected: AtomicBool,
    closed: CancellationToken,
    connect_delay: Duration,
    end_call_grace: Duration,
}

impl LocalSession {
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn persona(&self) -> &AgentPersona {
        &self.persona
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// True once the session has been left or ended.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Number of messages in the conversation so far.
    pub fn transcript_len(&self) -> usize {
        self.flow.lock().map(|flow| flow.chat_context().len()).unwrap_or(0)
    }

    /// Feeds one finished user utterance through the conversation flow and
    /// returns the text the model receives.
    pub fn hear(&self, transcript: &str) -> Result<String, VoiceError> {
        if !self.is_connected() {
            return Err(VoiceError::Startup(
                "agent is not connected to a room".to_string(),
            ));
        }
        let mut flow = self
            .flow
            .lock()
            .map_err(|_| VoiceError::Config("conversation flow lock poisoned".to_string()))?;
        let text = flow.begin_turn(transcript);
        debug!(
            meeting_id = %self.context.meeting_id,
            pipeline = %self.pipeline.label(),
            "user turn forwarded to model"
        );
        flow.end_turn();
        Ok(text)
    }

    /// The `end_call` tool: say goodbye, give the audio a moment to play,
    /// then leave. A no-op once the session is already gone.
    pub async fn end_call(&self) -> Result<(), VoiceError> {
        info!(meeting_id = %self.context.meeting_id, tool = END_CALL_TOOL, "end_call triggered");
        if !self.is_connected() || self.is_closed() {
            info!(
                meeting_id = %self.context.meeting_id,
                "end_call invoked on an already terminated session, ignoring"
            );
            return Ok(());
        }
        self.say(FAREWELL);
        tokio::time::sleep(self.end_call_grace).await;
        self.disconnect();
        Ok(())
    }

    fn say(&self, text: &str) {
        info!(meeting_id = %self.context.meeting_id, text, "agent speaking");
        if let Ok(mut flow) = self.flow.lock() {
            flow.record_reply(text);
        }
    }

    fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            info!(meeting_id = %self.context.meeting_id, "agent disconnected from room");
        }
        self.closed.cancel();
    }
}

#[async_trait::async_trait]
impl AgentSession for LocalSession {
    async fn start(&self) -> Result<(), VoiceError> {
        if self.is_closed() {
            return Err(VoiceError::Startup("session already closed".to_string()));
        }
        if self.context.token.trim().is_empty() {
            return Err(VoiceError::Startup("meeting token is empty".to_string()));
        }

        info!(
            meeting_id = %self.context.meeting_id,
            name = %self.context.name,
            pipeline = %self.pipeline.label(),
            mcp_servers = self.persona.mcp_servers.len(),
            "agent connecting to room"
        );

        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }

        self.connected.store(true, Ordering::SeqCst);
        self.say(GREETING);

        self.closed.cancelled().await;
        info!(meeting_id = %self.context.meeting_id, "agent session ended");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn leave(&self) -> Result<(), VoiceError> {
        if !self.is_connected() {
            warn!(
                meeting_id = %self.context.meeting_id,
                "leave requested for a session that is not connected"
            );
            return Ok(());
        }
        self.say(FAREWELL);
        self.disconnect();
        Ok(())
    }
}

/// Scripted runtime for tests.
///
/// Sessions follow a [`StartBehavior`] and record how they were driven so
/// tests can assert on the coordinator without touching real time.
pub mod mock {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::watch;

    /// What `start()` does.
    #[derive(Debug, Clone)]
    pub enum StartBehavior {
        /// Returns `Ok` straight away.
        Complete,
        /// Returns `Err(VoiceError::Startup)` with this message.
        Fail(String),
        /// Waits until [`ScriptedSession::release`] is called.
        Hold,
        /// Marks the session connected, then waits like `Hold`.
        ConnectAndHold,
    }

    pub struct ScriptedRuntime {
        behavior: StartBehavior,
        leave_error: Option<String>,
        create_error: Option<String>,
        sessions: Mutex<Vec<Arc<ScriptedSession>>>,
        started_tx: Arc<watch::Sender<usize>>,
    }

    impl ScriptedRuntime {
        pub fn new(behavior: StartBehavior) -> Self {
            Self {
                behavior,
                leave_error: None,
                create_error: None,
                sessions: Mutex::new(Vec::new()),
                started_tx: Arc::new(watch::channel(0).0),
            }
        }

        /// Sessions whose `leave()` fails with this message.
        pub fn with_leave_error(mut self, message: impl Into<String>) -> Self {
            self.leave_error = Some(message.into());
            self
        }

        /// `create_session` itself fails with this message.
        pub fn with_create_error(mut self, message: impl Into<String>) -> Self {
            self.create_error = Some(message.into());
            self
        }

        pub fn sessions(&self) -> Vec<Arc<ScriptedSession>> {
            self.sessions.lock().map(|s| s.clone()).unwrap_or_default()
        }

        pub fn created(&self) -> usize {
            self.sessions.lock().map(|s| s.len()).unwrap_or(0)
        }

        /// Waits until `count` sessions have entered `start()`.
        pub async fn wait_started(&self, count: usize) {
            let mut rx = self.started_tx.subscribe();
            let _ = rx.wait_for(|started| *started >= count).await;
        }
    }

    impl AgentRuntime for ScriptedRuntime {
        fn create_session(&self, spec: SessionSpec) -> Result<Arc<dyn AgentSession>, VoiceError> {
            if let Some(message) = &self.create_error {
                return Err(VoiceError::Startup(message.clone()));
            }
            let session = Arc::new(ScriptedSession {
                context: spec.context,
                pipeline: spec.pipeline,
                behavior: self.behavior.clone(),
                leave_error: self.leave_error.clone(),
                connected: AtomicBool::new(false),
                release: CancellationToken::new(),
                start_calls: AtomicUsize::new(0),
                leave_calls: AtomicUsize::new(0),
                start_abandoned: AtomicBool::new(false),
                started_tx: Arc::clone(&self.started_tx),
            });
            if let Ok(mut sessions) = self.sessions.lock() {
                sessions.push(Arc::clone(&session));
            }
            Ok(session)
        }
    }

    pub struct ScriptedSession {
        pub context: SessionContext,
        pub pipeline: Pipeline,
        behavior: StartBehavior,
        leave_error: Option<String>,
        connected: AtomicBool,
        release: CancellationToken,
        start_calls: AtomicUsize,
        leave_calls: AtomicUsize,
        start_abandoned: AtomicBool,
        started_tx: Arc<watch::Sender<usize>>,
    }

    impl ScriptedSession {
        /// Lets a held `start()` return `Ok`.
        pub fn release(&self) {
            self.release.cancel();
        }

        pub fn set_connected(&self, connected: bool) {
            self.connected.store(connected, Ordering::SeqCst);
        }

        pub fn start_calls(&self) -> usize {
            self.start_calls.load(Ordering::SeqCst)
        }

        pub fn leave_calls(&self) -> usize {
            self.leave_calls.load(Ordering::SeqCst)
        }

        /// True if a `start()` future was dropped before it finished.
        pub fn start_abandoned(&self) -> bool {
            self.start_abandoned.load(Ordering::SeqCst)
        }
    }

    /// Flags the session if the start future is dropped mid-flight.
    struct AbandonGuard<'a> {
        flag: &'a AtomicBool,
        armed: bool,
    }

    impl Drop for AbandonGuard<'_> {
        fn drop(&mut self) {
            if self.armed {
                self.flag.store(true, Ordering::SeqCst);
            }
        }
    }

    #[async_trait::async_trait]
    impl AgentSession for ScriptedSession {
        async fn start(&self) -> Result<(), VoiceError> {
            self.start_calls.fetch_add(1, Ordering::SeqCst);
            let mut guard = AbandonGuard {
                flag: &self.start_abandoned,
                armed: true,
            };
            self.started_tx.send_modify(|started| *started += 1);

            let result = match &self.behavior {
                StartBehavior::Complete => Ok(()),
                StartBehavior::Fail(message) => Err(VoiceError::Startup(message.clone())),
                StartBehavior::Hold => {
                    self.release.cancelled().await;
                    Ok(())
                }
                StartBehavior::ConnectAndHold => {
                    self.set_connected(true);
                    self.release.cancelled().await;
                    Ok(())
                }
            };
            guard.armed = false;
            result
        }

        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        async fn leave(&self) -> Result<(), VoiceError> {
            self.leave_calls.fetch_add(1, Ordering::SeqCst);
            self.set_connected(false);
            self.release.cancel();
            match &self.leave_error {
                Some(message) => Err(VoiceError::Leave(message.clone())),
                None => Ok(()),
            }
        }
    }
}
