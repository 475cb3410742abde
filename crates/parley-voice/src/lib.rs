//! Agent orchestration for Parley.
//!
//! Resolves join requests into provider pipelines, binds them to an agent
//! runtime and keeps track of which meetings currently have an agent
//! starting or running. The runtime itself (audio transport, recognition,
//! inference) sits behind the [`AgentRuntime`] / [`AgentSession`] traits.
//!
//! The join/leave race lives in [`coordinator`]; the registry it maintains
//! lives in [`registry`].

pub mod agent;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod runtime;

pub use agent::{AgentPersona, ConversationFlow};
pub use config::{LocalRuntimeConfig, ProviderCredentials};
pub use coordinator::{race, AgentCoordinator, Cancelled, JoinOutcome, LeaveOutcome};
pub use error::VoiceError;
pub use pipeline::{build_pipeline, Pipeline};
pub use registry::{SessionRecord, SessionRegistry};
pub use runtime::{AgentRuntime, AgentSession, LocalRuntime};
