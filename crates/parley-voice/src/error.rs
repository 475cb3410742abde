use parley_types::UnknownProvider;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Unknown pipeline_type: {0}")]
    UnknownPipeline(String),

    #[error(transparent)]
    UnknownProvider(#[from] UnknownProvider),

    #[error("Session startup failed: {0}")]
    Startup(String),

    #[error("Session leave failed: {0}")]
    Leave(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl VoiceError {
    /// True for errors raised while resolving the requested pipeline.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            VoiceError::UnknownPipeline(_) | VoiceError::UnknownProvider(_) | VoiceError::Config(_)
        )
    }
}
