use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

fn default_agent_name() -> String {
    "VideoSDK Agent".to_string()
}

fn default_end_call_grace_ms() -> u64 {
    1000
}

/// Settings for the bundled local agent runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalRuntimeConfig {
    /// Display name the agent joins the meeting under.
    #[serde(default = "default_agent_name")]
    pub name: String,
    /// Simulated room connection latency in milliseconds. Default: 0.
    #[serde(default)]
    pub connect_delay_ms: u64,
    /// Pause between the farewell and leaving when the agent ends the call
    /// itself. Default: 1000.
    #[serde(default = "default_end_call_grace_ms")]
    pub end_call_grace_ms: u64,
}

impl Default for LocalRuntimeConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            connect_delay_ms: 0,
            end_call_grace_ms: default_end_call_grace_ms(),
        }
    }
}

impl LocalRuntimeConfig {
    pub fn connect_delay(&self) -> Duration {
        Duration::from_millis(self.connect_delay_ms)
    }

    pub fn end_call_grace(&self) -> Duration {
        Duration::from_millis(self.end_call_grace_ms)
    }
}

/// Provider API keys, read from the process environment.
///
/// A missing key is kept as `None`; whether the provider can work without
/// it is decided when the runtime connects, not here.
#[derive(Clone, Default)]
pub struct ProviderCredentials {
    pub openai_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub deepgram_api_key: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    /// Used by the Sarvam STT and TTS plugins.
    pub sarvamai_api_key: Option<String>,
    /// Used by the Sarvam LLM plugin.
    pub sarvam_api_key: Option<String>,
}

impl ProviderCredentials {
    /// Reads every `*_API_KEY` variable the provider plugins consume.
    pub fn from_env() -> Self {
        Self {
            openai_api_key: env_key("OPENAI_API_KEY"),
            google_api_key: env_key("GOOGLE_API_KEY"),
            deepgram_api_key: env_key("DEEPGRAM_API_KEY"),
            elevenlabs_api_key: env_key("ELEVENLABS_API_KEY"),
            sarvamai_api_key: env_key("SARVAMAI_API_KEY"),
            sarvam_api_key: env_key("SARVAM_API_KEY"),
        }
    }
}

fn env_key(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn redact(key: &Option<String>) -> &'static str {
    if key.is_some() {
        "[REDACTED]"
    } else {
        "<unset>"
    }
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("google_api_key", &redact(&self.google_api_key))
            .field("deepgram_api_key", &redact(&self.deepgram_api_key))
            .field("elevenlabs_api_key", &redact(&self.elevenlabs_api_key))
            .field("sarvamai_api_key", &redact(&self.sarvamai_api_key))
            .field("sarvam_api_key", &redact(&self.sarvam_api_key))
            .finish()
    }
}
