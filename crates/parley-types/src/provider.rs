//! Provider kinds accepted by the join API.
//!
//! Every provider category is a closed sum type. Names arrive as plain
//! strings on the wire and are resolved with [`FromStr`]; an unrecognised
//! name is an [`UnknownProvider`] error and never falls back to a default.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The category a provider name was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderCategory {
    /// The top-level `pipeline_type` field.
    Pipeline,
    /// Speech-to-text.
    Stt,
    /// Language model.
    Llm,
    /// Text-to-speech.
    Tts,
}

impl ProviderCategory {
    /// Returns the label used in log lines and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pipeline => "pipeline_type",
            Self::Stt => "STT",
            Self::Llm => "LLM",
            Self::Tts => "TTS",
        }
    }
}

impl fmt::Display for ProviderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a provider name is not present in its category's mapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {category} provider: {name}")]
pub struct UnknownProvider {
    pub category: ProviderCategory,
    pub name: String,
}

impl UnknownProvider {
    pub fn new(category: ProviderCategory, name: impl Into<String>) -> Self {
        Self {
            category,
            name: name.into(),
        }
    }
}

/// Integrated speech + reasoning + voice backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RealtimeProvider {
    /// OpenAI Realtime (`openai`).
    OpenAi,
    /// Google Gemini Live (`google`).
    Gemini,
    /// AWS Nova Sonic (`aws`).
    NovaSonic,
}

/// What `pipeline_type` resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    /// A single realtime multimodal model.
    Realtime(RealtimeProvider),
    /// Discrete STT, LLM and TTS stages (`cascading`).
    Cascading,
}

impl PipelineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Realtime(RealtimeProvider::OpenAi) => "openai",
            Self::Realtime(RealtimeProvider::Gemini) => "google",
            Self::Realtime(RealtimeProvider::NovaSonic) => "aws",
            Self::Cascading => "cascading",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Self::Realtime(RealtimeProvider::OpenAi)),
            "google" => Ok(Self::Realtime(RealtimeProvider::Gemini)),
            "aws" => Ok(Self::Realtime(RealtimeProvider::NovaSonic)),
            "cascading" => Ok(Self::Cascading),
            _ => Err(UnknownProvider::new(ProviderCategory::Pipeline, s)),
        }
    }
}

/// Speech-to-text providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SttProvider {
    Deepgram,
    OpenAi,
    Google,
    Sarvam,
}

impl SttProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deepgram => "deepgram",
            Self::OpenAi => "openai",
            Self::Google => "google",
            Self::Sarvam => "sarvam",
        }
    }
}

impl fmt::Display for SttProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SttProvider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deepgram" => Ok(Self::Deepgram),
            "openai" => Ok(Self::OpenAi),
            "google" => Ok(Self::Google),
            "sarvam" => Ok(Self::Sarvam),
            _ => Err(UnknownProvider::new(ProviderCategory::Stt, s)),
        }
    }
}

/// Language-model providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    OpenAi,
    Google,
    Sarvam,
}

impl LlmProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Google => "google",
            Self::Sarvam => "sarvam",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Self::OpenAi),
            "google" => Ok(Self::Google),
            "sarvam" => Ok(Self::Sarvam),
            _ => Err(UnknownProvider::new(ProviderCategory::Llm, s)),
        }
    }
}

/// Text-to-speech providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TtsProvider {
    OpenAi,
    ElevenLabs,
    Google,
    Sarvam,
}

impl TtsProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::ElevenLabs => "elevenlabs",
            Self::Google => "google",
            Self::Sarvam => "sarvam",
        }
    }
}

impl fmt::Display for TtsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TtsProvider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Self::OpenAi),
            "elevenlabs" => Ok(Self::ElevenLabs),
            "google" => Ok(Self::Google),
            "sarvam" => Ok(Self::Sarvam),
            _ => Err(UnknownProvider::new(ProviderCategory::Tts, s)),
        }
    }
}

/// Resolves an optional request field, treating an absent name as unknown.
pub fn resolve<T>(name: Option<&str>) -> Result<T, UnknownProvider>
where
    T: FromStr<Err = UnknownProvider>,
{
    name.unwrap_or_default().parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_kind_names() {
        assert_eq!(
            "openai".parse::<PipelineKind>(),
            Ok(PipelineKind::Realtime(RealtimeProvider::OpenAi))
        );
        assert_eq!(
            "google".parse::<PipelineKind>(),
            Ok(PipelineKind::Realtime(RealtimeProvider::Gemini))
        );
        assert_eq!(
            "aws".parse::<PipelineKind>(),
            Ok(PipelineKind::Realtime(RealtimeProvider::NovaSonic))
        );
        assert_eq!(
            "cascading".parse::<PipelineKind>(),
            Ok(PipelineKind::Cascading)
        );
    }

    #[test]
    fn unknown_pipeline_kind() {
        let err = "anthropic".parse::<PipelineKind>().unwrap_err();
        assert_eq!(err.category, ProviderCategory::Pipeline);
        assert_eq!(err.name, "anthropic");
        assert_eq!(err.to_string(), "Unknown pipeline_type provider: anthropic");
    }

    #[test]
    fn names_are_case_sensitive() {
        assert!("Deepgram".parse::<SttProvider>().is_err());
        assert!("OPENAI".parse::<LlmProvider>().is_err());
        assert!("ElevenLabs".parse::<TtsProvider>().is_err());
    }

    #[test]
    fn categories_have_distinct_name_sets() {
        // deepgram only transcribes, elevenlabs only speaks
        assert!("deepgram".parse::<SttProvider>().is_ok());
        assert!("deepgram".parse::<LlmProvider>().is_err());
        assert!("deepgram".parse::<TtsProvider>().is_err());
        assert!("elevenlabs".parse::<TtsProvider>().is_ok());
        assert!("elevenlabs".parse::<SttProvider>().is_err());
    }

    #[test]
    fn display_matches_wire_name() {
        for name in ["deepgram", "openai", "google", "sarvam"] {
            let stt: SttProvider = name.parse().unwrap();
            assert_eq!(stt.to_string(), name);
        }
        for name in ["openai", "elevenlabs", "google", "sarvam"] {
            let tts: TtsProvider = name.parse().unwrap();
            assert_eq!(tts.to_string(), name);
        }
    }

    #[test]
    fn resolve_missing_name_is_unknown() {
        let err = resolve::<SttProvider>(None).unwrap_err();
        assert_eq!(err, UnknownProvider::new(ProviderCategory::Stt, ""));
        assert_eq!(resolve::<LlmProvider>(Some("sarvam")), Ok(LlmProvider::Sarvam));
    }
}
