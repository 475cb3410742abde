//! Pipeline selection.
//!
//! Turns the `pipeline_type` / `stt` / `llm` / `tts` / `detection` fields of a
//! join request into a [`Pipeline`] description the agent runtime can
//! instantiate. Construction is pure: no provider is contacted here.

use crate::config::ProviderCredentials;
use crate::error::VoiceError;
use parley_types::provider::resolve;
use parley_types::{
    JoinAgentRequest, LlmProvider, PipelineKind, ProviderCategory, RealtimeProvider, SttProvider,
    TtsProvider,
};
use serde::Serialize;
use tracing::info;

/// Server-side VAD settings for the OpenAI realtime model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerVad {
    pub threshold: f32,
    pub prefix_padding_ms: u32,
    pub silence_duration_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAiRealtimeConfig {
    pub model: String,
    pub modalities: Vec<String>,
    pub turn_detection: ServerVad,
    pub tool_choice: String,
}

impl Default for OpenAiRealtimeConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-realtime-preview".to_string(),
            modalities: vec!["text".to_string(), "audio".to_string()],
            turn_detection: ServerVad {
                threshold: 0.5,
                prefix_padding_ms: 300,
                silence_duration_ms: 200,
            },
            tool_choice: "auto".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeminiLiveConfig {
    pub model: String,
    pub response_modalities: Vec<String>,
}

impl Default for GeminiLiveConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash-live-001".to_string(),
            response_modalities: vec!["AUDIO".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NovaSonicConfig {
    pub model: String,
    pub voice: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl Default for NovaSonicConfig {
    fn default() -> Self {
        Self {
            model: "amazon.nova-sonic-v1:0".to_string(),
            voice: "tiffany".to_string(),
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: 1024,
        }
    }
}

/// One integrated speech + reasoning + voice backend.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeModel {
    OpenAi(OpenAiRealtimeConfig),
    Gemini(GeminiLiveConfig),
    /// Authenticates through the AWS credential chain, not an API key.
    NovaSonic(NovaSonicConfig),
}

impl RealtimeModel {
    pub fn model_name(&self) -> &str {
        match self {
            RealtimeModel::OpenAi(c) => &c.model,
            RealtimeModel::Gemini(c) => &c.model,
            RealtimeModel::NovaSonic(c) => &c.model,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RealtimePipeline {
    pub model: RealtimeModel,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SttStage {
    pub provider: SttProvider,
    pub api_key: Option<String>,
    /// Provider-specific recognition model, if one is pinned.
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmStage {
    pub provider: LlmProvider,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TtsStage {
    pub provider: TtsProvider,
    pub api_key: Option<String>,
}

/// Local voice-activity and end-of-turn detection for a cascading pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnDetection {
    /// Silero VAD with its stock settings.
    pub vad: Vad,
    /// Probability above which the turn detector ends the user's turn.
    pub turn_threshold: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vad {
    Silero,
}

impl Default for TurnDetection {
    fn default() -> Self {
        Self {
            vad: Vad::Silero,
            turn_threshold: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CascadingPipeline {
    pub stt: SttStage,
    pub llm: LlmStage,
    pub tts: TtsStage,
    /// `None` leaves turn handling to the providers.
    pub turn_detection: Option<TurnDetection>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pipeline {
    Realtime(RealtimePipeline),
    Cascading(CascadingPipeline),
}

impl Pipeline {
    /// Short label for log lines, e.g. `realtime:gpt-4o-realtime-preview` or
    /// `cascading:deepgram/openai/elevenlabs`.
    pub fn label(&self) -> String {
        match self {
            Pipeline::Realtime(p) => format!("realtime:{}", p.model.model_name()),
            Pipeline::Cascading(p) => {
                format!("cascading:{}/{}/{}", p.stt.provider, p.llm.provider, p.tts.provider)
            }
        }
    }
}

/// Builds the pipeline a join request asks for.
///
/// For `cascading`, `stt`, `llm` and `tts` are resolved in that order and
/// the first unknown (or missing) name fails the whole request.
pub fn build_pipeline(
    req: &JoinAgentRequest,
    creds: &ProviderCredentials,
) -> Result<Pipeline, VoiceError> {
    info!(pipeline_type = %req.pipeline_type, "creating pipeline");

    let kind: PipelineKind = req.pipeline_type.parse().map_err(|e: parley_types::UnknownProvider| {
        debug_assert_eq!(e.category, ProviderCategory::Pipeline);
        VoiceError::UnknownPipeline(e.name)
    })?;

    match kind {
        PipelineKind::Realtime(provider) => Ok(Pipeline::Realtime(realtime(provider, creds))),
        PipelineKind::Cascading => {
            info!(
                stt = ?req.stt,
                llm = ?req.llm,
                tts = ?req.tts,
                "using cascading pipeline"
            );
            let stt = stt_stage(resolve(req.stt.as_deref())?, creds);
            info!(stt = %stt.provider, "STT configured");
            let llm = llm_stage(resolve(req.llm.as_deref())?, creds);
            info!(llm = %llm.provider, "LLM configured");
            let tts = tts_stage(resolve(req.tts.as_deref())?, creds);
            info!(tts = %tts.provider, "TTS configured");

            let turn_detection = if req.detection_enabled() {
                info!("adding VAD and turn detection");
                Some(TurnDetection::default())
            } else {
                info!("no VAD/turn detection");
                None
            };

            Ok(Pipeline::Cascading(CascadingPipeline {
                stt,
                llm,
                tts,
                turn_detection,
            }))
        }
    }
}

fn realtime(provider: RealtimeProvider, creds: &ProviderCredentials) -> RealtimePipeline {
    match provider {
        RealtimeProvider::OpenAi => {
            info!("using OpenAI realtime");
            RealtimePipeline {
                model: RealtimeModel::OpenAi(OpenAiRealtimeConfig::default()),
                api_key: creds.openai_api_key.clone(),
            }
        }
        RealtimeProvider::Gemini => {
            info!("using Google Gemini realtime");
            RealtimePipeline {
                model: RealtimeModel::Gemini(GeminiLiveConfig::default()),
                api_key: creds.google_api_key.clone(),
            }
        }
        RealtimeProvider::NovaSonic => {
            info!("using AWS Nova Sonic realtime");
            RealtimePipeline {
                model: RealtimeModel::NovaSonic(NovaSonicConfig::default()),
                api_key: None,
            }
        }
    }
}

fn stt_stage(provider: SttProvider, creds: &ProviderCredentials) -> SttStage {
    let (api_key, model) = match provider {
        SttProvider::Deepgram => (creds.deepgram_api_key.clone(), None),
        SttProvider::OpenAi => (creds.openai_api_key.clone(), None),
        // Google speech uses application default credentials.
        SttProvider::Google => (None, Some("latest_long".to_string())),
        SttProvider::Sarvam => (creds.sarvamai_api_key.clone(), None),
    };
    SttStage {
        provider,
        api_key,
        model,
    }
}

fn llm_stage(provider: LlmProvider, creds: &ProviderCredentials) -> LlmStage {
    let api_key = match provider {
        LlmProvider::OpenAi => creds.openai_api_key.clone(),
        LlmProvider::Google => creds.google_api_key.clone(),
        LlmProvider::Sarvam => creds.sarvam_api_key.clone(),
    };
    LlmStage { provider, api_key }
}

fn tts_stage(provider: TtsProvider, creds: &ProviderCredentials) -> TtsStage {
    let api_key = match provider {
        TtsProvider::OpenAi => creds.openai_api_key.clone(),
        TtsProvider::ElevenLabs => creds.elevenlabs_api_key.clone(),
        TtsProvider::Google => creds.google_api_key.clone(),
        TtsProvider::Sarvam => creds.sarvamai_api_key.clone(),
    };
    TtsStage { provider, api_key }
}
