use std::time::Duration;
use tracing::info;

/// Spoken when the agent enters the meeting.
pub const GREETING: &str = "Hey, How can I help you today?";

/// Spoken when the agent leaves the meeting.
pub const FAREWELL: &str = "Goodbye!";

/// Name of the tool the model can call to hang up.
pub const END_CALL_TOOL: &str = "end_call";

const MCP_CLIENT_SESSION_TIMEOUT: Duration = Duration::from_secs(30);

/// An MCP server reached over streamable HTTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpServerHttp {
    pub url: String,
    pub client_session_timeout: Duration,
}

/// The persona the agent speaks as.
#[derive(Debug, Clone)]
pub struct AgentPersona {
    /// System prompt handed to the model.
    pub instructions: String,
    pub personality: String,
    pub mcp_servers: Vec<McpServerHttp>,
}

impl AgentPersona {
    pub fn new(system_prompt: &str, personality: &str, mcp_url: Option<&str>) -> Self {
        let mcp_servers = match mcp_url.filter(|url| !url.is_empty()) {
            Some(url) => {
                info!(mcp_url = url, "MCP URL provided, attaching MCP server");
                vec![McpServerHttp {
                    url: url.to_string(),
                    client_session_timeout: MCP_CLIENT_SESSION_TIMEOUT,
                }]
            }
            None => {
                info!("no MCP URL provided, skipping MCP server");
                Vec::new()
            }
        };

        info!(personality, "agent persona initialized");

        Self {
            instructions: system_prompt.to_string(),
            personality: personality.to_string(),
            mcp_servers,
        }
    }

    /// Function tools exposed to the model.
    pub fn tools(&self) -> &'static [&'static str] {
        &[END_CALL_TOOL]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Running transcript of the conversation as the model sees it.
#[derive(Debug, Clone, Default)]
pub struct ChatContext {
    messages: Vec<ChatMessage>,
}

impl ChatContext {
    pub fn with_instructions(instructions: &str) -> Self {
        let mut ctx = Self::default();
        ctx.add_message(ChatRole::System, instructions);
        ctx
    }

    pub fn add_message(&mut self, role: ChatRole, content: impl Into<String>) {
        self.messages.push(ChatMessage {
            role,
            content: content.into(),
        });
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Per-turn handler sitting between transcription and the model.
#[derive(Debug, Clone)]
pub struct ConversationFlow {
    chat: ChatContext,
    turn_active: bool,
}

impl ConversationFlow {
    pub fn new(persona: &AgentPersona) -> Self {
        info!("conversation flow initialized");
        Self {
            chat: ChatContext::with_instructions(&persona.instructions),
            turn_active: false,
        }
    }

    /// Opens a user turn. The transcript is trimmed and lowercased before it
    /// is added to the chat context; the normalised text is returned.
    pub fn begin_turn(&mut self, transcript: &str) -> String {
        self.turn_active = true;
        let processed = transcript.trim().to_lowercase();
        self.chat.add_message(ChatRole::User, processed.clone());
        processed
    }

    pub fn record_reply(&mut self, text: &str) {
        self.chat.add_message(ChatRole::Assistant, text);
    }

    pub fn end_turn(&mut self) {
        self.turn_active = false;
    }

    pub fn is_turn_active(&self) -> bool {
        self.turn_active
    }

    pub fn chat_context(&self) -> &ChatContext {
        &self.chat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persona_without_mcp() {
        let persona = AgentPersona::new("prompt", "cheerful", None);
        assert!(persona.mcp_servers.is_empty());
        assert_eq!(persona.instructions, "prompt");
        assert_eq!(persona.tools(), &["end_call"]);
    }

    #[test]
    fn persona_with_mcp() {
        let persona = AgentPersona::new("prompt", "cheerful", Some("http://mcp.local/mcp"));
        assert_eq!(
            persona.mcp_servers,
            vec![McpServerHttp {
                url: "http://mcp.local/mcp".to_string(),
                client_session_timeout: Duration::from_secs(30),
            }]
        );
    }

    #[test]
    fn empty_mcp_url_is_ignored() {
        let persona = AgentPersona::new("prompt", "cheerful", Some(""));
        assert!(persona.mcp_servers.is_empty());
    }

    #[test]
    fn turn_normalises_transcript() {
        let persona = AgentPersona::new("be kind", "warm", None);
        let mut flow = ConversationFlow::new(&persona);
        assert!(!flow.is_turn_active());

        let text = flow.begin_turn("  What's The Weather?  ");
        assert_eq!(text, "what's the weather?");
        assert!(flow.is_turn_active());

        flow.record_reply("Sunny.");
        flow.end_turn();
        assert!(!flow.is_turn_active());

        let roles: Vec<ChatRole> = flow
            .chat_context()
            .messages()
            .iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(roles, vec![ChatRole::System, ChatRole::User, ChatRole::Assistant]);
        assert_eq!(flow.chat_context().messages()[0].content, "be kind");
    }
}
