//! Verse judgment client backed by Claude.
//!
//! Each call forces a single `record_verdict` tool call so the reply comes
//! back as structured input rather than free text. Replies that arrive as
//! text anyway are parsed as JSON before giving up.

use crate::oracle::{JudgmentError, Oracle, OracleError, ProtocolError};
use crate::prompts::{
    opening_instruction, verdict_instruction, JUDGE_SYSTEM_PROMPT, OPENING_SYSTEM_PROMPT,
};
use crate::verdict::{JudgmentVerdict, WireVerdict};
use async_trait::async_trait;
use claude::{Claude, Message, Request};
use tracing::{debug, info, instrument, warn};

/// Environment variable that overrides the model.
pub const MODEL_ENV: &str = "MUSHAIRA_MODEL";

/// Configuration for the judge.
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// The model to use (defaults to the client's model).
    pub model: Option<String>,

    /// Maximum tokens for a verdict.
    pub max_tokens: usize,

    /// Temperature for generation.
    pub temperature: Option<f32>,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 1024,
            temperature: Some(0.7),
        }
    }
}

impl JudgeConfig {
    /// Defaults, with the model taken from `MUSHAIRA_MODEL` when set.
    pub fn from_env() -> Self {
        let model = std::env::var(MODEL_ENV)
            .ok()
            .filter(|m| !m.trim().is_empty());
        Self {
            model,
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, tokens: usize) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }
}

/// The Claude-backed oracle.
#[derive(Debug, Clone)]
pub struct ClaudeJudge {
    client: Claude,
    config: JudgeConfig,
}

impl ClaudeJudge {
    pub fn new(client: Claude) -> Self {
        Self {
            client,
            config: JudgeConfig::default(),
        }
    }

    /// Create a judge from `ANTHROPIC_API_KEY` and `MUSHAIRA_MODEL`.
    pub fn from_env() -> Result<Self, OracleError> {
        let client = Claude::from_env()?;
        Ok(Self {
            client,
            config: JudgeConfig::from_env(),
        })
    }

    pub fn with_config(mut self, config: JudgeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    fn build_request(&self, system: &str, instruction: String) -> Request {
        let mut request = Request::new(vec![Message::user(instruction)])
            .with_system(system)
            .with_max_tokens(self.config.max_tokens)
            .forcing_tool(WireVerdict::as_tool());

        if let Some(ref model) = self.config.model {
            request = request.with_model(model);
        }

        if let Some(temp) = self.config.temperature {
            request = request.with_temperature(temp);
        }

        request
    }

    async fn judge(&self, request: Request) -> Result<JudgmentVerdict, JudgmentError> {
        let response = self.client.complete(request).await?;

        let verdict = match response.tool_input(WireVerdict::tool_name()) {
            Some(input) => JudgmentVerdict::from_value(input.clone()),
            None => {
                let text = response.text();
                debug!(chars = text.len(), "No tool call in reply, parsing text");
                JudgmentVerdict::from_text(&text)
            }
        };

        verdict.map_err(|e: ProtocolError| {
            warn!(error = %e, "Oracle reply rejected");
            JudgmentError::Protocol(e)
        })
    }
}

#[async_trait]
impl Oracle for ClaudeJudge {
    #[instrument(skip(self))]
    async fn request_opening_verdict(&self) -> Result<JudgmentVerdict, JudgmentError> {
        let request = self.build_request(
            OPENING_SYSTEM_PROMPT,
            opening_instruction(WireVerdict::tool_name()),
        );
        let verdict = self.judge(request).await?;
        info!(
            has_verse = verdict.opponent_verse.is_some(),
            next_letter = ?verdict.next_required_letter,
            "Opening verdict received"
        );
        Ok(verdict)
    }

    #[instrument(skip(self, verse_text), fields(chars = verse_text.chars().count()))]
    async fn request_verdict(
        &self,
        verse_text: &str,
        required_letter: Option<char>,
    ) -> Result<JudgmentVerdict, JudgmentError> {
        let request = self.build_request(
            JUDGE_SYSTEM_PROMPT,
            verdict_instruction(WireVerdict::tool_name(), verse_text, required_letter),
        );
        let verdict = self.judge(request).await?;
        info!(
            is_valid = verdict.is_valid,
            is_winner = verdict.is_winner,
            next_letter = ?verdict.next_required_letter,
            "Turn verdict received"
        );
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_judge_config_builder() {
        let config = JudgeConfig::default()
            .with_model("claude-3-5-haiku-latest")
            .with_max_tokens(256)
            .with_temperature(0.2);

        assert_eq!(config.model.as_deref(), Some("claude-3-5-haiku-latest"));
        assert_eq!(config.max_tokens, 256);
        assert_eq!(config.temperature, Some(0.2));
    }

    #[test]
    fn test_request_forces_verdict_tool() {
        let judge = ClaudeJudge::new(Claude::new("test-key"))
            .with_config(JudgeConfig::default().with_model("m"));
        let request = judge.build_request(
            JUDGE_SYSTEM_PROMPT,
            verdict_instruction("record_verdict", "بیت", Some('ب')),
        );

        assert_eq!(request.model.as_deref(), Some("m"));
        assert_eq!(request.system.as_deref(), Some(JUDGE_SYSTEM_PROMPT));
        assert!(matches!(
            request.tool_choice,
            Some(claude::ToolChoice::Tool { ref name }) if name == "record_verdict"
        ));
        let tools = request.tools.unwrap();
        assert_eq!(tools[0].input_schema["required"][0], "isValid");
    }
}
