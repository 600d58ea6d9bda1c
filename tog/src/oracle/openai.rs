//! Chat Completions oracle backend implementing [`Oracle`] (ChatOracle).
//!
//! Requires `OPENAI_API_KEY` (or explicit config, e.g. a compatible proxy via
//! `OPENAI_BASE_URL`). Every call sends the instruction's system template plus
//! the rendered user block; with context enabled, prior turns of the same run
//! are replayed before the current one, so an instance must not be shared
//! between concurrent runs and `flush_context` must be called between runs.
//!
//! **Interaction**: Implements [`Oracle`]; used by the CLI and the serve
//! façade. Depends on `async_openai`.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
    },
    Client,
};

use crate::error::OracleError;
use crate::prompts;
use super::{Instruction, Oracle, PromptParams};

/// One remembered conversation turn (context mode only).
#[derive(Clone, Debug)]
enum Turn {
    User(String),
    Assistant(String),
}

/// Chat Completions judge.
///
/// Builder-style configuration: model, temperature, rolling context.
pub struct ChatOracle {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
    use_context: bool,
    context: Mutex<Vec<Turn>>,
}

impl ChatOracle {
    /// Build with default config (API key from `OPENAI_API_KEY` env).
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_config(OpenAIConfig::default(), model)
    }

    /// Build with custom config (e.g. custom API key or base URL).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
            temperature: None,
            use_context: false,
            context: Mutex::new(Vec::new()),
        }
    }

    /// Set temperature (0–2). Selection tasks usually want a low value.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Keep a rolling conversation context across calls of one run.
    pub fn with_context(mut self) -> Self {
        self.use_context = true;
        self
    }
}

#[async_trait]
impl Oracle for ChatOracle {
    async fn run(
        &self,
        instruction: Instruction,
        prompt: &str,
        params: PromptParams,
    ) -> Result<String, OracleError> {
        let system = prompts::system(instruction, &params);
        let user = prompts::user(instruction, prompt, &params);

        let mut messages: Vec<ChatCompletionRequestMessage> =
            vec![ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessage::from(system.as_str()),
            )];
        if self.use_context {
            for turn in self.context.lock().await.iter() {
                messages.push(match turn {
                    Turn::User(s) => ChatCompletionRequestMessage::User(
                        ChatCompletionRequestUserMessage::from(s.as_str()),
                    ),
                    Turn::Assistant(s) => {
                        ChatCompletionRequestMessage::Assistant((s.as_str()).into())
                    }
                });
            }
        }
        messages.push(ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessage::from(user.as_str()),
        ));

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(messages);
        if let Some(t) = self.temperature {
            args.temperature(t);
        }
        let request = args
            .build()
            .map_err(|e| OracleError::Backend(format!("request build failed: {e}")))?;

        debug!(
            instruction = %instruction,
            model = %self.model,
            use_context = self.use_context,
            "oracle chat create"
        );
        trace!(instruction = %instruction, user_block = %user, "oracle user block");

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| OracleError::Backend(format!("chat API error: {e}")))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| OracleError::Backend("chat API returned no content".to_string()))?;

        trace!(instruction = %instruction, response = %content, "oracle response");

        if self.use_context {
            let mut context = self.context.lock().await;
            context.push(Turn::User(user));
            context.push(Turn::Assistant(content.clone()));
        }

        Ok(content)
    }

    async fn flush_context(&self) {
        self.context.lock().await.clear();
    }
}
