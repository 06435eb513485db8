use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::textgen::{TextGenerator, TextRequest};

const MESSAGES_VERSION: &str = "2023-06-01";
const REPLY_TOKENS:     u32  = 64;

#[derive(Serialize)]
struct MessagesBody<'a> {
    model:      &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system:     Option<String>,
    messages:   Vec<Value>,
}

/// Only text blocks matter for a field value; anything else is skipped.
#[derive(Deserialize)]
struct MessagesReply {
    #[serde(default)]
    content: Vec<ReplyBlock>,
}

#[derive(Deserialize)]
struct ReplyBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Asks the Anthropic Messages API for a value to type into a field.
pub struct AnthropicTextGenerator {
    http:     reqwest::Client,
    api_key:  String,
    api_base: String,
    model:    String,
}

impl AnthropicTextGenerator {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http:     reqwest::Client::new(),
            api_key:  api_key.into(),
            api_base: "https://api.anthropic.com".into(),
            model:    model.into(),
        }
    }

    /// Reads the key from `ANTHROPIC_API_KEY`.
    pub fn from_env(model: impl Into<String>) -> Result<Self, String> {
        match std::env::var("ANTHROPIC_API_KEY") {
            Ok(key) => Ok(Self::new(key, model)),
            Err(_)  => Err("ANTHROPIC_API_KEY is not set".to_string()),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn body<'a>(&'a self, request: &TextRequest) -> MessagesBody<'a> {
        let (system, turns): (Vec<Value>, Vec<Value>) = request
            .build_messages()
            .into_iter()
            .partition(|m| m["role"] == "system");
        MessagesBody {
            model:      &self.model,
            max_tokens: REPLY_TOKENS,
            system:     system.first().and_then(|m| m["content"].as_str()).map(str::to_string),
            messages:   turns,
        }
    }
}

fn first_text(reply: MessagesReply) -> Option<String> {
    reply.content
        .into_iter()
        .filter(|b| b.kind == "text")
        .filter_map(|b| b.text)
        .map(|t| t.trim().to_string())
        .find(|t| !t.is_empty())
}

#[async_trait]
impl TextGenerator for AnthropicTextGenerator {
    async fn generate(&self, request: &TextRequest) -> Result<String, String> {
        let url = format!("{}/v1/messages", self.api_base.trim_end_matches('/'));
        let response = self.http
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", MESSAGES_VERSION)
            .json(&self.body(request))
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(format!("Anthropic returned {}: {}", status, detail));
        }

        let reply: MessagesReply = response
            .json()
            .await
            .map_err(|e| format!("Unreadable Anthropic reply: {}", e))?;
        first_text(reply).ok_or_else(|| "Anthropic reply had no text".to_string())
    }
}
