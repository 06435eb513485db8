use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;

use crate::textgen::{TextGenerator, TextRequest};

/// Field values from any OpenAI-compatible chat endpoint.
pub struct OpenAiTextGenerator {
    client: Client<OpenAIConfig>,
    model:  String,
}

impl OpenAiTextGenerator {
    /// Uses `OPENAI_API_KEY` and the public endpoint.
    pub fn new(model: impl Into<String>) -> Self {
        Self { client: Client::new(), model: model.into() }
    }

    pub fn with_base_url(
        api_base: impl Into<String>,
        api_key:  impl Into<String>,
        model:    impl Into<String>,
    ) -> Self {
        let config = OpenAIConfig::new().with_api_base(api_base).with_api_key(api_key);
        Self { client: Client::with_config(config), model: model.into() }
    }

    fn completion(&self, request: &TextRequest) -> Result<CreateChatCompletionRequest, OpenAIError> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system_prompt())
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user_prompt())
                .build()?
                .into(),
        ];
        CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages(messages)
            .max_tokens(64u32)
            .build()
    }
}

#[async_trait]
impl TextGenerator for OpenAiTextGenerator {
    async fn generate(&self, request: &TextRequest) -> Result<String, String> {
        let completion = self.completion(request)
            .map_err(|e| format!("Invalid completion request: {}", e))?;

        let response = self.client.chat()
            .create(completion)
            .await
            .map_err(|e| format!("OpenAI request failed: {}", e))?;

        response.choices
            .into_iter()
            .filter_map(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .find(|text| !text.is_empty())
            .ok_or_else(|| "OpenAI reply had no text".to_string())
    }
}
