use async_trait::async_trait;

#[cfg(feature = "anthropic")]
mod anthropic;
mod fallback;
mod mock;
#[cfg(feature = "openai")]
mod openai;
mod random;

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicTextGenerator;
pub use fallback::FallbackTextGenerator;
pub use mock::MockTextGenerator;
#[cfg(feature = "openai")]
pub use openai::OpenAiTextGenerator;
pub use random::RandomTextGenerator;

/// What the explorer knows about a text field it just focused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextRequest {
    pub app:          String,
    pub ability:      String,
    pub page:         String,
    pub element_type: String,
    /// Structural path of the field.
    pub location:     String,
}

impl TextRequest {
    pub fn system_prompt(&self) -> String {
        format!(
            "You are testing the mobile app {}. Reply with a single realistic value \
             to type into the focused input field and nothing else.",
            self.app
        )
    }

    pub fn user_prompt(&self) -> String {
        format!(
            "Ability: {}. Page: {}. Field type: {}. Field path: {}.",
            self.ability, self.page, self.element_type, self.location
        )
    }

    /// Chat messages describing the field, in the OpenAI wire shape.
    pub fn build_messages(&self) -> Vec<serde_json::Value> {
        vec![
            serde_json::json!({ "role": "system", "content": self.system_prompt() }),
            serde_json::json!({ "role": "user",   "content": self.user_prompt() }),
        ]
    }
}

/// The single interface between the explorer and anything that invents
/// text input.
///
/// # Contract
/// - Must be Send + Sync (used behind `Arc<dyn TextGenerator>`)
/// - Returns Err(String) for any failure; callers fall back to random text
/// - May take arbitrarily long; callers bound it with a timeout
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &TextRequest) -> Result<String, String>;
}
