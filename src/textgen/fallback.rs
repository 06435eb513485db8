use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use crate::textgen::{RandomTextGenerator, TextGenerator, TextRequest};

/// Wraps any generator with a time bound and a random-string fallback.
///
/// `generate` never returns `Err`: a failing, empty or slow reply is replaced
/// with random text, so text entry never blocks exploration past `timeout`.
pub struct FallbackTextGenerator {
    inner:    Arc<dyn TextGenerator>,
    timeout:  Duration,
    fallback: RandomTextGenerator,
}

impl FallbackTextGenerator {
    pub fn new(inner: Arc<dyn TextGenerator>, timeout: Duration, fallback: RandomTextGenerator) -> Self {
        Self { inner, timeout, fallback }
    }

    /// Random text only; the inner generator is the fallback itself.
    pub fn random_only(max_len: usize, seed: Option<u64>) -> Self {
        Self {
            inner:    Arc::new(RandomTextGenerator::new(max_len, seed)),
            timeout:  Duration::from_secs(1),
            fallback: RandomTextGenerator::new(max_len, seed.map(|s| s.wrapping_add(7))),
        }
    }
}

#[async_trait]
impl TextGenerator for FallbackTextGenerator {
    async fn generate(&self, request: &TextRequest) -> Result<String, String> {
        match tokio::time::timeout(self.timeout, self.inner.generate(request)).await {
            Ok(Ok(text)) if !text.is_empty() => Ok(text),
            Ok(Ok(_)) => {
                tracing::warn!(page = %request.page, "text generator returned nothing, using random text");
                Ok(self.fallback.next_string())
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, page = %request.page, "text generator failed, using random text");
                Ok(self.fallback.next_string())
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    page       = %request.page,
                    "text generator timed out, using random text"
                );
                Ok(self.fallback.next_string())
            }
        }
    }
}
