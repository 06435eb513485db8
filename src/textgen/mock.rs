use std::time::Duration;
use parking_lot::Mutex;
use async_trait::async_trait;
use crate::textgen::{TextGenerator, TextRequest};

/// Scripted generator for tests. Replies are consumed in order; an optional
/// delay simulates a slow backend.
pub struct MockTextGenerator {
    responses: Mutex<Vec<Result<String, String>>>,
    call_log:  Mutex<Vec<TextRequest>>,
    delay:     Option<Duration>,
}

impl MockTextGenerator {
    pub fn new(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_log:  Mutex::new(Vec::new()),
            delay:     None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns the number of times generate() was invoked
    pub fn call_count(&self) -> usize {
        self.call_log.lock().len()
    }

    /// Returns the request passed to the Nth call (0-indexed)
    pub fn request_for_call(&self, n: usize) -> Option<TextRequest> {
        self.call_log.lock().get(n).cloned()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, request: &TextRequest) -> Result<String, String> {
        self.call_log.lock().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut responses = self.responses.lock();
        if responses.is_empty() {
            return Err("MockTextGenerator: no more programmed responses".to_string());
        }
        responses.remove(0)
    }
}
