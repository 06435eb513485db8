use async_trait::async_trait;
use parking_lot::Mutex;
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::Rng;
use crate::agent::seeded_rng;
use crate::textgen::{TextGenerator, TextRequest};

/// Random alphanumeric strings of length `1..=max_len`. Never fails.
pub struct RandomTextGenerator {
    rng:     Mutex<StdRng>,
    max_len: usize,
}

impl RandomTextGenerator {
    pub fn new(max_len: usize, seed: Option<u64>) -> Self {
        Self { rng: Mutex::new(seeded_rng(seed)), max_len: max_len.max(1) }
    }

    pub fn next_string(&self) -> String {
        let mut rng = self.rng.lock();
        let len = rng.gen_range(1..=self.max_len);
        (&mut *rng).sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }
}

#[async_trait]
impl TextGenerator for RandomTextGenerator {
    async fn generate(&self, _request: &TextRequest) -> Result<String, String> {
        Ok(self.next_string())
    }
}
