use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dg_core::{GenerationRequest, LlmClient, LlmResponse, Result};
use tracing::warn;

/// Retries transient provider failures with exponential backoff.
pub struct RetryModel {
    inner: Arc<dyn LlmClient>,
    max_retries: u32,
    base_delay: Duration,
}

impl RetryModel {
    pub fn new(inner: Arc<dyn LlmClient>, max_retries: u32, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl fmt::Debug for RetryModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryModel")
            .field("inner", &self.inner)
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .finish()
    }
}

#[async_trait]
impl LlmClient for RetryModel {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<LlmResponse> {
        let mut attempt = 0;
        loop {
            match self.inner.generate(request).await {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    attempt += 1;
                    warn!(
                        "Retry {}/{} after {:.1}s: {}",
                        attempt,
                        self.max_retries,
                        delay.as_secs_f64(),
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}
