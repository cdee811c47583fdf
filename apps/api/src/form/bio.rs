use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::form::prompts::render_bio;

pub const DEFAULT_BIO_LATENCY: Duration = Duration::from_millis(2000);

#[derive(Debug, Error)]
pub enum BioError {
    #[error("bio generator unavailable: {0}")]
    Unavailable(String),

    #[error("bio generator returned an empty paragraph")]
    Empty,
}

/// `(name, specialty, keyword) -> one paragraph`.
#[async_trait]
pub trait BioGenerator: Send + Sync {
    async fn generate(
        &self,
        full_name: &str,
        specialty: &str,
        ai_keyword: &str,
    ) -> Result<String, BioError>;
}

/// Fills the fixed French template after a simulated latency.
pub struct TemplateBioGenerator {
    latency: Duration,
}

impl TemplateBioGenerator {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for TemplateBioGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_BIO_LATENCY)
    }
}

#[async_trait]
impl BioGenerator for TemplateBioGenerator {
    async fn generate(
        &self,
        full_name: &str,
        specialty: &str,
        ai_keyword: &str,
    ) -> Result<String, BioError> {
        debug!("Generating bio (latency: {}ms)", self.latency.as_millis());
        tokio::time::sleep(self.latency).await;
        Ok(render_bio(full_name, specialty, ai_keyword))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_template_bio_waits_and_interpolates() {
        let generator = TemplateBioGenerator::default();
        let started = tokio::time::Instant::now();
        let bio = generator
            .generate("Jean Dupont", "Développeur", "innovation")
            .await
            .unwrap();
        assert!(started.elapsed() >= DEFAULT_BIO_LATENCY);
        assert!(bio.starts_with("Jean Dupont est un(e) Développeur"));
        assert!(bio.contains("expertise en innovation."));
        assert!(!bio.contains('{'));
    }
}
