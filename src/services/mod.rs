pub mod content_cache;
pub mod generator;
pub mod llm_provider;
pub mod mock_generator;

use std::sync::Arc;

use crate::config::Config;
use generator::{ContentGenerator, LlmContentGenerator};
use llm_provider::LlmProvider;
use mock_generator::MockContentGenerator;

/// Picks the generator implementation from configuration.
pub fn build_generator(config: &Config) -> Arc<dyn ContentGenerator> {
    if config.llm.mock {
        tracing::info!("Using mock content generator");
        Arc::new(MockContentGenerator::new())
    } else {
        tracing::info!(
            model = %config.llm.model,
            enabled = config.llm.enabled,
            "Using LLM content generator"
        );
        Arc::new(LlmContentGenerator::new(
            LlmProvider::new(&config.llm),
            config.languages.clone(),
        ))
    }
}
