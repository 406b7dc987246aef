use super::{gemini::GeminiClient, openai::OpenAiClient, types::ImageData};
use crate::{
    Result,
    config::{LlmConfig, Provider},
};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait VisionClient: Send + Sync {
    /// Sends `prompt` together with `image` to a multimodal model and
    /// returns the generated text.
    async fn analyze_image(&self, prompt: &str, image: &ImageData) -> Result<String>;
}

pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn VisionClient>> {
    let client: Arc<dyn VisionClient> = match config.provider {
        Provider::Gemini => Arc::new(GeminiClient::new(config.clone())?),
        Provider::Openai => Arc::new(OpenAiClient::new(config.clone())),
    };
    Ok(client)
}
