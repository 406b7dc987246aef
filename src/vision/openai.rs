use super::{client::VisionClient, types::ImageData};
use crate::{Error, Result, config::LlmConfig};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequestArgs, ImageUrlArgs,
    },
};
use async_trait::async_trait;
use tracing::debug;

/// Client for endpoints speaking the OpenAI chat completions API. The image
/// travels as a data URI inside an `image_url` content part.
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: LlmConfig) -> Self {
        let model = config.effective_model().to_string();
        let base_url = config.effective_base_url().map(str::to_string);
        let mut openai_config = OpenAIConfig::new().with_api_key(config.api_key);

        if let Some(base_url) = base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        let client = Client::with_config(openai_config);

        Self { client, model }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

pub(crate) fn build_user_message(
    prompt: &str,
    image: &ImageData,
) -> Result<ChatCompletionRequestMessage> {
    let text = ChatCompletionRequestMessageContentPartTextArgs::default()
        .text(prompt)
        .build()?;

    let image_url = ImageUrlArgs::default().url(image.to_data_uri()).build()?;
    let image = ChatCompletionRequestMessageContentPartImageArgs::default()
        .image_url(image_url)
        .build()?;

    let message = ChatCompletionRequestUserMessageArgs::default()
        .content(ChatCompletionRequestUserMessageContent::Array(vec![
            ChatCompletionRequestUserMessageContentPart::Text(text),
            ChatCompletionRequestUserMessageContentPart::ImageUrl(image),
        ]))
        .build()?;

    Ok(message.into())
}

#[async_trait]
impl VisionClient for OpenAiClient {
    async fn analyze_image(&self, prompt: &str, image: &ImageData) -> Result<String> {
        debug!(
            model = %self.model,
            mime_type = %image.mime_type,
            "Sending image to OpenAI-compatible endpoint"
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![build_user_message(prompt, image)?])
            .build()?;

        let response = self.client.chat().create(request).await?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Error::external("Model returned an empty analysis"));
        }

        Ok(text)
    }
}
