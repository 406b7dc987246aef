//! Google Gemini `generateContent` client.

use super::{client::VisionClient, types::ImageData};
use crate::{
    Error, Result,
    config::{GEMINI_BASE_URL, LlmConfig},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = config
            .effective_base_url()
            .unwrap_or(GEMINI_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let model = config.effective_model().to_string();

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
            model,
        })
    }

    fn api_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl VisionClient for GeminiClient {
    async fn analyze_image(&self, prompt: &str, image: &ImageData) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::Text {
                        text: prompt.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type.clone(),
                            data: image.base64.clone(),
                        },
                    },
                ],
            }],
        };

        debug!(
            model = %self.model,
            mime_type = %image.mime_type,
            payload_len = image.base64.len(),
            "Sending image to Gemini"
        );

        let response = self
            .client
            .post(self.api_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::external(format!(
                "Gemini API error {}: {}",
                status, body
            )));
        }

        let reply: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::external(format!("Failed to parse Gemini response: {}", e)))?;

        extract_text(reply)
    }
}

fn extract_text(reply: GenerateContentResponse) -> Result<String> {
    if let Some(reason) = reply
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(Error::external(format!("Prompt blocked: {}", reason)));
    }

    let candidate = reply
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::external("Gemini returned no candidates"))?;

    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        return Err(Error::external("Response blocked by safety filters"));
    }

    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| match part {
            Part::Text { text } => Some(text),
            Part::InlineData { .. } => None,
        })
        .collect();

    if text.trim().is_empty() {
        return Err(Error::external("Gemini returned an empty analysis"));
    }

    debug!("Received {} characters from Gemini", text.len());
    Ok(text)
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(alias = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct InlineData {
    #[serde(alias = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
