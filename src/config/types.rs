use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const DEFAULT_ANALYSIS_PROMPT: &str = "Analyze this plant image and provide a detailed analysis of its species, health, care instructions, and any interesting facts in plain text without markdown.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: Provider,
    /// Unset means the provider's public endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: String,
    /// Unset means the provider's default model.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_prompt")]
    pub prompt: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Gemini,
    /// Any endpoint speaking the OpenAI chat completions API.
    Openai,
}

impl Provider {
    /// Endpoint used when `llm.base_url` is not set. `None` leaves the
    /// client library's own default in place.
    pub fn default_base_url(self) -> Option<&'static str> {
        match self {
            Provider::Gemini => Some(GEMINI_BASE_URL),
            Provider::Openai => None,
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-1.5-flash",
            Provider::Openai => "gpt-4o-mini",
        }
    }
}

impl LlmConfig {
    pub fn effective_base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .or(self.provider.default_base_url())
    }

    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .filter(|model| !model.trim().is_empty())
            .unwrap_or(self.provider.default_model())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: None,
            api_key: String::new(),
            model: None,
            prompt: default_prompt(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logs: LogsConfig::default(),
            public_dir: default_public_dir(),
            upload_dir: default_upload_dir(),
            reports_dir: default_reports_dir(),
            body_limit: default_body_limit(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_provider() -> Provider {
    Provider::Gemini
}

fn default_prompt() -> String {
    DEFAULT_ANALYSIS_PROMPT.to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    2206
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_body_limit() -> usize {
    10 * 1024 * 1024
}
