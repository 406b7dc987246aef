use async_trait::async_trait;
use plant_report::{
    Error, Result,
    vision::{ImageData, VisionClient},
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// What the mock saw for one call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub image: ImageData,
    /// Number of files in the watched directory while the call was running.
    pub files_in_dir: Option<usize>,
}

/// Mock vision client for testing
#[derive(Debug)]
pub struct MockVisionClient {
    pub reply: String,
    pub error: Option<String>,
    pub calls: Arc<Mutex<Vec<RecordedCall>>>,
    pub watch_dir: Option<PathBuf>,
}

impl MockVisionClient {
    pub fn new() -> Self {
        Self {
            reply: "Boston fern (Nephrolepis exaltata). The plant looks healthy.".to_string(),
            error: None,
            calls: Arc::new(Mutex::new(Vec::new())),
            watch_dir: None,
        }
    }

    pub fn with_reply(mut self, reply: &str) -> Self {
        self.reply = reply.to_string();
        self
    }

    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    /// Counts the files in `dir` whenever the client is called.
    pub fn watching(mut self, dir: PathBuf) -> Self {
        self.watch_dir = Some(dir);
        self
    }

    pub fn get_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockVisionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VisionClient for MockVisionClient {
    async fn analyze_image(&self, prompt: &str, image: &ImageData) -> Result<String> {
        let files_in_dir = self
            .watch_dir
            .as_ref()
            .map(|dir| std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0));

        self.calls.lock().unwrap().push(RecordedCall {
            prompt: prompt.to_string(),
            image: image.clone(),
            files_in_dir,
        });

        match &self.error {
            Some(error) => Err(Error::external(error.clone())),
            None => Ok(self.reply.clone()),
        }
    }
}
