use serde::{Deserialize, Serialize};

pub use crate::error::ErrorResponse;
pub use crate::vision::AnalysisResponse;

/// JSON body of `/download`. `image` is the data URI returned by `/analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    pub result: String,
    #[serde(default)]
    pub image: Option<String>,
}
