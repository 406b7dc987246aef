use crate::{Error, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

/// An image as handed to a vision provider: MIME type plus base64 payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub mime_type: String,
    pub base64: String,
}

impl ImageData {
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            base64: STANDARD.encode(bytes),
        }
    }

    /// Parses `data:<mime>;base64,<payload>`. A bare base64 payload is
    /// accepted as well and reported as `application/octet-stream`.
    /// The payload itself is only checked by [`ImageData::decode`].
    pub fn parse_data_uri(uri: &str) -> Result<Self> {
        let uri = uri.trim();

        let (mime_type, payload) = match uri.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest
                    .split_once(',')
                    .ok_or_else(|| Error::validation("Malformed image data URI"))?;
                let mime_type = header.strip_suffix(";base64").ok_or_else(|| {
                    Error::validation("Image data URI must be base64 encoded")
                })?;
                let mime_type = if mime_type.is_empty() {
                    "application/octet-stream"
                } else {
                    mime_type
                };
                (mime_type.to_string(), payload)
            }
            None => ("application/octet-stream".to_string(), uri),
        };

        Ok(Self {
            mime_type,
            base64: payload.to_string(),
        })
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.base64.as_bytes())
            .map_err(|e| Error::validation(format!("Invalid base64 image data: {}", e)))
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

/// JSON body returned by `/analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub result: String,
    pub image: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_data_uri_round_trip() {
        let image = ImageData::from_bytes("image/jpeg", b"\xff\xd8\xffjpeg");
        let uri = image.to_data_uri();

        assert!(uri.starts_with("data:image/jpeg;base64,"));
        let parsed = ImageData::parse_data_uri(&uri).unwrap();
        assert_eq!(parsed, image);
        assert_eq!(parsed.decode().unwrap(), b"\xff\xd8\xffjpeg".to_vec());
    }

    #[test]
    fn test_bare_base64_is_accepted() {
        let parsed = ImageData::parse_data_uri("aGVsbG8=").unwrap();
        assert_eq!(parsed.mime_type, "application/octet-stream");
        assert_eq!(parsed.decode().unwrap(), b"hello".to_vec());
    }

    #[test]
    fn test_non_base64_data_uri_is_rejected() {
        let result = ImageData::parse_data_uri("data:image/svg+xml,<svg/>");
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_invalid_payload_fails_to_decode() {
        let image = ImageData::parse_data_uri("data:image/png;base64,@@@@").unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert!(matches!(image.decode(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_missing_comma_is_rejected() {
        let result = ImageData::parse_data_uri("data:image/png;base64");
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
