use axum::Router;
use lopdf::{
    Document, Object,
    content::{Content, Operation},
};
use plant_report::{
    config::{Config, DEFAULT_ANALYSIS_PROMPT},
    server::{self, handlers::AppState},
    vision::VisionClient,
};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const BOUNDARY: &str = "plant-report-test-boundary";

/// Create a test configuration whose scratch and public directories live in `dir`
pub fn create_test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.llm.api_key = "test-api-key".to_string();
    config.server.host = "127.0.0.1".to_string();
    config.server.upload_dir = dir.path().join("uploads");
    config.server.reports_dir = dir.path().join("reports");
    config.server.public_dir = dir.path().join("public");
    config.server.logs.level = "debug".to_string();
    config
}

/// Build the full router around `client`, rooted in a fresh temp directory
pub fn create_test_app(client: Arc<dyn VisionClient>) -> (Router, TempDir) {
    create_test_app_with(client, |_| {})
}

/// Like [`create_test_app`], with `configure` applied to the config first
pub fn create_test_app_with(
    client: Arc<dyn VisionClient>,
    configure: impl FnOnce(&mut Config),
) -> (Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let mut config = create_test_config(&temp_dir);
    configure(&mut config);
    std::fs::create_dir_all(&config.server.public_dir).unwrap();
    std::fs::write(
        config.server.public_dir.join("index.html"),
        "<html><body>Plant analyzer</body></html>",
    )
    .unwrap();

    let app_state = AppState::new(&config, client);
    let app = server::router(app_state, &config.server);
    (app, temp_dir)
}

pub fn assert_default_prompt(prompt: &str) {
    assert_eq!(prompt, DEFAULT_ANALYSIS_PROMPT);
}

/// True when `dir` is missing or holds no entries
pub fn dir_is_empty(dir: &Path) -> bool {
    match std::fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}

/// A small gradient image encoded in `format`
pub fn sample_image(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 96])
    });
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

pub fn sample_jpeg() -> Vec<u8> {
    sample_image(120, 90, image::ImageFormat::Jpeg)
}

pub enum FormPart<'a> {
    Text {
        name: &'a str,
        value: &'a str,
    },
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: Option<&'a str>,
        bytes: &'a [u8],
    },
}

/// Encode `parts` as a multipart/form-data body using [`BOUNDARY`]
pub fn multipart_body(parts: &[FormPart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            FormPart::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            FormPart::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
                if let Some(content_type) = content_type {
                    body.extend_from_slice(
                        format!("Content-Type: {}\r\n", content_type).as_bytes(),
                    );
                }
                body.extend_from_slice(b"\r\n");
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

pub fn pdf_page_count(bytes: &[u8]) -> usize {
    Document::load_mem(bytes).unwrap().get_pages().len()
}

/// Content operations of page `page_number` (1-based)
pub fn pdf_page_operations(bytes: &[u8], page_number: u32) -> Vec<Operation> {
    let doc = Document::load_mem(bytes).unwrap();
    let page_id = doc.get_pages()[&page_number];
    Content::decode(&doc.get_page_content(page_id).unwrap())
        .unwrap()
        .operations
}

/// Every string shown with `Tj`, page by page in order
pub fn pdf_text_lines(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    let mut lines = Vec::new();
    for (_, page_id) in doc.get_pages() {
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        for operation in content.operations {
            if operation.operator != "Tj" {
                continue;
            }
            for operand in operation.operands {
                if let Object::String(text, _) = operand {
                    lines.push(String::from_utf8_lossy(&text).into_owned());
                }
            }
        }
    }
    lines
}
