//! PDF rendering of plant analysis reports.

pub mod layout;
pub mod pdf;

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, TimeZone};
use layout::{Font, encode_win_ansi};
use pdf::{MARGIN, PAGE_HEIGHT, PageWriter, Raster};
use tracing::debug;

pub const REPORT_TITLE: &str = "Plant Analysis Report";

/// Box the image page fits into, in points.
pub const IMAGE_BOX_WIDTH: i64 = 500;
pub const IMAGE_BOX_HEIGHT: i64 = 400;

// Larger rasters are downscaled before embedding; twice the box keeps print quality.
const MAX_RASTER_WIDTH: u32 = 1000;
const MAX_RASTER_HEIGHT: u32 = 800;

#[derive(Debug, Clone)]
pub struct Report {
    pub date: NaiveDate,
    pub body: String,
    /// Encoded image bytes (PNG, JPEG, ...) for the second page.
    pub image: Option<Vec<u8>>,
}

impl Report {
    pub fn new(date: NaiveDate, body: impl Into<String>) -> Self {
        Self {
            date,
            body: body.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: Vec<u8>) -> Self {
        self.image = Some(image);
        self
    }

    /// Renders the report: title, date and body on the first page(s), then
    /// the image fitted into a 500x400pt box on its own page.
    ///
    /// Image bytes that do not decode are a validation error.
    pub fn render(&self) -> Result<Vec<u8>> {
        let raster = self.image.as_deref().map(decode_raster).transpose()?;

        let mut writer = PageWriter::new();
        writer.centered(Font::Regular, 24, REPORT_TITLE.as_bytes());
        writer.move_down(12);
        writer.line(
            Font::Regular,
            14,
            MARGIN,
            format!("Date: {}", self.date.format("%-m/%-d/%Y")).as_bytes(),
        );
        writer.move_down(12);
        writer.paragraph(Font::Regular, 12, &encode_win_ansi(&self.body));

        if let Some(raster) = &raster {
            writer.add_page();
            writer.image(pdf::fit(
                raster.width,
                raster.height,
                MARGIN,
                PAGE_HEIGHT - MARGIN,
                IMAGE_BOX_WIDTH,
                IMAGE_BOX_HEIGHT,
            ));
        }

        debug!(
            pages = writer.page_count(),
            body_len = self.body.len(),
            has_image = raster.is_some(),
            "Rendering report"
        );

        writer.finish(REPORT_TITLE, raster)
    }
}

fn decode_raster(bytes: &[u8]) -> Result<Raster> {
    let mut image = image::load_from_memory(bytes)
        .map_err(|e| Error::validation(format!("Unsupported image data: {}", e)))?;

    if image.width() > MAX_RASTER_WIDTH || image.height() > MAX_RASTER_HEIGHT {
        image = image.thumbnail(MAX_RASTER_WIDTH, MAX_RASTER_HEIGHT);
    }

    let rgb = image.to_rgb8();
    Ok(Raster {
        width: rgb.width(),
        height: rgb.height(),
        rgb: rgb.into_raw(),
    })
}

/// File name for a report generated at `now`, unique to the millisecond.
pub fn report_file_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String {
    format!("plant_analysis_report_{}.pdf", now.timestamp_millis())
}
