use super::layout::{self, Font};
use crate::{Error, Result};
use lopdf::{
    Dictionary, Document, Object, Stream,
    content::{Content, Operation},
    dictionary,
};

// US Letter, in points
pub const PAGE_WIDTH: i64 = 612;
pub const PAGE_HEIGHT: i64 = 792;
pub const MARGIN: i64 = 72;
pub const CONTENT_WIDTH: i64 = PAGE_WIDTH - 2 * MARGIN;

const IMAGE_RESOURCE: &[u8] = b"Im1";

/// A decoded RGB raster ready to embed as an image XObject.
#[derive(Debug, Clone)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// Where an image is drawn on its page, in points from the bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// Scales a `width` x `height` image to fit a `box_width` x `box_height` box
/// whose top-left corner is at (`left`, `top`), keeping the aspect ratio and
/// centring the result inside the box.
pub fn fit(
    width: u32,
    height: u32,
    left: i64,
    top: i64,
    box_width: i64,
    box_height: i64,
) -> Placement {
    let scale = (box_width as f64 / f64::from(width.max(1)))
        .min(box_height as f64 / f64::from(height.max(1)));
    let draw_width = ((f64::from(width) * scale).round() as i64).clamp(1, box_width);
    let draw_height = ((f64::from(height) * scale).round() as i64).clamp(1, box_height);

    Placement {
        x: left + (box_width - draw_width) / 2,
        y: top - (box_height - draw_height) / 2 - draw_height,
        width: draw_width,
        height: draw_height,
    }
}

/// Accumulates content operations page by page, flowing text downwards and
/// starting a new page when the bottom margin is reached.
#[derive(Default)]
pub struct PageWriter {
    pages: Vec<Vec<Operation>>,
    cursor: i64,
}

fn line_height(size: i64) -> i64 {
    size * 6 / 5
}

impl PageWriter {
    pub fn new() -> Self {
        let mut writer = Self::default();
        writer.add_page();
        writer
    }

    pub fn add_page(&mut self) {
        self.pages.push(Vec::new());
        self.cursor = PAGE_HEIGHT - MARGIN;
    }

    fn current(&mut self) -> &mut Vec<Operation> {
        if self.pages.is_empty() {
            self.add_page();
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Blank vertical space of one line at `size`.
    pub fn move_down(&mut self, size: i64) {
        self.cursor -= line_height(size);
    }

    /// Writes one already-encoded line at horizontal offset `x`.
    pub fn line(&mut self, font: Font, size: i64, x: i64, text: &[u8]) {
        let height = line_height(size);
        if self.cursor - height < MARGIN {
            self.add_page();
        }
        self.cursor -= height;
        // Baseline sits a quarter of the font size above the line bottom
        let baseline = self.cursor + size / 4;

        if text.is_empty() {
            return;
        }

        let ops = self.current();
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![
                Object::Name(font.resource_name().to_vec()),
                Object::Integer(size),
            ],
        ));
        ops.push(Operation::new(
            "Td",
            vec![Object::Integer(x), Object::Integer(baseline)],
        ));
        ops.push(Operation::new(
            "Tj",
            vec![Object::string_literal(text.to_vec())],
        ));
        ops.push(Operation::new("ET", vec![]));
    }

    /// Writes `text` word-wrapped to the margin box.
    pub fn paragraph(&mut self, font: Font, size: i64, text: &[u8]) {
        for line in layout::wrap(text, font, size, CONTENT_WIDTH) {
            self.line(font, size, MARGIN, &line);
        }
    }

    /// Writes a single line centred between the margins.
    pub fn centered(&mut self, font: Font, size: i64, text: &[u8]) {
        let width = font.text_width(text, size) / 1000;
        let x = MARGIN + ((CONTENT_WIDTH - width) / 2).max(0);
        self.line(font, size, x, text);
    }

    pub fn image(&mut self, placement: Placement) {
        let ops = self.current();
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new(
            "cm",
            vec![
                Object::Integer(placement.width),
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(placement.height),
                Object::Integer(placement.x),
                Object::Integer(placement.y),
            ],
        ));
        ops.push(Operation::new(
            "Do",
            vec![Object::Name(IMAGE_RESOURCE.to_vec())],
        ));
        ops.push(Operation::new("Q", vec![]));
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Assembles the pages into a PDF file. `raster` is registered as the
    /// `Im1` XObject shared by all pages.
    pub fn finish(self, title: &str, raster: Option<Raster>) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font = Font::Regular;
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        let mut fonts = Dictionary::new();
        fonts.set(font.resource_name().to_vec(), font_id);

        let mut xobjects = Dictionary::new();
        if let Some(raster) = raster {
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => Object::Integer(i64::from(raster.width)),
                    "Height" => Object::Integer(i64::from(raster.height)),
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => Object::Integer(8),
                },
                raster.rgb,
            ));
            xobjects.set(IMAGE_RESOURCE.to_vec(), image_id);
        }

        let resources_id = doc.add_object(dictionary! {
            "Font" => fonts,
            "XObject" => xobjects,
        });

        let mut kids = Vec::with_capacity(self.pages.len());
        for operations in self.pages {
            let encoded = Content { operations }
                .encode()
                .map_err(|e| Error::render(format!("Failed to encode page content: {}", e)))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let page_count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => Object::Integer(page_count),
                "Resources" => resources_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(PAGE_WIDTH),
                    Object::Integer(PAGE_HEIGHT),
                ],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(layout::encode_win_ansi(title)),
            "Producer" => Object::string_literal(concat!("plant-report ", env!("CARGO_PKG_VERSION"))),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| Error::render(format!("Failed to serialize PDF: {}", e)))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fit_wide_image_fills_box_width() {
        let placement = fit(1000, 500, 72, 720, 500, 400);
        assert_eq!(
            placement,
            Placement {
                x: 72,
                y: 720 - 75 - 250,
                width: 500,
                height: 250,
            }
        );
    }

    #[test]
    fn test_fit_tall_image_is_centred_horizontally() {
        let placement = fit(300, 600, 72, 720, 500, 400);
        assert_eq!(placement.height, 400);
        assert_eq!(placement.width, 200);
        assert_eq!(placement.x, 72 + 150);
        assert_eq!(placement.y, 320);
    }

    #[test]
    fn test_fit_small_image_is_scaled_up() {
        let placement = fit(50, 40, 72, 720, 500, 400);
        assert_eq!((placement.width, placement.height), (500, 400));
    }

    #[test]
    fn test_text_overflow_starts_new_page() {
        let mut writer = PageWriter::new();
        for _ in 0..100 {
            writer.line(Font::Regular, 12, MARGIN, b"line");
        }
        // 648pt of usable height at 14pt per line
        assert_eq!(writer.page_count(), 3);
    }

    #[test]
    fn test_finish_produces_pdf() {
        let mut writer = PageWriter::new();
        writer.centered(Font::Regular, 24, b"Title");
        let bytes = writer.finish("Title", None).unwrap();

        assert!(bytes.starts_with(b"%PDF-"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_finish_registers_only_helvetica() {
        let mut writer = PageWriter::new();
        writer.paragraph(Font::Regular, 12, b"Healthy fern.");
        let bytes = writer.finish("Report", None).unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let fonts: Vec<Vec<u8>> = doc
            .objects
            .values()
            .filter_map(|object| object.as_dict().ok())
            .filter(|dict| dict.get(b"Type").and_then(Object::as_name).ok() == Some(&b"Font"[..]))
            .filter_map(|dict| dict.get(b"BaseFont").and_then(Object::as_name).ok())
            .map(<[u8]>::to_vec)
            .collect();
        assert_eq!(fonts, vec![b"Helvetica".to_vec()]);
    }
}
