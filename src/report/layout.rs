//! Text measurement and line breaking for the built-in Helvetica fonts.

/// Advance widths (1/1000 em) of Helvetica for bytes 0x20..=0x7E.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

/// Width used for bytes outside the printable ASCII range.
const FALLBACK_WIDTH: u16 = 556;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
}

impl Font {
    /// Resource name under which the font is registered on every page.
    pub fn resource_name(self) -> &'static [u8] {
        match self {
            Font::Regular => b"F1",
        }
    }

    pub fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
        }
    }

    fn glyph_width(self, byte: u8) -> u16 {
        let table = match self {
            Font::Regular => &HELVETICA_WIDTHS,
        };
        match byte {
            0x20..=0x7E => table[(byte - 0x20) as usize],
            _ => FALLBACK_WIDTH,
        }
    }

    /// Width of `text` in thousandths of a point at `size`.
    pub fn text_width(self, text: &[u8], size: i64) -> i64 {
        text.iter()
            .map(|&b| i64::from(self.glyph_width(b)))
            .sum::<i64>()
            * size
    }
}

/// Encodes `text` for a WinAnsiEncoding font. Characters with no WinAnsi
/// code point become `?`; tabs become a single space.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter_map(|c| match c {
            '\r' => None,
            '\t' => Some(b' '),
            ' '..='~' => Some(c as u8),
            '\u{A0}'..='\u{FF}' => Some(c as u32 as u8),
            '\u{20AC}' => Some(0x80),
            '\u{2026}' => Some(0x85),
            '\u{2018}' => Some(0x91),
            '\u{2019}' => Some(0x92),
            '\u{201C}' => Some(0x93),
            '\u{201D}' => Some(0x94),
            '\u{2022}' => Some(0x95),
            '\u{2013}' => Some(0x96),
            '\u{2014}' => Some(0x97),
            '\u{2122}' => Some(0x99),
            '\n' => Some(b'\n'),
            _ => Some(b'?'),
        })
        .collect()
}

/// Breaks encoded text into lines no wider than `max_width` points.
///
/// Explicit newlines always start a new line and blank input lines are kept.
/// Words wider than the line are split at the character that overflows.
pub fn wrap(text: &[u8], font: Font, size: i64, max_width: i64) -> Vec<Vec<u8>> {
    let limit = max_width * 1000;
    let space = font.text_width(b" ", size);
    let mut lines = Vec::new();

    for paragraph in text.split(|&b| b == b'\n') {
        let mut line: Vec<u8> = Vec::new();
        let mut line_width = 0;

        for word in paragraph.split(|&b| b == b' ').filter(|w| !w.is_empty()) {
            let word_width = font.text_width(word, size);
            let needed = if line.is_empty() {
                word_width
            } else {
                line_width + space + word_width
            };

            if needed <= limit {
                if !line.is_empty() {
                    line.push(b' ');
                    line_width += space;
                }
                line.extend_from_slice(word);
                line_width += word_width;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }

            if word_width <= limit {
                line.extend_from_slice(word);
                line_width = word_width;
                continue;
            }

            for &byte in word {
                let width = font.text_width(&[byte], size);
                if line_width + width > limit && !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                    line_width = 0;
                }
                line.push(byte);
                line_width += width;
            }
        }

        lines.push(line);
    }

    lines
}
