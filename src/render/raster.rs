use std::path::Path;

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{ImageFormat, Rgb, RgbImage};

use super::RenderError;

pub const GLYPH_SIZE: u32 = 8;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const GRID: Rgb<u8> = Rgb([190, 190, 190]);
pub const HEADER_FILL: Rgb<u8> = Rgb([225, 228, 232]);
pub const STRIPE_FILL: Rgb<u8> = Rgb([246, 247, 249]);

/// Pixel surface with rectangle and bitmap-font text primitives.
pub struct Canvas {
    img: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgb<u8>) -> Self {
        Self {
            img: RgbImage::from_pixel(width.max(1), height.max(1), background),
        }
    }

    pub fn width(&self) -> u32 {
        self.img.width()
    }

    pub fn height(&self) -> u32 {
        self.img.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        *self.img.get_pixel(x, y)
    }

    /// Fill, clipped to the canvas.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
        let x_end = x.saturating_add(w).min(self.img.width());
        let y_end = y.saturating_add(h).min(self.img.height());
        for py in y.min(y_end)..y_end {
            for px in x.min(x_end)..x_end {
                self.img.put_pixel(px, py, color);
            }
        }
    }

    pub fn stroke_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
        if w == 0 || h == 0 {
            return;
        }
        self.fill_rect(x, y, w, 1, color);
        self.fill_rect(x, y + h - 1, w, 1, color);
        self.fill_rect(x, y, 1, h, color);
        self.fill_rect(x + w - 1, y, 1, h, color);
    }

    /// Draw `text` with its top-left corner at (x, y). Characters without a
    /// glyph are drawn as '?'.
    pub fn draw_text(&mut self, x: u32, y: u32, text: &str, scale: u32, color: Rgb<u8>) {
        let advance = GLYPH_SIZE * scale;
        for (i, ch) in text.chars().enumerate() {
            let glyph = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?'));
            let Some(glyph) = glyph else { continue };
            let gx = x + i as u32 * advance;
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_SIZE {
                    if bits & (1u8 << col) != 0 {
                        self.fill_rect(gx + col * scale, y + row as u32 * scale, scale, scale, color);
                    }
                }
            }
        }
    }

    pub fn save_png(&self, path: &Path) -> Result<(), RenderError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.img.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

pub fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH_SIZE * scale
}

/// Cut `text` to at most `max_chars`, marking the cut with '~'.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.push('~');
    out
}

/// Black or white, whichever reads better on `background`.
pub fn contrast_color(background: Rgb<u8>) -> Rgb<u8> {
    let [r, g, b] = background.0;
    let luma = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
    if luma > 140.0 { BLACK } else { WHITE }
}
