/// Title label rendering.
///
/// Glyphs come from a built-in 5x7 block font and are emitted as SVG rects on
/// a translucent rounded backing, then rasterized with resvg on top of the
/// composed surface. No system fonts are involved, so output is identical on
/// every machine.

use crate::rendering::paint::Rgba;
use crate::{Error, Result};
use resvg::tiny_skia;
use resvg::usvg;
use serde::{Deserialize, Serialize};

pub const GLYPH_COLUMNS: u32 = 5;
pub const GLYPH_ROWS: u32 = 7;
const GLYPH_ADVANCE: u32 = GLYPH_COLUMNS + 1;

/// Placement and colors of the title label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelStyle {
    /// Top-left corner of the label backing, in canvas pixels
    pub x: f32,
    pub y: f32,
    /// Size of one glyph dot in pixels
    pub scale: f32,
    pub padding: f32,
    pub corner_radius: f32,
    pub text: Rgba,
    pub background: Rgba,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            x: 24.0,
            y: 24.0,
            scale: 4.0,
            padding: 12.0,
            corner_radius: 10.0,
            text: (255, 255, 255, 255),
            background: (0, 0, 0, 150),
        }
    }
}

fn glyph(ch: char) -> [u8; 7] {
    match ch.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        ' ' => [0x00; 7],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '\'' => [0x04, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
        '&' => [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
        '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
        _ => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
    }
}

/// Width in pixels of `chars` glyphs at `scale`, without padding.
pub fn text_width(chars: usize, scale: f32) -> f32 {
    if chars == 0 {
        return 0.0;
    }
    (chars as u32 * GLYPH_ADVANCE - 1) as f32 * scale
}

/// The characters of `text` that fit on a canvas `canvas_width` wide,
/// keeping the same margin on the right as the label has on the left.
pub fn fitted_text(text: &str, style: &LabelStyle, canvas_width: u32) -> String {
    let available = canvas_width as f32 - style.x * 2.0 - style.padding * 2.0;
    let chars: Vec<char> = text.trim().chars().collect();
    let mut count = chars.len();
    while count > 0 && text_width(count, style.scale) > available {
        count -= 1;
    }
    chars[..count].iter().collect()
}

fn hex(rgba: Rgba) -> (String, f32) {
    (
        format!("#{:02x}{:02x}{:02x}", rgba.0, rgba.1, rgba.2),
        rgba.3 as f32 / 255.0,
    )
}

/// Build the SVG document for the label, or `None` when nothing would be drawn.
pub fn label_svg(text: &str, style: &LabelStyle, canvas_width: u32, canvas_height: u32) -> Option<String> {
    let shown = fitted_text(text, style, canvas_width);
    if shown.is_empty() || style.scale <= 0.0 {
        return None;
    }

    let box_w = text_width(shown.chars().count(), style.scale) + style.padding * 2.0;
    let box_h = GLYPH_ROWS as f32 * style.scale + style.padding * 2.0;
    let (bg, bg_alpha) = hex(style.background);
    let (fg, fg_alpha) = hex(style.text);

    let mut glyphs = String::new();
    let origin_x = style.x + style.padding;
    let origin_y = style.y + style.padding;
    for (i, ch) in shown.chars().enumerate() {
        let gx = origin_x + (i as u32 * GLYPH_ADVANCE) as f32 * style.scale;
        for (row, bits) in glyph(ch).iter().enumerate() {
            // merge horizontal runs so each row is at most a few rects
            let mut col = 0u32;
            while col < GLYPH_COLUMNS {
                if bits & (0x10 >> col) == 0 {
                    col += 1;
                    continue;
                }
                let start = col;
                while col < GLYPH_COLUMNS && bits & (0x10 >> col) != 0 {
                    col += 1;
                }
                glyphs.push_str(&format!(
                    r##"<rect x="{}" y="{}" width="{}" height="{}"/>"##,
                    gx + start as f32 * style.scale,
                    origin_y + row as f32 * style.scale,
                    (col - start) as f32 * style.scale,
                    style.scale
                ));
            }
        }
    }

    Some(format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
<rect x="{x}" y="{y}" width="{bw}" height="{bh}" rx="{r}" fill="{bg}" fill-opacity="{bga}"/>
<g fill="{fg}" fill-opacity="{fga}" shape-rendering="crispEdges">{glyphs}</g>
</svg>"##,
        w = canvas_width,
        h = canvas_height,
        x = style.x,
        y = style.y,
        bw = box_w,
        bh = box_h,
        r = style.corner_radius.max(0.0).min(box_h / 2.0),
        bg = bg,
        bga = bg_alpha,
        fg = fg,
        fga = fg_alpha,
        glyphs = glyphs
    ))
}

/// Rasterize the label over the current contents of `pixmap`.
pub fn draw_label(pixmap: &mut tiny_skia::Pixmap, text: &str, style: &LabelStyle) -> Result<()> {
    let Some(svg) = label_svg(text, style, pixmap.width(), pixmap.height()) else {
        return Ok(());
    };

    let tree = usvg::Tree::from_data(svg.as_bytes(), &usvg::Options::default())
        .map_err(|e| Error::RenderError(format!("Failed to parse label SVG: {}", e)))?;
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
    Ok(())
}
