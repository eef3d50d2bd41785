//! Debug overlays: detected markers drawn over the source photo.
//!
//! Each marker gets its outline, a symbol at the centroid (circle when world
//! coordinates are known, triangle otherwise) and its id in a small bitmap
//! font. The result is written as PNG next to the other overlays.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgb, RgbImage};

use crate::coords::CoordTable;
use crate::marker::DetectedMarker;

const OUTLINE: Rgb<u8> = Rgb([0, 255, 0]);
const SYMBOL_FILL: Rgb<u8> = Rgb([255, 0, 0]);
const SYMBOL_EDGE: Rgb<u8> = Rgb([255, 255, 0]);
const LABEL: Rgb<u8> = Rgb([255, 255, 0]);
const EDGE_WIDTH: i64 = 2;

/// 3x5 digit glyphs, one row per entry, bit 2 is the leftmost column.
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b001, 0b001, 0b001],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

/// Where and how overlays are drawn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebugOptions {
    pub dir: PathBuf,
    /// Radius of the centroid symbol in pixels.
    pub marker_size: u32,
    /// Pixel size of one font cell.
    pub font_size: u32,
}

impl Default for DebugOptions {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("gcp_debug"),
            marker_size: 10,
            font_size: 6,
        }
    }
}

impl DebugOptions {
    /// Overlay file for `image_name`: `<dir>/<stem>_gcp.png`.
    pub fn overlay_path(&self, image_name: &str) -> PathBuf {
        self.numbered_overlay_path(image_name, 1)
    }

    /// Like [`Self::overlay_path`], with `_<n>` appended for `n > 1`.
    pub fn numbered_overlay_path(&self, image_name: &str, n: usize) -> PathBuf {
        let stem = Path::new(image_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        if n > 1 {
            self.dir.join(format!("{stem}_gcp_{n}.png"))
        } else {
            self.dir.join(format!("{stem}_gcp.png"))
        }
    }
}

/// Draw all `markers` on a copy of `image`.
pub fn render_overlay(
    image: &DynamicImage,
    markers: &[DetectedMarker],
    coords: &CoordTable,
    opts: &DebugOptions,
) -> RgbImage {
    let mut canvas = image.to_rgb8();
    let r = i64::from(opts.marker_size.max(1));
    let scale = i64::from(opts.font_size.max(1));

    for m in markers {
        for k in 0..4 {
            let a = m.corners[k];
            let b = m.corners[(k + 1) % 4];
            draw_line(
                &mut canvas,
                (a.x.round() as i64, a.y.round() as i64),
                (b.x.round() as i64, b.y.round() as i64),
                OUTLINE,
            );
        }

        let (cx, cy) = m.pixel_center();
        if coords.contains(m.id) {
            fill_circle(&mut canvas, cx, cy, r + EDGE_WIDTH, SYMBOL_EDGE);
            fill_circle(&mut canvas, cx, cy, r, SYMBOL_FILL);
        } else {
            fill_triangle(&mut canvas, cx, cy, r + EDGE_WIDTH, SYMBOL_EDGE);
            fill_triangle(&mut canvas, cx, cy, r, SYMBOL_FILL);
        }

        let text_top = cy - (5 * scale) / 2;
        let text_left = cx.saturating_add(r + EDGE_WIDTH);
        draw_number(&mut canvas, text_left, text_top, m.id, scale, LABEL);
    }
    canvas
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x < 0 || y < 0 || x >= i64::from(img.width()) || y >= i64::from(img.height()) {
        return;
    }
    img.put_pixel(x as u32, y as u32, color);
}

fn draw_line(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put(img, x, y, color);
        put(img, x + 1, y, color);
        put(img, x, y + 1, color);
        if x == to.0 && y == to.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Offsets in `lo..=hi` around `center` that land on a canvas axis of `len` pixels.
fn clipped(center: i64, lo: i64, hi: i64, len: u32) -> RangeInclusive<i64> {
    lo.max(-center)..=hi.min(i64::from(len) - 1 - center)
}

fn fill_circle(img: &mut RgbImage, cx: i64, cy: i64, r: i64, color: Rgb<u8>) {
    let r2 = r.saturating_mul(r);
    for dy in clipped(cy, -r, r, img.height()) {
        for dx in clipped(cx, -r, r, img.width()) {
            if dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy)) <= r2 {
                put(img, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Upward-pointing triangle inscribed in the `2r` box around the center.
fn fill_triangle(img: &mut RgbImage, cx: i64, cy: i64, r: i64, color: Rgb<u8>) {
    for dy in clipped(cy, -r, r, img.height()) {
        let half = (dy + r) / 2;
        for dx in clipped(cx, -half, half, img.width()) {
            put(img, cx + dx, cy + dy, color);
        }
    }
}

fn draw_number(img: &mut RgbImage, x0: i64, y0: i64, value: u32, scale: i64, color: Rgb<u8>) {
    let text = value.to_string();
    for (i, ch) in text.bytes().enumerate() {
        let glyph = DIGITS[usize::from(ch - b'0')];
        let gx = x0.saturating_add((i as i64).saturating_mul(4).saturating_mul(scale));
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..3 {
                if bits & (0b100 >> col) == 0 {
                    continue;
                }
                let px = gx.saturating_add(col as i64 * scale);
                let py = y0.saturating_add(row as i64 * scale);
                for oy in clipped(py, 0, scale - 1, img.height()) {
                    for ox in clipped(px, 0, scale - 1, img.width()) {
                        put(img, px + ox, py + oy, color);
                    }
                }
            }
        }
    }
}
