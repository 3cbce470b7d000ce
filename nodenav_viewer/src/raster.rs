use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use image::{ColorType, ImageEncoder, codecs::png::PngEncoder};

pub type Rgba = [u8; 4];

/// Software RGBA framebuffer, row-major, origin at the top-left.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgba) -> Self {
        let mut canvas = Canvas {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        };
        canvas.clear(background);
        canvas
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn clear(&mut self, color: Rgba) {
        for pixel in self.pixels.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[idx..idx + 4].try_into().ok()
    }

    fn put_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[idx..idx + 4].copy_from_slice(&color);
    }

    /// Draws a one-pixel line between two points in pixel space. Endpoints
    /// may lie far outside the canvas; the segment is clipped first.
    pub fn draw_line(&mut self, from: (f64, f64), to: (f64, f64), color: Rgba) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let max_x = f64::from(self.width - 1);
        let max_y = f64::from(self.height - 1);
        let Some((x0, y0, x1, y1)) = clip_line(from, to, max_x, max_y) else {
            return;
        };

        let (mut x0, mut y0) = (x0.round() as i32, y0.round() as i32);
        let (x1, y1) = (x1.round() as i32, y1.round() as i32);
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.put_pixel(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = err * 2;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Outline of the axis-aligned rectangle spanned by two opposite corners.
    pub fn draw_rect(&mut self, a: (f64, f64), b: (f64, f64), color: Rgba) {
        let corners = [a, (b.0, a.1), b, (a.0, b.1)];
        for i in 0..4 {
            self.draw_line(corners[i], corners[(i + 1) % 4], color);
        }
    }

    pub fn write_png(&self, destination: &Path) -> Result<()> {
        ensure!(
            self.width > 0 && self.height > 0,
            "cannot export an empty {}x{} canvas",
            self.width,
            self.height
        );
        let file = File::create(destination)
            .with_context(|| format!("creating {}", destination.display()))?;
        let encoder = PngEncoder::new(BufWriter::new(file));
        encoder
            .write_image(self.pixels(), self.width, self.height, ColorType::Rgba8.into())
            .with_context(|| format!("encoding PNG {}", destination.display()))?;
        Ok(())
    }
}

/// Liang-Barsky clip of a segment against `[0, max_x] x [0, max_y]`.
fn clip_line(
    from: (f64, f64),
    to: (f64, f64),
    max_x: f64,
    max_y: f64,
) -> Option<(f64, f64, f64, f64)> {
    let (x0, y0) = from;
    let (x1, y1) = to;
    if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
        return None;
    }

    let dx = x1 - x0;
    let dy = y1 - y0;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    for (p, q) in [(-dx, x0), (dx, max_x - x0), (-dy, y0), (dy, max_y - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some((x0 + t0 * dx, y0 + t0 * dy, x0 + t1 * dx, y0 + t1 * dy))
}
