use crate::r#trait::CoverImageGenerator;
use crate::{Result, SorterError};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

pub const COVER_SIZE: u32 = 640;
const WAVE_COUNT: usize = 7;
const JPEG_QUALITY: u8 = 90;
const BACKGROUND: [f64; 3] = [0.1, 0.1, 0.15];

/// Draws layered sine waves over a dark background.
///
/// Every random choice comes from an RNG seeded with the FNV-1a hash of the
/// seed name, so a playlist keeps the same cover across runs.
#[derive(Debug, Clone)]
pub struct WaveCoverGenerator {
    size: u32,
    quality: u8,
}

impl Default for WaveCoverGenerator {
    fn default() -> Self {
        Self {
            size: COVER_SIZE,
            quality: JPEG_QUALITY,
        }
    }
}

impl WaveCoverGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the cover without encoding it.
    pub fn render(&self, seed_name: &str) -> RgbImage {
        let mut rng = StdRng::seed_from_u64(fnv1a_64(seed_name.as_bytes()));
        let palette = analogous_palette(&mut rng);

        let mut canvas = RgbImage::from_pixel(self.size, self.size, to_pixel(BACKGROUND));
        let size = self.size as f64;

        for _ in 0..WAVE_COUNT {
            let color = to_pixel(palette[rng.gen_range(0..palette.len())]);
            let line_width = 2.0 + rng.gen::<f64>() * 15.0;
            let amplitude = 50.0 + rng.gen::<f64>() * 100.0;
            let frequency = 0.5 + rng.gen::<f64>() * 2.0;
            let y_offset = size / 2.0 + (rng.gen::<f64>() - 0.5) * 300.0;

            let wave_y = |x: f64| y_offset + (x / size * PI * 2.0 * frequency).sin() * amplitude;

            let mut previous = (0.0, wave_y(0.0));
            for step in 1..self.size {
                let current = (step as f64, wave_y(step as f64));
                stroke_segment(&mut canvas, previous, current, line_width / 2.0, color);
                previous = current;
            }
        }

        canvas
    }
}

impl CoverImageGenerator for WaveCoverGenerator {
    fn generate(&self, seed_name: &str) -> Result<Vec<u8>> {
        let canvas = self.render(seed_name);
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.quality)
            .encode_image(&canvas)
            .map_err(|e| SorterError::Image(format!("failed to encode image to jpeg: {e}")))?;
        log::debug!("Generated {} byte cover for '{seed_name}'", jpeg.len());
        Ok(jpeg)
    }
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes.iter().fold(OFFSET_BASIS, |hash, &byte| {
        (hash ^ u64::from(byte)).wrapping_mul(PRIME)
    })
}

/// Three colours 25 degrees apart on the colour wheel.
fn analogous_palette(rng: &mut StdRng) -> [[f64; 3]; 3] {
    let base_hue = rng.gen::<f64>() * 360.0;
    let (saturation, value) = (0.6, 0.9);
    [
        hsv_to_rgb(base_hue, saturation, value),
        hsv_to_rgb((base_hue + 25.0).rem_euclid(360.0), saturation, value),
        hsv_to_rgb((base_hue - 25.0).rem_euclid(360.0), saturation, value),
    ]
}

/// `h` in degrees, `s` and `v` in `[0, 1]`.
fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [f64; 3] {
    if s == 0.0 {
        return [v, v, v];
    }
    let h = h / 60.0;
    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    match (sector as i64).rem_euclid(6) {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

fn to_pixel(rgb: [f64; 3]) -> Rgb<u8> {
    Rgb(rgb.map(|channel| (channel.clamp(0.0, 1.0) * 255.0).round() as u8))
}

/// Stamp round brushes along a segment, one per pixel of its length.
fn stroke_segment(
    canvas: &mut RgbImage,
    from: (f64, f64),
    to: (f64, f64),
    radius: f64,
    color: Rgb<u8>,
) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as u32;
    for i in 0..=steps {
        let t = f64::from(i) / f64::from(steps);
        stamp_disc(canvas, from.0 + dx * t, from.1 + dy * t, radius, color);
    }
}

fn stamp_disc(canvas: &mut RgbImage, cx: f64, cy: f64, radius: f64, color: Rgb<u8>) {
    let (width, height) = (canvas.width() as i64, canvas.height() as i64);
    let min_x = ((cx - radius).floor() as i64).max(0);
    let max_x = ((cx + radius).ceil() as i64).min(width - 1);
    let min_y = ((cy - radius).floor() as i64).max(0);
    let max_y = ((cy + radius).ceil() as i64).min(height - 1);
    let radius_sq = radius * radius;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let (px, py) = (x as f64 + 0.5 - cx, y as f64 + 0.5 - cy);
            if px * px + py * py <= radius_sq {
                canvas.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}
