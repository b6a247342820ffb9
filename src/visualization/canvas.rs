//! Minimal raster line chart on top of `image`/`imageproc`

use crate::error::{Result, ValidatorError};
use ab_glyph::{FontRef, PxScale};
use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut, text_size,
};
use imageproc::rect::Rect;
use std::path::Path;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;
const MARGIN_LEFT: u32 = 70;
const MARGIN_RIGHT: u32 = 20;
const MARGIN_TOP: u32 = 40;
const MARGIN_BOTTOM: u32 = 60;
const GRID_DIVISIONS: u32 = 5;

const TITLE_SCALE: f32 = 18.0;
const LABEL_SCALE: f32 = 15.0;
const TICK_SCALE: f32 = 12.0;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);

/// DejaVu Sans, see `assets/LICENSE-DejaVu.txt`
static FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Matplotlib's tab10 cycle
const PALETTE: [Rgb<u8>; 10] = [
    Rgb([31, 119, 180]),
    Rgb([255, 127, 14]),
    Rgb([44, 160, 44]),
    Rgb([214, 39, 40]),
    Rgb([148, 103, 189]),
    Rgb([140, 86, 75]),
    Rgb([227, 119, 194]),
    Rgb([127, 127, 127]),
    Rgb([188, 189, 34]),
    Rgb([23, 190, 207]),
];

/// Color of the `index`-th series
pub fn series_color(index: usize) -> Rgb<u8> {
    PALETTE[index % PALETTE.len()]
}

/// Blend `color` toward white; `amount` 0 keeps it, 1 gives white
pub fn lighten(color: Rgb<u8>, amount: f64) -> Rgb<u8> {
    let amount = amount.clamp(0.0, 1.0);
    let mix = |c: u8| (c as f64 + (255.0 - c as f64) * amount).round() as u8;
    Rgb([mix(color[0]), mix(color[1]), mix(color[2])])
}

/// Round tick spacing (1, 2, 2.5 or 5 times a power of ten) for `span`
fn nice_step(span: f64) -> f64 {
    let raw = span / GRID_DIVISIONS as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude - 1e-9;
    let nice = match fraction {
        f if f <= 1.0 => 1.0,
        f if f <= 2.0 => 2.0,
        f if f <= 2.5 => 2.5,
        f if f <= 5.0 => 5.0,
        _ => 10.0,
    };
    nice * magnitude
}

/// Tick positions inside `[lo, hi]` and the decimals needed to print them
pub fn ticks(lo: f64, hi: f64) -> (Vec<f64>, usize) {
    let step = nice_step(hi - lo);
    let mut decimals = 0;
    while decimals < 4 {
        let scaled = step * 10f64.powi(decimals as i32);
        if (scaled.round() - scaled).abs() < 1e-9 {
            break;
        }
        decimals += 1;
    }

    let mut values = Vec::new();
    let mut k = (lo / step - 1e-9).ceil();
    while k * step <= hi + step * 1e-9 {
        values.push(k * step);
        k += 1.0;
    }
    (values, decimals)
}

/// A fixed-size chart mapping data coordinates into a framed plot area
pub struct Chart {
    image: RgbImage,
    x_range: (f64, f64),
    y_range: (f64, f64),
    font: FontRef<'static>,
}

impl Chart {
    pub fn new(x_range: (f64, f64), y_range: (f64, f64)) -> Result<Self> {
        for (name, (lo, hi)) in [("x_range", x_range), ("y_range", y_range)] {
            if !(lo.is_finite() && hi.is_finite() && hi > lo) {
                return Err(ValidatorError::InvalidParameter {
                    name: name.to_string(),
                    value: format!("({}, {})", lo, hi),
                    reason: "bounds must be finite and increasing".to_string(),
                });
            }
        }
        Ok(Self {
            image: RgbImage::from_pixel(WIDTH, HEIGHT, WHITE),
            x_range,
            y_range,
            font: FontRef::try_from_slice(FONT_DATA)?,
        })
    }

    pub fn width(&self) -> u32 {
        WIDTH
    }

    pub fn height(&self) -> u32 {
        HEIGHT
    }

    fn plot_width(&self) -> f64 {
        (WIDTH - MARGIN_LEFT - MARGIN_RIGHT) as f64
    }

    fn plot_height(&self) -> f64 {
        (HEIGHT - MARGIN_TOP - MARGIN_BOTTOM) as f64
    }

    /// Pixel position of a data point, clamped to the plot area
    pub fn to_pixel(&self, x: f64, y: f64) -> (f32, f32) {
        let (x0, x1) = self.x_range;
        let (y0, y1) = self.y_range;
        let fx = ((x - x0) / (x1 - x0)).clamp(0.0, 1.0);
        let fy = ((y - y0) / (y1 - y0)).clamp(0.0, 1.0);
        let px = MARGIN_LEFT as f64 + fx * self.plot_width();
        let py = MARGIN_TOP as f64 + (1.0 - fy) * self.plot_height();
        (px as f32, py as f32)
    }

    /// Grid lines, labelled ticks and the plot border
    pub fn draw_frame(&mut self) {
        let left = MARGIN_LEFT as f32;
        let right = (WIDTH - MARGIN_RIGHT) as f32;
        let top = MARGIN_TOP as f32;
        let bottom = (HEIGHT - MARGIN_BOTTOM) as f32;

        let (x_ticks, x_decimals) = ticks(self.x_range.0, self.x_range.1);
        for value in x_ticks {
            let (gx, _) = self.to_pixel(value, self.y_range.0);
            draw_line_segment_mut(&mut self.image, (gx, top), (gx, bottom), GRID);
            draw_line_segment_mut(&mut self.image, (gx, bottom), (gx, bottom + 5.0), AXIS);
            let label = format!("{:.*}", x_decimals, value);
            let (w, _) = self.text_size(&label, TICK_SCALE);
            self.text(&label, gx as i32 - w as i32 / 2, bottom as i32 + 8, TICK_SCALE, AXIS);
        }

        let (y_ticks, y_decimals) = ticks(self.y_range.0, self.y_range.1);
        for value in y_ticks {
            let (_, gy) = self.to_pixel(self.x_range.0, value);
            draw_line_segment_mut(&mut self.image, (left, gy), (right, gy), GRID);
            draw_line_segment_mut(&mut self.image, (left - 5.0, gy), (left, gy), AXIS);
            let label = format!("{:.*}", y_decimals, value);
            let (w, h) = self.text_size(&label, TICK_SCALE);
            self.text(&label, left as i32 - 8 - w as i32, gy as i32 - h as i32 / 2, TICK_SCALE, AXIS);
        }

        let frame = Rect::at(MARGIN_LEFT as i32, MARGIN_TOP as i32)
            .of_size(WIDTH - MARGIN_LEFT - MARGIN_RIGHT, HEIGHT - MARGIN_TOP - MARGIN_BOTTOM);
        draw_hollow_rect_mut(&mut self.image, frame, AXIS);
    }

    fn text(&mut self, text: &str, x: i32, y: i32, scale: f32, color: Rgb<u8>) {
        draw_text_mut(&mut self.image, color, x, y, PxScale::from(scale), &self.font, text);
    }

    fn text_size(&self, text: &str, scale: f32) -> (u32, u32) {
        text_size(PxScale::from(scale), &self.font, text)
    }

    /// Centred above the plot area
    pub fn title(&mut self, title: &str) {
        let (w, h) = self.text_size(title, TITLE_SCALE);
        let x = MARGIN_LEFT as i32 + (self.plot_width() as i32 - w as i32) / 2;
        let y = (MARGIN_TOP as i32 - h as i32) / 2;
        self.text(title, x, y, TITLE_SCALE, AXIS);
    }

    /// Horizontal label under the x ticks, vertical label left of the y ticks
    pub fn axis_labels(&mut self, x_label: &str, y_label: &str) {
        let (w, h) = self.text_size(x_label, LABEL_SCALE);
        let x = MARGIN_LEFT as i32 + (self.plot_width() as i32 - w as i32) / 2;
        self.text(x_label, x, (HEIGHT - h - 10) as i32, LABEL_SCALE, AXIS);

        let (w, h) = self.text_size(y_label, LABEL_SCALE);
        if w == 0 || h == 0 {
            return;
        }
        let mut strip = RgbImage::from_pixel(w, h + 2, WHITE);
        draw_text_mut(&mut strip, AXIS, 0, 0, PxScale::from(LABEL_SCALE), &self.font, y_label);
        let rotated = imageops::rotate270(&strip);
        let y = MARGIN_TOP as i64 + (self.plot_height() as i64 - w as i64) / 2;
        imageops::overlay(&mut self.image, &rotated, 8, y);
    }

    /// Polyline through the points; drawn two pixels thick
    pub fn line(&mut self, xs: &[f64], ys: &[f64], color: Rgb<u8>) {
        let points: Vec<(f32, f32)> = xs
            .iter()
            .zip(ys)
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|(&x, &y)| self.to_pixel(x, y))
            .collect();
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            draw_line_segment_mut(&mut self.image, a, b, color);
            draw_line_segment_mut(&mut self.image, (a.0, a.1 + 1.0), (b.0, b.1 + 1.0), color);
        }
    }

    /// Dashed straight segment between two data points
    pub fn dashed_line(&mut self, from: (f64, f64), to: (f64, f64), color: Rgb<u8>) {
        let (ax, ay) = self.to_pixel(from.0, from.1);
        let (bx, by) = self.to_pixel(to.0, to.1);
        let length = ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt();
        if length == 0.0 {
            return;
        }
        let dash = 8.0_f32;
        let mut start = 0.0_f32;
        while start < length {
            let end = (start + dash).min(length);
            let p = |d: f32| (ax + (bx - ax) * d / length, ay + (by - ay) * d / length);
            draw_line_segment_mut(&mut self.image, p(start), p(end), color);
            start += 2.0 * dash;
        }
    }

    /// Shaded area between `lower` and `upper`, filled column by column
    pub fn band(&mut self, xs: &[f64], lower: &[f64], upper: &[f64], color: Rgb<u8>) {
        let n = xs.len().min(lower.len()).min(upper.len());
        for i in 1..n {
            let (x0, lo0) = self.to_pixel(xs[i - 1], lower[i - 1]);
            let (_, hi0) = self.to_pixel(xs[i - 1], upper[i - 1]);
            let (x1, lo1) = self.to_pixel(xs[i], lower[i]);
            let (_, hi1) = self.to_pixel(xs[i], upper[i]);
            if !(x0.is_finite() && x1.is_finite()) || x1 <= x0 {
                continue;
            }
            let mut px = x0.floor();
            while px <= x1 {
                let t = ((px - x0) / (x1 - x0)).clamp(0.0, 1.0);
                let lo = lo0 + (lo1 - lo0) * t;
                let hi = hi0 + (hi1 - hi0) * t;
                draw_line_segment_mut(&mut self.image, (px, hi), (px, lo), color);
                px += 1.0;
            }
        }
    }

    /// Boxed legend in the lower-right corner, one line sample per entry.
    ///
    /// Entries that do not fit inside the plot area are left out.
    pub fn legend(&mut self, entries: &[(Rgb<u8>, &str)]) {
        if entries.is_empty() {
            return;
        }
        let row = 18u32;
        let sample = 22u32;
        let padding = 8u32;

        let plot_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM - 2 * padding;
        let rows = (entries.len() as u32).min(plot_height / row).max(1);
        let text_width = entries[..rows as usize]
            .iter()
            .map(|(_, label)| self.text_size(label, TICK_SCALE).0)
            .max()
            .unwrap_or(0);

        let width = padding * 3 + sample + text_width;
        let height = padding * 2 + rows * row;
        let x = (WIDTH - MARGIN_RIGHT - padding).saturating_sub(width) as i32;
        let y = (HEIGHT - MARGIN_BOTTOM - padding).saturating_sub(height) as i32;

        let frame = Rect::at(x, y).of_size(width, height);
        draw_filled_rect_mut(&mut self.image, frame, WHITE);
        draw_hollow_rect_mut(&mut self.image, frame, GRID);

        for (i, (color, label)) in entries.iter().take(rows as usize).enumerate() {
            let top = y + (padding + i as u32 * row) as i32;
            let mid = top + row as i32 / 2;
            draw_filled_rect_mut(
                &mut self.image,
                Rect::at(x + padding as i32, mid - 1).of_size(sample, 3),
                *color,
            );
            let (_, h) = self.text_size(label, TICK_SCALE);
            let text_x = x + (2 * padding + sample) as i32;
            self.text(label, text_x, mid - h as i32 / 2, TICK_SCALE, AXIS);
        }
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Encode as PNG, creating the parent directory if needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.image.save(path)?;
        Ok(())
    }
}
