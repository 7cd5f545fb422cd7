/// ASCII painter for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use lite3d_core::{FacePolygon, Frame, Stroke};
use nalgebra::Point2;
use std::io::Write;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Paints a [`Frame`] into a character grid.
///
/// Drawing happens on a virtual surface of `columns × 2·rows` units, since a
/// terminal cell is about twice as tall as it is wide. Later paint wins;
/// the frame already arrives in back-to-front order.
pub struct AsciiRenderer {
    columns: usize,
    rows: usize,
    /// Intensity per virtual pixel, `None` where nothing was painted.
    intensity: Vec<Option<f64>>,
}

impl AsciiRenderer {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            intensity: vec![None; columns * rows * 2],
        }
    }

    /// Size of the virtual drawing surface.
    pub fn surface_size(&self) -> (f64, f64) {
        (self.columns as f64, (self.rows * 2) as f64)
    }

    pub fn resize(&mut self, columns: usize, rows: usize) {
        *self = Self::new(columns, rows);
    }

    pub fn clear(&mut self) {
        self.intensity.fill(None);
    }

    pub fn paint(&mut self, frame: &Frame) {
        for layer in &frame.layers {
            if let Some(face) = &layer.face {
                self.fill_polygon(face);
            }
            for stroke in &layer.strokes {
                match stroke {
                    Stroke::Line { from, to, color } => self.draw_line(from, to, *color),
                    Stroke::Pixels { cells, color } => {
                        for cell in cells {
                            self.fill_cell(cell, frame.pixel_size, *color);
                        }
                    }
                }
            }
        }
    }

    fn height(&self) -> usize {
        self.rows * 2
    }

    fn plot(&mut self, x: i64, y: i64, value: f64) {
        if x < 0 || y < 0 || x >= self.columns as i64 || y >= self.height() as i64 {
            return;
        }
        let idx = y as usize * self.columns + x as usize;
        self.intensity[idx] = Some(value);
    }

    /// Fan-triangulate a convex polygon and fill each triangle.
    fn fill_polygon(&mut self, face: &FacePolygon) {
        let Some((first, rest)) = face.points.split_first() else {
            return;
        };
        for pair in rest.windows(2) {
            self.fill_triangle([*first, pair[0], pair[1]], face.color);
        }
    }

    fn fill_triangle(&mut self, [v0, v1, v2]: [Point2<f64>; 3], value: f64) {
        // Bounding box, clipped to the surface
        let min_x = v0.x.min(v1.x).min(v2.x).floor().max(0.0) as i64;
        let max_x = v0.x.max(v1.x).max(v2.x).ceil().min(self.columns as f64 - 1.0) as i64;
        let min_y = v0.y.min(v1.y).min(v2.y).floor().max(0.0) as i64;
        let max_y = v0.y.max(v1.y).max(v2.y).ceil().min(self.height() as f64 - 1.0) as i64;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = Point2::new(x as f64 + 0.5, y as f64 + 0.5);
                if let Some((w0, w1, w2)) = barycentric(&v0, &v1, &v2, &p) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        self.plot(x, y, value);
                    }
                }
            }
        }
    }

    /// DDA with one sample per virtual pixel.
    fn draw_line(&mut self, from: &Point2<f64>, to: &Point2<f64>, value: f64) {
        let delta = *to - *from;
        let steps = delta.x.abs().max(delta.y.abs()).ceil().max(1.0);
        if !steps.is_finite() {
            return;
        }
        let increment = delta / steps;
        for k in 0..=steps as usize {
            let p = *from + increment * k as f64;
            self.plot(p.x.floor() as i64, p.y.floor() as i64, value);
        }
    }

    fn fill_cell(&mut self, corner: &Point2<f64>, size: f64, value: f64) {
        let x0 = corner.x.floor() as i64;
        let y0 = corner.y.floor() as i64;
        let side = size.ceil().max(1.0) as i64;
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                self.plot(x, y, value);
            }
        }
    }

    /// The character shown for one terminal cell.
    fn glyph(&self, column: usize, row: usize) -> char {
        let top = self.intensity[(row * 2) * self.columns + column];
        let bottom = self.intensity[(row * 2 + 1) * self.columns + column];
        match top.into_iter().chain(bottom).reduce(f64::max) {
            Some(value) => ramp(value),
            None => ' ',
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for row in 0..self.rows {
            for column in 0..self.columns {
                let c = self.glyph(column, row);

                // Color based on character intensity
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            if row + 1 < self.rows {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Map an intensity on the 0..255 scale onto the ramp, skipping the blank.
fn ramp(value: f64) -> char {
    let last = LUMINOSITY_RAMP.len() - 1;
    let index = 1 + ((value / 255.0).clamp(0.0, 1.0) * (last - 1) as f64).round() as usize;
    LUMINOSITY_RAMP[index.min(last)]
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: &Point2<f64>,
    v1: &Point2<f64>,
    v2: &Point2<f64>,
    p: &Point2<f64>,
) -> Option<(f64, f64, f64)> {
    let denom = (v1.y - v2.y) * (v0.x - v2.x) + (v2.x - v1.x) * (v0.y - v2.y);

    if denom.abs() < 1e-9 {
        return None;
    }

    let w0 = ((v1.y - v2.y) * (p.x - v2.x) + (v2.x - v1.x) * (p.y - v2.y)) / denom;
    let w1 = ((v2.y - v0.y) * (p.x - v2.x) + (v0.x - v2.x) * (p.y - v2.y)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
