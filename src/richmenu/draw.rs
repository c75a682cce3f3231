//! Just enough raster drawing for the rich menu picture: flat fills with
//! alpha, a few primitive shapes, and a 7x7 bitmap font for the labels.

pub type Rgb = [u8; 3];

/// Bit 6 is the leftmost column.
type Glyph = [u8; 7];

const GLYPH_SCALE: f64 = 5.0;
const GLYPH_ADVANCE: f64 = 7.0 * GLYPH_SCALE + 2.0 * GLYPH_SCALE;

/// Only the letters the menu labels use. Combining marks take a cell of
/// their own.
const GLYPHS: &[(char, Glyph)] = &[
    ('ช', [0b0011100, 0b0100010, 0b0100010, 0b0011100, 0b0010000, 0b0010010, 0b0001100]),
    ('\u{0E48}', [0b0010000, 0b0100000, 0, 0, 0, 0, 0]),
    ('ว', [0b0011100, 0b0100010, 0b0000010, 0b0001100, 0b0010000, 0b0010000, 0b0001100]),
    ('ย', [0b0100010, 0b0100010, 0b0010100, 0b0001000, 0b0010000, 0b0010000, 0b0011110]),
    ('เ', [0b0011000, 0b0100100, 0b0100000, 0b0111100, 0b0100100, 0b0100100, 0b0001100]),
    ('ห', [0b0100010, 0b0100010, 0b0110110, 0b0101010, 0b0100010, 0b0100010, 0b0100010]),
    ('ล', [0b0001110, 0b0010001, 0b0010000, 0b0011100, 0b0100010, 0b0100010, 0b0100010]),
    ('\u{0E37}', [0b0010100, 0b0101000, 0, 0, 0, 0, 0]),
    ('อ', [0b0011100, 0b0100010, 0b0000110, 0b0001000, 0b0001000, 0b0010000, 0b0011110]),
    ('ส', [0b0001100, 0b0010010, 0b0011100, 0b0100010, 0b0100110, 0b0100000, 0b0100000]),
    ('ร', [0b0011100, 0b0100010, 0b0000010, 0b0000100, 0b0001000, 0b0010000, 0b0010000]),
    ('ป', [0b0100010, 0b0100010, 0b0100010, 0b0100010, 0b0100010, 0b0100010, 0b0111110]),
    ('\u{0E38}', [0, 0, 0, 0, 0, 0b0001000, 0b0010000]),
    ('ท', [0b0011100, 0b0100010, 0b0000100, 0b0000100, 0b0000100, 0b0000100, 0b0000100]),
    ('\u{0E31}', [0b0011000, 0b0100100, 0, 0, 0, 0, 0]),
    ('พ', [0b0100010, 0b0100010, 0b0101010, 0b0101010, 0b0110110, 0b0100010, 0b0100010]),
    ('\u{0E4C}', [0b0000110, 0b0001001, 0, 0, 0, 0, 0]),
    ('ซ', [0b0001010, 0b0010101, 0b0000100, 0b0001000, 0b0010000, 0b0010000, 0b0111110]),
    ('น', [0b0010010, 0b0010010, 0b0010010, 0b0010010, 0b0010010, 0b0010010, 0b0001100]),
    ('า', [0b0011100, 0b0000010, 0b0000010, 0b0000010, 0b0000010, 0b0000010, 0b0001110]),
    ('จ', [0b0011100, 0b0100010, 0b0000010, 0b0001100, 0b0010000, 0b0100000, 0b0100000]),
    ('บ', [0b0100010, 0b0100010, 0b0100010, 0b0100010, 0b0100010, 0b0100010, 0b0011100]),
    ('\u{0E47}', [0b0010000, 0b0100000, 0b0100000, 0, 0, 0, 0]),
    ('ไ', [0b0001000, 0b0010100, 0b0010000, 0b0010000, 0b0010000, 0b0010000, 0b0010000]),
    ('ต', [0b0011110, 0b0100101, 0b0000101, 0b0000100, 0b0010000, 0b0010000, 0b0010000]),
];

/// Drawn for anything missing from [GLYPHS]
const MISSING_GLYPH: Glyph = [
    0b1111111, 0b1000001, 0b1000001, 0b1000001, 0b1000001, 0b1000001, 0b1111111,
];

fn glyph(c: char) -> &'static Glyph {
    GLYPHS
        .iter()
        .find(|(g, _)| *g == c)
        .map(|(_, bits)| bits)
        .unwrap_or(&MISSING_GLYPH)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Icon {
    Question,
    Bars,
    Home,
    Minus,
    Plus,
    Globe,
}

/// RGBA, row-major, always fully opaque
pub struct Canvas {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        let mut pixels = vec![0; width * height * 4];
        for px in pixels.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Canvas {
            width,
            height,
            pixels,
        }
    }

    #[cfg(test)]
    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        let i = (y * self.width + x) * 4;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]]
    }

    /// Top-left `from` to bottom-right `to`
    pub fn diagonal_gradient(&mut self, from: Rgb, to: Rgb) {
        let (w, h) = (self.width as f64, self.height as f64);
        for y in 0..self.height {
            for x in 0..self.width {
                let t = (x as f64 / w + y as f64 / h) / 2.0;
                let i = (y * self.width + x) * 4;
                for c in 0..3 {
                    self.pixels[i + c] =
                        (from[c] as f64 * (1.0 - t) + to[c] as f64 * t) as u8;
                }
            }
        }
    }

    /// Alpha-blend one pixel; anything off the canvas is dropped.
    fn blend(&mut self, x: i64, y: i64, color: Rgb, alpha: f64) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let i = (y as usize * self.width + x as usize) * 4;
        for c in 0..3 {
            let under = self.pixels[i + c] as f64;
            self.pixels[i + c] =
                (under * (1.0 - alpha) + color[c] as f64 * alpha).round() as u8;
        }
    }

    /// Visit every whole pixel inside the box whose center passes `inside`.
    fn fill_where<F>(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb, alpha: f64, inside: F)
    where
        F: Fn(f64, f64) -> bool,
    {
        let (x0, y0) = (x.floor() as i64, y.floor() as i64);
        let (x1, y1) = ((x + w).ceil() as i64, (y + h).ceil() as i64);
        for py in y0..y1 {
            for px in x0..x1 {
                let (cx, cy) = (px as f64 + 0.5, py as f64 + 0.5);
                if cx >= x && cx < x + w && cy >= y && cy < y + h && inside(cx, cy) {
                    self.blend(px, py, color, alpha);
                }
            }
        }
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb, alpha: f64) {
        self.fill_where(x, y, w, h, color, alpha, |_, _| true);
    }

    pub fn fill_rounded_rect(
        &mut self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        radius: f64,
        color: Rgb,
        alpha: f64,
    ) {
        let r = radius.min(w / 2.0).min(h / 2.0);
        self.fill_where(x, y, w, h, color, alpha, |px, py| {
            // distance from the nearest corner circle center
            let dx = (x + r - px).max(px - (x + w - r)).max(0.0);
            let dy = (y + r - py).max(py - (y + h - r)).max(0.0);
            dx * dx + dy * dy <= r * r
        });
    }

    pub fn fill_circle(&mut self, cx: f64, cy: f64, r: f64, color: Rgb, alpha: f64) {
        self.fill_where(cx - r, cy - r, 2.0 * r, 2.0 * r, color, alpha, |px, py| {
            (px - cx).powi(2) + (py - cy).powi(2) <= r * r
        });
    }

    /// Elliptical outline `thickness` pixels wide, centered on the ellipse
    pub fn ellipse_ring(
        &mut self,
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        thickness: f64,
        color: Rgb,
    ) {
        let half = thickness / 2.0;
        let (ox, oy) = (rx + half, ry + half);
        let (ix, iy) = ((rx - half).max(0.0), (ry - half).max(0.0));
        self.fill_where(cx - ox, cy - oy, 2.0 * ox, 2.0 * oy, color, 1.0, |px, py| {
            let (dx, dy) = (px - cx, py - cy);
            let outside_inner =
                ix == 0.0 || iy == 0.0 || (dx / ix).powi(2) + (dy / iy).powi(2) > 1.0;
            (dx / ox).powi(2) + (dy / oy).powi(2) <= 1.0 && outside_inner
        });
    }

    /// Isosceles triangle pointing up, apex at (`cx`, `top`)
    pub fn fill_triangle(&mut self, cx: f64, top: f64, base: f64, height: f64, color: Rgb) {
        self.fill_where(cx - base / 2.0, top, base, height, color, 1.0, |px, py| {
            let half_width = (py - top) / height * base / 2.0;
            (px - cx).abs() <= half_width
        });
    }

    pub fn draw_icon(&mut self, icon: Icon, cx: f64, cy: f64, color: Rgb) {
        self.fill_circle(cx, cy, 120.0, color, 0.15);
        match icon {
            Icon::Question => {
                let scale = 16.0;
                self.draw_glyph(&QUESTION_MARK, cx - 3.5 * scale, cy - 3.5 * scale, scale, color);
            }
            Icon::Bars => {
                for (i, h) in [60.0, 110.0, 160.0].into_iter().enumerate() {
                    let x = cx - 75.0 + i as f64 * 55.0;
                    self.fill_rect(x, cy + 80.0 - h, 40.0, h, color, 1.0);
                }
            }
            Icon::Home => {
                self.fill_triangle(cx, cy - 90.0, 200.0, 80.0, color);
                self.fill_rect(cx - 70.0, cy - 10.0, 140.0, 100.0, color, 1.0);
                self.fill_rect(cx - 20.0, cy + 30.0, 40.0, 60.0, [30, 41, 59], 1.0);
            }
            Icon::Minus => {
                self.fill_rect(cx - 80.0, cy - 15.0, 160.0, 30.0, color, 1.0);
            }
            Icon::Plus => {
                self.fill_rect(cx - 80.0, cy - 15.0, 160.0, 30.0, color, 1.0);
                self.fill_rect(cx - 15.0, cy - 80.0, 30.0, 160.0, color, 1.0);
            }
            Icon::Globe => {
                self.ellipse_ring(cx, cy, 85.0, 85.0, 14.0, color);
                self.ellipse_ring(cx, cy, 35.0, 85.0, 12.0, color);
                self.fill_rect(cx - 85.0, cy - 6.0, 170.0, 12.0, color, 1.0);
            }
        }
    }

    fn draw_glyph(&mut self, glyph: &Glyph, left: f64, top: f64, scale: f64, color: Rgb) {
        for (r, bits) in glyph.iter().enumerate() {
            for c in 0..7 {
                if bits & (1 << (6 - c)) != 0 {
                    self.fill_rect(
                        left + c as f64 * scale,
                        top + r as f64 * scale,
                        scale,
                        scale,
                        color,
                        1.0,
                    );
                }
            }
        }
    }

    /// Centered horizontally on `cx`, one cell per `char`
    pub fn draw_text(&mut self, cx: f64, cy: f64, text: &str, color: Rgb) {
        let count = text.chars().count() as f64;
        let start_x = cx - count * GLYPH_ADVANCE / 2.0;
        for (i, c) in text.chars().enumerate() {
            self.draw_glyph(
                glyph(c),
                start_x + i as f64 * GLYPH_ADVANCE + GLYPH_SCALE / 2.0,
                cy - 20.0,
                GLYPH_SCALE,
                color,
            );
        }
    }
}

const QUESTION_MARK: Glyph = [
    0b0011100, 0b0100010, 0b0000010, 0b0000100, 0b0001000, 0b0000000, 0b0001000,
];
