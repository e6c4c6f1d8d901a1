use rps_shared::Hsv;

/// Byte layout of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    /// OpenCV's native channel order
    Bgr,
    Rgba,
}

impl PixelFormat {
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Rgb | PixelFormat::Bgr => 3,
            PixelFormat::Rgba => 4,
        }
    }

    /// Reads the pixel starting at `idx`. The caller guarantees the slice is long enough.
    pub fn read(self, data: &[u8], idx: usize) -> Rgb {
        match self {
            PixelFormat::Rgb | PixelFormat::Rgba => Rgb::new(data[idx], data[idx + 1], data[idx + 2]),
            PixelFormat::Bgr => Rgb::new(data[idx + 2], data[idx + 1], data[idx]),
        }
    }
}

/// RGB color value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert RGB to HSV color space
    pub fn to_hsv(&self) -> Hsv {
        let r = self.r as f32 / 255.0;
        let g = self.g as f32 / 255.0;
        let b = self.b as f32 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        // Calculate hue
        let h = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * (((g - b) / delta) % 6.0)
        } else if max == g {
            60.0 * (((b - r) / delta) + 2.0)
        } else {
            60.0 * (((r - g) / delta) + 4.0)
        };

        let h = if h < 0.0 { h + 360.0 } else { h };

        let s = if max == 0.0 { 0.0 } else { delta / max * 100.0 };
        let v = max * 100.0;

        Hsv { h, s, v }
    }
}
