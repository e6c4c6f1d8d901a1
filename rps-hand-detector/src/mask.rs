use anyhow::Result;
use image::{GrayImage, Luma};

use crate::ops;

const FOREGROUND: u8 = 255;

/// Binary hand mask with the ROI's dimensions. Recomputed every frame.
///
/// Foreground pixels are 255 and background pixels 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandMask {
    image: GrayImage,
}

impl HandMask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            image: GrayImage::new(width as u32, height as u32),
        }
    }

    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let image = GrayImage::from_fn(width as u32, height as u32, |x, y| {
            Luma([if f(x as usize, y as usize) { FOREGROUND } else { 0 }])
        });
        Self { image }
    }

    pub(crate) fn from_image(image: GrayImage) -> Self {
        Self { image }
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    pub fn width(&self) -> usize {
        self.image.width() as usize
    }

    pub fn height(&self) -> usize {
        self.image.height() as usize
    }

    /// Out-of-bounds coordinates read as background.
    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as usize >= self.width() || y as usize >= self.height() {
            return false;
        }
        self.image.get_pixel(x as u32, y as u32)[0] > 0
    }

    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        let level = if value { FOREGROUND } else { 0 };
        self.image.put_pixel(x as u32, y as u32, Luma([level]));
    }

    pub fn foreground_count(&self) -> usize {
        self.image.as_raw().iter().filter(|&&px| px > 0).count()
    }

    /// Foreground fraction in [0, 1]; an empty mask has density 0.
    pub fn density(&self) -> f32 {
        let total = self.image.as_raw().len();
        if total == 0 {
            return 0.0;
        }
        self.foreground_count() as f32 / total as f32
    }

    /// Removes speckle smaller than the square structuring element of `radius`.
    pub fn open(&self, radius: usize) -> Result<HandMask> {
        if radius == 0 || self.image.as_raw().is_empty() {
            return Ok(self.clone());
        }
        Ok(Self::from_image(ops::open(&self.image, radius)?))
    }

    /// Fills holes and cracks smaller than the square structuring element of `radius`.
    pub fn close(&self, radius: usize) -> Result<HandMask> {
        if radius == 0 || self.image.as_raw().is_empty() {
            return Ok(self.clone());
        }
        Ok(Self::from_image(ops::close(&self.image, radius)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(width: usize, height: usize, x0: usize, y0: usize, x1: usize, y1: usize) -> HandMask {
        HandMask::from_fn(width, height, |x, y| x >= x0 && x < x1 && y >= y0 && y < y1)
    }

    #[test]
    fn test_open_removes_speckle() {
        let mut mask = block(40, 40, 10, 10, 30, 30);
        mask.set(2, 2, true);
        mask.set(35, 5, true);

        let opened = mask.open(1).unwrap();
        assert!(!opened.get(2, 2));
        assert!(!opened.get(35, 5));
        assert_eq!(opened.foreground_count(), 400);
    }

    #[test]
    fn test_close_fills_small_hole() {
        let mut mask = block(40, 40, 10, 10, 30, 30);
        mask.set(20, 20, false);

        let closed = mask.close(1).unwrap();
        assert!(closed.get(20, 20));
        assert_eq!(closed, block(40, 40, 10, 10, 30, 30));
    }

    #[test]
    fn test_zero_radius_is_identity() {
        let mut mask = block(20, 20, 5, 5, 15, 15);
        mask.set(0, 0, true);
        assert_eq!(mask.open(0).unwrap(), mask);
        assert_eq!(mask.close(0).unwrap(), mask);
    }

    #[test]
    fn test_density_and_bounds() {
        let mask = block(10, 10, 0, 0, 5, 10);
        assert_eq!(mask.density(), 0.5);
        assert!(!mask.get(-1, 0));
        assert!(!mask.get(0, 10));
        assert_eq!((mask.width(), mask.height()), (10, 10));
        assert_eq!(HandMask::new(0, 0).density(), 0.0);
    }
}
