//! Frame capture type and the preprocessing step that crops the region of interest and
//! converts it to HSV.

use rps_shared::{Hsv, RoiRect};
use std::time::Instant;

use crate::color::PixelFormat;

/// One captured camera frame. Borrowed for a single tick, never retained.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
    pub timestamp: Instant,
}

impl Frame {
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format,
            data,
            timestamp: Instant::now(),
        }
    }

    /// A frame is usable when it has pixels and its buffer covers every one of them.
    pub fn is_well_formed(&self) -> bool {
        let needed = self.width as usize * self.height as usize * self.format.channels();
        needed > 0 && self.data.len() >= needed
    }
}

/// HSV image covering the region of interest.
#[derive(Debug, Clone)]
pub struct HsvImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Hsv>,
}

impl HsvImage {
    pub fn get(&self, x: usize, y: usize) -> &Hsv {
        &self.pixels[y * self.width + x]
    }
}

/// Crops `roi` out of `frame` (optionally mirrored first) and converts it to HSV.
///
/// Returns `None` for empty or truncated frames and for an ROI that misses the frame
/// entirely. ROIs hanging over the frame edge are clipped.
pub fn preprocess(frame: &Frame, roi: &RoiRect, mirror: bool) -> Option<HsvImage> {
    if !frame.is_well_formed() {
        log::warn!(
            "Dropping malformed frame ({}x{}, {} bytes)",
            frame.width,
            frame.height,
            frame.data.len()
        );
        return None;
    }

    let frame_w = frame.width as usize;
    let frame_h = frame.height as usize;
    let x0 = roi.x as usize;
    let y0 = roi.y as usize;
    let x1 = (x0 + roi.width as usize).min(frame_w);
    let y1 = (y0 + roi.height as usize).min(frame_h);
    if x0 >= x1 || y0 >= y1 {
        log::warn!("ROI {:?} lies outside the {}x{} frame", roi, frame_w, frame_h);
        return None;
    }

    let channels = frame.format.channels();
    let width = x1 - x0;
    let height = y1 - y0;
    let mut pixels = Vec::with_capacity(width * height);

    for y in y0..y1 {
        for x in x0..x1 {
            let src_x = if mirror { frame_w - 1 - x } else { x };
            let idx = (y * frame_w + src_x) * channels;
            pixels.push(frame.format.read(&frame.data, idx).to_hsv());
        }
    }

    Some(HsvImage {
        width,
        height,
        pixels,
    })
}
