//! Frame sources: a live camera (behind the `opencv-backend` feature) and a directory replay.

use anyhow::{bail, Context, Result};
use rps_hand_detector::{Frame, PixelFormat};
use std::path::{Path, PathBuf};

/// Pull-based source of camera frames, one per tick.
pub trait FrameSource {
    /// `Ok(None)` means the source is exhausted. Empty or broken frames are still returned
    /// and rejected downstream.
    fn grab(&mut self) -> Result<Option<Frame>>;

    /// Native frame size, if known up front.
    fn resolution(&self) -> Option<(u32, u32)> {
        None
    }
}

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "ppm"];

/// Replays the images of a directory in file-name order. Each image is served for
/// `repeat` consecutive ticks so the stability gate can settle on it.
pub struct ImageDirSource {
    paths: Vec<PathBuf>,
    cursor: usize,
    repeat: usize,
    served: usize,
    current: Option<Frame>,
}

impl ImageDirSource {
    pub fn open(dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read replay directory {}", dir.display()))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_image {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            bail!("No images found in replay directory {}", dir.display());
        }
        log::info!("Replaying {} images from {}", paths.len(), dir.display());

        Ok(Self {
            paths,
            cursor: 0,
            repeat: 1,
            served: 0,
            current: None,
        })
    }

    pub fn with_repeat(mut self, repeat: usize) -> Self {
        self.repeat = repeat.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn load(path: &Path) -> Result<Frame> {
        let rgb = image::open(path)
            .with_context(|| format!("Failed to decode {}", path.display()))?
            .to_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(Frame::new(width, height, PixelFormat::Rgb, rgb.into_raw()))
    }
}

impl FrameSource for ImageDirSource {
    fn grab(&mut self) -> Result<Option<Frame>> {
        if self.served == self.repeat {
            self.cursor += 1;
            self.served = 0;
            self.current = None;
        }
        let Some(path) = self.paths.get(self.cursor) else {
            return Ok(None);
        };

        if self.current.is_none() {
            self.current = Some(Self::load(path)?);
        }
        self.served += 1;
        Ok(self.current.clone())
    }
}

#[cfg(feature = "opencv-backend")]
pub use self::opencv_camera::OpenCvCamera;

#[cfg(feature = "opencv-backend")]
mod opencv_camera {
    use super::FrameSource;
    use anyhow::{bail, Context, Result};
    use opencv::{
        core::{Mat, Point, Rect, Scalar},
        highgui, imgproc,
        prelude::*,
        videoio::{self, VideoCapture, VideoCaptureAPIs},
    };
    use rps_hand_detector::{Frame, PixelFormat};
    use rps_shared::RoiRect;

    const WINDOW: &str = "Rock Paper Scissors";

    /// Local webcam. The device is released when the camera is dropped.
    pub struct OpenCvCamera {
        capture: VideoCapture,
        last: Mat,
        show_window: bool,
    }

    impl OpenCvCamera {
        pub fn open(device: i32, show_window: bool) -> Result<Self> {
            log::info!("Opening local camera device {}...", device);
            let mut capture = VideoCapture::new(device, VideoCaptureAPIs::CAP_ANY as i32)
                .with_context(|| format!("Failed to open camera device {}", device))?;
            if !capture.is_opened()? {
                bail!("Failed to open camera device {}", device);
            }

            capture.set(videoio::CAP_PROP_FRAME_WIDTH, 800.0)?;
            capture.set(videoio::CAP_PROP_FRAME_HEIGHT, 600.0)?;

            if show_window {
                highgui::named_window(WINDOW, highgui::WINDOW_AUTOSIZE)?;
            }

            log::info!("Successfully opened local camera");
            Ok(Self {
                capture,
                last: Mat::default(),
                show_window,
            })
        }

        /// Draws the ROI and status lines over the last frame and polls the keyboard.
        pub fn show(&mut self, roi: &RoiRect, lines: &[String]) -> Result<Option<char>> {
            if !self.show_window {
                return Ok(None);
            }

            if !self.last.empty() {
                let mut display = self.last.clone();
                imgproc::rectangle(
                    &mut display,
                    Rect::new(roi.x as i32, roi.y as i32, roi.width as i32, roi.height as i32),
                    Scalar::new(0.0, 255.0, 0.0, 0.0),
                    2,
                    imgproc::LINE_8,
                    0,
                )?;
                for (i, line) in lines.iter().enumerate() {
                    imgproc::put_text(
                        &mut display,
                        line,
                        Point::new(10, 30 + 30 * i as i32),
                        imgproc::FONT_HERSHEY_SIMPLEX,
                        0.8,
                        Scalar::new(255.0, 255.0, 255.0, 0.0),
                        2,
                        imgproc::LINE_8,
                        false,
                    )?;
                }
                highgui::imshow(WINDOW, &display)?;
            }

            let key = highgui::wait_key(1)?;
            Ok(u8::try_from(key).ok().map(char::from))
        }
    }

    impl FrameSource for OpenCvCamera {
        fn grab(&mut self) -> Result<Option<Frame>> {
            self.capture.read(&mut self.last)?;
            if self.last.empty() {
                log::warn!("Empty frame received");
                return Ok(Some(Frame::new(0, 0, PixelFormat::Bgr, Vec::new())));
            }

            let width = self.last.cols() as u32;
            let height = self.last.rows() as u32;
            let data = self.last.data_bytes()?.to_vec();
            Ok(Some(Frame::new(width, height, PixelFormat::Bgr, data)))
        }

        fn resolution(&self) -> Option<(u32, u32)> {
            let width = self.capture.get(videoio::CAP_PROP_FRAME_WIDTH).ok()?;
            let height = self.capture.get(videoio::CAP_PROP_FRAME_HEIGHT).ok()?;
            (width > 0.0 && height > 0.0).then(|| (width as u32, height as u32))
        }
    }

    impl Drop for OpenCvCamera {
        fn drop(&mut self) {
            if let Err(e) = self.capture.release() {
                log::warn!("Failed to release camera: {}", e);
            }
            if self.show_window {
                let _ = highgui::destroy_all_windows();
            }
            log::info!("Camera released");
        }
    }
}
