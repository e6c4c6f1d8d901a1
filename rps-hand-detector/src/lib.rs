//! Hand gesture detection for webcam Rock-Paper-Scissors.
//!
//! Skin colour segmentation inside a fixed region of interest, contour and convexity
//! defect analysis, and a band-based classifier with a stability gate.
//!
//! Mask morphology and contour geometry run on `imageproc` by default, or on OpenCV with
//! the `opencv-backend` feature.

use anyhow::Result;
use rps_shared::{GameConfig, Move, RoiRect};

pub mod classifier;
pub mod color;
pub mod frame;
pub mod geometry;
pub mod mask;
pub mod segmenter;

#[cfg(not(feature = "opencv-backend"))]
#[path = "ops_imageproc.rs"]
mod ops;
#[cfg(feature = "opencv-backend")]
#[path = "ops_opencv.rs"]
mod ops;

pub use classifier::{GestureClassifier, StabilityGate};
pub use color::{PixelFormat, Rgb};
pub use frame::{preprocess, Frame, HsvImage};
pub use geometry::{ContourFeatures, GeometryAnalyzer, Point};
pub use mask::HandMask;
pub use segmenter::SkinSegmenter;

/// Everything learned from one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameAnalysis {
    /// Provisional, single-frame classification
    pub provisional: Move,
    pub features: Option<ContourFeatures>,
    pub mask_density: f32,
    pub profile_index: usize,
}

/// Runs preprocess → segment → analyze → classify on each frame.
pub struct HandDetector {
    roi: RoiRect,
    mirror: bool,
    segmenter: SkinSegmenter,
    analyzer: GeometryAnalyzer,
    classifier: GestureClassifier,
}

impl HandDetector {
    pub fn new(config: &GameConfig) -> Result<Self> {
        Ok(Self {
            roi: config.roi,
            mirror: config.mirror_input,
            segmenter: SkinSegmenter::from_config(config)?,
            analyzer: GeometryAnalyzer::from_config(config),
            classifier: GestureClassifier::new(config.classification_bands),
        })
    }

    pub fn roi(&self) -> RoiRect {
        self.roi
    }

    pub fn segmenter(&self) -> &SkinSegmenter {
        &self.segmenter
    }

    /// Returns `None` only when the frame itself is unusable or the mask backend fails.
    pub fn analyze(&mut self, frame: &Frame) -> Option<FrameAnalysis> {
        let hsv = preprocess(frame, &self.roi, self.mirror)?;
        match self.measure(&hsv) {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                log::warn!("Frame analysis failed: {:#}", e);
                None
            }
        }
    }

    fn measure(&mut self, hsv: &HsvImage) -> Result<FrameAnalysis> {
        let mask = self.segmenter.segment(hsv)?;
        let features = self.analyzer.analyze(&mask)?;
        let provisional = features
            .as_ref()
            .map_or(Move::None, |f| self.classifier.classify(f));

        if provisional.is_playable() {
            self.segmenter.notify_classified();
        }

        if let Some(f) = &features {
            log::debug!(
                "defects: {}, solidity: {:.2}, circularity: {:.2}, area: {:.0} -> {}",
                f.defect_count,
                f.solidity,
                f.circularity,
                f.area,
                provisional
            );
        }

        Ok(FrameAnalysis {
            provisional,
            features,
            mask_density: mask.density(),
            profile_index: self.segmenter.profile_index(),
        })
    }

    /// Provisional move for a frame; unusable frames count as no gesture.
    pub fn detect(&mut self, frame: &Frame) -> Move {
        self.analyze(frame).map_or(Move::None, |a| a.provisional)
    }
}
