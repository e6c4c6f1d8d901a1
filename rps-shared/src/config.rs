//! Tunable configuration for the gesture pipeline, the opponent AI and the round flow.
//!
//! Every numeric band and colour range here depends on camera and lighting, so none of
//! them are hard-coded in the pipeline. `GameConfig::validate` rejects settings under which
//! no round could ever be played.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::StrategyKind;

/// HSV colour value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsv {
    pub h: f32, // 0-360
    pub s: f32, // 0-100
    pub v: f32, // 0-100
}

impl Hsv {
    pub fn new(h: f32, s: f32, v: f32) -> Self {
        Self { h, s, v }
    }
}

/// Inclusive HSV box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: Hsv,
    pub upper: Hsv,
}

impl HsvRange {
    pub fn new(lower: Hsv, upper: Hsv) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, hsv: &Hsv) -> bool {
        hsv.h >= self.lower.h
            && hsv.h <= self.upper.h
            && hsv.s >= self.lower.s
            && hsv.s <= self.upper.s
            && hsv.v >= self.lower.v
            && hsv.v <= self.upper.v
    }
}

/// Named set of skin-colour ranges. A pixel is skin if any range contains it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorProfile {
    pub name: String,
    pub ranges: Vec<HsvRange>,
}

impl ColorProfile {
    pub fn new(name: impl Into<String>, ranges: Vec<HsvRange>) -> Self {
        Self {
            name: name.into(),
            ranges,
        }
    }

    pub fn contains(&self, hsv: &Hsv) -> bool {
        self.ranges.iter().any(|range| range.contains(hsv))
    }

    /// Profiles tuned for typical indoor webcams: a standard range (with the red hue
    /// wrap-around), one wider for darker skin tones, one tighter for bright light.
    pub fn defaults() -> Vec<ColorProfile> {
        vec![
            ColorProfile::new(
                "standard",
                vec![
                    HsvRange::new(Hsv::new(0.0, 8.0, 27.0), Hsv::new(60.0, 100.0, 100.0)),
                    HsvRange::new(Hsv::new(340.0, 8.0, 27.0), Hsv::new(360.0, 100.0, 100.0)),
                ],
            ),
            ColorProfile::new(
                "darker-tones",
                vec![HsvRange::new(
                    Hsv::new(0.0, 4.0, 23.0),
                    Hsv::new(70.0, 100.0, 100.0),
                )],
            ),
            ColorProfile::new(
                "bright-light",
                vec![HsvRange::new(
                    Hsv::new(0.0, 12.0, 31.0),
                    Hsv::new(50.0, 100.0, 100.0),
                )],
            ),
        ]
    }
}

/// Region of interest inside the camera frame, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoiRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RoiRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// True if the whole rectangle lies inside a frame of the given size.
    pub fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        self.x as u64 + self.width as u64 <= frame_width as u64
            && self.y as u64 + self.height as u64 <= frame_height as u64
    }
}

/// Inclusive range of convexity-defect counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectBand {
    pub min: usize,
    pub max: usize,
}

impl DefectBand {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, count: usize) -> bool {
        count >= self.min && count <= self.max
    }

    fn overlaps(&self, other: &DefectBand) -> bool {
        self.min <= other.max && other.min <= self.max
    }
}

/// Decision bands mapping contour geometry to a move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationBands {
    pub rock: DefectBand,
    pub scissors: DefectBand,
    pub paper: DefectBand,
    /// Counts outside every band are Rock when the blob is at least this solid...
    pub rock_min_solidity: f32,
    /// ...and at least this circular.
    pub rock_min_circularity: f32,
    /// Counts outside every band are Paper when solidity is below this.
    pub paper_max_solidity: f32,
}

impl Default for ClassificationBands {
    fn default() -> Self {
        Self {
            rock: DefectBand::new(0, 0),
            scissors: DefectBand::new(1, 1),
            paper: DefectBand::new(3, 5),
            rock_min_solidity: 0.8,
            rock_min_circularity: 0.7,
            paper_max_solidity: 0.75,
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub roi: RoiRect,
    /// Flip frames horizontally before cropping so the player sees a mirror image.
    pub mirror_input: bool,
    pub color_profiles: Vec<ColorProfile>,
    pub min_mask_density: f32,
    pub max_mask_density: f32,
    /// Consecutive out-of-band frames before the next colour profile is tried.
    pub profile_switch_frames: u32,
    /// Half-width of the square structuring element used for open/close.
    pub morphology_radius: u32,
    pub min_contour_area: f32,
    /// Contours thinner than this area-to-perimeter ratio are treated as noise.
    pub min_area_perimeter_ratio: f32,
    pub defect_depth_threshold: f32,
    pub max_defect_angle_deg: f32,
    pub classification_bands: ClassificationBands,
    pub stability_frame_count: usize,
    pub countdown_ms: u64,
    pub capture_timeout_ms: u64,
    pub best_of: u32,
    pub ai_strategy: StrategyKind,
    /// Probability of following the selected strategy instead of playing randomly.
    pub ai_difficulty: f64,
    pub history_window_size: usize,
    /// Extra weight per step of recency in the frequency distribution.
    pub recency_ramp: f64,
    /// Extra weight for a move played at least twice in the last three rounds.
    pub counter_trend_boost: f64,
    /// Counter a move the player has avoided for five rounds instead of the heaviest one.
    pub counter_avoid_unused: bool,
    pub pattern_min_repeats: usize,
    pub adaptive_window: usize,
    pub adaptive_win_threshold: f64,
    pub rng_seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            roi: RoiRect::new(200, 200, 400, 300),
            mirror_input: true,
            color_profiles: ColorProfile::defaults(),
            min_mask_density: 0.02,
            max_mask_density: 0.75,
            profile_switch_frames: 30,
            morphology_radius: 2,
            min_contour_area: 3000.0,
            min_area_perimeter_ratio: 10.0,
            defect_depth_threshold: 20.0,
            max_defect_angle_deg: 90.0,
            classification_bands: ClassificationBands::default(),
            stability_frame_count: 3,
            countdown_ms: 3000,
            capture_timeout_ms: 3000,
            best_of: 5,
            ai_strategy: StrategyKind::Adaptive,
            ai_difficulty: 1.0,
            history_window_size: 10,
            recency_ramp: 0.1,
            counter_trend_boost: 2.0,
            counter_avoid_unused: false,
            pattern_min_repeats: 3,
            adaptive_window: 5,
            adaptive_win_threshold: 0.4,
            rng_seed: None,
        }
    }
}

impl GameConfig {
    pub fn countdown(&self) -> Duration {
        Duration::from_millis(self.countdown_ms)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    /// Rejects configurations under which the tick loop cannot do anything useful.
    pub fn validate(&self) -> Result<()> {
        if self.roi.width == 0 || self.roi.height == 0 {
            bail!(
                "ROI must have a non-zero size, got {}x{}",
                self.roi.width,
                self.roi.height
            );
        }

        if self.color_profiles.is_empty() {
            bail!("at least one colour profile is required");
        }
        for profile in &self.color_profiles {
            if profile.ranges.is_empty() {
                bail!("colour profile '{}' has no ranges", profile.name);
            }
            for range in &profile.ranges {
                validate_range(&profile.name, range)?;
            }
        }

        if !(0.0..=1.0).contains(&self.min_mask_density)
            || !(0.0..=1.0).contains(&self.max_mask_density)
            || self.min_mask_density >= self.max_mask_density
        {
            bail!(
                "mask density band [{}, {}] must be increasing and within [0, 1]",
                self.min_mask_density,
                self.max_mask_density
            );
        }
        if self.profile_switch_frames == 0 {
            bail!("profile_switch_frames must be at least 1");
        }
        if self.min_contour_area <= 0.0 {
            bail!("min_contour_area must be positive");
        }
        if self.min_area_perimeter_ratio < 0.0 {
            bail!("min_area_perimeter_ratio must not be negative");
        }
        if self.defect_depth_threshold < 0.0 {
            bail!("defect_depth_threshold must not be negative");
        }
        if !(0.0..=180.0).contains(&self.max_defect_angle_deg) {
            bail!("max_defect_angle_deg must be within [0, 180]");
        }

        let bands = &self.classification_bands;
        for (name, band) in [
            ("rock", bands.rock),
            ("scissors", bands.scissors),
            ("paper", bands.paper),
        ] {
            if band.min > band.max {
                bail!("{} band is inverted: {}..={}", name, band.min, band.max);
            }
        }
        if bands.rock.overlaps(&bands.scissors)
            || bands.rock.overlaps(&bands.paper)
            || bands.scissors.overlaps(&bands.paper)
        {
            bail!("classification bands must not overlap");
        }

        if self.stability_frame_count == 0 {
            bail!("stability_frame_count must be at least 1");
        }
        if self.capture_timeout_ms == 0 {
            bail!("capture_timeout_ms must be positive");
        }
        if self.best_of == 0 {
            bail!("best_of must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.ai_difficulty) {
            bail!("ai_difficulty must be within [0, 1]");
        }
        if self.history_window_size == 0 {
            bail!("history_window_size must be at least 1");
        }
        if self.recency_ramp < 0.0 {
            bail!("recency_ramp must not be negative");
        }
        if self.counter_trend_boost < 0.0 {
            bail!("counter_trend_boost must not be negative");
        }
        if self.pattern_min_repeats == 0 {
            bail!("pattern_min_repeats must be at least 1");
        }
        if self.adaptive_window == 0 {
            bail!("adaptive_window must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.adaptive_win_threshold) {
            bail!("adaptive_win_threshold must be within [0, 1]");
        }

        Ok(())
    }
}

fn validate_range(profile: &str, range: &HsvRange) -> Result<()> {
    let (lo, hi) = (range.lower, range.upper);
    if lo.h > hi.h || lo.s > hi.s || lo.v > hi.v {
        bail!("colour profile '{}' contains an inverted range", profile);
    }
    if lo.h < 0.0 || hi.h > 360.0 || lo.s < 0.0 || hi.s > 100.0 || lo.v < 0.0 || hi.v > 100.0 {
        bail!(
            "colour profile '{}' has a range outside H 0-360, S/V 0-100",
            profile
        );
    }
    Ok(())
}
