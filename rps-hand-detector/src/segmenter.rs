use anyhow::{bail, Result};
use rps_shared::{ColorProfile, GameConfig};

use crate::frame::HsvImage;
use crate::mask::HandMask;

/// Skin segmentation with a self-correcting colour profile cursor.
///
/// The only feedback is mask density: when it stays outside the acceptable band for
/// `switch_after` consecutive frames the next profile is tried, wrapping around.
pub struct SkinSegmenter {
    profiles: Vec<ColorProfile>,
    cursor: usize,
    min_density: f32,
    max_density: f32,
    switch_after: u32,
    out_of_band_frames: u32,
    morphology_radius: usize,
}

impl SkinSegmenter {
    pub fn new(profiles: Vec<ColorProfile>) -> Result<Self> {
        if profiles.is_empty() {
            bail!("skin segmenter needs at least one colour profile");
        }
        let defaults = GameConfig::default();
        Ok(Self {
            profiles,
            cursor: 0,
            min_density: defaults.min_mask_density,
            max_density: defaults.max_mask_density,
            switch_after: defaults.profile_switch_frames,
            out_of_band_frames: 0,
            morphology_radius: defaults.morphology_radius as usize,
        })
    }

    pub fn from_config(config: &GameConfig) -> Result<Self> {
        Ok(Self::new(config.color_profiles.clone())?
            .with_density_band(config.min_mask_density, config.max_mask_density)
            .with_switch_after(config.profile_switch_frames)
            .with_morphology_radius(config.morphology_radius as usize))
    }

    pub fn with_density_band(mut self, min: f32, max: f32) -> Self {
        self.min_density = min;
        self.max_density = max;
        self
    }

    pub fn with_switch_after(mut self, frames: u32) -> Self {
        self.switch_after = frames.max(1);
        self
    }

    pub fn with_morphology_radius(mut self, radius: usize) -> Self {
        self.morphology_radius = radius;
        self
    }

    pub fn active_profile(&self) -> &ColorProfile {
        &self.profiles[self.cursor]
    }

    pub fn profile_index(&self) -> usize {
        self.cursor
    }

    pub fn out_of_band_frames(&self) -> u32 {
        self.out_of_band_frames
    }

    /// Thresholds `hsv` with the active profile, cleans the result with open then close,
    /// and feeds the resulting density into the profile cursor.
    pub fn segment(&mut self, hsv: &HsvImage) -> Result<HandMask> {
        let profile = self.active_profile();
        let raw = HandMask::from_fn(hsv.width, hsv.height, |x, y| profile.contains(hsv.get(x, y)));
        let mask = raw
            .open(self.morphology_radius)?
            .close(self.morphology_radius)?;

        self.observe_density(mask.density());
        Ok(mask)
    }

    /// Updates the consecutive out-of-band counter. Returns true if the profile changed.
    pub fn observe_density(&mut self, density: f32) -> bool {
        if density >= self.min_density && density <= self.max_density {
            self.out_of_band_frames = 0;
            return false;
        }

        self.out_of_band_frames += 1;
        if self.out_of_band_frames < self.switch_after {
            return false;
        }

        let previous = self.cursor;
        self.cursor = (self.cursor + 1) % self.profiles.len();
        self.out_of_band_frames = 0;
        log::info!(
            "Mask density {:.3} out of band for {} frames, switching skin profile '{}' -> '{}'",
            density,
            self.switch_after,
            self.profiles[previous].name,
            self.profiles[self.cursor].name
        );
        true
    }

    /// A committed classification proves the current profile works.
    pub fn notify_classified(&mut self) {
        self.out_of_band_frames = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rps_shared::{Hsv, HsvRange};

    fn two_profiles() -> Vec<ColorProfile> {
        vec![
            ColorProfile::new(
                "a",
                vec![HsvRange::new(Hsv::new(0.0, 10.0, 10.0), Hsv::new(50.0, 100.0, 100.0))],
            ),
            ColorProfile::new(
                "b",
                vec![HsvRange::new(Hsv::new(200.0, 10.0, 10.0), Hsv::new(260.0, 100.0, 100.0))],
            ),
        ]
    }

    fn uniform(hsv: Hsv, width: usize, height: usize) -> HsvImage {
        HsvImage {
            width,
            height,
            pixels: vec![hsv; width * height],
        }
    }

    #[test]
    fn test_empty_profile_list_rejected() {
        assert!(SkinSegmenter::new(Vec::new()).is_err());
    }

    #[test]
    fn test_profile_advances_once_after_k_frames() {
        let mut segmenter = SkinSegmenter::new(two_profiles())
            .unwrap()
            .with_density_band(0.1, 0.9)
            .with_switch_after(4);

        for _ in 0..3 {
            assert!(!segmenter.observe_density(0.0));
        }
        assert_eq!(segmenter.profile_index(), 0);
        assert_eq!(segmenter.out_of_band_frames(), 3);

        assert!(segmenter.observe_density(0.95));
        assert_eq!(segmenter.profile_index(), 1);
        assert_eq!(segmenter.out_of_band_frames(), 0);
    }

    #[test]
    fn test_in_band_frame_resets_counter() {
        let mut segmenter = SkinSegmenter::new(two_profiles())
            .unwrap()
            .with_density_band(0.1, 0.9)
            .with_switch_after(3);

        segmenter.observe_density(0.0);
        segmenter.observe_density(0.0);
        segmenter.observe_density(0.5);
        segmenter.observe_density(0.0);
        segmenter.observe_density(0.0);
        assert_eq!(segmenter.profile_index(), 0);
        assert_eq!(segmenter.out_of_band_frames(), 2);

        segmenter.notify_classified();
        assert_eq!(segmenter.out_of_band_frames(), 0);
    }

    #[test]
    fn test_cursor_wraps() {
        let mut segmenter = SkinSegmenter::new(two_profiles())
            .unwrap()
            .with_switch_after(1);
        segmenter.observe_density(1.0);
        segmenter.observe_density(1.0);
        assert_eq!(segmenter.profile_index(), 0);
    }

    #[test]
    fn test_segment_uses_active_profile() {
        let mut segmenter = SkinSegmenter::new(two_profiles())
            .unwrap()
            .with_density_band(0.1, 0.9)
            .with_switch_after(2)
            .with_morphology_radius(1);

        // Blue scene: profile "a" sees nothing, density 0.
        let blue = uniform(Hsv::new(240.0, 75.0, 78.0), 20, 20);
        assert_eq!(segmenter.segment(&blue).unwrap().foreground_count(), 0);
        assert_eq!(segmenter.segment(&blue).unwrap().foreground_count(), 0);
        assert_eq!(segmenter.active_profile().name, "b");

        // Profile "b" now covers the whole frame, which is too dense but still segmented.
        assert_eq!(segmenter.segment(&blue).unwrap().foreground_count(), 400);
    }
}
