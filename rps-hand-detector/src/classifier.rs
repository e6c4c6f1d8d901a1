use rps_shared::{ClassificationBands, LiveFeedback, Move};

use crate::geometry::ContourFeatures;

/// Maps contour geometry to a move using configurable defect-count bands.
#[derive(Debug, Clone)]
pub struct GestureClassifier {
    bands: ClassificationBands,
}

impl GestureClassifier {
    pub fn new(bands: ClassificationBands) -> Self {
        Self { bands }
    }

    /// Single-frame, provisional classification.
    ///
    /// Band membership decides first (Rock, then Scissors, then Paper). Counts that fall
    /// between bands are settled by shape: a compact, round blob is a fist, a hollow one an
    /// open hand, anything else is not trusted.
    pub fn classify(&self, features: &ContourFeatures) -> Move {
        let bands = &self.bands;
        let count = features.defect_count;

        if bands.rock.contains(count) {
            Move::Rock
        } else if bands.scissors.contains(count) {
            Move::Scissors
        } else if bands.paper.contains(count) {
            Move::Paper
        } else if features.solidity >= bands.rock_min_solidity
            && features.circularity >= bands.rock_min_circularity
        {
            Move::Rock
        } else if features.solidity < bands.paper_max_solidity {
            Move::Paper
        } else {
            Move::None
        }
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(ClassificationBands::default())
    }
}

/// Debounces per-frame classifications: a move commits only after it has been seen on
/// `required` consecutive frames. `None` or a different move restarts the streak.
#[derive(Debug, Clone)]
pub struct StabilityGate {
    required: usize,
    candidate: Move,
    streak: usize,
}

impl StabilityGate {
    pub fn new(required: usize) -> Self {
        Self {
            required: required.max(1),
            candidate: Move::None,
            streak: 0,
        }
    }

    /// Feeds one frame's classification. Returns the committed move once stable.
    pub fn observe(&mut self, mv: Move) -> Option<Move> {
        if !mv.is_playable() {
            self.reset();
            return None;
        }

        if mv == self.candidate {
            self.streak += 1;
        } else {
            self.candidate = mv;
            self.streak = 1;
        }

        (self.streak >= self.required).then_some(mv)
    }

    pub fn reset(&mut self) {
        self.candidate = Move::None;
        self.streak = 0;
    }

    pub fn feedback(&self) -> LiveFeedback {
        LiveFeedback {
            provisional: self.candidate,
            streak: self.streak,
            required: self.required,
        }
    }
}
