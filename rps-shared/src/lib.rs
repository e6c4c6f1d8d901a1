use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod config;

pub use config::{
    ClassificationBands, ColorProfile, DefectBand, GameConfig, Hsv, HsvRange, RoiRect,
};

/// A symbolic hand move. `None` means no stable gesture was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Rock,
    Paper,
    Scissors,
    None,
}

impl Move {
    /// The three moves that can actually be played, in tie-break precedence order.
    pub const PLAYABLE: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    pub fn is_playable(self) -> bool {
        !matches!(self, Move::None)
    }

    /// Position inside `PLAYABLE`, if any.
    pub fn index(self) -> Option<usize> {
        match self {
            Move::Rock => Some(0),
            Move::Paper => Some(1),
            Move::Scissors => Some(2),
            Move::None => None,
        }
    }

    /// Rock beats Scissors, Scissors beats Paper, Paper beats Rock.
    pub fn beats(self, other: Move) -> bool {
        matches!(
            (self, other),
            (Move::Rock, Move::Scissors) | (Move::Scissors, Move::Paper) | (Move::Paper, Move::Rock)
        )
    }

    /// The move that beats this one. `None` has no counter.
    pub fn counter(self) -> Move {
        match self {
            Move::Rock => Move::Paper,
            Move::Paper => Move::Scissors,
            Move::Scissors => Move::Rock,
            Move::None => Move::None,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Rock => "rock",
            Move::Paper => "paper",
            Move::Scissors => "scissors",
            Move::None => "none",
        };
        f.write_str(name)
    }
}

/// Who produced a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Player,
    Ai,
}

/// One entry of the append-only move history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveEvent {
    #[serde(rename = "move")]
    pub mv: Move,
    pub round_index: u32,
    pub source: Source,
}

/// Round outcome from the player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    PlayerWin,
    AiWin,
    Tie,
    Invalid,
}

impl Outcome {
    /// Applies the cyclic beats-relation. A missing move on either side is `Invalid`.
    pub fn resolve(player: Move, ai: Move) -> Outcome {
        if !player.is_playable() || !ai.is_playable() {
            Outcome::Invalid
        } else if player == ai {
            Outcome::Tie
        } else if player.beats(ai) {
            Outcome::PlayerWin
        } else {
            Outcome::AiWin
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Outcome::PlayerWin => "player wins",
            Outcome::AiWin => "computer wins",
            Outcome::Tie => "tie",
            Outcome::Invalid => "invalid round",
        };
        f.write_str(text)
    }
}

/// Opponent strategy selectable by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Random,
    Counter,
    Pattern,
    Adaptive,
}

impl StrategyKind {
    /// Every selectable strategy, in the order the number keys pick them.
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Random,
        StrategyKind::Counter,
        StrategyKind::Pattern,
        StrategyKind::Adaptive,
    ];
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Random => "random",
            StrategyKind::Counter => "counter",
            StrategyKind::Pattern => "pattern",
            StrategyKind::Adaptive => "adaptive",
        };
        f.write_str(name)
    }
}

impl FromStr for StrategyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(StrategyKind::Random),
            "counter" => Ok(StrategyKind::Counter),
            "pattern" => Ok(StrategyKind::Pattern),
            "adaptive" => Ok(StrategyKind::Adaptive),
            other => anyhow::bail!(
                "unknown strategy '{}', expected random, counter, pattern or adaptive",
                other
            ),
        }
    }
}

/// Result of a single round, handed to the scoreboard collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round_index: u32,
    pub player_move: Move,
    pub ai_move: Move,
    pub outcome: Outcome,
    /// Strategy that actually produced `ai_move`.
    pub strategy: StrategyKind,
}

/// Per-tick feedback for live rendering while a gesture is being captured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveFeedback {
    pub provisional: Move,
    pub streak: usize,
    pub required: usize,
}

impl LiveFeedback {
    /// Fraction of the stability requirement reached so far, in [0, 1].
    pub fn confidence(&self) -> f32 {
        if self.required == 0 {
            return 1.0;
        }
        (self.streak as f32 / self.required as f32).min(1.0)
    }
}
