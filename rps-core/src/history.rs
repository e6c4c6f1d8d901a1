//! Append-only move log and the statistics the opponent reads from it.

use rps_shared::{GameConfig, Move, MoveEvent, Outcome, Source};

/// Kind of regularity found in the player's recent moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Same move several times in a row
    Repeat,
    /// ABAB...
    Alternating,
    /// ABCABC...
    Cycle,
    /// What followed earlier occurrences of the current suffix
    Sequence,
    /// All three moves seen lately; the one missing from the last two comes next
    Rotation,
    /// After losing, the player switches to the move that beats the AI's last move
    LoseShift,
}

/// Prediction of the player's next move derived from a pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternSignal {
    pub predicted: Move,
    pub kind: PatternKind,
    /// Number of observations backing the prediction.
    pub support: usize,
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub struct MoveHistory {
    events: Vec<MoveEvent>,
    window: usize,
    recency_ramp: f64,
    trend_boost: f64,
}

impl MoveHistory {
    pub fn new(window: usize, recency_ramp: f64) -> Self {
        Self {
            events: Vec::new(),
            window: window.max(1),
            recency_ramp,
            trend_boost: GameConfig::default().counter_trend_boost,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.history_window_size, config.recency_ramp)
            .with_trend_boost(config.counter_trend_boost)
    }

    pub fn with_trend_boost(mut self, boost: f64) -> Self {
        self.trend_boost = boost;
        self
    }

    pub fn events(&self) -> &[MoveEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Logs both sides of a resolved round. A missing player move is not an event.
    pub fn record_round(&mut self, round_index: u32, player: Move, ai: Move) {
        if player.is_playable() {
            self.events.push(MoveEvent {
                mv: player,
                round_index,
                source: Source::Player,
            });
        }
        self.events.push(MoveEvent {
            mv: ai,
            round_index,
            source: Source::Ai,
        });
    }

    /// All player moves, oldest first.
    pub fn player_moves(&self) -> impl Iterator<Item = Move> + '_ {
        self.events
            .iter()
            .filter(|e| e.source == Source::Player)
            .map(|e| e.mv)
    }

    /// The analysis window: at most `window` most recent player moves, oldest first.
    pub fn recent_player_moves(&self) -> Vec<Move> {
        let moves: Vec<Move> = self.player_moves().collect();
        let skip = moves.len().saturating_sub(self.window);
        moves[skip..].to_vec()
    }

    /// Both sides of the rounds in the analysis window, oldest first. Invalid rounds carry
    /// `Move::None` for the player.
    pub fn recent_rounds(&self) -> Vec<(Move, Move)> {
        let mut rounds = Vec::new();
        let mut player = Move::None;
        for event in &self.events {
            match event.source {
                Source::Player => player = event.mv,
                Source::Ai => {
                    rounds.push((player, event.mv));
                    player = Move::None;
                }
            }
        }
        let skip = rounds.len().saturating_sub(self.window);
        rounds.split_off(skip)
    }

    /// Recency-weighted counts of Rock, Paper and Scissors over the window, indexed by
    /// `Move::index`. The i-th oldest move weighs `1 + recency_ramp * i`, and a move played
    /// at least twice in the last three rounds gains `trend_boost` on top.
    pub fn weighted_frequencies(&self) -> [f64; 3] {
        let moves = self.recent_player_moves();
        let mut weights = [0.0; 3];
        for (i, mv) in moves.iter().enumerate() {
            if let Some(slot) = mv.index() {
                weights[slot] += 1.0 + self.recency_ramp * i as f64;
            }
        }

        if moves.len() >= 3 {
            let tail = &moves[moves.len() - 3..];
            for mv in Move::PLAYABLE {
                let Some(slot) = mv.index() else { continue };
                if tail.iter().filter(|&&m| m == mv).count() >= 2 {
                    weights[slot] += self.trend_boost;
                }
            }
        }
        weights
    }

    /// First of Rock, Paper, Scissors absent from the last five player moves. Needs five.
    pub fn unused_recent_move(&self) -> Option<Move> {
        let moves = self.recent_player_moves();
        if moves.len() < 5 {
            return None;
        }
        let tail = &moves[moves.len() - 5..];
        Move::PLAYABLE.into_iter().find(|mv| !tail.contains(mv))
    }

    /// Heaviest move in the window. Equal weights resolve Rock, then Paper, then Scissors.
    pub fn most_frequent(&self) -> Option<Move> {
        let weights = self.weighted_frequencies();
        let mut best: Option<(Move, f64)> = None;
        for mv in Move::PLAYABLE {
            let Some(slot) = mv.index() else { continue };
            let weight = weights[slot];
            if weight <= 0.0 {
                continue;
            }
            if best.map_or(true, |(_, w)| weight > w) {
                best = Some((mv, weight));
            }
        }
        best.map(|(mv, _)| mv)
    }

    /// Strongest pattern in the window backed by at least `min_support` observations.
    /// Equal confidences keep the first of repeat, alternating, cycle, sequence, rotation,
    /// lose-shift.
    pub fn pattern_signal(&self, min_support: usize) -> Option<PatternSignal> {
        let moves = self.recent_player_moves();
        let candidates = [
            repeat_signal(&moves),
            alternating_signal(&moves),
            cycle_signal(&moves),
            sequence_signal(&moves),
            rotation_signal(&moves),
            lose_shift_signal(&self.recent_rounds()),
        ];

        let mut best: Option<PatternSignal> = None;
        for signal in candidates.into_iter().flatten() {
            if signal.support < min_support {
                continue;
            }
            if best.map_or(true, |b| signal.confidence > b.confidence) {
                best = Some(signal);
            }
        }
        best
    }
}

/// Lengths of the maximal runs of equal moves, oldest first.
fn run_lengths(moves: &[Move]) -> Vec<usize> {
    let mut runs: Vec<usize> = Vec::new();
    for (i, mv) in moves.iter().enumerate() {
        if i > 0 && moves[i - 1] == *mv {
            if let Some(len) = runs.last_mut() {
                *len += 1;
            }
        } else {
            runs.push(1);
        }
    }
    runs
}

fn repeat_signal(moves: &[Move]) -> Option<PatternSignal> {
    let runs = run_lengths(moves);
    let (&trailing, earlier) = runs.split_last()?;
    if trailing < 3 {
        return None;
    }
    let prior = earlier.iter().filter(|&&len| len >= 3).count().min(3);
    Some(PatternSignal {
        predicted: *moves.last()?,
        kind: PatternKind::Repeat,
        support: trailing,
        confidence: 0.7 + 0.1 * prior as f64,
    })
}

fn alternating_signal(moves: &[Move]) -> Option<PatternSignal> {
    let n = moves.len();
    if n < 4 {
        return None;
    }
    let mut len = 2;
    while len < n {
        let i = n - len - 1;
        if moves[i] == moves[i + 2] && moves[i] != moves[i + 1] {
            len += 1;
        } else {
            break;
        }
    }
    if moves[n - 1] == moves[n - 2] || len < 4 {
        return None;
    }
    Some(PatternSignal {
        predicted: moves[n - 2],
        kind: PatternKind::Alternating,
        support: len,
        confidence: 0.8,
    })
}

fn cycle_signal(moves: &[Move]) -> Option<PatternSignal> {
    let n = moves.len();
    if n < 6 {
        return None;
    }
    let period = &moves[n - 3..];
    if period[0] == period[1] && period[1] == period[2] {
        return None;
    }
    let mut len = 3;
    while len < n && moves[n - len - 1] == moves[n - len + 2] {
        len += 1;
    }
    if len < 6 {
        return None;
    }
    Some(PatternSignal {
        predicted: moves[n - 3],
        kind: PatternKind::Cycle,
        support: len,
        confidence: 0.85,
    })
}

fn sequence_signal(moves: &[Move]) -> Option<PatternSignal> {
    let n = moves.len();
    let mut best: Option<PatternSignal> = None;

    for len in 2..5usize.min(n.saturating_sub(1)) {
        let suffix = &moves[n - len..];
        let mut followers = [0usize; 3];
        for start in 0..n - len {
            if &moves[start..start + len] == suffix {
                if let Some(slot) = moves[start + len].index() {
                    followers[slot] += 1;
                }
            }
        }

        let total: usize = followers.iter().sum();
        if total == 0 {
            continue;
        }
        let mut pick = Move::Rock;
        let mut count = 0;
        for mv in Move::PLAYABLE {
            let Some(slot) = mv.index() else { continue };
            if followers[slot] > count {
                pick = mv;
                count = followers[slot];
            }
        }

        let confidence =
            (0.6 + (count as f64 / total as f64) * (len as f64 / 4.0)).min(0.9);
        if best.map_or(true, |b| confidence > b.confidence) {
            best = Some(PatternSignal {
                predicted: pick,
                kind: PatternKind::Sequence,
                support: count,
                confidence,
            });
        }
    }
    best
}

fn rotation_signal(moves: &[Move]) -> Option<PatternSignal> {
    let n = moves.len();
    if n < 5 {
        return None;
    }
    let recent = &moves[n - 5..];
    if !Move::PLAYABLE.iter().all(|mv| recent.contains(mv)) {
        return None;
    }
    let predicted = Move::PLAYABLE
        .into_iter()
        .find(|&mv| mv != moves[n - 1] && mv != moves[n - 2])?;
    Some(PatternSignal {
        predicted,
        kind: PatternKind::Rotation,
        support: recent.len(),
        confidence: 0.6,
    })
}

/// Fires after an AI win. Support counts the last loss plus every earlier loss the player
/// answered with the move that beats the AI's winning move.
fn lose_shift_signal(rounds: &[(Move, Move)]) -> Option<PatternSignal> {
    if rounds.len() < 2 {
        return None;
    }
    let &(player, ai) = rounds.last()?;
    if Outcome::resolve(player, ai) != Outcome::AiWin {
        return None;
    }
    let shifts = rounds
        .windows(2)
        .filter(|pair| {
            let (lost_with, beaten_by) = pair[0];
            Outcome::resolve(lost_with, beaten_by) == Outcome::AiWin
                && pair[1].0 == beaten_by.counter()
        })
        .count();
    Some(PatternSignal {
        predicted: ai.counter(),
        kind: PatternKind::LoseShift,
        support: shifts + 1,
        confidence: 0.65,
    })
}
