//! Opponent strategies and the adaptive strategy switcher.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rps_shared::{GameConfig, Move, Outcome, StrategyKind};

use crate::history::MoveHistory;

/// Strategies the adaptive mode rotates through, in fallback order.
pub const ADAPTIVE_ROTATION: [StrategyKind; 3] = [
    StrategyKind::Counter,
    StrategyKind::Pattern,
    StrategyKind::Random,
];

/// Fixed-capacity ring of the most recent decided outcomes.
#[derive(Debug, Clone)]
pub struct OutcomeWindow {
    outcomes: VecDeque<Outcome>,
    capacity: usize,
}

impl OutcomeWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            outcomes: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Invalid rounds say nothing about the strategy and are skipped.
    pub fn push(&mut self, outcome: Outcome) {
        if outcome == Outcome::Invalid {
            return;
        }
        if self.outcomes.len() == self.capacity {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(outcome);
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.outcomes.len() == self.capacity
    }

    pub fn clear(&mut self) {
        self.outcomes.clear();
    }

    pub fn ai_win_rate(&self) -> Option<f64> {
        if self.outcomes.is_empty() {
            return None;
        }
        let wins = self.outcomes.iter().filter(|&&o| o == Outcome::AiWin).count();
        Some(wins as f64 / self.outcomes.len() as f64)
    }
}

/// Lifetime record of one strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrategyTally {
    pub rounds: u32,
    pub ai_wins: u32,
}

impl StrategyTally {
    pub fn win_rate(&self) -> Option<f64> {
        (self.rounds > 0).then(|| self.ai_wins as f64 / self.rounds as f64)
    }
}

/// Per-strategy tallies for the concrete strategies.
#[derive(Debug, Clone, Default)]
pub struct StrategyTallies {
    counter: StrategyTally,
    pattern: StrategyTally,
    random: StrategyTally,
}

impl StrategyTallies {
    pub fn get(&self, kind: StrategyKind) -> Option<&StrategyTally> {
        match kind {
            StrategyKind::Counter => Some(&self.counter),
            StrategyKind::Pattern => Some(&self.pattern),
            StrategyKind::Random => Some(&self.random),
            StrategyKind::Adaptive => None,
        }
    }

    fn get_mut(&mut self, kind: StrategyKind) -> Option<&mut StrategyTally> {
        match kind {
            StrategyKind::Counter => Some(&mut self.counter),
            StrategyKind::Pattern => Some(&mut self.pattern),
            StrategyKind::Random => Some(&mut self.random),
            StrategyKind::Adaptive => None,
        }
    }

    pub fn record(&mut self, kind: StrategyKind, outcome: Outcome) {
        if outcome == Outcome::Invalid {
            return;
        }
        if let Some(tally) = self.get_mut(kind) {
            tally.rounds += 1;
            if outcome == Outcome::AiWin {
                tally.ai_wins += 1;
            }
        }
    }

    pub fn win_rate(&self, kind: StrategyKind) -> Option<f64> {
        self.get(kind).and_then(StrategyTally::win_rate)
    }
}

/// Adaptive transition rule.
///
/// Keeps `current` until the window is full. A full window whose AI win rate is below
/// `threshold` moves to the other strategy with the best lifetime win rate. Strategies
/// without data rank last; ties and an all-unknown field go to the first candidate after
/// `current` in `ADAPTIVE_ROTATION`.
pub fn next_strategy(
    current: StrategyKind,
    window: &OutcomeWindow,
    threshold: f64,
    tallies: &StrategyTallies,
) -> StrategyKind {
    if !window.is_full() {
        return current;
    }
    match window.ai_win_rate() {
        Some(rate) if rate < threshold => {}
        _ => return current,
    }

    let position = ADAPTIVE_ROTATION
        .iter()
        .position(|&k| k == current)
        .unwrap_or(ADAPTIVE_ROTATION.len() - 1);

    let mut best: Option<(StrategyKind, f64)> = None;
    for step in 1..ADAPTIVE_ROTATION.len() {
        let candidate = ADAPTIVE_ROTATION[(position + step) % ADAPTIVE_ROTATION.len()];
        let score = tallies.win_rate(candidate).unwrap_or(-1.0);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }
    best.map_or(current, |(kind, _)| kind)
}

/// Which strategy the player selected and, for Adaptive, which one is currently in use.
#[derive(Debug, Clone)]
pub struct StrategyState {
    selected: StrategyKind,
    active: StrategyKind,
    window: OutcomeWindow,
    tallies: StrategyTallies,
    threshold: f64,
}

impl StrategyState {
    pub fn new(selected: StrategyKind, window: usize, threshold: f64) -> Self {
        Self {
            selected,
            active: initial_active(selected),
            window: OutcomeWindow::new(window),
            tallies: StrategyTallies::default(),
            threshold,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(
            config.ai_strategy,
            config.adaptive_window,
            config.adaptive_win_threshold,
        )
    }

    pub fn selected(&self) -> StrategyKind {
        self.selected
    }

    /// Concrete strategy that will pick the next AI move.
    pub fn active(&self) -> StrategyKind {
        self.active
    }

    pub fn window(&self) -> &OutcomeWindow {
        &self.window
    }

    pub fn tallies(&self) -> &StrategyTallies {
        &self.tallies
    }

    pub fn set_strategy(&mut self, kind: StrategyKind) {
        if kind == self.selected {
            return;
        }
        log::info!("AI strategy changed: {} -> {}", self.selected, kind);
        self.selected = kind;
        self.active = initial_active(kind);
        self.window.clear();
    }

    /// Records a resolved round played with `used`. Returns the new active strategy if the
    /// adaptive rule switched.
    pub fn record(&mut self, used: StrategyKind, outcome: Outcome) -> Option<StrategyKind> {
        self.tallies.record(used, outcome);
        if outcome == Outcome::Invalid {
            return None;
        }
        self.window.push(outcome);

        if self.selected != StrategyKind::Adaptive {
            return None;
        }

        let next = next_strategy(self.active, &self.window, self.threshold, &self.tallies);
        if next == self.active {
            return None;
        }
        log::info!(
            "Adaptive AI win rate {:.2} below {:.2}, switching {} -> {}",
            self.window.ai_win_rate().unwrap_or(0.0),
            self.threshold,
            self.active,
            next
        );
        self.active = next;
        self.window.clear();
        Some(next)
    }
}

fn initial_active(selected: StrategyKind) -> StrategyKind {
    match selected {
        StrategyKind::Adaptive => StrategyKind::Counter,
        concrete => concrete,
    }
}

/// The AI's move for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiDecision {
    pub ai_move: Move,
    /// Player move the AI is countering, if it made a prediction.
    pub predicted: Option<Move>,
    /// Strategy that actually produced `ai_move`.
    pub strategy: StrategyKind,
}

pub struct AiEngine {
    rng: StdRng,
    difficulty: f64,
    pattern_min_repeats: usize,
    avoid_unused: bool,
}

impl AiEngine {
    pub fn new(seed: Option<u64>, difficulty: f64, pattern_min_repeats: usize) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            difficulty: difficulty.clamp(0.0, 1.0),
            pattern_min_repeats,
            avoid_unused: false,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(
            config.rng_seed,
            config.ai_difficulty,
            config.pattern_min_repeats,
        )
        .with_avoid_unused(config.counter_avoid_unused)
    }

    /// Counter expects a move the player has left out of the last five rounds to come next.
    pub fn with_avoid_unused(mut self, enabled: bool) -> Self {
        self.avoid_unused = enabled;
        self
    }

    /// Chooses the AI move from history alone; the player's current move is never visible
    /// here.
    pub fn choose(&mut self, state: &StrategyState, history: &MoveHistory) -> AiDecision {
        if self.difficulty < 1.0 && self.rng.gen::<f64>() >= self.difficulty {
            return self.random();
        }

        match state.active() {
            StrategyKind::Random => self.random(),
            StrategyKind::Counter | StrategyKind::Adaptive => self.counter(history),
            StrategyKind::Pattern => self.pattern(history),
        }
    }

    fn random(&mut self) -> AiDecision {
        let ai_move = Move::PLAYABLE[self.rng.gen_range(0..Move::PLAYABLE.len())];
        AiDecision {
            ai_move,
            predicted: None,
            strategy: StrategyKind::Random,
        }
    }

    fn counter(&mut self, history: &MoveHistory) -> AiDecision {
        let avoided = if self.avoid_unused {
            history.unused_recent_move()
        } else {
            None
        };
        match avoided.or_else(|| history.most_frequent()) {
            Some(predicted) => AiDecision {
                ai_move: predicted.counter(),
                predicted: Some(predicted),
                strategy: StrategyKind::Counter,
            },
            None => AiDecision {
                strategy: StrategyKind::Counter,
                ..self.random()
            },
        }
    }

    fn pattern(&mut self, history: &MoveHistory) -> AiDecision {
        match history.pattern_signal(self.pattern_min_repeats) {
            Some(signal) => {
                log::debug!(
                    "Pattern {:?} predicts {} (support {}, confidence {:.2})",
                    signal.kind,
                    signal.predicted,
                    signal.support,
                    signal.confidence
                );
                AiDecision {
                    ai_move: signal.predicted.counter(),
                    predicted: Some(signal.predicted),
                    strategy: StrategyKind::Pattern,
                }
            }
            _ => AiDecision {
                strategy: StrategyKind::Pattern,
                ..self.random()
            },
        }
    }
}
