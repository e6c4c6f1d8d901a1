use std::time::{Duration, Instant};

use rps_core::{
    CaptureMode, Control, GameContext, GestureSensor, MatchScore, RoundMachine, RoundPhase,
    Scoreboard, Tick,
};
use rps_hand_detector::{Frame, PixelFormat};
use rps_shared::{GameConfig, Move, Outcome, RoundResult, Source, StrategyKind};

/// Plays the same gesture on every frame.
struct Steady(Move);

impl GestureSensor for Steady {
    fn sense(&mut self, _frame: &Frame) -> Move {
        self.0
    }
}

#[derive(Default)]
struct Recorder {
    results: Vec<RoundResult>,
    last_score: Option<MatchScore>,
}

impl Scoreboard for Recorder {
    fn publish(&mut self, result: &RoundResult, score: &MatchScore) {
        self.results.push(*result);
        self.last_score = Some(*score);
    }
}

/// Drives a machine with a fake clock advancing `step` per tick.
struct Harness<S> {
    machine: RoundMachine<S>,
    ctx: GameContext,
    scoreboard: Recorder,
    frame: Frame,
    now: Instant,
    step: Duration,
}

impl<S: GestureSensor> Harness<S> {
    fn new(config: &GameConfig, sensor: S) -> Self {
        Self {
            machine: RoundMachine::new(config, sensor),
            ctx: GameContext::new(config),
            scoreboard: Recorder::default(),
            frame: Frame::new(2, 2, PixelFormat::Rgb, vec![0; 12]),
            now: Instant::now(),
            step: Duration::from_millis(50),
        }
    }

    fn manual(mut self) -> Self {
        self.machine = self.machine.with_capture_mode(CaptureMode::Manual);
        self
    }

    fn tick(&mut self) -> RoundPhase {
        self.now += self.step;
        let tick = Tick {
            now: self.now,
            frame: Some(&self.frame),
        };
        self.machine
            .tick(&mut self.ctx, tick, &mut self.scoreboard)
            .phase
    }

    fn apply(&mut self, control: Control) {
        self.machine.apply(&mut self.ctx, control);
    }

    /// Ticks until `phase` is reached, failing after `limit` ticks.
    fn run_until(&mut self, phase: RoundPhase, limit: usize) {
        for _ in 0..limit {
            if self.tick() == phase {
                return;
            }
        }
        panic!("machine never reached {:?}", phase);
    }
}

fn config() -> GameConfig {
    GameConfig {
        countdown_ms: 100,
        capture_timeout_ms: 300,
        stability_frame_count: 3,
        rng_seed: Some(17),
        ..GameConfig::default()
    }
}

#[test]
fn test_timeout_is_invalid_and_match_continues() {
    let mut harness = Harness::new(&config(), Steady(Move::None));
    harness.apply(Control::StartRound);
    harness.run_until(RoundPhase::Capturing, 10);

    let mut phases = Vec::new();
    for _ in 0..10 {
        let phase = harness.tick();
        phases.push(phase);
        if phase == RoundPhase::Countdown {
            break;
        }
    }

    assert_eq!(phases.last(), Some(&RoundPhase::Countdown));
    let result = harness.scoreboard.results[0];
    assert_eq!(result.player_move, Move::None);
    assert_eq!(result.outcome, Outcome::Invalid);

    // Only the AI's move was logged.
    assert_eq!(harness.ctx.history.player_moves().count(), 0);
    assert_eq!(harness.ctx.history.len(), 1);
    assert_eq!(harness.ctx.score.invalid, 1);
    assert!(harness.ctx.strategy.window().is_empty());
}

#[test]
fn test_full_match_reaches_finished() {
    let config = GameConfig {
        best_of: 3,
        ..config()
    };
    let mut harness = Harness::new(&config, Steady(Move::Rock));
    harness.apply(Control::StartRound);
    harness.run_until(RoundPhase::Finished, 500);

    let results = &harness.scoreboard.results;
    assert!(!results.is_empty() && results.len() <= 3);

    let score = harness.scoreboard.last_score.unwrap();
    assert!(score.is_over());
    assert_eq!(score.decided_rounds() as usize, results.len());

    // Finished is terminal until restarted.
    harness.apply(Control::StartRound);
    for _ in 0..20 {
        assert_eq!(harness.tick(), RoundPhase::Finished);
    }
}

#[test]
fn test_history_matches_valid_rounds() {
    let config = GameConfig {
        best_of: 7,
        ..config()
    };
    let mut harness = Harness::new(&config, Steady(Move::Paper));
    harness.apply(Control::StartRound);
    harness.run_until(RoundPhase::Finished, 1000);

    let results = &harness.scoreboard.results;
    let valid = results
        .iter()
        .filter(|r| r.outcome != Outcome::Invalid)
        .count();
    assert_eq!(harness.ctx.history.player_moves().count(), valid);

    let indices: Vec<u32> = results.iter().map(|r| r.round_index).collect();
    assert!(indices.windows(2).all(|w| w[0] < w[1]));

    let events = harness.ctx.history.events();
    assert!(events.windows(2).all(|w| w[0].round_index <= w[1].round_index));
    assert!(events
        .iter()
        .filter(|e| e.source == Source::Player)
        .all(|e| e.mv == Move::Paper));
}

#[test]
fn test_counter_learns_steady_player() {
    let config = GameConfig {
        best_of: 9,
        ai_strategy: StrategyKind::Counter,
        ..config()
    };
    let mut harness = Harness::new(&config, Steady(Move::Scissors));
    harness.apply(Control::StartRound);
    harness.run_until(RoundPhase::Finished, 2000);

    // After the first round the history only holds Scissors.
    for result in harness.scoreboard.results.iter().skip(1) {
        assert_eq!(result.ai_move, Move::Rock);
        assert_eq!(result.outcome, Outcome::AiWin);
        assert_eq!(result.strategy, StrategyKind::Counter);
    }
}

#[test]
fn test_adaptive_switches_after_losing_window() {
    let config = GameConfig {
        best_of: 99,
        ai_strategy: StrategyKind::Adaptive,
        adaptive_window: 5,
        adaptive_win_threshold: 0.4,
        ..config()
    };
    let mut harness = Harness::new(&config, Steady(Move::None)).manual();
    assert_eq!(harness.ctx.strategy.active(), StrategyKind::Counter);

    // Seed one earlier player move so Counter is deterministic from the first round.
    harness.ctx.history.record_round(0, Move::Rock, Move::Rock);

    harness.apply(Control::StartRound);
    for round in 0..5 {
        harness.run_until(RoundPhase::Capturing, 10);
        let ai_move = harness
            .ctx
            .history
            .most_frequent()
            .map(|m| m.counter())
            .unwrap();
        // Four player wins, then a tie.
        let player = if round < 4 { ai_move.counter() } else { ai_move };
        harness.apply(Control::InjectMove(player));
        harness.run_until(RoundPhase::Countdown, 10);
    }

    let outcomes: Vec<Outcome> = harness.scoreboard.results.iter().map(|r| r.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            Outcome::PlayerWin,
            Outcome::PlayerWin,
            Outcome::PlayerWin,
            Outcome::PlayerWin,
            Outcome::Tie,
        ]
    );
    assert_eq!(harness.ctx.strategy.active(), StrategyKind::Pattern);
    assert!(harness.ctx.strategy.window().is_empty());

    // The very next AI move comes from the new strategy.
    harness.run_until(RoundPhase::Capturing, 10);
    harness.apply(Control::InjectMove(Move::Paper));
    harness.run_until(RoundPhase::ScoreUpdated, 10);
    harness.tick();
    assert_eq!(harness.scoreboard.results[5].strategy, StrategyKind::Pattern);
}
