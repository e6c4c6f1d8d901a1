//! Tick-driven round state machine.
//!
//! The machine owns the sensing pipeline and the AI engine; the long-lived match data sits in
//! a [`GameContext`] the caller passes in on every tick. Each tick advances at most one
//! transition.

use std::time::{Duration, Instant};

use rps_hand_detector::{Frame, HandDetector, StabilityGate};
use rps_shared::{GameConfig, LiveFeedback, Move, Outcome, RoundResult, StrategyKind};

use crate::ai::{AiEngine, StrategyState};
use crate::history::MoveHistory;

/// Turns a frame into a provisional move.
pub trait GestureSensor {
    fn sense(&mut self, frame: &Frame) -> Move;
}

impl GestureSensor for HandDetector {
    fn sense(&mut self, frame: &Frame) -> Move {
        self.detect(frame)
    }
}

/// Receives every resolved round.
pub trait Scoreboard {
    fn publish(&mut self, result: &RoundResult, score: &MatchScore);
}

/// Scoreboard that discards everything.
pub struct NullScoreboard;

impl Scoreboard for NullScoreboard {
    fn publish(&mut self, _result: &RoundResult, _score: &MatchScore) {}
}

/// Running score of the current best-of-N match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchScore {
    pub player_wins: u32,
    pub ai_wins: u32,
    pub ties: u32,
    pub invalid: u32,
    pub best_of: u32,
}

impl MatchScore {
    pub fn new(best_of: u32) -> Self {
        Self {
            player_wins: 0,
            ai_wins: 0,
            ties: 0,
            invalid: 0,
            best_of: best_of.max(1),
        }
    }

    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::PlayerWin => self.player_wins += 1,
            Outcome::AiWin => self.ai_wins += 1,
            Outcome::Tie => self.ties += 1,
            Outcome::Invalid => self.invalid += 1,
        }
    }

    /// Rounds that produced a result; invalid rounds are replayed.
    pub fn decided_rounds(&self) -> u32 {
        self.player_wins + self.ai_wins + self.ties
    }

    /// Either side holds a majority of `best_of`, or all `best_of` rounds are decided.
    pub fn is_over(&self) -> bool {
        let majority = self.best_of / 2;
        self.player_wins > majority
            || self.ai_wins > majority
            || self.decided_rounds() >= self.best_of
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.best_of);
    }
}

/// Match state that outlives individual rounds. History survives match restarts.
#[derive(Debug, Clone)]
pub struct GameContext {
    pub history: MoveHistory,
    pub strategy: StrategyState,
    pub score: MatchScore,
}

impl GameContext {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            history: MoveHistory::from_config(config),
            strategy: StrategyState::from_config(config),
            score: MatchScore::new(config.best_of),
        }
    }
}

/// Where the player's move comes from while capturing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    Camera,
    Manual,
}

/// Control signals from the user or the embedding program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    StartRound,
    RestartMatch,
    ChangeStrategy(StrategyKind),
    ToggleCaptureMode,
    InjectMove(Move),
    SetCaptureTimeout(Duration),
    Quit,
}

/// Externally visible phase of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Idle,
    Countdown,
    Capturing,
    Resolving,
    ScoreUpdated,
    Finished,
}

#[derive(Debug, Clone, Copy)]
enum State {
    Idle,
    Countdown { since: Instant },
    Capturing { since: Instant },
    Resolving { player: Move },
    ScoreUpdated { result: RoundResult },
    Finished,
}

impl State {
    fn phase(&self) -> RoundPhase {
        match self {
            State::Idle => RoundPhase::Idle,
            State::Countdown { .. } => RoundPhase::Countdown,
            State::Capturing { .. } => RoundPhase::Capturing,
            State::Resolving { .. } => RoundPhase::Resolving,
            State::ScoreUpdated { .. } => RoundPhase::ScoreUpdated,
            State::Finished => RoundPhase::Finished,
        }
    }
}

/// Input for one tick. The frame is only borrowed for the duration of the tick.
#[derive(Debug, Clone, Copy)]
pub struct Tick<'a> {
    pub now: Instant,
    pub frame: Option<&'a Frame>,
}

/// What happened during a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Phase after the tick
    pub phase: RoundPhase,
    pub feedback: LiveFeedback,
    /// Set on the tick that published a round.
    pub result: Option<RoundResult>,
}

pub struct RoundMachine<S> {
    sensor: S,
    ai: AiEngine,
    gate: StabilityGate,
    state: State,
    mode: CaptureMode,
    countdown: Duration,
    capture_timeout: Duration,
    next_round_index: u32,
    start_requested: bool,
    injected: Option<Move>,
    quit: bool,
}

impl<S: GestureSensor> RoundMachine<S> {
    pub fn new(config: &GameConfig, sensor: S) -> Self {
        Self {
            sensor,
            ai: AiEngine::from_config(config),
            gate: StabilityGate::new(config.stability_frame_count),
            state: State::Idle,
            mode: CaptureMode::Camera,
            countdown: config.countdown(),
            capture_timeout: config.capture_timeout(),
            next_round_index: 0,
            start_requested: false,
            injected: None,
            quit: false,
        }
    }

    pub fn with_capture_mode(mut self, mode: CaptureMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn phase(&self) -> RoundPhase {
        self.state.phase()
    }

    pub fn capture_mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn capture_timeout(&self) -> Duration {
        self.capture_timeout
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn feedback(&self) -> LiveFeedback {
        self.gate.feedback()
    }

    /// Applies a control signal. Signals that make no sense in the current phase are
    /// ignored.
    pub fn apply(&mut self, ctx: &mut GameContext, control: Control) {
        match control {
            Control::StartRound => match self.state {
                State::Idle => self.start_requested = true,
                State::Finished => log::info!("Match is over, restart it to play again"),
                _ => {}
            },
            Control::RestartMatch => {
                log::info!("Restarting match");
                ctx.score.reset();
                self.gate.reset();
                self.injected = None;
                self.start_requested = false;
                self.state = State::Idle;
            }
            Control::ChangeStrategy(kind) => ctx.strategy.set_strategy(kind),
            Control::ToggleCaptureMode => {
                self.mode = match self.mode {
                    CaptureMode::Camera => CaptureMode::Manual,
                    CaptureMode::Manual => CaptureMode::Camera,
                };
                self.gate.reset();
                self.injected = None;
                log::info!("Capture mode: {:?}", self.mode);
            }
            Control::InjectMove(mv) => {
                let capturing = matches!(self.state, State::Capturing { .. });
                if self.mode == CaptureMode::Manual && capturing && mv.is_playable() {
                    self.injected = Some(mv);
                } else {
                    log::debug!("Ignoring injected move {} in {:?}", mv, self.phase());
                }
            }
            Control::SetCaptureTimeout(timeout) => {
                self.capture_timeout = timeout;
                log::info!("Capture timeout set to {:.1}s", timeout.as_secs_f32());
            }
            Control::Quit => self.quit = true,
        }
    }

    pub fn tick(
        &mut self,
        ctx: &mut GameContext,
        tick: Tick<'_>,
        scoreboard: &mut dyn Scoreboard,
    ) -> TickReport {
        let mut published = None;

        match self.state {
            State::Idle => {
                if std::mem::take(&mut self.start_requested) {
                    self.state = State::Countdown { since: tick.now };
                }
            }
            State::Countdown { since } => {
                if tick.now.saturating_duration_since(since) >= self.countdown {
                    self.gate.reset();
                    self.injected = None;
                    self.state = State::Capturing { since: tick.now };
                }
            }
            State::Capturing { since } => {
                if let Some(player) = self.capture(tick.frame) {
                    self.state = State::Resolving { player };
                } else if tick.now.saturating_duration_since(since) >= self.capture_timeout {
                    log::info!("No stable gesture within {:?}", self.capture_timeout);
                    self.state = State::Resolving { player: Move::None };
                }
            }
            State::Resolving { player } => {
                let result = self.resolve(ctx, player);
                self.state = State::ScoreUpdated { result };
            }
            State::ScoreUpdated { result } => {
                scoreboard.publish(&result, &ctx.score);
                published = Some(result);
                self.state = if ctx.score.is_over() {
                    log::info!(
                        "Match finished: player {} - {} computer",
                        ctx.score.player_wins,
                        ctx.score.ai_wins
                    );
                    State::Finished
                } else {
                    State::Countdown { since: tick.now }
                };
            }
            State::Finished => {}
        }

        TickReport {
            phase: self.state.phase(),
            feedback: self.gate.feedback(),
            result: published,
        }
    }

    fn capture(&mut self, frame: Option<&Frame>) -> Option<Move> {
        match self.mode {
            CaptureMode::Manual => self.injected.take(),
            CaptureMode::Camera => {
                let provisional = frame.map_or(Move::None, |f| self.sensor.sense(f));
                self.gate.observe(provisional)
            }
        }
    }

    fn resolve(&mut self, ctx: &mut GameContext, player: Move) -> RoundResult {
        let decision = self.ai.choose(&ctx.strategy, &ctx.history);
        let outcome = Outcome::resolve(player, decision.ai_move);
        let round_index = self.next_round_index;
        self.next_round_index += 1;

        ctx.history.record_round(round_index, player, decision.ai_move);
        ctx.strategy.record(decision.strategy, outcome);
        ctx.score.record(outcome);

        log::info!(
            "Round {}: player {} vs computer {} ({}) -> {}",
            round_index,
            player,
            decision.ai_move,
            decision.strategy,
            outcome
        );

        RoundResult {
            round_index,
            player_move: player,
            ai_move: decision.ai_move,
            outcome,
            strategy: decision.strategy,
        }
    }
}
