//! Game logic for gesture Rock-Paper-Scissors: move history, the opponent, and the
//! round state machine that ties sensing to scoring.

pub mod ai;
pub mod history;
pub mod round;

pub use ai::{next_strategy, AiDecision, AiEngine, OutcomeWindow, StrategyState, StrategyTallies};
pub use history::{MoveHistory, PatternKind, PatternSignal};
pub use round::{
    CaptureMode, Control, GameContext, GestureSensor, MatchScore, NullScoreboard, RoundMachine,
    RoundPhase, Scoreboard, Tick, TickReport,
};
