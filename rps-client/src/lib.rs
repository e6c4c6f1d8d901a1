//! Desktop front end: frame sources, scoreboards, key bindings and the session that ties them
//! to the round state machine.

use anyhow::{bail, Result};
use rps_core::{Control, GameContext, RoundMachine, RoundPhase, Scoreboard, Tick, TickReport};
use rps_hand_detector::HandDetector;
use rps_shared::{GameConfig, RoiRect};
use std::time::Instant;

pub mod camera;
pub mod controls;
pub mod scoreboard;
pub mod settings;

use camera::FrameSource;

/// One running game: pulls a frame, ticks the machine, publishes results.
pub struct Session<F> {
    source: F,
    machine: RoundMachine<HandDetector>,
    ctx: GameContext,
    scoreboard: Box<dyn Scoreboard>,
}

impl<F: FrameSource> Session<F> {
    pub fn new(config: &GameConfig, source: F, scoreboard: Box<dyn Scoreboard>) -> Result<Self> {
        if let Some((width, height)) = source.resolution() {
            if !config.roi.fits_within(width, height) {
                bail!(
                    "ROI {:?} does not fit the {}x{} camera frame",
                    config.roi,
                    width,
                    height
                );
            }
        }

        let detector = HandDetector::new(config)?;
        Ok(Self {
            source,
            machine: RoundMachine::new(config, detector),
            ctx: GameContext::new(config),
            scoreboard,
        })
    }

    pub fn control(&mut self, control: Control) {
        self.machine.apply(&mut self.ctx, control);
    }

    /// Runs one tick. Returns `Ok(None)` once the frame source is exhausted.
    pub fn step(&mut self, now: Instant) -> Result<Option<TickReport>> {
        let Some(frame) = self.source.grab()? else {
            return Ok(None);
        };
        let tick = Tick {
            now,
            frame: Some(&frame),
        };
        Ok(Some(self.machine.tick(&mut self.ctx, tick, self.scoreboard.as_mut())))
    }

    pub fn context(&self) -> &GameContext {
        &self.ctx
    }

    pub fn machine(&self) -> &RoundMachine<HandDetector> {
        &self.machine
    }

    pub fn source_mut(&mut self) -> &mut F {
        &mut self.source
    }

    pub fn roi(&self) -> RoiRect {
        self.machine.sensor().roi()
    }

    pub fn quit_requested(&self) -> bool {
        self.machine.quit_requested()
    }

    /// Text overlay for the preview window.
    pub fn status_lines(&self, report: &TickReport) -> Vec<String> {
        let score = &self.ctx.score;
        let mut lines = vec![format!(
            "You {} - {} Computer   (best of {})",
            score.player_wins, score.ai_wins, score.best_of
        )];

        lines.push(match report.phase {
            RoundPhase::Idle => "Press space to play".to_string(),
            RoundPhase::Countdown => "Get ready...".to_string(),
            RoundPhase::Capturing => format!(
                "Show your hand: {} ({:.0}%)",
                report.feedback.provisional,
                report.feedback.confidence() * 100.0
            ),
            RoundPhase::Resolving | RoundPhase::ScoreUpdated => "...".to_string(),
            RoundPhase::Finished => "Match over, press n for a new one".to_string(),
        });

        if let Some(result) = report.result {
            lines.push(format!(
                "{} vs {}: {}",
                result.player_move, result.ai_move, result.outcome
            ));
        }

        lines.push(format!(
            "AI: {} ({})   capture: {:?}, {:.1}s   skin: {}",
            self.ctx.strategy.selected(),
            self.ctx.strategy.active(),
            self.machine.capture_mode(),
            self.machine.capture_timeout().as_secs_f32(),
            self.machine.sensor().segmenter().active_profile().name
        ));
        lines.push(controls::KEY_HELP.to_string());
        lines
    }
}
