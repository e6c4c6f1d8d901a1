use anyhow::{Context, Result};
use clap::Parser;
use rps_client::camera::{FrameSource, ImageDirSource};
use rps_client::scoreboard::{HttpScoreboard, LogScoreboard, Scoreboards};
use rps_client::settings::{resolve_config, Overrides};
use rps_client::Session;
use rps_core::{Control, RoundPhase, TickReport};
use rps_shared::{GameConfig, StrategyKind};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about = "Rock-Paper-Scissors against the computer, played with hand gestures", long_about = None)]
struct Args {
    /// JSON configuration file; missing keys use defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Camera device ID (requires the opencv-backend feature)
    #[arg(short = 'v', long, default_value = "0")]
    camera: i32,

    /// Replay images from a directory instead of using the camera
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// Ticks each replayed image is shown for
    #[arg(long, default_value = "10")]
    replay_repeat: usize,

    /// Scoreboard server URL (e.g., http://localhost:8080)
    #[arg(short, long)]
    server: Option<String>,

    /// AI strategy: random, counter, pattern or adaptive
    #[arg(long)]
    strategy: Option<StrategyKind>,

    /// Number of rounds in a match
    #[arg(long)]
    best_of: Option<u32>,

    /// Time allowed to show a gesture, in milliseconds
    #[arg(long)]
    capture_timeout_ms: Option<u64>,

    /// Seed for the AI's random choices
    #[arg(long)]
    seed: Option<u64>,

    /// Start in manual capture mode (moves come from the z/x/c keys)
    #[arg(long)]
    manual: bool,

    /// Start the first round immediately
    #[arg(long)]
    auto_start: bool,

    /// Exit once the match is finished
    #[arg(long)]
    exit_on_finish: bool,

    /// Run without the preview window (keys are read from the window, so they are lost too)
    #[arg(long)]
    no_window: bool,

    /// Target tick rate
    #[arg(long, default_value = "30")]
    fps: u32,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

struct GameClient<F> {
    session: Session<F>,
    tick_interval: Duration,
    exit_on_finish: bool,
}

impl<F: FrameSource> GameClient<F> {
    fn new(config: &GameConfig, source: F, server: Option<&str>, args: &Args) -> Result<Self> {
        let mut scoreboards = Scoreboards::new().with(LogScoreboard);
        if let Some(server) = server {
            log::info!("Publishing rounds to {}", server);
            scoreboards = scoreboards.with(HttpScoreboard::new(server)?);
        }

        let mut session = Session::new(config, source, Box::new(scoreboards))?;
        if args.manual {
            session.control(Control::ToggleCaptureMode);
        }
        if args.auto_start {
            session.control(Control::StartRound);
        }

        Ok(Self {
            session,
            tick_interval: Duration::from_secs(1) / args.fps.max(1),
            exit_on_finish: args.exit_on_finish,
        })
    }

    /// Runs one tick and reports whether the loop should continue.
    fn tick(
        &mut self,
        on_report: impl FnOnce(&mut Session<F>, &TickReport) -> Result<()>,
    ) -> Result<bool> {
        let started = Instant::now();

        let Some(report) = self.session.step(started)? else {
            log::info!("Frame source exhausted");
            return Ok(false);
        };
        on_report(&mut self.session, &report)?;

        if self.session.quit_requested() {
            log::info!("Quit requested");
            return Ok(false);
        }
        if self.exit_on_finish && report.phase == RoundPhase::Finished {
            log::info!("Match finished, exiting");
            return Ok(false);
        }

        if let Some(rest) = self.tick_interval.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
        Ok(true)
    }
}

impl GameClient<ImageDirSource> {
    fn run(&mut self) -> Result<()> {
        log::info!("Starting replay loop...");
        while self.tick(|_, _| Ok(()))? {}
        Ok(())
    }
}

#[cfg(feature = "opencv-backend")]
impl GameClient<rps_client::camera::OpenCvCamera> {
    fn run(&mut self) -> Result<()> {
        use rps_client::controls::control_for_key;

        log::info!("Starting main loop...");
        while self.tick(|session, report| {
            let lines = session.status_lines(report);
            let roi = session.roi();
            if let Some(key) = session.source_mut().show(&roi, &lines)? {
                let timeout = session.machine().capture_timeout();
                if let Some(control) = control_for_key(key, timeout) {
                    session.control(control);
                }
            }
            Ok(())
        })? {}
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    log::info!("Rock-Paper-Scissors client starting...");

    let overrides = Overrides {
        strategy: args.strategy,
        best_of: args.best_of,
        capture_timeout_ms: args.capture_timeout_ms,
        seed: args.seed,
    };
    let config = resolve_config(args.config.as_deref(), &overrides)?;
    log::info!(
        "AI strategy: {}, best of {}, capture timeout {} ms",
        config.ai_strategy,
        config.best_of,
        config.capture_timeout_ms
    );

    if let Some(dir) = &args.replay {
        let source = ImageDirSource::open(dir)?.with_repeat(args.replay_repeat);
        let mut client = GameClient::new(&config, source, args.server.as_deref(), &args)
            .context("Failed to initialize client")?;
        return client.run().context("Client error");
    }

    run_camera(&config, &args)
}

#[cfg(feature = "opencv-backend")]
fn run_camera(config: &GameConfig, args: &Args) -> Result<()> {
    use rps_client::camera::OpenCvCamera;

    let camera = OpenCvCamera::open(args.camera, !args.no_window)?;
    let mut client = GameClient::new(config, camera, args.server.as_deref(), args)
        .context("Failed to initialize client")?;
    client.run().context("Client error")
}

#[cfg(not(feature = "opencv-backend"))]
fn run_camera(_config: &GameConfig, args: &Args) -> Result<()> {
    anyhow::bail!(
        "Camera device {} unavailable: built without the opencv-backend feature. \
        Use --replay <dir> or rebuild with --features opencv-backend",
        args.camera
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_window_can_be_disabled() {
        let args = Args::try_parse_from(["rps-client"]).unwrap();
        assert!(!args.no_window);

        let args = Args::try_parse_from(["rps-client", "--no-window"]).unwrap();
        assert!(args.no_window);
    }

    #[test]
    fn test_strategy_flag_parses() {
        let args = Args::try_parse_from(["rps-client", "--strategy", "pattern", "--best-of", "3"])
            .unwrap();
        assert_eq!(args.strategy, Some(StrategyKind::Pattern));
        assert_eq!(args.best_of, Some(3));
        assert!(Args::try_parse_from(["rps-client", "--strategy", "psychic"]).is_err());
    }
}
