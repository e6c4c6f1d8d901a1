use anyhow::Result;
use rps_client::camera::ImageDirSource;
use rps_client::scoreboard::{HttpScoreboard, RoundReport};
use rps_client::Session;
use rps_core::{Control, MatchScore, RoundPhase, Scoreboard};
use rps_shared::{GameConfig, Move, Outcome, RoiRect, RoundResult, StrategyKind};
use serde_json::json;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Stores received round reports for verification
#[derive(Clone, Default)]
struct ReceivedReports {
    reports: Arc<Mutex<Vec<RoundReport>>>,
}

impl ReceivedReports {
    fn add(&self, report: RoundReport) {
        self.reports.lock().unwrap().push(report);
    }

    fn get_all(&self) -> Vec<RoundReport> {
        self.reports.lock().unwrap().clone()
    }

    fn count(&self) -> usize {
        self.reports.lock().unwrap().len()
    }
}

async fn scoreboard_server(received: &ReceivedReports) -> MockServer {
    let mock_server = MockServer::start().await;
    let received_clone = received.clone();

    Mock::given(method("POST"))
        .and(path("/api/round"))
        .respond_with(move |req: &wiremock::Request| {
            if let Ok(report) = serde_json::from_slice::<RoundReport>(&req.body) {
                received_clone.add(report);
            }
            ResponseTemplate::new(200).set_body_json(json!({"status": "ok"}))
        })
        .mount(&mock_server)
        .await;

    mock_server
}

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;

/// Writes a synthetic closed-fist image (skin-coloured disc on blue) and returns its directory.
fn fist_replay_dir(name: &str) -> Result<PathBuf> {
    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir)?;

    let img = image::RgbImage::from_fn(WIDTH, HEIGHT, |x, y| {
        let dx = x as i32 - 160;
        let dy = y as i32 - 130;
        if dx * dx + dy * dy <= 60 * 60 {
            image::Rgb([180, 150, 120])
        } else {
            image::Rgb([50, 50, 200])
        }
    });
    img.save(dir.join("fist.png"))?;
    Ok(dir)
}

fn result(round_index: u32, outcome: Outcome) -> RoundResult {
    RoundResult {
        round_index,
        player_move: Move::Rock,
        ai_move: Move::Scissors,
        outcome,
        strategy: StrategyKind::Counter,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_http_scoreboard_posts_rounds() -> Result<()> {
    let received = ReceivedReports::default();
    let mock_server = scoreboard_server(&received).await;
    let uri = mock_server.uri();

    // The blocking client must not run on the async runtime's threads.
    let delivered = tokio::task::spawn_blocking(move || -> Result<usize> {
        let mut board = HttpScoreboard::new(&uri)?;
        let mut score = MatchScore::new(3);

        score.record(Outcome::PlayerWin);
        board.publish(&result(0, Outcome::PlayerWin), &score);
        score.record(Outcome::Invalid);
        board.publish(&result(1, Outcome::Invalid), &score);
        Ok(board.delivered())
    })
    .await??;

    assert_eq!(delivered, 2);
    assert_eq!(received.count(), 2);

    let all = received.get_all();
    assert_eq!(all[0].result.round_index, 0);
    assert_eq!(all[0].score.player, 1);
    assert_eq!(all[1].result.outcome, Outcome::Invalid);
    assert_eq!(all[1].score.invalid, 1);
    assert!(!all[1].score.finished);

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scoreboard_error_does_not_stop_match() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/round"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;
    let uri = mock_server.uri();

    let delivered = tokio::task::spawn_blocking(move || -> Result<usize> {
        let mut board = HttpScoreboard::new(&uri)?;
        board.publish(&result(0, Outcome::Tie), &MatchScore::new(5));
        Ok(board.delivered())
    })
    .await??;

    assert_eq!(delivered, 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_replayed_fist_plays_full_match() -> Result<()> {
    let received = ReceivedReports::default();
    let mock_server = scoreboard_server(&received).await;
    let uri = mock_server.uri();
    let dir = fist_replay_dir("replay-fist")?;

    let phase = tokio::task::spawn_blocking(move || -> Result<RoundPhase> {
        let config = GameConfig {
            roi: RoiRect::new(0, 0, WIDTH, HEIGHT),
            mirror_input: false,
            countdown_ms: 0,
            capture_timeout_ms: 10_000,
            best_of: 1,
            rng_seed: Some(9),
            ..GameConfig::default()
        };
        let source = ImageDirSource::open(&dir)?.with_repeat(50);
        let board = HttpScoreboard::new(&uri)?;
        let mut session = Session::new(&config, source, Box::new(board))?;
        session.control(Control::StartRound);

        let start = Instant::now();
        let mut phase = RoundPhase::Idle;
        for i in 0..50u64 {
            let Some(report) = session.step(start + Duration::from_millis(33 * i))? else {
                break;
            };
            phase = report.phase;
            if phase == RoundPhase::Finished {
                break;
            }
        }
        Ok(phase)
    })
    .await??;

    assert_eq!(phase, RoundPhase::Finished);
    assert_eq!(received.count(), 1);

    let report = &received.get_all()[0];
    assert_eq!(report.result.player_move, Move::Rock);
    assert_ne!(report.result.outcome, Outcome::Invalid);
    assert!(report.score.finished);

    Ok(())
}
