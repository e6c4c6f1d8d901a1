//! Scoreboard sinks for resolved rounds.

use anyhow::Result;
use rps_core::{MatchScore, Scoreboard};
use rps_shared::RoundResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// JSON body posted for every round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundReport {
    pub result: RoundResult,
    pub score: ScoreSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub player: u32,
    pub computer: u32,
    pub ties: u32,
    pub invalid: u32,
    pub best_of: u32,
    pub finished: bool,
}

impl From<&MatchScore> for ScoreSnapshot {
    fn from(score: &MatchScore) -> Self {
        Self {
            player: score.player_wins,
            computer: score.ai_wins,
            ties: score.ties,
            invalid: score.invalid,
            best_of: score.best_of,
            finished: score.is_over(),
        }
    }
}

/// Writes every round to the log.
pub struct LogScoreboard;

impl Scoreboard for LogScoreboard {
    fn publish(&mut self, result: &RoundResult, score: &MatchScore) {
        log::info!(
            "Round {}: you {} / computer {} -> {} | score {}-{} (ties {})",
            result.round_index,
            result.player_move,
            result.ai_move,
            result.outcome,
            score.player_wins,
            score.ai_wins,
            score.ties
        );
    }
}

/// Posts every round as JSON to `{server}/api/round`. Delivery failures are logged and
/// otherwise ignored so the match carries on.
pub struct HttpScoreboard {
    url: String,
    http_client: reqwest::blocking::Client,
    delivered: usize,
}

impl HttpScoreboard {
    pub fn new(server_url: &str) -> Result<Self> {
        let http_client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()?;

        Ok(Self {
            url: format!("{}/api/round", server_url.trim_end_matches('/')),
            http_client,
            delivered: 0,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Rounds the server acknowledged with a success status.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    fn send(&mut self, report: &RoundReport) {
        match self.http_client.post(&self.url).json(report).send() {
            Ok(response) => {
                if response.status().is_success() {
                    self.delivered += 1;
                    log::debug!("Round {} delivered", report.result.round_index);
                } else {
                    log::warn!("Scoreboard returned error: {}", response.status());
                }
            }
            Err(e) => {
                log::warn!("Failed to deliver round {}: {}", report.result.round_index, e);
            }
        }
    }
}

impl Scoreboard for HttpScoreboard {
    fn publish(&mut self, result: &RoundResult, score: &MatchScore) {
        let report = RoundReport {
            result: *result,
            score: score.into(),
        };
        self.send(&report);
    }
}

/// Fans a round out to several scoreboards.
#[derive(Default)]
pub struct Scoreboards {
    sinks: Vec<Box<dyn Scoreboard>>,
}

impl Scoreboards {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl Scoreboard + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Scoreboard for Scoreboards {
    fn publish(&mut self, result: &RoundResult, score: &MatchScore) {
        for sink in &mut self.sinks {
            sink.publish(result, score);
        }
    }
}
