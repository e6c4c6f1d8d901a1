//! Keyboard bindings for the preview window.

use rps_core::Control;
use rps_shared::{Move, StrategyKind};
use std::time::Duration;

pub const MIN_CAPTURE_TIMEOUT: Duration = Duration::from_millis(1000);
pub const MAX_CAPTURE_TIMEOUT: Duration = Duration::from_millis(5000);
pub const CAPTURE_TIMEOUT_STEP: Duration = Duration::from_millis(500);

/// Maps a key press to a control signal. `capture_timeout` is the current timeout, used by
/// the `+`/`-` keys to compute the adjusted one.
pub fn control_for_key(key: char, capture_timeout: Duration) -> Option<Control> {
    let control = match key.to_ascii_lowercase() {
        'q' | '\u{1b}' => Control::Quit,
        ' ' => Control::StartRound,
        'n' => Control::RestartMatch,
        'k' => Control::ToggleCaptureMode,
        digit @ '1'..='4' => {
            let slot = digit as usize - '1' as usize;
            Control::ChangeStrategy(StrategyKind::ALL[slot])
        }
        'z' => Control::InjectMove(Move::Rock),
        'x' => Control::InjectMove(Move::Paper),
        'c' => Control::InjectMove(Move::Scissors),
        '+' | '=' => Control::SetCaptureTimeout(adjust_timeout(capture_timeout, true)),
        '-' | '_' => Control::SetCaptureTimeout(adjust_timeout(capture_timeout, false)),
        _ => return None,
    };
    Some(control)
}

/// Moves the capture timeout one step, staying within [1 s, 5 s].
pub fn adjust_timeout(current: Duration, longer: bool) -> Duration {
    let next = if longer {
        current + CAPTURE_TIMEOUT_STEP
    } else {
        current.saturating_sub(CAPTURE_TIMEOUT_STEP)
    };
    next.clamp(MIN_CAPTURE_TIMEOUT, MAX_CAPTURE_TIMEOUT)
}

/// One-line help shown in the window.
pub const KEY_HELP: &str =
    "space: play  n: new match  k: manual  1-4: AI  z/x/c: R/P/S  +/-: time  q: quit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_map() {
        let t = Duration::from_secs(3);
        assert_eq!(control_for_key('q', t), Some(Control::Quit));
        assert_eq!(control_for_key(' ', t), Some(Control::StartRound));
        assert_eq!(control_for_key('N', t), Some(Control::RestartMatch));
        assert_eq!(
            control_for_key('1', t),
            Some(Control::ChangeStrategy(StrategyKind::Random))
        );
        assert_eq!(
            control_for_key('4', t),
            Some(Control::ChangeStrategy(StrategyKind::Adaptive))
        );
        assert_eq!(control_for_key('5', t), None);
        assert_eq!(control_for_key('x', t), Some(Control::InjectMove(Move::Paper)));
        assert_eq!(control_for_key('?', t), None);
    }

    #[test]
    fn test_timeout_adjustment_is_clamped() {
        let up = control_for_key('+', Duration::from_millis(3000));
        assert_eq!(up, Some(Control::SetCaptureTimeout(Duration::from_millis(3500))));

        assert_eq!(adjust_timeout(Duration::from_millis(5000), true), MAX_CAPTURE_TIMEOUT);
        assert_eq!(adjust_timeout(Duration::from_millis(1200), false), MIN_CAPTURE_TIMEOUT);
        assert_eq!(adjust_timeout(Duration::ZERO, false), MIN_CAPTURE_TIMEOUT);
    }
}
