use rps_hand_detector::{Frame, HandDetector, PixelFormat, StabilityGate};
use rps_shared::{GameConfig, Move, RoiRect};

const WIDTH: usize = 320;
const HEIGHT: usize = 240;
const SKIN: [u8; 3] = [180, 150, 120];
const BACKGROUND: [u8; 3] = [50, 50, 200];

fn test_config() -> GameConfig {
    GameConfig {
        roi: RoiRect::new(0, 0, WIDTH as u32, HEIGHT as u32),
        mirror_input: false,
        profile_switch_frames: 5,
        ..GameConfig::default()
    }
}

/// Draws a synthetic RGB frame: skin-coloured pixels wherever `is_hand` holds.
fn draw_frame(is_hand: impl Fn(usize, usize) -> bool) -> Frame {
    let mut data = Vec::with_capacity(WIDTH * HEIGHT * 3);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let color = if is_hand(x, y) { SKIN } else { BACKGROUND };
            data.extend_from_slice(&color);
        }
    }
    Frame::new(WIDTH as u32, HEIGHT as u32, PixelFormat::Rgb, data)
}

fn in_rect(x: usize, y: usize, (x0, y0, x1, y1): (usize, usize, usize, usize)) -> bool {
    x >= x0 && x < x1 && y >= y0 && y < y1
}

/// Closed fist: a filled disc
fn fist_frame() -> Frame {
    draw_frame(|x, y| {
        let dx = x as i32 - 160;
        let dy = y as i32 - 130;
        dx * dx + dy * dy <= 60 * 60
    })
}

/// Two raised fingers on a narrow palm, flush with its sides
fn scissors_frame() -> Frame {
    draw_frame(|x, y| {
        in_rect(x, y, (120, 130, 200, 220))
            || in_rect(x, y, (120, 40, 145, 130))
            || in_rect(x, y, (175, 40, 200, 130))
    })
}

/// Five raised fingers across the full palm width
fn open_hand_frame() -> Frame {
    draw_frame(|x, y| {
        if in_rect(x, y, (60, 130, 260, 220)) {
            return true;
        }
        (0..5).any(|i| {
            let x0 = 60 + i * 44;
            in_rect(x, y, (x0, 40, x0 + 24, 130))
        })
    })
}

fn empty_frame() -> Frame {
    draw_frame(|_, _| false)
}

#[test]
fn test_fist_is_rock() {
    let mut detector = HandDetector::new(&test_config()).unwrap();
    let analysis = detector.analyze(&fist_frame()).unwrap();

    let features = analysis.features.expect("fist should produce a contour");
    assert_eq!(features.defect_count, 0);
    assert!(features.solidity > 0.9, "solidity {}", features.solidity);
    assert!(features.circularity > 0.7, "circularity {}", features.circularity);
    assert_eq!(analysis.provisional, Move::Rock);
}

#[test]
fn test_two_fingers_are_scissors() {
    let mut detector = HandDetector::new(&test_config()).unwrap();
    let analysis = detector.analyze(&scissors_frame()).unwrap();

    let features = analysis.features.expect("scissors should produce a contour");
    assert_eq!(features.defect_count, 1);
    assert_eq!(analysis.provisional, Move::Scissors);
}

#[test]
fn test_open_hand_is_paper() {
    let mut detector = HandDetector::new(&test_config()).unwrap();
    let analysis = detector.analyze(&open_hand_frame()).unwrap();

    let features = analysis.features.expect("open hand should produce a contour");
    assert_eq!(features.defect_count, 4);
    assert!(features.solidity < 0.9);
    assert_eq!(analysis.provisional, Move::Paper);
}

#[test]
fn test_empty_roi_is_no_gesture() {
    let mut detector = HandDetector::new(&test_config()).unwrap();
    let analysis = detector.analyze(&empty_frame()).unwrap();

    assert!(analysis.features.is_none());
    assert_eq!(analysis.provisional, Move::None);
    assert_eq!(analysis.mask_density, 0.0);
}

#[test]
fn test_malformed_frame_is_skipped() {
    let mut detector = HandDetector::new(&test_config()).unwrap();
    let truncated = Frame::new(WIDTH as u32, HEIGHT as u32, PixelFormat::Rgb, vec![0; 100]);

    assert!(detector.analyze(&truncated).is_none());
    assert_eq!(detector.detect(&truncated), Move::None);
}

#[test]
fn test_bgr_frames_are_supported() {
    let mut detector = HandDetector::new(&test_config()).unwrap();
    let mut frame = fist_frame();
    for px in frame.data.chunks_exact_mut(3) {
        px.swap(0, 2);
    }
    frame.format = PixelFormat::Bgr;

    assert_eq!(detector.detect(&frame), Move::Rock);
}

#[test]
fn test_blank_frames_cycle_profile_once() {
    let mut detector = HandDetector::new(&test_config()).unwrap();
    let blank = empty_frame();

    for _ in 0..4 {
        detector.analyze(&blank);
    }
    assert_eq!(detector.segmenter().profile_index(), 0);
    assert_eq!(detector.segmenter().out_of_band_frames(), 4);

    let analysis = detector.analyze(&blank).unwrap();
    assert_eq!(analysis.profile_index, 1);
    assert_eq!(detector.segmenter().out_of_band_frames(), 0);
}

#[test]
fn test_classification_resets_profile_counter() {
    // The fist covers about 15% of the ROI, above this band, so its density alone
    // would extend the out-of-band run.
    let config = GameConfig {
        max_mask_density: 0.1,
        profile_switch_frames: 10,
        ..test_config()
    };
    let mut detector = HandDetector::new(&config).unwrap();

    detector.analyze(&empty_frame());
    detector.analyze(&empty_frame());
    assert_eq!(detector.segmenter().out_of_band_frames(), 2);

    let analysis = detector.analyze(&fist_frame()).unwrap();
    assert!(analysis.mask_density > config.max_mask_density);
    assert_eq!(analysis.provisional, Move::Rock);
    assert_eq!(detector.segmenter().out_of_band_frames(), 0);
    assert_eq!(detector.segmenter().profile_index(), 0);
}

#[test]
fn test_thin_streak_is_not_a_hand() {
    let mut detector = HandDetector::new(&test_config()).unwrap();
    let streak = draw_frame(|x, y| in_rect(x, y, (5, 100, 315, 112)));

    let analysis = detector.analyze(&streak).unwrap();
    assert!(analysis.features.is_none());
    assert_eq!(analysis.provisional, Move::None);
}

#[test]
fn test_gate_commits_steady_gesture_only() {
    let config = test_config();
    let mut detector = HandDetector::new(&config).unwrap();
    let mut gate = StabilityGate::new(config.stability_frame_count);

    let flicker = [fist_frame(), scissors_frame(), fist_frame(), scissors_frame()];
    for frame in &flicker {
        assert_eq!(gate.observe(detector.detect(frame)), None);
    }

    let open = open_hand_frame();
    let mut committed = None;
    for _ in 0..config.stability_frame_count {
        committed = gate.observe(detector.detect(&open));
    }
    assert_eq!(committed, Some(Move::Paper));
}
