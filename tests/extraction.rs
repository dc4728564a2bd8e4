use std::collections::HashMap;
use std::path::Path;

use approx::assert_abs_diff_eq;
use lipcontour::features::{FeatureExtractor, SequentialIds, UuidIds};
use lipcontour::ingest::load_attempts;
use lipcontour::types::{
    Attempt, Frame, Point, LOWER_LIP_BOTTOM, LOWER_LIP_TOP, UPPER_LIP_BOTTOM, UPPER_LIP_TOP,
};

const FIXTURE_DIR: &str = "tests/fixtures/attempts";

/// Lips drawn so that lip_gap_norm = gap / width and mouth_height_norm = height / width.
fn frame(index: i64, gap: f64, height: f64, width: f64) -> Frame {
    Frame {
        timestamp: Some(index as f64 * 0.033),
        frame_index: Some(index),
        ..Frame::default()
    }
    .with_contour(
        UPPER_LIP_BOTTOM,
        vec![
            Point::new(0.0, 10.0),
            Point::new(width / 2.0, 10.0),
            Point::new(width, 10.0),
        ],
    )
    .with_contour(
        LOWER_LIP_TOP,
        vec![
            Point::new(0.0, 10.0 + gap),
            Point::new(width / 2.0, 10.0 + gap),
            Point::new(width, 10.0 + gap),
        ],
    )
    .with_contour(
        UPPER_LIP_TOP,
        vec![Point::new(width * 0.25, 5.0), Point::new(width * 0.75, 5.0)],
    )
    .with_contour(
        LOWER_LIP_BOTTOM,
        vec![
            Point::new(width * 0.25, 5.0 + height),
            Point::new(width * 0.75, 5.0 + height),
        ],
    )
}

fn attempt(label: &str, frames: Vec<Frame>) -> Attempt {
    Attempt {
        phoneme: "O".to_string(),
        quality_label: label.to_string(),
        frames,
    }
}

#[test]
fn invalid_first_frame_is_skipped_and_deltas_chain() {
    let mut first = frame(0, 2.0, 5.0, 10.0);
    first
        .mouth_contours
        .insert(UPPER_LIP_BOTTOM.to_string(), Some(Vec::new()));
    let attempt = attempt(
        "good",
        vec![first, frame(1, 2.0, 5.0, 10.0), frame(2, 2.5, 4.5, 10.0)],
    );

    let rows = FeatureExtractor::new().extract_attempt(&attempt, &mut SequentialIds::new());

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].frame_index, Some(1));
    assert_abs_diff_eq!(rows[0].lip_gap_norm, 0.2, epsilon = 1e-12);
    assert_abs_diff_eq!(rows[0].mouth_height_norm, 0.5, epsilon = 1e-12);
    assert_eq!(rows[0].lip_gap_delta_norm, 0.0);
    assert_eq!(rows[0].mouth_height_delta_norm, 0.0);
    assert_eq!(rows[0].lip_gap_prev_norm, rows[0].lip_gap_norm);

    assert_eq!(rows[1].frame_index, Some(2));
    assert_abs_diff_eq!(rows[1].lip_gap_delta_norm, 0.05, epsilon = 1e-12);
    assert_abs_diff_eq!(rows[1].mouth_height_delta_norm, -0.05, epsilon = 1e-12);
    assert_eq!(rows[1].lip_gap_prev_norm, rows[0].lip_gap_norm);
    assert_abs_diff_eq!(rows[1].round_ratio, 10.0 / 4.5, epsilon = 1e-12);
}

#[test]
fn attempt_with_only_invalid_frames_yields_nothing() {
    let attempt = attempt(
        "bad",
        vec![Frame::default(), frame(1, 2.0, 5.0, 0.0), Frame::default()],
    );
    let rows = FeatureExtractor::new().extract_attempt(&attempt, &mut SequentialIds::new());
    assert!(rows.is_empty());
}

#[test]
fn rows_share_attempt_level_fields() {
    let attempts = vec![
        attempt("good", vec![frame(0, 1.0, 4.0, 10.0), frame(1, 1.5, 4.0, 10.0)]),
        attempt("bad", vec![frame(0, 3.0, 6.0, 10.0), frame(1, 3.5, 6.5, 10.0)]),
    ];
    let table = FeatureExtractor::new().extract_all(&attempts, &mut UuidIds);
    assert_eq!(table.len(), 4);

    let mut by_attempt: HashMap<&str, (&str, &str)> = HashMap::new();
    for row in &table {
        let entry = by_attempt
            .entry(row.attempt_id.as_str())
            .or_insert((row.phoneme.as_str(), row.class_label.as_str()));
        assert_eq!(*entry, (row.phoneme.as_str(), row.class_label.as_str()));
    }
    assert_eq!(by_attempt.len(), 2, "one id per attempt, not per frame");
}

#[test]
fn first_valid_frame_has_zero_deltas_in_every_attempt() {
    let attempts: Vec<Attempt> = (0..5)
        .map(|i| {
            attempt(
                "good",
                vec![
                    Frame::default(),
                    frame(1, 1.0 + i as f64, 4.0, 10.0),
                    frame(2, 2.0, 4.0 + i as f64, 10.0),
                ],
            )
        })
        .collect();
    let table = FeatureExtractor::new().extract_all(&attempts, &mut SequentialIds::new());
    for row in table.iter().filter(|row| row.frame_index == Some(1)) {
        assert_eq!(row.lip_gap_delta_norm, 0.0);
        assert_eq!(row.mouth_height_delta_norm, 0.0);
    }
}

#[test]
fn closed_mouth_produces_infinite_round_ratio() {
    let attempt = attempt("good", vec![frame(0, 0.0, 0.0, 10.0)]);
    let rows = FeatureExtractor::new().extract_attempt(&attempt, &mut SequentialIds::new());
    assert_eq!(rows.len(), 1);
    assert!(rows[0].round_ratio.is_infinite());
    assert!(!rows[0].is_clean());
}

#[test]
fn fixture_file_loads_and_extracts() {
    let report = load_attempts(&[Path::new(FIXTURE_DIR).to_path_buf()], "jsonl")
        .expect("fixture directory loads");
    assert_eq!(report.files_read, 1);
    assert_eq!(report.attempts.len(), 2);
    assert_eq!(report.skipped_lines, 1);

    let table = FeatureExtractor::new().extract_all(&report.attempts, &mut SequentialIds::new());
    // second frame of the first attempt has no lower lip top
    assert_eq!(table.len(), 3);
    assert_eq!(table[0].attempt_id, "attempt-000001");
    assert_eq!(table[2].attempt_id, "attempt-000002");
    assert_abs_diff_eq!(table[0].lip_gap_norm, 0.25, epsilon = 1e-12);
    assert_abs_diff_eq!(table[1].lip_gap_delta_norm, 0.125, epsilon = 1e-12);
}
