//! Core types for the lip feature pipeline

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Contour names read by the feature extractor.
pub const UPPER_LIP_BOTTOM: &str = "upperLipBottom";
pub const LOWER_LIP_TOP: &str = "lowerLipTop";
pub const UPPER_LIP_TOP: &str = "upperLipTop";
pub const LOWER_LIP_BOTTOM: &str = "lowerLipBottom";

/// Numeric feature columns, in matrix column order.
pub const FEATURE_COLUMNS: [&str; 6] = [
    "lip_gap_norm",
    "mouth_height_norm",
    "round_ratio",
    "lip_gap_prev_norm",
    "lip_gap_delta_norm",
    "mouth_height_delta_norm",
];

/// A landmark coordinate. Either axis may be absent in recorded data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
        }
    }

    /// Both coordinates, if present.
    pub fn coords(&self) -> Option<(f64, f64)> {
        Some((self.x?, self.y?))
    }
}

/// Ordered points outlining one anatomical curve of the mouth.
pub type Contour = Vec<Point>;

/// One capture instant within an attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub frame_index: Option<i64>,
    #[serde(
        default,
        rename = "mouthContours",
        deserialize_with = "null_as_default"
    )]
    pub mouth_contours: BTreeMap<String, Option<Contour>>,
}

impl Frame {
    /// Returns the named contour, treating missing or null entries as empty.
    pub fn contour(&self, name: &str) -> &[Point] {
        self.mouth_contours
            .get(name)
            .and_then(|contour| contour.as_deref())
            .unwrap_or(&[])
    }

    pub fn with_contour(mut self, name: &str, points: Contour) -> Self {
        self.mouth_contours.insert(name.to_string(), Some(points));
        self
    }
}

/// One recorded pronunciation trial as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub phoneme: String,
    pub quality_label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub frames: Vec<Frame>,
}

/// One output row: a single valid frame of an attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub attempt_id: String,
    pub phoneme: String,
    pub class_label: String,
    pub timestamp: Option<f64>,
    pub frame_index: Option<i64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub lip_gap_norm: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub mouth_height_norm: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub round_ratio: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub lip_gap_prev_norm: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub lip_gap_delta_norm: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub mouth_height_delta_norm: f64,
}

impl FeatureRow {
    /// Feature values in [`FEATURE_COLUMNS`] order.
    pub fn features(&self) -> [f64; 6] {
        [
            self.lip_gap_norm,
            self.mouth_height_norm,
            self.round_ratio,
            self.lip_gap_prev_norm,
            self.lip_gap_delta_norm,
            self.mouth_height_delta_norm,
        ]
    }

    /// True when every feature is finite and the row carries its attempt and label.
    pub fn is_clean(&self) -> bool {
        self.features().iter().all(|value| value.is_finite())
            && !self.attempt_id.trim().is_empty()
            && !self.class_label.trim().is_empty()
    }
}

/// Full ordered feature table across all processed attempts.
pub type FeatureTable = Vec<FeatureRow>;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Empty cells read back as NaN so cleaning can drop them.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_parses_with_missing_and_null_contours() {
        let json = r#"{
            "timestamp": 1.5,
            "frame_index": 3,
            "mouthContours": {"upperLipBottom": [{"x": 1.0, "y": 2.0}, {"x": 3.0}], "lowerLipTop": null}
        }"#;
        let frame: Frame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.timestamp, Some(1.5));
        assert_eq!(frame.frame_index, Some(3));
        assert_eq!(frame.contour(UPPER_LIP_BOTTOM).len(), 2);
        assert_eq!(frame.contour(UPPER_LIP_BOTTOM)[1].coords(), None);
        assert!(frame.contour(LOWER_LIP_TOP).is_empty());
        assert!(frame.contour(UPPER_LIP_TOP).is_empty());
    }

    #[test]
    fn attempt_accepts_null_frames() {
        let attempt: Attempt =
            serde_json::from_str(r#"{"phoneme": "A", "quality_label": "good", "frames": null}"#)
                .unwrap();
        assert!(attempt.frames.is_empty());
    }

    #[test]
    fn infinite_ratio_is_not_clean() {
        let row = FeatureRow {
            attempt_id: "a".into(),
            phoneme: "A".into(),
            class_label: "good".into(),
            timestamp: None,
            frame_index: None,
            lip_gap_norm: 0.1,
            mouth_height_norm: 0.0,
            round_ratio: f64::INFINITY,
            lip_gap_prev_norm: 0.1,
            lip_gap_delta_norm: 0.0,
            mouth_height_delta_norm: 0.0,
        };
        assert!(!row.is_clean());
        let finite = FeatureRow {
            round_ratio: 2.0,
            ..row.clone()
        };
        assert!(finite.is_clean());
        let unlabeled = FeatureRow {
            class_label: " ".into(),
            ..finite
        };
        assert!(!unlabeled.is_clean());
    }
}
