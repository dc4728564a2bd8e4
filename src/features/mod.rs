pub mod geometry;
mod ids;

pub use ids::{AttemptIdSource, SequentialIds, UuidIds};

use geometry::{centroid, euclidean_distance, mouth_corners, vertical_distance};
use tracing::debug;

use crate::types::{
    Attempt, FeatureRow, FeatureTable, Frame, LOWER_LIP_BOTTOM, LOWER_LIP_TOP, UPPER_LIP_BOTTOM,
    UPPER_LIP_TOP,
};

/// Raw mouth measurements of a single frame that passed the validity gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGeometry {
    pub lip_gap: f64,
    pub mouth_height: f64,
    pub mouth_width: f64,
}

impl FrameGeometry {
    /// Measures a frame, returning `None` when it cannot yield usable features.
    pub fn measure(frame: &Frame) -> Option<Self> {
        let upper_lip_bottom = frame.contour(UPPER_LIP_BOTTOM);
        let lower_lip_top = frame.contour(LOWER_LIP_TOP);

        let lip_gap = vertical_distance(centroid(upper_lip_bottom), centroid(lower_lip_top))?;
        let mouth_height = vertical_distance(
            centroid(frame.contour(UPPER_LIP_TOP)),
            centroid(frame.contour(LOWER_LIP_BOTTOM)),
        )?;

        let reference = if lower_lip_top.is_empty() {
            upper_lip_bottom
        } else {
            lower_lip_top
        };
        let (left, right) = mouth_corners(reference)?;
        let mouth_width = euclidean_distance(Some(left), Some(right))?;
        if mouth_width == 0.0 || !mouth_width.is_finite() {
            return None;
        }

        Some(Self {
            lip_gap,
            mouth_height,
            mouth_width,
        })
    }

    pub fn lip_gap_norm(&self) -> f64 {
        self.lip_gap / self.mouth_width
    }

    pub fn mouth_height_norm(&self) -> f64 {
        self.mouth_height / self.mouth_width
    }

    /// Width over height; positive infinity for a closed mouth.
    pub fn round_ratio(&self) -> f64 {
        if self.mouth_height > 0.0 {
            self.mouth_width / self.mouth_height
        } else {
            f64::INFINITY
        }
    }
}

/// Width-normalised features of one valid frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameFeatures {
    pub timestamp: Option<f64>,
    pub frame_index: Option<i64>,
    pub lip_gap_norm: f64,
    pub mouth_height_norm: f64,
    pub round_ratio: f64,
    pub lip_gap_prev_norm: f64,
    pub lip_gap_delta_norm: f64,
    pub mouth_height_delta_norm: f64,
}

impl FrameFeatures {
    /// Builds features, chaining deltas from the last valid frame if there is one.
    pub fn from_geometry(
        frame: &Frame,
        geometry: &FrameGeometry,
        previous: Option<&FrameFeatures>,
    ) -> Self {
        let lip_gap_norm = geometry.lip_gap_norm();
        let mouth_height_norm = geometry.mouth_height_norm();
        let (lip_gap_prev_norm, mouth_height_prev_norm) = previous
            .map(|prev| (prev.lip_gap_norm, prev.mouth_height_norm))
            .unwrap_or((lip_gap_norm, mouth_height_norm));

        Self {
            timestamp: frame.timestamp,
            frame_index: frame.frame_index,
            lip_gap_norm,
            mouth_height_norm,
            round_ratio: geometry.round_ratio(),
            lip_gap_prev_norm,
            lip_gap_delta_norm: lip_gap_norm - lip_gap_prev_norm,
            mouth_height_delta_norm: mouth_height_norm - mouth_height_prev_norm,
        }
    }

    fn into_row(self, attempt_id: &str, attempt: &Attempt) -> FeatureRow {
        FeatureRow {
            attempt_id: attempt_id.to_string(),
            phoneme: attempt.phoneme.clone(),
            class_label: attempt.quality_label.clone(),
            timestamp: self.timestamp,
            frame_index: self.frame_index,
            lip_gap_norm: self.lip_gap_norm,
            mouth_height_norm: self.mouth_height_norm,
            round_ratio: self.round_ratio,
            lip_gap_prev_norm: self.lip_gap_prev_norm,
            lip_gap_delta_norm: self.lip_gap_delta_norm,
            mouth_height_delta_norm: self.mouth_height_delta_norm,
        }
    }
}

/// Per-frame features for the valid frames of `frames`, in order.
///
/// Invalid frames are skipped and leave the previous-frame state untouched.
pub fn frame_features(frames: &[Frame]) -> Vec<FrameFeatures> {
    frames
        .iter()
        .filter_map(|frame| FrameGeometry::measure(frame).map(|geometry| (frame, geometry)))
        .scan(None::<FrameFeatures>, |previous, (frame, geometry)| {
            let features = FrameFeatures::from_geometry(frame, &geometry, previous.as_ref());
            *previous = Some(features);
            Some(features)
        })
        .collect()
}

/// Turns recorded attempts into flat feature rows.
#[derive(Debug, Default)]
pub struct FeatureExtractor {}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows for one attempt under an already assigned id.
    pub fn extract_with_id(&self, attempt: &Attempt, attempt_id: &str) -> Vec<FeatureRow> {
        frame_features(&attempt.frames)
            .into_iter()
            .map(|features| features.into_row(attempt_id, attempt))
            .collect()
    }

    /// Rows for one attempt, drawing a single fresh id from `ids`.
    pub fn extract_attempt(
        &self,
        attempt: &Attempt,
        ids: &mut impl AttemptIdSource,
    ) -> Vec<FeatureRow> {
        let attempt_id = ids.next_id();
        let rows = self.extract_with_id(attempt, &attempt_id);
        debug!(
            attempt_id = %attempt_id,
            phoneme = %attempt.phoneme,
            frames = attempt.frames.len(),
            rows = rows.len(),
            "extracted attempt"
        );
        rows
    }

    /// Rows for every attempt, in input order.
    pub fn extract_all(
        &self,
        attempts: &[Attempt],
        ids: &mut impl AttemptIdSource,
    ) -> FeatureTable {
        attempts
            .iter()
            .flat_map(|attempt| self.extract_attempt(attempt, &mut *ids))
            .collect()
    }
}
