use crate::types::Point;

/// Mean of every point carrying both coordinates.
pub fn centroid(points: &[Point]) -> Option<(f64, f64)> {
    let (sx, sy, n) = points
        .iter()
        .filter_map(Point::coords)
        .fold((0.0, 0.0, 0usize), |(sx, sy, n), (x, y)| (sx + x, sy + y, n + 1));
    if n == 0 {
        return None;
    }
    Some((sx / n as f64, sy / n as f64))
}

pub fn vertical_distance(a: Option<(f64, f64)>, b: Option<(f64, f64)>) -> Option<f64> {
    Some((a?.1 - b?.1).abs())
}

pub fn euclidean_distance(a: Option<(f64, f64)>, b: Option<(f64, f64)>) -> Option<f64> {
    let (ax, ay) = a?;
    let (bx, by) = b?;
    Some((ax - bx).hypot(ay - by))
}

/// Leftmost and rightmost points of a contour.
///
/// A point without `x` never wins either side unless every point lacks it.
/// Ties keep the earliest point. Returns `None` when the contour is empty or
/// either corner is missing a coordinate.
pub fn mouth_corners(points: &[Point]) -> Option<((f64, f64), (f64, f64))> {
    let first = points.first()?;
    let mut left = first;
    let mut right = first;
    for point in &points[1..] {
        if point.x.unwrap_or(f64::INFINITY) < left.x.unwrap_or(f64::INFINITY) {
            left = point;
        }
        if point.x.unwrap_or(f64::NEG_INFINITY) > right.x.unwrap_or(f64::NEG_INFINITY) {
            right = point;
        }
    }
    Some((left.coords()?, right.coords()?))
}
