use std::fmt::Write;

use super::scale::LinearScale;
use crate::models::PointLike;

/// Offset of the zero-intensity feet placed around each centroid.
pub const STICK_HALF_WIDTH: f64 = 1e-6;

/// Turns centroids into a profile-like polyline: every peak becomes a
/// zero, apex, zero triple so a single path draws all sticks.
pub fn sticks<P: PointLike>(points: &[P]) -> Vec<(f64, f64)> {
    let mut coords = Vec::with_capacity(points.len() * 3);
    for p in points {
        let x = p.x();
        coords.push((x - STICK_HALF_WIDTH, 0.0));
        coords.push((x, p.y()));
        coords.push((x + STICK_HALF_WIDTH, 0.0));
    }
    coords
}

/// SVG path data for a polyline through data coordinates.
pub fn line_path<I>(coords: I, x_scale: &LinearScale, y_scale: &LinearScale) -> String
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut d = String::new();
    for (i, (x, y)) in coords.into_iter().enumerate() {
        let command = if i == 0 { 'M' } else { 'L' };
        // Writing into a String cannot fail
        let _ = write!(d, "{}{:.2},{:.2}", command, x_scale.apply(x), y_scale.apply(y));
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MzPoint;

    #[test]
    fn test_sticks_bracket_each_peak() {
        let coords = sticks(&[MzPoint::new(100.0, 5.0), MzPoint::new(200.0, 7.0)]);
        assert_eq!(coords.len(), 6);
        assert_eq!(coords[1], (100.0, 5.0));
        assert_eq!(coords[0].1, 0.0);
        assert_eq!(coords[5].1, 0.0);
    }

    #[test]
    fn test_line_path() {
        let x = LinearScale::new((0.0, 10.0), (0.0, 100.0));
        let y = LinearScale::new((0.0, 1.0), (50.0, 0.0));
        let d = line_path(vec![(0.0, 0.0), (5.0, 1.0)], &x, &y);
        assert_eq!(d, "M0.00,50.00L50.00,0.00");
        assert!(line_path(Vec::new(), &x, &y).is_empty());
    }
}
