//! Extent arithmetic shared by every canvas kind.

use crate::models::ScanRange;

/// Margin added below the smallest primary coordinate of the data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Padding {
    /// Subtract the pad, never going below zero.
    Clamped(f64),
    /// Subtract the pad unless that reaches zero, then use no pad at all.
    KeepWhenNonPositive(f64),
}

impl Padding {
    pub fn pad(&self) -> f64 {
        match *self {
            Padding::Clamped(pad) | Padding::KeepWhenNonPositive(pad) => pad,
        }
    }

    fn lower(&self, min: f64) -> f64 {
        match *self {
            Padding::Clamped(pad) => (min - pad).max(0.0),
            Padding::KeepWhenNonPositive(pad) => {
                if min - pad > 0.0 {
                    min - pad
                } else {
                    min
                }
            }
        }
    }
}

/// Smallest finite value, `None` when there is none.
pub fn finite_min<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .reduce(f64::min)
}

/// Largest finite value, `None` when there is none.
pub fn finite_max<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .reduce(f64::max)
}

/// Lower end of the default extent.
pub fn min_coordinate(min_x: Option<f64>, scan_range: Option<ScanRange>, padding: Padding) -> f64 {
    let padded = min_x.map_or(0.0, |x| padding.lower(x.max(0.0)));
    match scan_range {
        Some(range) => range.lower_bound.min(padded),
        None => padded,
    }
}

/// Upper end of the default extent.
pub fn max_coordinate(max_x: Option<f64>, scan_range: Option<ScanRange>, padding: Padding) -> f64 {
    let max_x = max_x.unwrap_or(0.0);
    let padded = (max_x * 1.1).min(max_x + padding.pad());
    match scan_range {
        Some(range) => padded.min(range.upper_bound),
        None => padded,
    }
}

/// Intensity axis domain for the visible window. Falls back to the global
/// maximum when nothing is visible, and to 1 when that is 0 too.
pub fn intensity_domain(visible_max: f64, global_max: f64) -> (f64, f64) {
    let top = if visible_max > 0.0 {
        visible_max
    } else if global_max > 0.0 {
        global_max
    } else {
        1.0
    };
    (0.0, top * 1.05)
}

/// Time axis domain around a time span.
pub fn time_domain(span: Option<(f64, f64)>) -> (f64, f64) {
    match span {
        Some((lo, hi)) => (lo * 0.95, hi * 1.05),
        None => (0.0, 1.0),
    }
}

/// Domain of the secondary axis on first render.
pub fn initial_domain(min_y: f64, max_y: f64) -> (f64, f64) {
    (min_y * 0.75, max_y * 1.25)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_extent_with_scan_range() {
        let scan = Some(ScanRange::new(80.0, 2000.0));
        // Test: 1000 + 50 is tighter than 1000 * 1.1
        assert_eq!(max_coordinate(Some(1000.0), scan, Padding::Clamped(50.0)), 1050.0);
        assert_eq!(min_coordinate(Some(100.0), scan, Padding::Clamped(50.0)), 50.0);
    }

    #[test]
    fn test_scan_range_caps_extent() {
        let scan = Some(ScanRange::new(200.0, 1200.0));
        assert_eq!(max_coordinate(Some(1190.0), scan, Padding::Clamped(50.0)), 1200.0);
        assert_eq!(min_coordinate(Some(400.0), scan, Padding::Clamped(50.0)), 200.0);
    }

    #[test]
    fn test_small_values_clamp_at_zero() {
        assert_eq!(min_coordinate(Some(20.0), None, Padding::Clamped(50.0)), 0.0);
        assert!((max_coordinate(Some(20.0), None, Padding::Clamped(50.0)) - 22.0).abs() < 1e-9);
        // Test: A time axis keeps its minimum rather than dropping to zero
        assert_eq!(min_coordinate(Some(0.05), None, Padding::KeepWhenNonPositive(0.1)), 0.05);
        assert!((min_coordinate(Some(1.5), None, Padding::KeepWhenNonPositive(0.1)) - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_empty_layers_yield_zero_extent() {
        let scan = Some(ScanRange::new(80.0, 2000.0));
        assert_eq!(min_coordinate(None, scan, Padding::Clamped(50.0)), 0.0);
        assert_eq!(max_coordinate(None, scan, Padding::Clamped(50.0)), 0.0);
    }

    #[test]
    fn test_finite_reductions_skip_nan() {
        assert_eq!(finite_max([f64::NAN, 3.0, 1.0]), Some(3.0));
        assert_eq!(finite_min([f64::NAN, 3.0, 1.0]), Some(1.0));
        assert_eq!(finite_max([f64::NAN]), None);
    }

    #[test]
    fn test_intensity_domain_fallbacks() {
        assert_eq!(intensity_domain(50.0, 80.0), (0.0, 52.5));
        assert_eq!(intensity_domain(0.0, 80.0), (0.0, 84.0));
        assert_eq!(intensity_domain(0.0, 0.0), (0.0, 1.05));
    }
}
