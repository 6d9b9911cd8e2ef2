//! Nearest-coordinate lookups over ascending sequences.
//!
//! Everything here works on an index-addressable coordinate accessor so the
//! same search backs every layer kind, whatever its point type.

/// Below this absolute difference the bisection stops early and hands over
/// to the linear refinement.
pub const NEAR_TIE: f64 = 1e-3;

/// Index of the element whose coordinate is closest to `query`.
///
/// `coordinate` must be ascending over `0..len`. Queries outside the covered
/// range clamp to the first or last index. An empty sequence yields `0`.
pub fn nearest_index<F>(len: usize, coordinate: F, query: f64) -> usize
where
    F: Fn(usize) -> f64,
{
    if len == 0 {
        return 0;
    }
    let last = len - 1;
    if query >= coordinate(last) {
        return last;
    }
    if query <= coordinate(0) {
        return 0;
    }

    // Invariant: coordinate(lo) <= query < coordinate(hi)
    let mut lo = 0;
    let mut hi = last;
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        let diff = coordinate(mid) - query;
        if diff.abs() < NEAR_TIE {
            return refine(len, &coordinate, query, mid);
        }
        if diff > 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    refine(len, &coordinate, query, lo)
}

/// Walks outwards from `start` in both directions while the error keeps
/// shrinking, stepping over runs of equal error (duplicate coordinates).
fn refine<F>(len: usize, coordinate: &F, query: f64, start: usize) -> usize
where
    F: Fn(usize) -> f64,
{
    let mut best = start;
    let mut best_err = (coordinate(start) - query).abs();

    let mut i = start;
    while i > 0 {
        i -= 1;
        let err = (coordinate(i) - query).abs();
        if err < best_err {
            best = i;
            best_err = err;
        } else if err > best_err {
            break;
        }
    }

    let mut i = start;
    while i + 1 < len {
        i += 1;
        let err = (coordinate(i) - query).abs();
        if err < best_err {
            best = i;
            best_err = err;
        } else if err > best_err {
            break;
        }
    }
    best
}

/// Index range `[begin, end)` of the elements with coordinate in `[lo, hi)`.
pub fn window_bounds<F>(len: usize, coordinate: F, lo: f64, hi: f64) -> (usize, usize)
where
    F: Fn(usize) -> f64,
{
    if len == 0 {
        return (0, 0);
    }
    let mut begin = nearest_index(len, &coordinate, lo);
    while begin > 0 && coordinate(begin - 1) >= lo {
        begin -= 1;
    }
    while begin < len && coordinate(begin) < lo {
        begin += 1;
    }
    let mut end = begin;
    while end < len && coordinate(end) < hi {
        end += 1;
    }
    (begin, end)
}

/// Whether `value` lies within relative error `tolerance` of `query`.
pub fn within_relative(value: f64, query: f64, tolerance: f64) -> bool {
    ((value - query) / query).abs() < tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nearest(values: &[f64], query: f64) -> usize {
        nearest_index(values.len(), |i| values[i], query)
    }

    #[test]
    fn test_nearest_basic() {
        let values = [100.0, 200.0, 300.0, 400.0, 500.0];
        assert_eq!(nearest(&values, 240.0), 1);
        assert_eq!(nearest(&values, 260.0), 2);
        assert_eq!(nearest(&values, 300.0), 2);
    }

    #[test]
    fn test_nearest_clamps_out_of_range() {
        // Test: Queries below/above the data clamp to the extremes
        let values = [100.0, 200.0, 300.0];
        assert_eq!(nearest(&values, -5.0), 0);
        assert_eq!(nearest(&values, 1e9), 2);
    }

    #[test]
    fn test_nearest_empty_and_single() {
        assert_eq!(nearest(&[], 10.0), 0);
        assert_eq!(nearest(&[42.0], 10.0), 0);
        assert_eq!(nearest(&[42.0], 100.0), 0);
    }

    #[test]
    fn test_nearest_with_plateau() {
        // Test: A run of duplicates next to the query must not hide the
        // closer element behind it
        let values = [1.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0004, 3.0];
        assert_eq!(nearest(&values, 2.0003), 6);
        let idx = nearest(&values, 1.9);
        assert_eq!(values[idx], 2.0);
    }

    #[test]
    fn test_window_bounds_half_open() {
        let values = [100.0, 200.0, 300.0, 400.0, 500.0];
        assert_eq!(window_bounds(values.len(), |i| values[i], 200.0, 400.0), (1, 3));
        assert_eq!(window_bounds(values.len(), |i| values[i], 0.0, 1000.0), (0, 5));
        assert_eq!(window_bounds(values.len(), |i| values[i], 600.0, 700.0), (5, 5));
        assert_eq!(window_bounds(values.len(), |i| values[i], 400.0, 200.0).0, 3);
    }

    #[test]
    fn test_window_bounds_includes_leading_duplicates() {
        let values = [1.0, 2.0, 2.0, 2.0, 3.0];
        assert_eq!(window_bounds(values.len(), |i| values[i], 2.0, 3.0), (1, 4));
    }

    #[test]
    fn test_within_relative() {
        assert!(within_relative(500.001, 500.0, 1e-5));
        assert!(!within_relative(500.1, 500.0, 1e-5));
    }
}
