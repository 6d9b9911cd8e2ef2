use std::sync::Arc;

use crate::models::PointLike;

/// Points sorted by their primary coordinate, shared between a layer and
/// all of its slices.
///
/// A slice is a window `[begin, end)` into the same buffer, so zooming never
/// copies point data.
#[derive(Debug, Clone)]
pub struct SortedPoints<P> {
    data: Arc<[P]>,
    begin: usize,
    end: usize,
}

impl<P> Default for SortedPoints<P> {
    fn default() -> Self {
        Self {
            data: Arc::from(Vec::new()),
            begin: 0,
            end: 0,
        }
    }
}

impl<P: PointLike> SortedPoints<P> {
    pub fn new(mut points: Vec<P>) -> Self {
        points.sort_by(|a, b| a.x().total_cmp(&b.x()));
        let end = points.len();
        Self {
            data: Arc::from(points),
            begin: 0,
            end,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    pub fn as_slice(&self) -> &[P] {
        &self.data[self.begin..self.end]
    }

    pub fn get(&self, i: usize) -> Option<&P> {
        self.as_slice().get(i)
    }

    pub fn coordinate(&self, i: usize) -> f64 {
        self.get(i).map_or(f64::NAN, |p| p.x())
    }

    pub fn first(&self) -> Option<&P> {
        self.as_slice().first()
    }

    pub fn last(&self) -> Option<&P> {
        self.as_slice().last()
    }

    /// Window `[begin, end)` relative to this view, clamped to its length.
    pub fn slice(&self, begin: usize, end: usize) -> Self {
        let len = self.len();
        let end = end.min(len);
        let begin = begin.min(end);
        Self {
            data: Arc::clone(&self.data),
            begin: self.begin + begin,
            end: self.begin + end,
        }
    }

    /// Largest `y`, `0` when empty. NaNs are skipped.
    pub fn max_y(&self) -> f64 {
        self.as_slice().iter().map(|p| p.y()).fold(0.0, f64::max)
    }

    pub fn shares_buffer(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, P> {
        self.as_slice().iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MzPoint;

    #[test]
    fn test_sorted_on_construction() {
        let points = SortedPoints::new(vec![
            MzPoint::new(300.0, 1.0),
            MzPoint::new(100.0, 2.0),
            MzPoint::new(200.0, 3.0),
        ]);
        let xs: Vec<f64> = points.iter().map(|p| p.mz).collect();
        assert_eq!(xs, vec![100.0, 200.0, 300.0]);
        assert_eq!(points.max_y(), 3.0);
    }

    #[test]
    fn test_slices_share_the_buffer() {
        let points = SortedPoints::new((0..10).map(|i| MzPoint::new(i as f64, 1.0)).collect());
        let slice = points.slice(2, 8);
        let nested = slice.slice(1, 100);
        assert!(slice.shares_buffer(&points));
        assert_eq!(slice.len(), 6);
        // Test: Nested slices are relative to their parent and clamp
        assert_eq!(nested.len(), 5);
        assert_eq!(nested.coordinate(0), 3.0);
        assert!(points.slice(7, 3).is_empty());
    }
}
