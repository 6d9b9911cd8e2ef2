//! Sorted, searchable point collections that know how to draw themselves.
//!
//! Every concrete layer implements [`LayerLike`]; the closed [`Layer`] enum
//! dispatches to them so canvases can hold heterogeneous layer sets.

mod artist;
pub mod feature_map;
pub mod profile;
pub mod spectrum;
mod storage;

pub use artist::{
    Artist,
    Cursor,
    Frame,
    reset_brush,
};
pub use feature_map::{
    DeconvolvedFeatureEllipseLayer,
    FeatureEllipseLayer,
    FeaturePointLayer,
};
pub use profile::{
    FeatureProfileCollection,
    FeatureProfileLayer,
    TraceMode,
};
pub use spectrum::{
    CentroidLayer,
    DeconvolutedLayer,
    IsolationWindowLayer,
    LabeledPeakLayer,
    PrecursorLayer,
    ProfileLayer,
};
pub use storage::SortedPoints;

use crate::errors::CanvasError;
use crate::models::{
    Point,
    PointLike,
};
use crate::render::{
    Element,
    Scene,
};
use crate::search;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Profile,
    Centroid,
    LabeledPeaks,
    Deconvoluted,
    Precursor,
    IsolationWindow,
    FeaturePoints,
    FeatureEllipses,
    DeconvolvedFeatureEllipses,
    FeatureProfile,
    FeatureProfiles,
}

impl LayerKind {
    /// CSS class of the layer's artifacts.
    pub fn class(&self) -> &'static str {
        match self {
            LayerKind::Profile => "profile-layer",
            LayerKind::Centroid => "centroid-layer",
            LayerKind::LabeledPeaks => "labeled-peak-layer",
            LayerKind::Deconvoluted => "deconvoluted-layer",
            LayerKind::Precursor => "precursor-layer",
            LayerKind::IsolationWindow => "isolation-window-layer",
            LayerKind::FeaturePoints => "feature-map-points",
            LayerKind::FeatureEllipses => "feature-map-ellipses",
            LayerKind::DeconvolvedFeatureEllipses => "deconvolved-feature-map-ellipses",
            LayerKind::FeatureProfile => "feature-profile",
            LayerKind::FeatureProfiles => "feature-profile-collection",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerStyle {
    /// Fixed color, otherwise the canvas palette decides.
    pub color: Option<String>,
    pub stroke_width: f64,
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            color: None,
            stroke_width: 1.5,
        }
    }
}

impl LayerStyle {
    pub fn with_stroke_width(stroke_width: f64) -> Self {
        Self {
            stroke_width,
            ..Default::default()
        }
    }
}

/// A stroked, unfilled path.
pub(crate) fn stroke_path(d: String, color: &str, width: f64, class: &str) -> Element {
    Element::path(d)
        .class(class)
        .attr("stroke", color)
        .attr("stroke-width", width)
        .attr("fill", "none")
}

pub trait LayerLike {
    fn kind(&self) -> LayerKind;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Primary coordinate of the `i`th point.
    fn coordinate(&self, i: usize) -> f64;

    fn get(&self, i: usize) -> Option<Point>;

    /// A new layer of the same kind over `[begin, end)`.
    fn slice(&self, begin: usize, end: usize) -> Layer;

    fn max_y(&self) -> f64;

    /// Puts the layer on the scene. `artist` was released beforehand.
    fn draw(&self, artist: &mut Artist, frame: &mut Frame<'_>) -> Result<(), CanvasError>;

    fn points(&self) -> Vec<Point> {
        (0..self.len()).filter_map(|i| self.get(i)).collect()
    }

    fn search_x(&self, query: f64) -> usize {
        search::nearest_index(self.len(), |i| self.coordinate(i), query)
    }

    /// The nearest point if it lies within relative error `tolerance`.
    fn match_x(&self, query: f64, tolerance: f64) -> Option<Point> {
        if self.is_empty() {
            return None;
        }
        let i = self.search_x(query);
        if search::within_relative(self.coordinate(i), query, tolerance) {
            self.get(i)
        } else {
            None
        }
    }

    /// The points with primary coordinate in `[lo, hi)`.
    fn between(&self, lo: f64, hi: f64) -> Layer {
        let (begin, end) = search::window_bounds(self.len(), |i| self.coordinate(i), lo, hi);
        self.slice(begin, end)
    }

    fn min_x(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.coordinate(0) }
    }

    fn max_x(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.coordinate(self.len() - 1)
        }
    }

    fn min_y(&self) -> f64 {
        0.0
    }

    fn min_coordinate(&self) -> f64 {
        self.min_x()
    }

    fn max_coordinate(&self) -> f64 {
        self.max_x()
    }

    /// Time span covered, for layers drawn on a time axis.
    fn time_bounds(&self) -> Option<(f64, f64)> {
        None
    }

    /// First draw: picks a fresh color.
    fn init_artist(&self, artist: &mut Artist, frame: &mut Frame<'_>) -> Result<(), CanvasError> {
        artist.color = None;
        artist.pattern_color = None;
        self.draw(artist, frame)
    }

    /// Re-draws against the current scales, keeping the color.
    fn redraw(&self, artist: &mut Artist, frame: &mut Frame<'_>) -> Result<(), CanvasError> {
        self.draw(artist, frame)
    }

    fn remove(&self, artist: &mut Artist, scene: &mut Scene) {
        artist.release(scene);
    }

    fn on_hover(
        &self,
        _artist: &mut Artist,
        _frame: &mut Frame<'_>,
        _cursor: Cursor,
    ) -> Result<(), CanvasError> {
        Ok(())
    }

    fn on_brush(
        &self,
        artist: &mut Artist,
        scene: &mut Scene,
        extent: (f64, f64),
    ) -> Result<(), CanvasError> {
        reset_brush(artist, scene, extent)
    }
}

#[derive(Debug, Clone)]
pub enum Layer {
    Profile(ProfileLayer),
    Centroid(CentroidLayer),
    LabeledPeaks(LabeledPeakLayer),
    Deconvoluted(DeconvolutedLayer),
    Precursor(PrecursorLayer),
    IsolationWindow(IsolationWindowLayer),
    FeaturePoints(FeaturePointLayer),
    FeatureEllipses(FeatureEllipseLayer),
    DeconvolvedFeatureEllipses(DeconvolvedFeatureEllipseLayer),
    FeatureProfile(FeatureProfileLayer),
    FeatureProfiles(FeatureProfileCollection),
}

macro_rules! dispatch {
    ($layer:expr, $inner:ident => $body:expr) => {
        match $layer {
            Layer::Profile($inner) => $body,
            Layer::Centroid($inner) => $body,
            Layer::LabeledPeaks($inner) => $body,
            Layer::Deconvoluted($inner) => $body,
            Layer::Precursor($inner) => $body,
            Layer::IsolationWindow($inner) => $body,
            Layer::FeaturePoints($inner) => $body,
            Layer::FeatureEllipses($inner) => $body,
            Layer::DeconvolvedFeatureEllipses($inner) => $body,
            Layer::FeatureProfile($inner) => $body,
            Layer::FeatureProfiles($inner) => $body,
        }
    };
}

impl LayerLike for Layer {
    fn kind(&self) -> LayerKind {
        dispatch!(self, l => l.kind())
    }

    fn len(&self) -> usize {
        dispatch!(self, l => l.len())
    }

    fn coordinate(&self, i: usize) -> f64 {
        dispatch!(self, l => l.coordinate(i))
    }

    fn get(&self, i: usize) -> Option<Point> {
        dispatch!(self, l => l.get(i))
    }

    fn slice(&self, begin: usize, end: usize) -> Layer {
        dispatch!(self, l => l.slice(begin, end))
    }

    fn max_y(&self) -> f64 {
        dispatch!(self, l => l.max_y())
    }

    fn draw(&self, artist: &mut Artist, frame: &mut Frame<'_>) -> Result<(), CanvasError> {
        dispatch!(self, l => l.draw(artist, frame))
    }

    fn points(&self) -> Vec<Point> {
        dispatch!(self, l => l.points())
    }

    fn search_x(&self, query: f64) -> usize {
        dispatch!(self, l => l.search_x(query))
    }

    fn match_x(&self, query: f64, tolerance: f64) -> Option<Point> {
        dispatch!(self, l => l.match_x(query, tolerance))
    }

    fn between(&self, lo: f64, hi: f64) -> Layer {
        dispatch!(self, l => l.between(lo, hi))
    }

    fn min_x(&self) -> f64 {
        dispatch!(self, l => l.min_x())
    }

    fn max_x(&self) -> f64 {
        dispatch!(self, l => l.max_x())
    }

    fn min_y(&self) -> f64 {
        dispatch!(self, l => l.min_y())
    }

    fn min_coordinate(&self) -> f64 {
        dispatch!(self, l => l.min_coordinate())
    }

    fn max_coordinate(&self) -> f64 {
        dispatch!(self, l => l.max_coordinate())
    }

    fn time_bounds(&self) -> Option<(f64, f64)> {
        dispatch!(self, l => l.time_bounds())
    }

    fn init_artist(&self, artist: &mut Artist, frame: &mut Frame<'_>) -> Result<(), CanvasError> {
        dispatch!(self, l => l.init_artist(artist, frame))
    }

    fn redraw(&self, artist: &mut Artist, frame: &mut Frame<'_>) -> Result<(), CanvasError> {
        dispatch!(self, l => l.redraw(artist, frame))
    }

    fn remove(&self, artist: &mut Artist, scene: &mut Scene) {
        dispatch!(self, l => l.remove(artist, scene))
    }

    fn on_hover(
        &self,
        artist: &mut Artist,
        frame: &mut Frame<'_>,
        cursor: Cursor,
    ) -> Result<(), CanvasError> {
        dispatch!(self, l => l.on_hover(artist, frame, cursor))
    }

    fn on_brush(
        &self,
        artist: &mut Artist,
        scene: &mut Scene,
        extent: (f64, f64),
    ) -> Result<(), CanvasError> {
        dispatch!(self, l => l.on_brush(artist, scene, extent))
    }
}

impl Layer {
    /// Restricts profile collections to features within `[start, end]` m/z.
    /// Other layers pass through untouched.
    pub fn apply_mz_filter(&self, start: f64, end: f64) -> Layer {
        match self {
            Layer::FeatureProfiles(collection) => {
                Layer::FeatureProfiles(collection.apply_mz_filter(start, end))
            }
            other => other.clone(),
        }
    }

    /// Largest primary coordinate, ignoring NaNs and empty layers.
    pub(crate) fn finite_max_coordinate(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let value = self.max_coordinate();
        value.is_finite().then_some(value)
    }

    pub(crate) fn finite_min_coordinate(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let value = self.min_coordinate();
        value.is_finite().then_some(value)
    }
}

/// Shared hover behavior of stick layers: label the nearest peak with its
/// m/z when the pointer is close enough.
pub(crate) fn hover_nearest_peak<P: PointLike>(
    points: &SortedPoints<P>,
    artist: &mut Artist,
    frame: &mut Frame<'_>,
    cursor: Cursor,
) -> Result<(), CanvasError> {
    artist.clear_hover(frame.scene);
    if points.is_empty() {
        return Ok(());
    }
    let i = search::nearest_index(points.len(), |i| points.coordinate(i), cursor.x);
    let Some(peak) = points.get(i) else {
        return Ok(());
    };
    if (peak.x() - cursor.x).abs() > frame.config.hover.peak_mz {
        return Ok(());
    }
    let (x, y) = (peak.x(), peak.y());
    frame.hover_label(artist, x, y, format!("{:.3}", x), "peak-label")
}
