//! Layers drawn on an m/z by intensity canvas.

use std::borrow::Cow;
use std::sync::{
    Arc,
    OnceLock,
};

use super::{
    Artist,
    Cursor,
    Frame,
    Layer,
    LayerKind,
    LayerLike,
    LayerStyle,
    SortedPoints,
    hover_nearest_peak,
    stroke_path,
};
use crate::errors::CanvasError;
use crate::models::{
    ChargedPoint,
    DeconvolutedPoint,
    IsolationWindow,
    LabeledPoint,
    MzPoint,
    Point,
    PointLike,
    neutral_mass,
};
use crate::render::color::pattern_color;
use crate::render::path::{
    line_path,
    sticks,
};
use crate::render::{
    Element,
    Tag,
};
use crate::search;

/// Keeps points spaced more than `resolution` apart, always keeping the
/// first and the last one.
pub fn subsample(points: &[MzPoint], resolution: f64) -> Vec<MzPoint> {
    let Some((first, rest)) = points.split_first() else {
        return Vec::new();
    };
    let mut kept = vec![*first];
    let mut last_mz = first.mz;
    for (i, p) in rest.iter().enumerate() {
        let is_last = i + 1 == rest.len();
        if p.mz - last_mz > resolution || is_last {
            kept.push(*p);
            last_mz = p.mz;
        }
    }
    kept
}

/// Collapses runs of zero intensity to their two endpoints.
pub fn drop_zero_runs(points: &[MzPoint]) -> Vec<MzPoint> {
    let n = points.len();
    points
        .iter()
        .enumerate()
        .filter(|(i, p)| {
            if p.intensity != 0.0 || *i == 0 || *i + 1 == n {
                return true;
            }
            points[i - 1].intensity != 0.0 || points[i + 1].intensity != 0.0
        })
        .map(|(_, p)| *p)
        .collect()
}

/// Raw, continuous signal.
#[derive(Debug, Clone, Default)]
pub struct ProfileLayer {
    points: SortedPoints<MzPoint>,
    style: LayerStyle,
}

impl ProfileLayer {
    pub fn new(points: Vec<MzPoint>) -> Self {
        Self {
            points: SortedPoints::new(points),
            style: LayerStyle::default(),
        }
    }

    /// Pairs up parallel arrays, extra elements of the longer one are dropped.
    pub fn from_arrays(mz: &[f64], intensity: &[f64]) -> Self {
        Self::new(
            mz.iter()
                .zip(intensity)
                .map(|(mz, intensity)| MzPoint::new(*mz, *intensity))
                .collect(),
        )
    }

    pub fn with_style(mut self, style: LayerStyle) -> Self {
        self.style = style;
        self
    }

    pub fn data(&self) -> &[MzPoint] {
        self.points.as_slice()
    }

    /// The points actually drawn. Dense signals are thinned out first.
    pub fn display_points(&self, threshold: usize, resolution: f64) -> Cow<'_, [MzPoint]> {
        if self.points.len() > threshold {
            let thinned = subsample(self.points.as_slice(), resolution);
            Cow::Owned(drop_zero_runs(&thinned))
        } else {
            Cow::Borrowed(self.points.as_slice())
        }
    }
}

impl LayerLike for ProfileLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Profile
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn coordinate(&self, i: usize) -> f64 {
        self.points.coordinate(i)
    }

    fn get(&self, i: usize) -> Option<Point> {
        self.points.get(i).map(|p| Point::Mz(*p))
    }

    fn slice(&self, begin: usize, end: usize) -> Layer {
        Layer::Profile(Self {
            points: self.points.slice(begin, end),
            style: self.style.clone(),
        })
    }

    fn max_y(&self) -> f64 {
        self.points.max_y()
    }

    fn draw(&self, artist: &mut Artist, frame: &mut Frame<'_>) -> Result<(), CanvasError> {
        let root = frame.begin(artist, self.kind().class(), self.style.color.as_deref())?;
        let points = self.display_points(
            frame.config.subsample_threshold,
            frame.config.subsample_resolution,
        );
        let d = line_path(
            points.iter().map(|p| (p.mz, p.intensity)),
            &frame.x_scale,
            &frame.y_scale,
        );
        let color = artist.color.clone().unwrap_or_default();
        frame.scene.append(
            root,
            stroke_path(d, &color, self.style.stroke_width, "line profile-layer"),
        )?;
        Ok(())
    }
}

/// Draws `points` as sticks into the artist's group.
fn draw_sticks<P: PointLike>(
    points: &[P],
    artist: &Artist,
    frame: &mut Frame<'_>,
    style: &LayerStyle,
    class: &str,
    dash: Option<&str>,
) -> Result<(), CanvasError> {
    let Some(root) = artist.root else {
        return Ok(());
    };
    let d = line_path(sticks(points), &frame.x_scale, &frame.y_scale);
    let color = artist.color.as_deref().unwrap_or_default();
    let mut element = stroke_path(d, color, style.stroke_width, &format!("line {}", class));
    if let Some(dash) = dash {
        element = element.attr("stroke-dasharray", dash);
    }
    frame.scene.append(root, element)?;
    Ok(())
}

/// Centroided peaks.
#[derive(Debug, Clone, Default)]
pub struct CentroidLayer {
    points: SortedPoints<MzPoint>,
    style: LayerStyle,
}

impl CentroidLayer {
    pub fn new(points: Vec<MzPoint>) -> Self {
        Self {
            points: SortedPoints::new(points),
            style: LayerStyle::default(),
        }
    }

    pub fn with_style(mut self, style: LayerStyle) -> Self {
        self.style = style;
        self
    }

    pub fn data(&self) -> &[MzPoint] {
        self.points.as_slice()
    }
}

impl LayerLike for CentroidLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Centroid
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn coordinate(&self, i: usize) -> f64 {
        self.points.coordinate(i)
    }

    fn get(&self, i: usize) -> Option<Point> {
        self.points.get(i).map(|p| Point::Mz(*p))
    }

    fn slice(&self, begin: usize, end: usize) -> Layer {
        Layer::Centroid(Self {
            points: self.points.slice(begin, end),
            style: self.style.clone(),
        })
    }

    fn max_y(&self) -> f64 {
        self.points.max_y()
    }

    fn draw(&self, artist: &mut Artist, frame: &mut Frame<'_>) -> Result<(), CanvasError> {
        frame.begin(artist, self.kind().class(), self.style.color.as_deref())?;
        draw_sticks(
            self.points.as_slice(),
            artist,
            frame,
            &self.style,
            self.kind().class(),
            None,
        )
    }

    fn on_hover(
        &self,
        artist: &mut Artist,
        frame: &mut Frame<'_>,
        cursor: Cursor,
    ) -> Result<(), CanvasError> {
        hover_nearest_peak(&self.points, artist, frame, cursor)
    }
}

trait MassLocated {
    fn mass(&self) -> f64;
}

impl MassLocated for LabeledPoint {
    fn mass(&self) -> f64 {
        self.neutral_mass()
    }
}

impl MassLocated for DeconvolutedPoint {
    fn mass(&self) -> f64 {
        self.neutral_mass()
    }
}

/// Secondary ordering of charged peaks by neutral mass, built on first use.
#[derive(Debug, Clone, Default)]
struct MassIndex {
    entries: OnceLock<Arc<[(f64, usize)]>>,
}

impl MassIndex {
    fn entries<P: MassLocated>(&self, points: &[P]) -> &[(f64, usize)] {
        self.entries.get_or_init(|| {
            let mut entries: Vec<(f64, usize)> =
                points.iter().enumerate().map(|(i, p)| (p.mass(), i)).collect();
            entries.sort_by(|a, b| a.0.total_cmp(&b.0));
            Arc::from(entries)
        })
    }

    /// Index of the point whose neutral mass is closest to `mass`.
    fn search<P: MassLocated>(&self, points: &[P], mass: f64) -> Option<usize> {
        let entries = self.entries(points);
        if entries.is_empty() {
            return None;
        }
        let i = search::nearest_index(entries.len(), |i| entries[i].0, mass);
        Some(entries[i].1)
    }
}

/// Peaks carrying an annotation string drawn above them.
#[derive(Debug, Clone, Default)]
pub struct LabeledPeakLayer {
    points: SortedPoints<LabeledPoint>,
    style: LayerStyle,
    series: String,
    masses: MassIndex,
}

impl LabeledPeakLayer {
    pub fn new(points: Vec<LabeledPoint>, series: impl Into<String>) -> Self {
        Self {
            points: SortedPoints::new(points),
            style: LayerStyle::default(),
            series: series.into(),
            masses: MassIndex::default(),
        }
    }

    pub fn with_style(mut self, style: LayerStyle) -> Self {
        self.style = style;
        self
    }

    pub fn search_mass(&self, mass: f64) -> Option<usize> {
        self.masses.search(self.points.as_slice(), mass)
    }

    pub fn match_mass(&self, mass: f64, tolerance: f64) -> Option<Point> {
        let i = self.search_mass(mass)?;
        let point = self.points.get(i)?;
        search::within_relative(point.neutral_mass(), mass, tolerance)
            .then(|| Point::Labeled(point.clone()))
    }
}

impl LayerLike for LabeledPeakLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::LabeledPeaks
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn coordinate(&self, i: usize) -> f64 {
        self.points.coordinate(i)
    }

    fn get(&self, i: usize) -> Option<Point> {
        self.points.get(i).map(|p| Point::Labeled(p.clone()))
    }

    fn slice(&self, begin: usize, end: usize) -> Layer {
        Layer::LabeledPeaks(Self {
            points: self.points.slice(begin, end),
            style: self.style.clone(),
            series: self.series.clone(),
            masses: MassIndex::default(),
        })
    }

    fn max_y(&self) -> f64 {
        self.points.max_y()
    }

    fn draw(&self, artist: &mut Artist, frame: &mut Frame<'_>) -> Result<(), CanvasError> {
        let root = frame.begin(artist, self.kind().class(), self.style.color.as_deref())?;
        draw_sticks(
            self.points.as_slice(),
            artist,
            frame,
            &self.style,
            self.kind().class(),
            None,
        )?;
        let group = frame.scene.append(
            root,
            Element::group().class(&format!("labels label-{}", self.series)),
        )?;
        for point in self.points.iter() {
            let x = frame.x(point.mz);
            let y = frame.y(point.intensity) - 10.0;
            frame.scene.append(
                group,
                Element::text_at(x, y, point.label.to_string())
                    .class("peak-annotation")
                    .attr("text-anchor", "middle"),
            )?;
        }
        artist.labels.push(group);
        Ok(())
    }

    fn on_hover(
        &self,
        artist: &mut Artist,
        frame: &mut Frame<'_>,
        cursor: Cursor,
    ) -> Result<(), CanvasError> {
        hover_nearest_peak(&self.points, artist, frame, cursor)
    }
}

/// Charge-deconvoluted peaks. Hovering one overlays its isotopic envelope.
#[derive(Debug, Clone, Default)]
pub struct DeconvolutedLayer {
    points: SortedPoints<DeconvolutedPoint>,
    style: LayerStyle,
    masses: MassIndex,
}

impl DeconvolutedLayer {
    pub fn new(points: Vec<DeconvolutedPoint>) -> Self {
        Self {
            points: SortedPoints::new(points),
            style: LayerStyle::default(),
            masses: MassIndex::default(),
        }
    }

    pub fn with_style(mut self, style: LayerStyle) -> Self {
        self.style = style;
        self
    }

    pub fn search_mass(&self, mass: f64) -> Option<usize> {
        self.masses.search(self.points.as_slice(), mass)
    }

    pub fn match_mass(&self, mass: f64, tolerance: f64) -> Option<Point> {
        let i = self.search_mass(mass)?;
        let point = self.points.get(i)?;
        search::within_relative(point.neutral_mass(), mass, tolerance)
            .then(|| Point::Deconvoluted(point.clone()))
    }

    fn draw_envelope(
        &self,
        artist: &mut Artist,
        frame: &mut Frame<'_>,
        cursor: Cursor,
    ) -> Result<(), CanvasError> {
        artist.clear_pattern(frame.scene);
        let Some(root) = artist.root else {
            return Ok(());
        };
        if self.points.is_empty() {
            return Ok(());
        }
        let i = search::nearest_index(self.points.len(), |i| self.points.coordinate(i), cursor.x);
        let Some(peak) = self.points.get(i) else {
            return Ok(());
        };
        if (peak.mz - cursor.x).abs() > frame.config.hover.envelope_mz {
            return Ok(());
        }

        let base = artist.color.clone().unwrap_or_default();
        let color = artist
            .pattern_color
            .get_or_insert_with(|| pattern_color(&base))
            .clone();
        let d = line_path(sticks(&peak.envelope[..]), &frame.x_scale, &frame.y_scale);
        let line = frame
            .scene
            .append(root, stroke_path(d, &color, 4.0, "envelope-pattern"))?;
        artist.pattern.push(line);

        let x = frame.x(peak.envelope_centroid());
        let y = frame.y(peak.envelope_apex() * 1.1);
        let text = format!(
            "{:.3}, z={}",
            neutral_mass(peak.mz, peak.charge),
            peak.charge
        );
        let label = frame.scene.append(
            root,
            Element::text_at(x, y, text)
                .class("envelope-label")
                .attr("text-anchor", "middle"),
        )?;
        artist.pattern.push(label);
        Ok(())
    }
}

impl LayerLike for DeconvolutedLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Deconvoluted
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn coordinate(&self, i: usize) -> f64 {
        self.points.coordinate(i)
    }

    fn get(&self, i: usize) -> Option<Point> {
        self.points.get(i).map(|p| Point::Deconvoluted(p.clone()))
    }

    fn slice(&self, begin: usize, end: usize) -> Layer {
        Layer::Deconvoluted(Self {
            points: self.points.slice(begin, end),
            style: self.style.clone(),
            masses: MassIndex::default(),
        })
    }

    /// Headroom for the envelope labels.
    fn max_y(&self) -> f64 {
        self.points.max_y() * 1.25
    }

    fn draw(&self, artist: &mut Artist, frame: &mut Frame<'_>) -> Result<(), CanvasError> {
        frame.begin(artist, self.kind().class(), self.style.color.as_deref())?;
        draw_sticks(
            self.points.as_slice(),
            artist,
            frame,
            &self.style,
            self.kind().class(),
            None,
        )
    }

    fn on_hover(
        &self,
        artist: &mut Artist,
        frame: &mut Frame<'_>,
        cursor: Cursor,
    ) -> Result<(), CanvasError> {
        hover_nearest_peak(&self.points, artist, frame, cursor)?;
        self.draw_envelope(artist, frame, cursor)
    }
}

/// Marker for the precursor ion of a product spectrum.
///
/// It annotates the view rather than being data, so any slice of it is
/// empty.
#[derive(Debug, Clone, Default)]
pub struct PrecursorLayer {
    peak: Option<ChargedPoint>,
    style: LayerStyle,
}

impl PrecursorLayer {
    pub fn new(peak: ChargedPoint) -> Self {
        Self {
            peak: Some(peak),
            style: LayerStyle::default(),
        }
    }

    pub fn label_lines(&self) -> Vec<String> {
        match &self.peak {
            Some(peak) => vec![
                format!("Prec. m/z: {:.3}", peak.mz),
                format!("Prec. z: {}", peak.charge),
                format!("Prec. mass: {:.3}", peak.neutral_mass()),
            ],
            None => Vec::new(),
        }
    }
}

impl LayerLike for PrecursorLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Precursor
    }

    fn len(&self) -> usize {
        usize::from(self.peak.is_some())
    }

    fn coordinate(&self, i: usize) -> f64 {
        match (&self.peak, i) {
            (Some(peak), 0) => peak.mz,
            _ => f64::NAN,
        }
    }

    fn get(&self, i: usize) -> Option<Point> {
        match (&self.peak, i) {
            (Some(peak), 0) => Some(Point::Charged(*peak)),
            _ => None,
        }
    }

    fn slice(&self, _begin: usize, _end: usize) -> Layer {
        Layer::Precursor(Self {
            peak: None,
            style: self.style.clone(),
        })
    }

    fn max_y(&self) -> f64 {
        if self.peak.is_some() { 1.0 } else { 0.0 }
    }

    fn draw(&self, artist: &mut Artist, frame: &mut Frame<'_>) -> Result<(), CanvasError> {
        frame.begin(artist, self.kind().class(), self.style.color.as_deref())?;
        let Some(peak) = &self.peak else {
            return Ok(());
        };
        draw_sticks(
            std::slice::from_ref(peak),
            artist,
            frame,
            &self.style,
            self.kind().class(),
            Some("5 1 10"),
        )?;

        let container = frame.container;
        let label = Element::new(Tag::Text).class("precursor-label").attr(
            "transform",
            format!("translate({},{})", frame.width * 0.85, frame.height * 0.02),
        );
        let label = frame.scene.append(container, label)?;
        for line in self.label_lines() {
            frame.scene.append(
                label,
                Element::new(Tag::TSpan)
                    .attr("dx", 10)
                    .attr("dy", 16)
                    .attr("x", 0)
                    .content(line),
            )?;
        }
        artist.labels.push(label);
        Ok(())
    }
}

/// Isolation window bounds of the product spectra acquired from a
/// precursor spectrum, drawn at a fixed height. Slices are empty.
#[derive(Debug, Clone, Default)]
pub struct IsolationWindowLayer {
    points: SortedPoints<MzPoint>,
    windows: Vec<IsolationWindow>,
    height: f64,
    style: LayerStyle,
}

impl IsolationWindowLayer {
    pub fn new(windows: Vec<IsolationWindow>, height: f64) -> Self {
        let points = windows
            .iter()
            .flat_map(|w| [MzPoint::new(w.lower_bound, height), MzPoint::new(w.upper_bound, height)])
            .collect();
        Self {
            points: SortedPoints::new(points),
            windows,
            height,
            style: LayerStyle::default(),
        }
    }

    pub fn windows(&self) -> &[IsolationWindow] {
        &self.windows
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}

impl LayerLike for IsolationWindowLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::IsolationWindow
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn coordinate(&self, i: usize) -> f64 {
        self.points.coordinate(i)
    }

    fn get(&self, i: usize) -> Option<Point> {
        self.points.get(i).map(|p| Point::Mz(*p))
    }

    fn slice(&self, _begin: usize, _end: usize) -> Layer {
        Layer::IsolationWindow(Self {
            style: self.style.clone(),
            ..Default::default()
        })
    }

    fn max_y(&self) -> f64 {
        if self.points.is_empty() { 0.0 } else { 1.0 }
    }

    fn draw(&self, artist: &mut Artist, frame: &mut Frame<'_>) -> Result<(), CanvasError> {
        frame.begin(artist, self.kind().class(), self.style.color.as_deref())?;
        draw_sticks(
            self.points.as_slice(),
            artist,
            frame,
            &self.style,
            self.kind().class(),
            Some("5 5"),
        )
    }
}
