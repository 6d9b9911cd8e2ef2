//! Layers drawn on an m/z by time canvas.

use std::sync::Arc;

use super::{
    Artist,
    Cursor,
    Frame,
    Layer,
    LayerKind,
    LayerLike,
    LayerStyle,
    SortedPoints,
};
use crate::errors::CanvasError;
use crate::models::{
    DeconvolvedFeature,
    Feature,
    FeatureMapPoint,
    FeatureRef,
    Point,
    PointLike,
};
use crate::render::color::{
    cividis,
    cool,
    sqrt_ramp_position,
};
use crate::render::{
    Element,
    Tag,
};

/// A feature placed at its summary position on the m/z by time plane.
#[derive(Debug, Clone)]
pub struct FeatureEntry<F> {
    pub point: FeatureMapPoint,
    pub feature: Arc<F>,
}

impl<F> PointLike for FeatureEntry<F> {
    fn x(&self) -> f64 {
        self.point.mz
    }
    fn y(&self) -> f64 {
        self.point.time
    }
}

fn span<I: Iterator<Item = (f64, f64)>>(bounds: I) -> Option<(f64, f64)> {
    bounds
        .filter(|(lo, hi)| lo.is_finite() && hi.is_finite())
        .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)))
}

/// Indices of `intensities` in ascending order, so the brightest marks are
/// drawn last.
fn ascending_order(intensities: impl Iterator<Item = f64>) -> Vec<usize> {
    let intensities: Vec<f64> = intensities.collect();
    let mut order: Vec<usize> = (0..intensities.len()).collect();
    order.sort_by(|a, b| intensities[*a].total_cmp(&intensities[*b]));
    order
}

/// Rectangle covering an m/z spread over a time span, at least 2 pixels wide.
fn feature_rect(frame: &Frame<'_>, mz_bounds: (f64, f64), start: f64, end: f64) -> Element {
    let (x0, x1) = (frame.x(mz_bounds.0), frame.x(mz_bounds.1));
    let (y_start, y_end) = (frame.y(start), frame.y(end));
    Element::new(Tag::Rect)
        .attr("x", x0.min(x1))
        .attr("y", y_start.min(y_end))
        .attr("rx", 2)
        .attr("ry", 2)
        .attr("width", (x1 - x0).abs().max(2.0))
        .attr("height", (y_start - y_end).abs())
}

/// Every sampled point of a set of features.
#[derive(Debug, Clone, Default)]
pub struct FeaturePointLayer {
    points: SortedPoints<FeatureMapPoint>,
    style: LayerStyle,
}

impl FeaturePointLayer {
    pub fn new(points: Vec<FeatureMapPoint>) -> Self {
        Self {
            points: SortedPoints::new(points),
            style: LayerStyle::default(),
        }
    }

    pub fn from_features(features: &[Arc<Feature>]) -> Self {
        Self::new(
            features
                .iter()
                .flat_map(|f| f.samples.iter())
                .map(|s| FeatureMapPoint {
                    mz: s.mz,
                    time: s.time,
                    intensity: s.intensity,
                })
                .collect(),
        )
    }
}

impl LayerLike for FeaturePointLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::FeaturePoints
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn coordinate(&self, i: usize) -> f64 {
        self.points.coordinate(i)
    }

    fn get(&self, i: usize) -> Option<Point> {
        self.points.get(i).map(|p| Point::FeatureMap(*p))
    }

    fn slice(&self, begin: usize, end: usize) -> Layer {
        Layer::FeaturePoints(Self {
            points: self.points.slice(begin, end),
            style: self.style.clone(),
        })
    }

    fn max_y(&self) -> f64 {
        self.time_bounds().map_or(0.0, |(_, hi)| hi)
    }

    fn min_y(&self) -> f64 {
        self.time_bounds().map_or(0.0, |(lo, _)| lo)
    }

    fn time_bounds(&self) -> Option<(f64, f64)> {
        span(self.points.iter().map(|p| (p.time, p.time)))
    }

    fn draw(&self, artist: &mut Artist, frame: &mut Frame<'_>) -> Result<(), CanvasError> {
        let root = frame.begin(artist, self.kind().class(), self.style.color.as_deref())?;
        let points = self.points.as_slice();
        let z_max = points.iter().map(|p| p.intensity).fold(0.0, f64::max);
        let markers = frame
            .scene
            .append(root, Element::group().class("markers"))?;
        for i in ascending_order(points.iter().map(|p| p.intensity)) {
            let p = &points[i];
            let circle = Element::new(Tag::Circle)
                .attr("cx", frame.x(p.mz))
                .attr("cy", frame.y(p.time))
                .attr("r", 2)
                .attr("fill", cool(sqrt_ramp_position(p.intensity, z_max)));
            frame.scene.append(markers, circle)?;
        }
        Ok(())
    }
}

/// Extent of each feature as a translucent box.
#[derive(Debug, Clone, Default)]
pub struct FeatureEllipseLayer {
    entries: SortedPoints<FeatureEntry<Feature>>,
    style: LayerStyle,
}

impl FeatureEllipseLayer {
    pub fn new(features: Vec<Arc<Feature>>) -> Self {
        let entries = features
            .into_iter()
            .filter(|f| !f.is_empty())
            .map(|feature| FeatureEntry {
                point: FeatureMapPoint {
                    mz: feature.average_mz(),
                    time: feature.apex_time(),
                    intensity: feature.total_ion_current(),
                },
                feature,
            })
            .collect();
        Self {
            entries: SortedPoints::new(entries),
            style: LayerStyle::default(),
        }
    }

    pub fn features(&self) -> impl Iterator<Item = &Arc<Feature>> {
        self.entries.iter().map(|e| &e.feature)
    }
}

impl LayerLike for FeatureEllipseLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::FeatureEllipses
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn coordinate(&self, i: usize) -> f64 {
        self.entries.coordinate(i)
    }

    fn get(&self, i: usize) -> Option<Point> {
        self.entries.get(i).map(|e| Point::Feature {
            point: e.point,
            feature: FeatureRef::Feature(Arc::clone(&e.feature)),
        })
    }

    fn slice(&self, begin: usize, end: usize) -> Layer {
        Layer::FeatureEllipses(Self {
            entries: self.entries.slice(begin, end),
            style: self.style.clone(),
        })
    }

    fn max_y(&self) -> f64 {
        self.time_bounds().map_or(0.0, |(_, hi)| hi)
    }

    fn min_y(&self) -> f64 {
        self.time_bounds().map_or(0.0, |(lo, _)| lo)
    }

    fn time_bounds(&self) -> Option<(f64, f64)> {
        span(
            self.entries
                .iter()
                .map(|e| (e.feature.start_time(), e.feature.end_time())),
        )
    }

    fn draw(&self, artist: &mut Artist, frame: &mut Frame<'_>) -> Result<(), CanvasError> {
        let root = frame.begin(artist, self.kind().class(), self.style.color.as_deref())?;
        let entries = self.entries.as_slice();
        let z_max = entries.iter().map(|e| e.point.intensity).fold(0.0, f64::max);
        for i in ascending_order(entries.iter().map(|e| e.point.intensity)) {
            let entry = &entries[i];
            let Some(bounds) = entry.feature.mz_bounds() else {
                continue;
            };
            let rect = feature_rect(
                frame,
                bounds,
                entry.feature.start_time(),
                entry.feature.end_time(),
            )
            .class("feature-ellipse")
            .attr("fill", cool(sqrt_ramp_position(entry.point.intensity, z_max)))
            .attr("fill-opacity", 0.2)
            .attr("stroke", "black")
            .attr("stroke-width", 0.15);
            frame.scene.append(root, rect)?;
        }
        Ok(())
    }
}

/// Extent of each deconvolved feature's monoisotopic trace. Hovering one
/// overlays its whole isotopic envelope.
#[derive(Debug, Clone, Default)]
pub struct DeconvolvedFeatureEllipseLayer {
    entries: SortedPoints<FeatureEntry<DeconvolvedFeature>>,
    style: LayerStyle,
}

impl DeconvolvedFeatureEllipseLayer {
    pub fn new(features: Vec<Arc<DeconvolvedFeature>>) -> Self {
        let entries = features
            .into_iter()
            .filter(|f| !f.envelope.is_empty())
            .map(|feature| FeatureEntry {
                point: FeatureMapPoint {
                    mz: feature.weighted_mz(),
                    time: feature.apex_time(),
                    intensity: feature.total_ion_current(),
                },
                feature,
            })
            .collect();
        Self {
            entries: SortedPoints::new(entries),
            style: LayerStyle::default(),
        }
    }

    pub fn features(&self) -> impl Iterator<Item = &Arc<DeconvolvedFeature>> {
        self.entries.iter().map(|e| &e.feature)
    }

    /// The feature eluting at `time` whose m/z is closest to `mz`, with its
    /// m/z error.
    pub fn nearest_eluting(&self, mz: f64, time: f64) -> Option<(&FeatureEntry<DeconvolvedFeature>, f64)> {
        self.entries
            .iter()
            .filter(|e| e.feature.start_time() <= time && e.feature.end_time() >= time)
            .map(|e| (e, (e.point.mz - mz).abs()))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    fn draw_envelope(
        &self,
        entry: &FeatureEntry<DeconvolvedFeature>,
        artist: &mut Artist,
        frame: &mut Frame<'_>,
    ) -> Result<(), CanvasError> {
        let Some(root) = artist.root else {
            return Ok(());
        };
        let envelope = &entry.feature.envelope;
        let group = frame.scene.append(
            root,
            Element::group()
                .class("envelope-pattern")
                .attr("clip-path", "url(#clip)"),
        )?;
        artist.pattern.push(group);

        let z_max = envelope
            .iter()
            .map(|f| f.total_ion_current())
            .fold(0.0, f64::max);
        for trace in envelope.iter() {
            let Some(bounds) = trace.mz_bounds() else {
                continue;
            };
            let rect = feature_rect(frame, bounds, trace.start_time(), trace.end_time())
                .class("deconvoluted-feature-ellipse")
                .attr("fill", cividis(sqrt_ramp_position(trace.total_ion_current(), z_max)))
                .attr("fill-opacity", 0.5)
                .attr("stroke", "purple")
                .attr("stroke-width", 2.5);
            frame.scene.append(group, rect)?;
        }

        let top = envelope.iter().map(|f| f.end_time()).fold(0.0, f64::max);
        let center = envelope.iter().map(|f| f.average_mz()).sum::<f64>() / envelope.len() as f64;
        let text = format!(
            "{:.2}, z={}",
            entry.feature.weighted_neutral_mass(),
            entry.feature.charge
        );
        let label = Element::text_at(frame.x(center), frame.y(top) - 10.0, text)
            .class("envelope-label")
            .attr("text-anchor", "middle");
        let label = frame.scene.append(root, label)?;
        artist.pattern.push(label);
        Ok(())
    }
}

impl LayerLike for DeconvolvedFeatureEllipseLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::DeconvolvedFeatureEllipses
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn coordinate(&self, i: usize) -> f64 {
        self.entries.coordinate(i)
    }

    fn get(&self, i: usize) -> Option<Point> {
        self.entries.get(i).map(|e| Point::Feature {
            point: e.point,
            feature: FeatureRef::Deconvolved(Arc::clone(&e.feature)),
        })
    }

    fn slice(&self, begin: usize, end: usize) -> Layer {
        Layer::DeconvolvedFeatureEllipses(Self {
            entries: self.entries.slice(begin, end),
            style: self.style.clone(),
        })
    }

    fn max_y(&self) -> f64 {
        self.time_bounds().map_or(0.0, |(_, hi)| hi)
    }

    fn min_y(&self) -> f64 {
        self.time_bounds().map_or(0.0, |(lo, _)| lo)
    }

    fn time_bounds(&self) -> Option<(f64, f64)> {
        span(
            self.entries
                .iter()
                .map(|e| (e.feature.start_time(), e.feature.end_time())),
        )
    }

    fn draw(&self, artist: &mut Artist, frame: &mut Frame<'_>) -> Result<(), CanvasError> {
        let root = frame.begin(artist, self.kind().class(), self.style.color.as_deref())?;
        let entries = self.entries.as_slice();
        let z_max = entries.iter().map(|e| e.point.intensity).fold(0.0, f64::max);
        for i in ascending_order(entries.iter().map(|e| e.point.intensity)) {
            let entry = &entries[i];
            let Some(bounds) = entry.feature.mz_bounds() else {
                continue;
            };
            let rect = feature_rect(
                frame,
                bounds,
                entry.feature.start_time(),
                entry.feature.end_time(),
            )
            .class("deconvolved-feature")
            .attr("fill", cividis(sqrt_ramp_position(entry.point.intensity, z_max)))
            .attr("fill-opacity", 0.5)
            .attr("stroke", "red")
            .attr("stroke-width", 0.15);
            frame.scene.append(root, rect)?;
        }
        Ok(())
    }

    fn on_hover(
        &self,
        artist: &mut Artist,
        frame: &mut Frame<'_>,
        cursor: Cursor,
    ) -> Result<(), CanvasError> {
        let hover = frame.config.hover;
        let nearest = self.nearest_eluting(cursor.x, cursor.y);
        let err = nearest.map_or(f64::INFINITY, |(_, err)| err);
        if err > hover.feature_clear_mz {
            artist.clear_pattern(frame.scene);
        }
        let Some((entry, err)) = nearest else {
            return Ok(());
        };
        if err > hover.feature_draw_mz {
            return Ok(());
        }
        artist.clear_pattern(frame.scene);
        self.draw_envelope(entry, artist, frame)
    }
}
