//! Layers drawn on a time by intensity canvas, one trace per feature.

use std::sync::Arc;

use tracing::debug;

use super::{
    Artist,
    Cursor,
    Frame,
    Layer,
    LayerKind,
    LayerLike,
    LayerStyle,
    SortedPoints,
    stroke_path,
};
use crate::errors::CanvasError;
use crate::models::{
    FeatureMap,
    FeatureProfilePoint,
    FeatureRef,
    PeakFit,
    Point,
};
use crate::render::Scene;
use crate::render::path::{
    line_path,
    sticks,
};
use crate::search;

/// How a feature trace is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceMode {
    /// The sampled elution profile.
    #[default]
    Profile,
    /// A single stick at the apex of the best peak fit.
    Centroid,
}

fn trace_points(feature: &FeatureRef) -> Vec<FeatureProfilePoint> {
    match feature {
        FeatureRef::Feature(f) => f
            .samples
            .iter()
            .map(|s| FeatureProfilePoint {
                time: s.time,
                intensity: s.intensity,
                mz: s.mz,
            })
            .collect(),
        FeatureRef::Deconvolved(f) => {
            // Isotopic traces sampled at the same time add up.
            let mz = f.weighted_mz();
            let mut points: Vec<FeatureProfilePoint> = Vec::new();
            for s in f.samples() {
                match points.last_mut() {
                    Some(last) if last.time == s.time => last.intensity += s.intensity,
                    _ => points.push(FeatureProfilePoint {
                        time: s.time,
                        intensity: s.intensity,
                        mz,
                    }),
                }
            }
            points
        }
    }
}

fn best_fit(feature: &FeatureRef) -> Option<PeakFit> {
    match feature {
        FeatureRef::Feature(f) => f.best_fit().copied(),
        FeatureRef::Deconvolved(f) => f.envelope.first().and_then(|m| m.best_fit().copied()),
    }
}

/// Elution profile of a single feature.
#[derive(Debug, Clone)]
pub struct FeatureProfileLayer {
    points: SortedPoints<FeatureProfilePoint>,
    feature: FeatureRef,
    mode: TraceMode,
    style: LayerStyle,
}

impl FeatureProfileLayer {
    pub fn new(feature: FeatureRef) -> Self {
        Self {
            points: SortedPoints::new(trace_points(&feature)),
            feature,
            mode: TraceMode::default(),
            style: LayerStyle::with_stroke_width(2.5),
        }
    }

    pub fn with_mode(mut self, mode: TraceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_style(mut self, style: LayerStyle) -> Self {
        self.style = style;
        self
    }

    pub fn feature(&self) -> &FeatureRef {
        &self.feature
    }

    pub fn mode(&self) -> TraceMode {
        self.mode
    }

    /// The sample closest in time to `time`, if it is within `tolerance`.
    pub fn nearest_within(&self, time: f64, tolerance: f64) -> Option<FeatureProfilePoint> {
        if self.points.is_empty() {
            return None;
        }
        let i = search::nearest_index(self.points.len(), |i| self.points.coordinate(i), time);
        self.points
            .get(i)
            .filter(|p| (p.time - time).abs() <= tolerance)
            .copied()
    }

    /// Labels the trace at `point` in the trace's color.
    fn label_at(
        &self,
        artist: &mut Artist,
        frame: &mut Frame<'_>,
        point: FeatureProfilePoint,
    ) -> Result<(), CanvasError> {
        frame.hover_label(
            artist,
            point.time,
            point.intensity,
            self.feature.label(),
            "peak-label",
        )?;
        if let (Some(id), Some(color)) = (artist.hover.last().copied(), artist.color.clone()) {
            frame.scene.set_attr(id, "fill", color)?;
        }
        Ok(())
    }
}

impl LayerLike for FeatureProfileLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::FeatureProfile
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn coordinate(&self, i: usize) -> f64 {
        self.points.coordinate(i)
    }

    fn get(&self, i: usize) -> Option<Point> {
        self.points.get(i).map(|p| Point::FeatureProfile(*p))
    }

    fn slice(&self, begin: usize, end: usize) -> Layer {
        Layer::FeatureProfile(Self {
            points: self.points.slice(begin, end),
            feature: self.feature.clone(),
            mode: self.mode,
            style: self.style.clone(),
        })
    }

    fn max_y(&self) -> f64 {
        self.points.max_y()
    }

    fn draw(&self, artist: &mut Artist, frame: &mut Frame<'_>) -> Result<(), CanvasError> {
        let root = frame.begin(artist, self.kind().class(), self.style.color.as_deref())?;
        let color = artist.color.clone().unwrap_or_default();
        let fit = match self.mode {
            TraceMode::Centroid => best_fit(&self.feature),
            TraceMode::Profile => None,
        };
        let element = match fit {
            Some(fit) => {
                let apex = FeatureProfilePoint {
                    time: fit.mu,
                    intensity: fit.density,
                    mz: self.feature.mz(),
                };
                let d = line_path(sticks(&[apex]), &frame.x_scale, &frame.y_scale);
                stroke_path(d, &color, self.style.stroke_width, "line feature-centroid")
            }
            None => {
                let d = line_path(
                    self.points.iter().map(|p| (p.time, p.intensity)),
                    &frame.x_scale,
                    &frame.y_scale,
                );
                stroke_path(d, &color, self.style.stroke_width, "line feature-profile")
                    .attr("marker-start", "url(#marker-circle)")
                    .attr("marker-mid", "url(#marker-circle)")
                    .attr("marker-end", "url(#marker-circle)")
            }
        };
        frame.scene.append(root, element)?;
        Ok(())
    }

    fn on_hover(
        &self,
        artist: &mut Artist,
        frame: &mut Frame<'_>,
        cursor: Cursor,
    ) -> Result<(), CanvasError> {
        artist.clear_hover(frame.scene);
        match self.nearest_within(cursor.x, frame.config.hover.profile_time) {
            Some(point) => self.label_at(artist, frame, point),
            None => Ok(()),
        }
    }
}

/// Index of a merged sample: (point, member, position within the member).
type MergedEntry = (FeatureProfilePoint, usize, usize);

/// A set of feature traces searched and sliced as one time-sorted layer.
///
/// Each member keeps its own sorted samples; `merged` orders all of them by
/// time so the collection satisfies the same search contract as any other
/// layer.
#[derive(Debug, Clone)]
pub struct FeatureProfileCollection {
    members: Vec<FeatureProfileLayer>,
    merged: Arc<[MergedEntry]>,
    max_features: usize,
}

impl Default for FeatureProfileCollection {
    fn default() -> Self {
        Self::new(Vec::new(), usize::MAX)
    }
}

impl FeatureProfileCollection {
    pub fn new(members: Vec<FeatureProfileLayer>, max_features: usize) -> Self {
        let mut merged: Vec<MergedEntry> = members
            .iter()
            .enumerate()
            .flat_map(|(m, member)| {
                member
                    .points
                    .iter()
                    .enumerate()
                    .map(move |(i, p)| (*p, m, i))
            })
            .collect();
        merged.sort_by(|a, b| a.0.time.total_cmp(&b.0.time));
        Self {
            members,
            merged: Arc::from(merged),
            max_features,
        }
    }

    /// One profile trace per plain and per deconvolved feature of `map`.
    pub fn from_feature_map(map: &FeatureMap, max_features: usize) -> Self {
        let plain = map
            .features
            .iter()
            .flatten()
            .filter(|f| !f.is_empty())
            .map(|f| FeatureRef::Feature(Arc::clone(f)));
        let deconvolved = map
            .deconvolved_features
            .iter()
            .flatten()
            .filter(|f| !f.envelope.is_empty())
            .map(|f| FeatureRef::Deconvolved(Arc::clone(f)));
        let members = plain
            .chain(deconvolved)
            .map(FeatureProfileLayer::new)
            .collect();
        Self::new(members, max_features)
    }

    pub fn members(&self) -> &[FeatureProfileLayer] {
        &self.members
    }

    pub fn max_features(&self) -> usize {
        self.max_features
    }

    /// The members whose feature m/z lies in `[start, end]`, most intense
    /// first, capped at `max_features`. `self` is left untouched.
    pub fn apply_mz_filter(&self, start: f64, end: f64) -> Self {
        let mut kept: Vec<FeatureProfileLayer> = self
            .members
            .iter()
            .filter(|m| {
                let mz = m.feature.mz();
                mz >= start && mz <= end
            })
            .cloned()
            .collect();
        kept.sort_by(|a, b| b.max_y().total_cmp(&a.max_y()));
        kept.truncate(self.max_features);
        debug!(
            "Profile filter [{:.3}, {:.3}] kept {} of {} traces",
            start,
            end,
            kept.len(),
            self.members.len()
        );
        Self::new(kept, self.max_features)
    }
}

impl LayerLike for FeatureProfileCollection {
    fn kind(&self) -> LayerKind {
        LayerKind::FeatureProfiles
    }

    fn len(&self) -> usize {
        self.merged.len()
    }

    fn coordinate(&self, i: usize) -> f64 {
        self.merged.get(i).map_or(f64::NAN, |e| e.0.time)
    }

    fn get(&self, i: usize) -> Option<Point> {
        self.merged.get(i).map(|e| Point::FeatureProfile(e.0))
    }

    /// Each member is cut down to the samples falling in the merged window.
    /// Members left without samples are dropped.
    fn slice(&self, begin: usize, end: usize) -> Layer {
        let end = end.min(self.merged.len());
        let begin = begin.min(end);
        let mut ranges: Vec<Option<(usize, usize)>> = vec![None; self.members.len()];
        for (_, m, i) in self.merged[begin..end].iter() {
            ranges[*m] = Some(match ranges[*m] {
                Some((lo, hi)) => (lo.min(*i), hi.max(*i + 1)),
                None => (*i, *i + 1),
            });
        }
        let members = self
            .members
            .iter()
            .zip(ranges)
            .filter_map(|(member, range)| {
                let (lo, hi) = range?;
                Some(FeatureProfileLayer {
                    points: member.points.slice(lo, hi),
                    feature: member.feature.clone(),
                    mode: member.mode,
                    style: member.style.clone(),
                })
            })
            .collect();
        Layer::FeatureProfiles(Self::new(members, self.max_features))
    }

    fn max_y(&self) -> f64 {
        self.members.iter().map(|m| m.max_y()).fold(0.0, f64::max)
    }

    fn init_artist(&self, artist: &mut Artist, frame: &mut Frame<'_>) -> Result<(), CanvasError> {
        artist.release(frame.scene);
        artist.color = None;
        artist.pattern_color = None;
        self.draw(artist, frame)
    }

    /// Member traces take successive palette colors. A redraw keeps the
    /// colors of the previous draw.
    fn draw(&self, artist: &mut Artist, frame: &mut Frame<'_>) -> Result<(), CanvasError> {
        let previous: Vec<Option<String>> =
            artist.children.iter().map(|c| c.color.clone()).collect();
        frame.begin(artist, self.kind().class(), Some("black"))?;
        let mut children = Vec::with_capacity(self.members.len());
        for (i, member) in self.members.iter().enumerate() {
            let mut child = Artist {
                color: previous.get(i).cloned().flatten(),
                brush_extent: artist.brush_extent,
                ..Default::default()
            };
            member.draw(&mut child, frame)?;
            children.push(child);
        }
        artist.children = children;
        Ok(())
    }

    fn remove(&self, artist: &mut Artist, scene: &mut Scene) {
        artist.release(scene);
    }

    fn on_hover(
        &self,
        artist: &mut Artist,
        frame: &mut Frame<'_>,
        cursor: Cursor,
    ) -> Result<(), CanvasError> {
        for child in artist.children.iter_mut() {
            child.clear_hover(frame.scene);
        }
        let tolerance = frame.config.hover.profile_time;
        let mut hits: Vec<(usize, FeatureProfilePoint, f64)> = self
            .members
            .iter()
            .enumerate()
            .filter_map(|(i, m)| {
                m.nearest_within(cursor.x, tolerance)
                    .map(|p| (i, p, (p.intensity - cursor.y).abs()))
            })
            .collect();
        hits.sort_by(|a, b| a.2.total_cmp(&b.2));
        let Some(best) = hits.first().map(|h| h.2) else {
            return Ok(());
        };
        let limit = frame.config.hover.max_profile_labels;
        for (i, point, _) in hits.into_iter().filter(|h| h.2 <= best * 1.5).take(limit) {
            if let Some(child) = artist.children.get_mut(i) {
                self.members[i].label_at(child, frame, point)?;
            }
        }
        Ok(())
    }
}
