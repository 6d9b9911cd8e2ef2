//! Viewports: a set of layers drawn against a pair of scales, with the
//! zoom and brush state machine that moves them.

pub mod extent;
pub mod interaction;
mod surface;
pub mod timers;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{
    AtomicU64,
    Ordering,
};

use tracing::{
    debug,
    info,
    instrument,
};

pub use self::extent::Padding;
pub use self::interaction::{
    BrushController,
    BrushOutcome,
    BrushState,
    Selection,
};
use self::surface::Surface;
pub use self::timers::{
    Debouncer,
    IdleTimeout,
    Throttle,
    Timestamp,
};
use crate::config::{
    CanvasConfig,
    InteractionTimings,
};
use crate::errors::CanvasError;
use crate::layers::{
    Artist,
    Cursor,
    Layer,
    LayerLike,
};
use crate::models::ScanRange;
use crate::render::{
    ColorCycle,
    LinearScale,
    Scene,
};

static NEXT_CANVAS_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a canvas. Linked canvases refer to each other only through
/// this key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanvasId(u64);

impl CanvasId {
    pub fn next() -> Self {
        Self(NEXT_CANVAS_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for CanvasId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "canvas-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanvasKind {
    /// m/z by intensity.
    Spectrum,
    /// m/z by time, with a rectangular brush.
    FeatureMap,
    /// Time by intensity, one trace per feature.
    FeatureProfile,
}

impl CanvasKind {
    /// Horizontal and vertical axis labels.
    pub fn dimension_labels(&self) -> (&'static str, &'static str) {
        match self {
            CanvasKind::Spectrum => ("m/z", "Relative Intensity"),
            CanvasKind::FeatureMap => ("m/z", "ion mobility"),
            CanvasKind::FeatureProfile => ("time", "intensity"),
        }
    }

    pub fn padding(&self) -> Padding {
        match self {
            CanvasKind::FeatureProfile => Padding::KeepWhenNonPositive(0.1),
            _ => Padding::Clamped(50.0),
        }
    }

    pub fn idle_ms(&self, timings: &InteractionTimings) -> f64 {
        match self {
            CanvasKind::FeatureMap => timings.feature_map_idle_ms,
            _ => timings.spectrum_idle_ms,
        }
    }

    fn readout_offset(&self) -> f64 {
        match self {
            CanvasKind::FeatureProfile => 0.08,
            _ => 0.06,
        }
    }
}

/// Sent to listeners, debounced, after the extent of a canvas changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedrawEvent {
    pub canvas: CanvasId,
    pub extent: (f64, f64),
    pub at: Timestamp,
}

pub type RedrawListener = Box<dyn FnMut(&RedrawEvent)>;

/// One viewport.
///
/// Layer data is shared with whoever built it, the artists drawing it are
/// owned here. Nothing is drawn until [`Canvas::render`] is called, and
/// [`Canvas::remove`] undoes everything `render` did.
pub struct Canvas {
    id: CanvasId,
    kind: CanvasKind,
    config: Arc<CanvasConfig>,
    entity_id: Option<String>,
    source: Option<CanvasId>,
    scan_range: Option<ScanRange>,
    layers: Vec<Layer>,
    artists: Vec<Artist>,
    original_layers: Option<Vec<Layer>>,
    layer_set: Option<Arc<Vec<Layer>>>,
    extent: (f64, f64),
    surface: Surface,
    brush: BrushController,
    redraw: Debouncer<RedrawEvent>,
    listeners: Vec<RedrawListener>,
    pointer: Option<(f64, f64)>,
}

impl Canvas {
    pub fn new(kind: CanvasKind, config: Arc<CanvasConfig>) -> Self {
        let height = match kind {
            CanvasKind::FeatureProfile => config.profile_height,
            _ => config.height,
        };
        let scan_range = match kind {
            CanvasKind::FeatureProfile => None,
            _ => config.default_scan_range,
        };
        let palette: Arc<[String]> = config.palette.iter().cloned().collect();
        let surface = Surface::new(config.width, height, config.margins, ColorCycle::new(palette));
        let brush = BrushController::new(
            config.timings.brush_throttle_ms,
            kind.idle_ms(&config.timings),
        );
        let redraw = Debouncer::new(config.timings.redraw_debounce_ms);
        let mut canvas = Self {
            id: CanvasId::next(),
            kind,
            config,
            entity_id: None,
            source: None,
            scan_range,
            layers: Vec::new(),
            artists: Vec::new(),
            original_layers: None,
            layer_set: None,
            extent: (0.0, 0.0),
            surface,
            brush,
            redraw,
            listeners: Vec::new(),
            pointer: None,
        };
        canvas.update_coordinate_interval();
        canvas
    }

    pub fn id(&self) -> CanvasId {
        self.id
    }

    pub fn kind(&self) -> CanvasKind {
        self.kind
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Identity of the entity on display, compared by the lifecycle to
    /// decide whether a zoom survives new data.
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn set_entity_id(&mut self, entity_id: Option<String>) {
        self.entity_id = entity_id;
    }

    /// The canvas this one follows, if it is a linked view.
    pub fn source(&self) -> Option<CanvasId> {
        self.source
    }

    pub fn set_source(&mut self, source: Option<CanvasId>) {
        self.source = source;
    }

    pub fn scan_range(&self) -> Option<ScanRange> {
        self.scan_range
    }

    /// Profile canvases take the range as given, the others fall back to the
    /// configured default.
    pub fn set_scan_range(&mut self, scan_range: Option<ScanRange>) {
        self.scan_range = match self.kind {
            CanvasKind::FeatureProfile => scan_range,
            _ => scan_range.or(self.config.default_scan_range),
        };
        self.update_coordinate_interval();
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// The unfiltered layers of a linked view, once it has been filtered.
    pub fn original_layers(&self) -> Option<&[Layer]> {
        self.original_layers.as_deref()
    }

    pub fn artists(&self) -> &[Artist] {
        &self.artists
    }

    pub fn extent(&self) -> (f64, f64) {
        self.extent
    }

    pub fn x_scale(&self) -> Option<LinearScale> {
        self.surface.x_scale
    }

    pub fn y_scale(&self) -> Option<LinearScale> {
        self.surface.y_scale
    }

    pub fn scene(&self) -> &Scene {
        &self.surface.scene
    }

    pub fn to_svg_string(&self) -> String {
        self.surface.scene.to_svg_string()
    }

    pub fn is_materialized(&self) -> bool {
        self.surface.container.is_some()
    }

    pub fn brush_state(&self) -> BrushState {
        self.brush.state()
    }

    pub fn idle_armed(&self) -> bool {
        self.brush.idle_armed()
    }

    pub fn has_pending_redraw(&self) -> bool {
        self.redraw.is_pending()
    }

    /// Current text of the x and y pointer readouts.
    pub fn readouts(&self) -> (Option<&str>, Option<&str>) {
        self.surface.readouts()
    }

    /// Takes over the entity id and extent of a canvas being replaced, so
    /// the next render keeps its zoom.
    pub(crate) fn inherit(&mut self, previous: &Canvas) {
        self.entity_id = previous.entity_id.clone();
        self.extent = previous.extent;
    }

    /// Whether this canvas was built from exactly this layer set.
    pub fn displays(&self, layers: &Arc<Vec<Layer>>) -> bool {
        self.layer_set
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, layers))
    }

    /// Adds a shared layer set, remembering it for [`Canvas::displays`].
    pub fn attach(&mut self, layers: &Arc<Vec<Layer>>) -> Result<(), CanvasError> {
        self.layer_set = Some(Arc::clone(layers));
        self.add_layers(layers.iter().cloned())
    }

    pub fn add_layer(&mut self, layer: Layer) -> Result<(), CanvasError> {
        self.layers.push(layer);
        if self.is_materialized() {
            self.render()?;
        }
        Ok(())
    }

    pub fn add_layers<I: IntoIterator<Item = Layer>>(&mut self, layers: I) -> Result<(), CanvasError> {
        self.layers.extend(layers);
        self.update_coordinate_interval();
        if self.is_materialized() {
            self.render()?;
        }
        Ok(())
    }

    /// Resets the extent to the default one for the current layers.
    pub fn update_coordinate_interval(&mut self) {
        self.extent = (self.min_coordinate(), self.max_coordinate());
    }

    pub fn min_coordinate(&self) -> f64 {
        let min_x = extent::finite_min(self.layers.iter().filter_map(|l| l.finite_min_coordinate()));
        extent::min_coordinate(min_x, self.scan_range, self.kind.padding())
    }

    pub fn max_coordinate(&self) -> f64 {
        let max_x = extent::finite_max(self.layers.iter().filter_map(|l| l.finite_max_coordinate()));
        extent::max_coordinate(max_x, self.scan_range, self.kind.padding())
    }

    fn min_y(&self) -> f64 {
        extent::finite_min(self.layers.iter().map(|l| l.min_y())).unwrap_or(0.0)
    }

    fn max_y(&self) -> f64 {
        extent::finite_max(self.layers.iter().map(|l| l.max_y())).unwrap_or(0.0)
    }

    fn max_y_between(&self, low: f64, high: f64) -> f64 {
        extent::finite_max(self.layers.iter().map(|l| l.between(low, high).max_y())).unwrap_or(0.0)
    }

    fn span<I: Iterator<Item = Option<(f64, f64)>>>(bounds: I) -> Option<(f64, f64)> {
        bounds
            .flatten()
            .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)))
    }

    fn time_bounds(&self) -> Option<(f64, f64)> {
        Self::span(self.layers.iter().map(|l| l.time_bounds()))
    }

    fn visible_time_bounds(&self, low: f64, high: f64) -> Option<(f64, f64)> {
        Self::span(self.layers.iter().map(|l| l.between(low, high).time_bounds()))
    }

    /// Tears down whatever was drawn and draws everything again against the
    /// default scales.
    #[instrument(skip(self), fields(canvas = %self.id))]
    pub fn render(&mut self) -> Result<(), CanvasError> {
        if self.is_materialized() {
            self.release_artifacts();
        }
        self.init_container()?;
        if !self.layers.is_empty() {
            self.draw()?;
        }
        Ok(())
    }

    fn init_container(&mut self) -> Result<(), CanvasError> {
        info!(
            "Initializing {} ({:?}) with {} layers",
            self.id,
            self.kind,
            self.layers.len()
        );
        let x_domain = (self.min_coordinate(), self.max_coordinate());
        let y_domain = match self.kind {
            CanvasKind::FeatureMap => {
                let (lo, hi) = self.time_bounds().unwrap_or((0.0, 0.0));
                extent::initial_domain(lo, hi)
            }
            _ => extent::initial_domain(self.min_y(), self.max_y()),
        };
        self.surface.init_container(self.kind, x_domain, y_domain)?;
        Ok(())
    }

    fn draw(&mut self) -> Result<(), CanvasError> {
        self.surface.colors.reset();
        self.artists.resize_with(self.layers.len(), Artist::default);
        let mut frame = self.surface.frame(self.id, &self.config)?;
        for (layer, artist) in self.layers.iter().zip(self.artists.iter_mut()) {
            layer.init_artist(artist, &mut frame)?;
        }
        Ok(())
    }

    fn release_artifacts(&mut self) {
        let scene = &mut self.surface.scene;
        for (i, artist) in self.artists.iter_mut().enumerate() {
            match self.layers.get(i) {
                Some(layer) => layer.remove(artist, scene),
                None => artist.release(scene),
            }
        }
        self.artists.clear();
        self.surface.teardown();
    }

    /// Removes every drawn artifact, cancels pending timers and detaches the
    /// redraw listeners. Layers stay, a later [`Canvas::render`] draws them
    /// again.
    pub fn remove(&mut self) {
        self.release_artifacts();
        self.brush.cancel();
        self.redraw.cancel();
        self.pointer = None;
        self.remove_redraw_listeners();
    }

    /// [`Canvas::remove`], then forgets the layers and scales.
    pub fn clear(&mut self) {
        self.remove();
        self.layers.clear();
        self.original_layers = None;
        self.layer_set = None;
        self.extent = (0.0, 0.0);
        self.surface.x_scale = None;
        self.surface.y_scale = None;
    }

    #[instrument(skip(self), fields(canvas = %self.id))]
    pub fn set_extent_by_coordinate(
        &mut self,
        min: Option<f64>,
        max: Option<f64>,
        duration: Option<f64>,
        now: Timestamp,
    ) -> Result<(), CanvasError> {
        self.set_extent(min, max, None, duration, now)
    }

    /// Moves the visible window. Missing endpoints take the default extent.
    ///
    /// The secondary axis follows the data inside the window: intensity
    /// canvases scale to the tallest visible point, feature maps to
    /// `time_span` if given, else to the time span of the visible features.
    pub fn set_extent(
        &mut self,
        min: Option<f64>,
        max: Option<f64>,
        time_span: Option<(f64, f64)>,
        duration: Option<f64>,
        now: Timestamp,
    ) -> Result<(), CanvasError> {
        if !self.is_materialized() {
            return Err(CanvasError::UninitializedContainer(self.id));
        }
        let (mut x_scale, mut y_scale) = self.surface.scales(self.id)?;
        let min = min.unwrap_or_else(|| self.min_coordinate());
        let max = max.unwrap_or_else(|| self.max_coordinate());
        let duration = duration.unwrap_or(self.config.timings.transition_ms);
        let y_domain = match self.kind {
            CanvasKind::FeatureMap => extent::time_domain(
                time_span
                    .or_else(|| self.visible_time_bounds(min, max))
                    .or_else(|| self.time_bounds()),
            ),
            _ => extent::intensity_domain(self.max_y_between(min, max), self.max_y()),
        };
        debug!(
            "{} extent [{:.3}, {:.3}], secondary [{:.3}, {:.3}]",
            self.id, min, max, y_domain.0, y_domain.1
        );

        self.extent = (min, max);
        x_scale.set_domain((min, max));
        y_scale.set_domain(y_domain);
        self.surface.x_scale = Some(x_scale);
        self.surface.y_scale = Some(y_scale);
        self.surface.draw_axes(duration)?;

        for (layer, artist) in self.layers.iter().zip(self.artists.iter_mut()) {
            layer.on_brush(artist, &mut self.surface.scene, (min, max))?;
        }
        let mut frame = self.surface.frame(self.id, &self.config)?;
        for (layer, artist) in self.layers.iter().zip(self.artists.iter_mut()) {
            layer.redraw(artist, &mut frame)?;
        }

        self.redraw.schedule(
            now,
            RedrawEvent {
                canvas: self.id,
                extent: (min, max),
                at: now,
            },
        );
        Ok(())
    }

    pub fn reset_zoom(&mut self, now: Timestamp) -> Result<(), CanvasError> {
        info!("Resetting {}", self.id);
        self.set_extent_by_coordinate(None, None, None, now)
    }

    pub fn brush_start(&mut self) {
        self.brush.start();
    }

    pub fn brush_move(&mut self, selection: Selection) {
        self.brush.moved(selection);
    }

    /// Queues the end of a brush gesture. It is applied by [`Canvas::tick`]
    /// once the throttle window closes.
    pub fn brush_end(&mut self, selection: Selection, now: Timestamp) {
        debug!("{} brush end {:?}", self.id, selection);
        self.brush.end(selection, now);
    }

    pub fn double_click(&mut self, now: Timestamp) -> Result<(), CanvasError> {
        self.reset_zoom(now)
    }

    fn commit_selection(&mut self, selection: Selection, now: Timestamp) -> Result<(), CanvasError> {
        let (x_scale, y_scale) = self.surface.scales(self.id)?;
        let ordered = |a: f64, b: f64| if a <= b { (a, b) } else { (b, a) };
        match selection {
            Selection::Empty => Ok(()),
            Selection::Range(x0, x1) => {
                let (lo, hi) = ordered(x_scale.invert(x0), x_scale.invert(x1));
                self.set_extent_by_coordinate(Some(lo), Some(hi), None, now)
            }
            Selection::Rect { x0, y0, x1, y1 } => {
                let (lo, hi) = ordered(x_scale.invert(x0), x_scale.invert(x1));
                let time_span = match self.kind {
                    CanvasKind::FeatureMap => Some(ordered(y_scale.invert(y0), y_scale.invert(y1))),
                    _ => None,
                };
                self.set_extent(Some(lo), Some(hi), time_span, None, now)
            }
        }
    }

    /// Advances the brush and redraw timers to `now`, delivering whatever
    /// came due.
    pub fn tick(&mut self, now: Timestamp) -> Result<(), CanvasError> {
        match self.brush.poll(now) {
            Some(BrushOutcome::Commit(selection)) => self.commit_selection(selection, now)?,
            Some(BrushOutcome::Reset) => self.reset_zoom(now)?,
            Some(BrushOutcome::Armed) => debug!("{} waiting for a second empty brush", self.id),
            None => {}
        }
        if let Some(event) = self.redraw.poll(now) {
            for listener in self.listeners.iter_mut() {
                listener(&event);
            }
        }
        Ok(())
    }

    /// Records the pointer position in pixels. Nothing is updated until the
    /// next [`Canvas::animation_frame`].
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.pointer = Some((x, y));
    }

    /// Updates the pointer readouts and hover annotations for the last
    /// recorded pointer position.
    pub fn animation_frame(&mut self) -> Result<(), CanvasError> {
        let Some((px, py)) = self.pointer.take() else {
            return Ok(());
        };
        let (x_scale, y_scale) = self.surface.scales(self.id)?;
        let cursor = Cursor {
            x: x_scale.invert(px),
            y: y_scale.invert(py),
        };
        let (x_label, _) = self.kind.dimension_labels();
        let x_text = if cursor.x > 0.0 {
            format!("{} = {:.3}", x_label, cursor.x)
        } else {
            format!("{} = -", x_label)
        };
        let y_text = match (self.kind, cursor.y > 0.0) {
            (CanvasKind::FeatureMap, true) => format!("IM. = {:.3}", cursor.y),
            (CanvasKind::FeatureMap, false) => "IM. = -".to_string(),
            (_, true) => format!("Int. = {:.2e}", cursor.y),
            (_, false) => "Int. = -".to_string(),
        };
        self.surface.set_readouts(&x_text, &y_text)?;

        let mut frame = self.surface.frame(self.id, &self.config)?;
        for (layer, artist) in self.layers.iter().zip(self.artists.iter_mut()) {
            layer.on_hover(artist, &mut frame, cursor)?;
        }
        Ok(())
    }

    pub fn add_redraw_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&RedrawEvent) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn remove_redraw_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Narrows a linked view to the traces whose feature m/z lies in
    /// `[start, end]`. Without both bounds the original layers come back
    /// unchanged.
    ///
    /// The layers present on the first call are kept as the original set;
    /// every later call filters that set, never the displayed one.
    pub fn set_mz_range(&mut self, start: Option<f64>, end: Option<f64>) -> Result<(), CanvasError> {
        if self.original_layers.is_none() {
            self.original_layers = Some(self.layers.clone());
        }
        self.release_artifacts();
        let original = self.original_layers.as_deref().unwrap_or_default();
        self.layers = match (start, end) {
            (Some(start), Some(end)) => original
                .iter()
                .map(|l| l.apply_mz_filter(start, end))
                .collect(),
            _ => original.to_vec(),
        };
        debug!(
            "{} showing {} points after m/z filter {:?}..{:?}",
            self.id,
            self.layers.iter().map(|l| l.len()).sum::<usize>(),
            start,
            end
        );
        self.update_coordinate_interval();
        self.render()
    }
}

#[cfg(test)]
mod tests;
