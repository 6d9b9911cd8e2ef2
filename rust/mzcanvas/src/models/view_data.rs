use std::sync::Arc;

use tracing::{
    debug,
    instrument,
};

use super::points::{
    ChargedPoint,
    DeconvolutedPoint,
    MzPoint,
};
use super::sources::{
    FeatureMap,
    ScanRange,
    SignalContinuity,
    SourceEntity,
    Spectrum,
    SpectrumGroup,
};
use crate::canvas::CanvasKind;
use crate::layers::{
    CentroidLayer,
    DeconvolutedLayer,
    DeconvolvedFeatureEllipseLayer,
    FeatureEllipseLayer,
    FeaturePointLayer,
    FeatureProfileCollection,
    IsolationWindowLayer,
    Layer,
    LayerLike,
    LayerStyle,
    PrecursorLayer,
    ProfileLayer,
};

/// An entity together with the layers that display it.
///
/// The layer set is built once and shared: a canvas showing this data holds
/// the same `Arc`, which is how the lifecycle tells a redraw of the same data
/// from new data.
#[derive(Debug, Clone)]
pub struct ViewData {
    pub id: String,
    pub entity: SourceEntity,
    pub layers: Arc<Vec<Layer>>,
    pub scan_range: Option<ScanRange>,
}

impl ViewData {
    #[instrument(skip(entity), fields(id = %entity.id()))]
    pub fn new(entity: SourceEntity) -> Self {
        let layers = match &entity {
            SourceEntity::Spectrum { spectrum, group } => spectrum_layers(spectrum, group.as_ref()),
            SourceEntity::FeatureMap(map) => feature_map_layers(map),
        };
        debug!("Built {} layers", layers.len());
        Self {
            id: entity.id().to_string(),
            scan_range: entity.scan_range(),
            layers: Arc::new(layers),
            entity,
        }
    }

    /// The kind of canvas able to display this data.
    pub fn kind(&self) -> CanvasKind {
        match self.entity {
            SourceEntity::Spectrum { .. } => CanvasKind::Spectrum,
            SourceEntity::FeatureMap(_) => CanvasKind::FeatureMap,
        }
    }

    pub fn feature_map(&self) -> Option<&Arc<FeatureMap>> {
        match &self.entity {
            SourceEntity::FeatureMap(map) => Some(map),
            SourceEntity::Spectrum { .. } => None,
        }
    }

    /// Elution profiles of every feature, for the view linked to a feature
    /// map. `None` for spectra.
    pub fn profile_collection(&self, max_features: usize) -> Option<FeatureProfileCollection> {
        self.feature_map()
            .map(|map| FeatureProfileCollection::from_feature_map(map, max_features))
    }
}

fn spectrum_layers(spectrum: &Spectrum, group: Option<&SpectrumGroup>) -> Vec<Layer> {
    let mut layers = Vec::new();
    let centroids = spectrum
        .centroids
        .as_ref()
        .filter(|c| !c.is_empty())
        .cloned();
    match spectrum.signal_continuity {
        SignalContinuity::Profile => {
            layers.push(Layer::Profile(ProfileLayer::from_arrays(
                &spectrum.mz_array,
                &spectrum.intensity_array,
            )));
            if let Some(peaks) = centroids {
                layers.push(Layer::Centroid(CentroidLayer::new(peaks)));
            }
        }
        SignalContinuity::Centroid => {
            let peaks = centroids.unwrap_or_else(|| {
                spectrum
                    .mz_array
                    .iter()
                    .zip(&spectrum.intensity_array)
                    .map(|(mz, intensity)| MzPoint::new(*mz, *intensity))
                    .collect()
            });
            if !peaks.is_empty() {
                layers.push(Layer::Centroid(CentroidLayer::new(peaks)));
            }
        }
    }

    if let Some(peaks) = spectrum.deconvoluted_peaks.as_ref().filter(|p| !p.is_empty()) {
        let points = peaks
            .iter()
            .map(|p| DeconvolutedPoint {
                mz: p.mz,
                intensity: p.intensity,
                charge: p.charge,
                envelope: Arc::from(p.envelope.as_slice()),
            })
            .collect();
        layers.push(Layer::Deconvoluted(
            DeconvolutedLayer::new(points).with_style(LayerStyle::with_stroke_width(0.5)),
        ));
    }

    if spectrum.ms_level > 1 {
        if let Some(precursor) = &spectrum.precursor {
            layers.push(Layer::Precursor(PrecursorLayer::new(ChargedPoint {
                mz: precursor.mz,
                intensity: precursor.intensity,
                charge: precursor.charge.unwrap_or(0),
            })));
        }
    }

    if let Some(group) = group {
        let windows = group.isolation_windows();
        if !windows.is_empty() {
            let height = layers.first().map_or(1.0, |l| l.max_y());
            layers.push(Layer::IsolationWindow(IsolationWindowLayer::new(
                windows, height,
            )));
        }
    }
    layers
}

fn feature_map_layers(map: &FeatureMap) -> Vec<Layer> {
    let mut layers = Vec::new();
    if let Some(features) = &map.features {
        layers.push(Layer::FeaturePoints(FeaturePointLayer::from_features(
            features,
        )));
        layers.push(Layer::FeatureEllipses(FeatureEllipseLayer::new(
            features.clone(),
        )));
    }
    if let Some(features) = &map.deconvolved_features {
        layers.push(Layer::DeconvolvedFeatureEllipses(
            DeconvolvedFeatureEllipseLayer::new(features.clone()),
        ));
    }
    layers
}
