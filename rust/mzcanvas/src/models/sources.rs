//! Already-processed entities handed to the engine by the caller.
//!
//! Nothing here is computed by the engine: centroids, deconvoluted peaks,
//! features and peak fits all come from an external processing step. The
//! accessors only summarize what is already there.

use serde::{
    Deserialize,
    Serialize,
};
use std::sync::Arc;

use super::points::{
    MzPoint,
    neutral_mass,
};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ScanRange {
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl ScanRange {
    pub fn new(lower_bound: f64, upper_bound: f64) -> Self {
        Self {
            lower_bound,
            upper_bound,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct IsolationWindow {
    pub target: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Precursor {
    pub mz: f64,
    pub intensity: f64,
    pub charge: Option<i32>,
    pub isolation_window: Option<IsolationWindow>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SignalContinuity {
    Profile,
    Centroid,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DeconvolutedPeak {
    pub mz: f64,
    pub intensity: f64,
    pub charge: i32,
    #[serde(default)]
    pub envelope: Vec<MzPoint>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Spectrum {
    pub id: String,
    pub ms_level: u8,
    pub signal_continuity: SignalContinuity,
    /// Raw signal, profile data only.
    #[serde(default)]
    pub mz_array: Vec<f64>,
    #[serde(default)]
    pub intensity_array: Vec<f64>,
    #[serde(default)]
    pub centroids: Option<Vec<MzPoint>>,
    #[serde(default)]
    pub deconvoluted_peaks: Option<Vec<DeconvolutedPeak>>,
    #[serde(default)]
    pub precursor: Option<Precursor>,
    #[serde(default)]
    pub scan_range: Option<ScanRange>,
}

/// A precursor spectrum with the product spectra acquired from it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct SpectrumGroup {
    #[serde(default)]
    pub products: Vec<Spectrum>,
}

impl SpectrumGroup {
    pub fn isolation_windows(&self) -> Vec<IsolationWindow> {
        self.products
            .iter()
            .filter_map(|s| s.precursor.as_ref()?.isolation_window)
            .collect()
    }
}

/// One sample of an extracted ion trace.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct FeatureSample {
    pub mz: f64,
    pub time: f64,
    pub intensity: f64,
}

/// A peak model fitted to a feature's trace by an external fitter.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct PeakFit {
    /// Location of the apex along time.
    pub mu: f64,
    /// Model density at the apex.
    pub density: f64,
}

/// An ion trace in the m/z by time plane. Samples are kept sorted by time,
/// deserialized features go through [`Feature::new`] as well.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(from = "RawFeature")]
pub struct Feature {
    pub samples: Vec<FeatureSample>,
    pub peak_fits: Vec<PeakFit>,
}

#[derive(Deserialize)]
struct RawFeature {
    samples: Vec<FeatureSample>,
    #[serde(default)]
    peak_fits: Vec<PeakFit>,
}

impl From<RawFeature> for Feature {
    fn from(raw: RawFeature) -> Self {
        Feature::new(raw.samples, raw.peak_fits)
    }
}

impl Feature {
    pub fn new(mut samples: Vec<FeatureSample>, peak_fits: Vec<PeakFit>) -> Self {
        samples.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { samples, peak_fits }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn total_ion_current(&self) -> f64 {
        self.samples.iter().map(|s| s.intensity).sum()
    }

    /// Intensity-weighted mean m/z.
    pub fn average_mz(&self) -> f64 {
        let total = self.total_ion_current();
        if total <= 0.0 {
            return self.samples.first().map_or(0.0, |s| s.mz);
        }
        self.samples.iter().map(|s| s.mz * s.intensity).sum::<f64>() / total
    }

    pub fn start_time(&self) -> f64 {
        self.samples.first().map_or(0.0, |s| s.time)
    }

    pub fn end_time(&self) -> f64 {
        self.samples.last().map_or(0.0, |s| s.time)
    }

    pub fn apex(&self) -> Option<&FeatureSample> {
        self.samples
            .iter()
            .max_by(|a, b| a.intensity.total_cmp(&b.intensity))
    }

    pub fn apex_time(&self) -> f64 {
        self.apex().map_or(0.0, |s| s.time)
    }

    pub fn max_intensity(&self) -> f64 {
        self.apex().map_or(0.0, |s| s.intensity)
    }

    /// Smallest and largest sampled m/z.
    pub fn mz_bounds(&self) -> Option<(f64, f64)> {
        let mut iter = self.samples.iter().map(|s| s.mz);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), mz| (lo.min(mz), hi.max(mz))))
    }

    /// The fit with the highest density, if any was provided.
    pub fn best_fit(&self) -> Option<&PeakFit> {
        self.peak_fits
            .iter()
            .max_by(|a, b| a.density.total_cmp(&b.density))
    }
}

/// A charge-deconvolved feature: one trace per isotopic peak.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DeconvolvedFeature {
    pub charge: i32,
    /// Monoisotopic peak first.
    pub envelope: Vec<Feature>,
}

impl DeconvolvedFeature {
    fn monoisotopic(&self) -> Option<&Feature> {
        self.envelope.first()
    }

    pub fn total_ion_current(&self) -> f64 {
        self.envelope.iter().map(|f| f.total_ion_current()).sum()
    }

    /// Intensity-weighted mean m/z of the monoisotopic trace.
    pub fn weighted_mz(&self) -> f64 {
        self.monoisotopic().map_or(0.0, |f| f.average_mz())
    }

    pub fn weighted_neutral_mass(&self) -> f64 {
        neutral_mass(self.weighted_mz(), self.charge)
    }

    pub fn start_time(&self) -> f64 {
        let start = self
            .envelope
            .iter()
            .filter(|f| !f.is_empty())
            .map(|f| f.start_time())
            .fold(f64::INFINITY, f64::min);
        if start.is_finite() { start } else { 0.0 }
    }

    pub fn end_time(&self) -> f64 {
        self.envelope
            .iter()
            .map(|f| f.end_time())
            .fold(0.0, f64::max)
    }

    pub fn apex_time(&self) -> f64 {
        self.monoisotopic().map_or(0.0, |f| f.apex_time())
    }

    pub fn mz_bounds(&self) -> Option<(f64, f64)> {
        self.monoisotopic()?.mz_bounds()
    }

    /// Samples of every envelope trace, merged and sorted by time.
    pub fn samples(&self) -> Vec<FeatureSample> {
        let mut samples: Vec<FeatureSample> = self
            .envelope
            .iter()
            .flat_map(|f| f.samples.iter().copied())
            .collect();
        samples.sort_by(|a, b| a.time.total_cmp(&b.time));
        samples
    }
}

/// Features detected over an LC-MS or ion mobility acquisition.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct FeatureMap {
    pub id: String,
    #[serde(default)]
    pub features: Option<Vec<Arc<Feature>>>,
    #[serde(default)]
    pub deconvolved_features: Option<Vec<Arc<DeconvolvedFeature>>>,
    #[serde(default)]
    pub scan_range: Option<ScanRange>,
}

/// The entity a view displays.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceEntity {
    Spectrum {
        spectrum: Arc<Spectrum>,
        #[serde(default)]
        group: Option<SpectrumGroup>,
    },
    FeatureMap(Arc<FeatureMap>),
}

impl SourceEntity {
    pub fn id(&self) -> &str {
        match self {
            SourceEntity::Spectrum { spectrum, .. } => &spectrum.id,
            SourceEntity::FeatureMap(map) => &map.id,
        }
    }

    pub fn scan_range(&self) -> Option<ScanRange> {
        match self {
            SourceEntity::Spectrum { spectrum, .. } => spectrum.scan_range,
            SourceEntity::FeatureMap(map) => map.scan_range,
        }
    }
}
