use serde::{
    Deserialize,
    Serialize,
};
use std::sync::Arc;

use super::sources::{
    DeconvolvedFeature,
    Feature,
};

/// Mass of a proton as used for charge state conversions.
pub const PROTON: f64 = 1.007;

pub fn neutral_mass(mz: f64, charge: i32) -> f64 {
    mz * (charge.abs() as f64) - (charge as f64) * PROTON
}

/// Anything that can be placed on a 2D canvas.
///
/// `x` is the primary (sort) coordinate of the layer holding the point.
pub trait PointLike {
    fn x(&self) -> f64;
    fn y(&self) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MzPoint {
    pub mz: f64,
    pub intensity: f64,
}

impl MzPoint {
    pub fn new(mz: f64, intensity: f64) -> Self {
        Self { mz, intensity }
    }
}

impl PointLike for MzPoint {
    fn x(&self) -> f64 {
        self.mz
    }
    fn y(&self) -> f64 {
        self.intensity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChargedPoint {
    pub mz: f64,
    pub intensity: f64,
    pub charge: i32,
}

impl ChargedPoint {
    pub fn neutral_mass(&self) -> f64 {
        neutral_mass(self.mz, self.charge)
    }
}

impl PointLike for ChargedPoint {
    fn x(&self) -> f64 {
        self.mz
    }
    fn y(&self) -> f64 {
        self.intensity
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledPoint {
    pub mz: f64,
    pub intensity: f64,
    pub charge: i32,
    pub label: Arc<str>,
}

impl LabeledPoint {
    pub fn neutral_mass(&self) -> f64 {
        neutral_mass(self.mz, self.charge)
    }
}

impl PointLike for LabeledPoint {
    fn x(&self) -> f64 {
        self.mz
    }
    fn y(&self) -> f64 {
        self.intensity
    }
}

/// A charge-deconvoluted peak together with the isotopic envelope it was
/// assembled from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeconvolutedPoint {
    pub mz: f64,
    pub intensity: f64,
    pub charge: i32,
    pub envelope: Arc<[MzPoint]>,
}

impl DeconvolutedPoint {
    pub fn neutral_mass(&self) -> f64 {
        neutral_mass(self.mz, self.charge)
    }

    /// Intensity-weighted mean m/z of the envelope, falling back to the
    /// monoisotopic m/z for an empty envelope.
    pub fn envelope_centroid(&self) -> f64 {
        let total: f64 = self.envelope.iter().map(|p| p.intensity).sum();
        if total <= 0.0 {
            return self.mz;
        }
        self.envelope.iter().map(|p| p.mz * p.intensity).sum::<f64>() / total
    }

    pub fn envelope_apex(&self) -> f64 {
        self.envelope
            .iter()
            .map(|p| p.intensity)
            .fold(0.0, f64::max)
    }
}

impl PointLike for DeconvolutedPoint {
    fn x(&self) -> f64 {
        self.mz
    }
    fn y(&self) -> f64 {
        self.intensity
    }
}

/// A sample on the m/z by time plane. Intensity is carried along for color.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureMapPoint {
    pub mz: f64,
    pub time: f64,
    pub intensity: f64,
}

impl PointLike for FeatureMapPoint {
    fn x(&self) -> f64 {
        self.mz
    }
    fn y(&self) -> f64 {
        self.time
    }
}

/// A sample of an extracted ion trace, laid out along time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureProfilePoint {
    pub time: f64,
    pub intensity: f64,
    pub mz: f64,
}

impl PointLike for FeatureProfilePoint {
    fn x(&self) -> f64 {
        self.time
    }
    fn y(&self) -> f64 {
        self.intensity
    }
}

/// Shared handle to the feature a point was derived from.
#[derive(Debug, Clone)]
pub enum FeatureRef {
    Feature(Arc<Feature>),
    Deconvolved(Arc<DeconvolvedFeature>),
}

impl FeatureRef {
    /// The m/z the feature is filtered and labeled by.
    pub fn mz(&self) -> f64 {
        match self {
            FeatureRef::Feature(f) => f.average_mz(),
            FeatureRef::Deconvolved(f) => f.weighted_mz(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            FeatureRef::Feature(f) => format!("{:.3}", f.average_mz()),
            FeatureRef::Deconvolved(f) => {
                format!("{:.3}, {}", f.weighted_neutral_mass(), f.charge)
            }
        }
    }

    pub fn start_time(&self) -> f64 {
        match self {
            FeatureRef::Feature(f) => f.start_time(),
            FeatureRef::Deconvolved(f) => f.start_time(),
        }
    }

    pub fn end_time(&self) -> f64 {
        match self {
            FeatureRef::Feature(f) => f.end_time(),
            FeatureRef::Deconvolved(f) => f.end_time(),
        }
    }

    /// Identity comparison, two handles are the same feature only if they
    /// point at the same allocation.
    pub fn same_feature(&self, other: &FeatureRef) -> bool {
        match (self, other) {
            (FeatureRef::Feature(a), FeatureRef::Feature(b)) => Arc::ptr_eq(a, b),
            (FeatureRef::Deconvolved(a), FeatureRef::Deconvolved(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// The closed family of points a layer can hand out.
#[derive(Debug, Clone)]
pub enum Point {
    Mz(MzPoint),
    Charged(ChargedPoint),
    Labeled(LabeledPoint),
    Deconvoluted(DeconvolutedPoint),
    FeatureMap(FeatureMapPoint),
    FeatureProfile(FeatureProfilePoint),
    Feature {
        point: FeatureMapPoint,
        feature: FeatureRef,
    },
}

impl PointLike for Point {
    fn x(&self) -> f64 {
        match self {
            Point::Mz(p) => p.x(),
            Point::Charged(p) => p.x(),
            Point::Labeled(p) => p.x(),
            Point::Deconvoluted(p) => p.x(),
            Point::FeatureMap(p) => p.x(),
            Point::FeatureProfile(p) => p.x(),
            Point::Feature { point, .. } => point.x(),
        }
    }

    fn y(&self) -> f64 {
        match self {
            Point::Mz(p) => p.y(),
            Point::Charged(p) => p.y(),
            Point::Labeled(p) => p.y(),
            Point::Deconvoluted(p) => p.y(),
            Point::FeatureMap(p) => p.y(),
            Point::FeatureProfile(p) => p.y(),
            Point::Feature { point, .. } => point.y(),
        }
    }
}

impl Point {
    pub fn intensity(&self) -> f64 {
        match self {
            Point::FeatureMap(p) => p.intensity,
            Point::Feature { point, .. } => point.intensity,
            other => other.y(),
        }
    }
}

impl From<MzPoint> for Point {
    fn from(p: MzPoint) -> Self {
        Point::Mz(p)
    }
}

impl From<ChargedPoint> for Point {
    fn from(p: ChargedPoint) -> Self {
        Point::Charged(p)
    }
}

impl From<LabeledPoint> for Point {
    fn from(p: LabeledPoint) -> Self {
        Point::Labeled(p)
    }
}

impl From<DeconvolutedPoint> for Point {
    fn from(p: DeconvolutedPoint) -> Self {
        Point::Deconvoluted(p)
    }
}

impl From<FeatureMapPoint> for Point {
    fn from(p: FeatureMapPoint) -> Self {
        Point::FeatureMap(p)
    }
}

impl From<FeatureProfilePoint> for Point {
    fn from(p: FeatureProfilePoint) -> Self {
        Point::FeatureProfile(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_mass_positive_charge() {
        // Test: [M+2H]2+ at 500.5 is a ~999 Da molecule
        let mass = neutral_mass(500.5, 2);
        assert!((mass - 998.986).abs() < 1e-9);
    }

    #[test]
    fn test_neutral_mass_negative_charge() {
        let mass = neutral_mass(500.5, -2);
        assert!((mass - 1003.014).abs() < 1e-9);
    }

    #[test]
    fn test_envelope_centroid_is_intensity_weighted() {
        let point = DeconvolutedPoint {
            mz: 500.0,
            intensity: 30.0,
            charge: 2,
            envelope: Arc::from(vec![MzPoint::new(500.0, 10.0), MzPoint::new(500.5, 30.0)]),
        };
        assert!((point.envelope_centroid() - 500.375).abs() < 1e-9);
        assert_eq!(point.envelope_apex(), 30.0);
    }

    #[test]
    fn test_empty_envelope_falls_back_to_mz() {
        let point = DeconvolutedPoint {
            mz: 321.0,
            intensity: 1.0,
            charge: 1,
            envelope: Arc::from(Vec::<MzPoint>::new()),
        };
        assert_eq!(point.envelope_centroid(), 321.0);
    }
}
