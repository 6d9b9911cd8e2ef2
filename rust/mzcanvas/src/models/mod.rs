pub mod points;
pub mod sources;
pub mod view_data;

pub use points::{
    ChargedPoint,
    DeconvolutedPoint,
    FeatureMapPoint,
    FeatureProfilePoint,
    FeatureRef,
    LabeledPoint,
    MzPoint,
    PROTON,
    Point,
    PointLike,
    neutral_mass,
};
pub use sources::{
    DeconvolutedPeak,
    DeconvolvedFeature,
    Feature,
    FeatureMap,
    FeatureSample,
    IsolationWindow,
    PeakFit,
    Precursor,
    ScanRange,
    SignalContinuity,
    SourceEntity,
    Spectrum,
    SpectrumGroup,
};
pub use view_data::ViewData;
