use std::sync::Arc;

use mzcanvas::layers::LayerKind;
use mzcanvas::models::{
    Feature,
    FeatureMap,
    FeatureSample,
    MzPoint,
    SignalContinuity,
    Spectrum,
};
use mzcanvas::{
    CanvasAction,
    CanvasConfig,
    CanvasKind,
    CanvasState,
    LayerLike,
    SourceEntity,
    Timestamp,
    ViewData,
};

fn spectrum(id: &str) -> Arc<ViewData> {
    let spectrum = Spectrum {
        id: id.to_string(),
        ms_level: 1,
        signal_continuity: SignalContinuity::Centroid,
        mz_array: vec![],
        intensity_array: vec![],
        centroids: Some(vec![
            MzPoint::new(100.0, 100.0),
            MzPoint::new(300.0, 50.0),
            MzPoint::new(1000.0, 80.0),
        ]),
        deconvoluted_peaks: None,
        precursor: None,
        scan_range: None,
    };
    Arc::new(ViewData::new(SourceEntity::Spectrum {
        spectrum: Arc::new(spectrum),
        group: None,
    }))
}

fn feature(mz: f64, times: &[f64]) -> Arc<Feature> {
    let samples = times
        .iter()
        .map(|&time| FeatureSample {
            mz,
            time,
            intensity: 100.0 * time,
        })
        .collect();
    Arc::new(Feature::new(samples, vec![]))
}

fn feature_map(id: &str) -> Arc<ViewData> {
    let map = FeatureMap {
        id: id.to_string(),
        features: Some(vec![
            feature(500.0, &[1.0, 1.1, 1.2]),
            feature(700.0, &[1.05, 1.15]),
        ]),
        deconvolved_features: None,
        scan_range: None,
    };
    Arc::new(ViewData::new(SourceEntity::FeatureMap(Arc::new(map))))
}

fn state() -> CanvasState {
    CanvasState::new("test", Arc::new(CanvasConfig::default()))
}

fn set(state: CanvasState, data: &Arc<ViewData>, at: f64) -> CanvasState {
    state
        .dispatch(CanvasAction::SetData(Some(Arc::clone(data))), Timestamp(at))
        .unwrap()
}

fn zoom(state: &mut CanvasState, min: f64, max: f64, at: f64) {
    state
        .viewport_mut()
        .unwrap()
        .set_extent_by_coordinate(Some(min), Some(max), Some(0.0), Timestamp(at))
        .unwrap();
}

#[test]
fn test_first_data_creates_viewport() {
    let state = set(state(), &spectrum("scan=1"), 0.0);
    let viewport = state.viewport().unwrap();
    assert_eq!(viewport.kind(), CanvasKind::Spectrum);
    assert!(viewport.is_materialized());
    assert_eq!(viewport.entity_id(), Some("scan=1"));
    assert_eq!(viewport.extent(), (50.0, 1050.0));
    assert!(state.linked_viewport().is_none());
}

#[test]
fn test_same_entity_keeps_zoom() {
    let mut state = set(state(), &spectrum("scan=1"), 0.0);
    zoom(&mut state, 200.0, 400.0, 10.0);
    // Test: Rebuilt data for the same scan keeps the zoom
    let state = set(state, &spectrum("scan=1"), 20.0);
    assert_eq!(state.viewport().unwrap().extent(), (200.0, 400.0));
}

#[test]
fn test_new_entity_resets_zoom() {
    let mut state = set(state(), &spectrum("scan=1"), 0.0);
    zoom(&mut state, 200.0, 400.0, 10.0);
    let state = set(state, &spectrum("scan=2"), 20.0);
    let viewport = state.viewport().unwrap();
    assert_eq!(viewport.extent(), (50.0, 1050.0));
    assert_eq!(viewport.entity_id(), Some("scan=2"));
}

#[test]
fn test_same_layer_set_is_not_redrawn() {
    let data = spectrum("scan=1");
    let mut state = set(state(), &data, 0.0);
    zoom(&mut state, 200.0, 400.0, 10.0);
    let id = state.viewport().unwrap().id();
    let size = state.viewport().unwrap().scene().len();

    let state = set(state, &data, 20.0)
        .dispatch(CanvasAction::RenderCanvas, Timestamp(30.0))
        .unwrap();
    let viewport = state.viewport().unwrap();
    assert_eq!(viewport.id(), id);
    assert_eq!(viewport.extent(), (200.0, 400.0));
    assert_eq!(viewport.scene().len(), size);
}

#[test]
fn test_kind_switch_rebuilds_viewport() {
    let state = set(state(), &spectrum("scan=1"), 0.0);
    let spectrum_id = state.viewport().unwrap().id();
    let state = set(state, &feature_map("map=1"), 10.0);
    let viewport = state.viewport().unwrap();
    assert_eq!(viewport.kind(), CanvasKind::FeatureMap);
    assert_ne!(viewport.id(), spectrum_id);
    assert_eq!(viewport.layers().len(), 2);
}

#[test]
fn test_clearing_data_tears_down() {
    let state = state().with_linked_view(true);
    let state = set(state, &feature_map("map=1"), 0.0);
    assert!(state.linked_viewport().is_some());
    let state = state
        .dispatch(CanvasAction::SetData(None), Timestamp(10.0))
        .unwrap();
    assert!(state.viewport().is_none());
    assert!(state.linked_viewport().is_none());
    assert!(state.current_data().is_none());
}

#[test]
fn test_spectra_have_no_linked_view() {
    let state = state().with_linked_view(true);
    let state = set(state, &spectrum("scan=1"), 0.0);
    assert!(state.show_linked_view());
    assert!(state.linked_viewport().is_none());
}

#[test]
fn test_toggle_linked_view_keeps_zoom() {
    let mut state = set(state(), &feature_map("map=1"), 0.0);
    zoom(&mut state, 450.0, 650.0, 10.0);

    let state = state
        .dispatch(CanvasAction::ToggleLinkedView, Timestamp(20.0))
        .unwrap();
    let viewport = state.viewport().unwrap();
    let linked = state.linked_viewport().unwrap();
    assert_eq!(viewport.extent(), (450.0, 650.0));
    assert_eq!(linked.kind(), CanvasKind::FeatureProfile);
    assert_eq!(linked.source(), Some(viewport.id()));
    assert_eq!(linked.layers()[0].kind(), LayerKind::FeatureProfiles);
    assert_eq!(viewport.listener_count(), 1);

    // Test: Toggling twice is back where it started
    let state = state
        .dispatch(CanvasAction::ToggleLinkedView, Timestamp(30.0))
        .unwrap();
    assert!(!state.show_linked_view());
    assert!(state.linked_viewport().is_none());
    assert_eq!(state.viewport().unwrap().extent(), (450.0, 650.0));
    assert_eq!(state.viewport().unwrap().listener_count(), 0);
}

#[test]
fn test_linked_view_follows_zoom() {
    let state = state().with_linked_view(true);
    let mut state = set(state, &feature_map("map=1"), 0.0);
    state.tick(Timestamp(10.0)).unwrap();
    assert_eq!(state.viewport().unwrap().extent(), (80.0, 750.0));
    assert_eq!(state.linked_viewport().unwrap().layers()[0].len(), 5);

    zoom(&mut state, 450.0, 550.0, 20.0);
    state.tick(Timestamp(24.0)).unwrap();
    assert_eq!(state.linked_viewport().unwrap().layers()[0].len(), 5);

    state.tick(Timestamp(25.0)).unwrap();
    let linked = state.linked_viewport().unwrap();
    assert_eq!(linked.layers()[0].len(), 3);
    assert!(linked.is_materialized());
    assert_eq!(linked.original_layers().map(|l| l[0].len()), Some(5));
}

#[test]
fn test_toggle_off_and_on_reproduces_filter() {
    let state = state().with_linked_view(true);
    let mut state = set(state, &feature_map("map=1"), 0.0);
    state.tick(Timestamp(10.0)).unwrap();
    zoom(&mut state, 450.0, 550.0, 20.0);
    state.tick(Timestamp(30.0)).unwrap();
    let before = state.linked_viewport().unwrap().layers()[0].len();

    let mut state = state
        .dispatch(CanvasAction::ToggleLinkedView, Timestamp(40.0))
        .unwrap()
        .dispatch(CanvasAction::ToggleLinkedView, Timestamp(50.0))
        .unwrap();
    state.tick(Timestamp(60.0)).unwrap();
    assert_eq!(state.viewport().unwrap().extent(), (450.0, 550.0));
    assert_eq!(state.linked_viewport().unwrap().layers()[0].len(), before);
    assert_eq!(before, 3);
}

#[test]
fn test_rerender_does_not_leak_artifacts() {
    let mut state = set(state(), &spectrum("scan=1"), 0.0);
    let size = state.viewport().unwrap().scene().len();
    for i in 1..5 {
        state = set(state, &spectrum("scan=1"), i as f64 * 10.0);
    }
    assert_eq!(state.viewport().unwrap().scene().len(), size);
}
