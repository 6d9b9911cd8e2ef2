use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use super::*;
use crate::layers::{
    CentroidLayer,
    FeatureProfileCollection,
    FeatureProfileLayer,
};
use crate::models::{
    Feature,
    FeatureRef,
    FeatureSample,
    MzPoint,
};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn centroid_canvas() -> Canvas {
    let mut canvas = Canvas::new(CanvasKind::Spectrum, Arc::new(CanvasConfig::default()));
    canvas
        .add_layer(Layer::Centroid(CentroidLayer::new(vec![
            MzPoint::new(100.0, 100.0),
            MzPoint::new(300.0, 50.0),
            MzPoint::new(1000.0, 80.0),
        ])))
        .unwrap();
    canvas.update_coordinate_interval();
    canvas
}

fn feature(mz: f64, times: &[f64]) -> Arc<Feature> {
    let samples = times
        .iter()
        .enumerate()
        .map(|(i, &time)| FeatureSample {
            mz,
            time,
            intensity: 10.0 * (i + 1) as f64,
        })
        .collect();
    Arc::new(Feature::new(samples, vec![]))
}

#[test]
fn test_default_extent_pads_data() {
    let canvas = centroid_canvas();
    assert_eq!(canvas.extent(), (50.0, 1050.0));
    assert!(!canvas.is_materialized());
}

#[test]
fn test_interaction_before_render_fails() {
    let mut canvas = centroid_canvas();
    let result = canvas.set_extent_by_coordinate(Some(1.0), Some(2.0), None, Timestamp(0.0));
    assert!(matches!(result, Err(CanvasError::UninitializedContainer(_))));
}

#[test]
fn test_zoom_rescales_to_visible_peaks() {
    let mut canvas = centroid_canvas();
    canvas.render().unwrap();
    canvas
        .set_extent_by_coordinate(Some(200.0), Some(400.0), Some(0.0), Timestamp(0.0))
        .unwrap();
    assert_eq!(canvas.extent(), (200.0, 400.0));
    // Test: Only the 50 peak is visible, the axis tops out 5% above it
    assert_eq!(canvas.y_scale().unwrap().domain(), (0.0, 52.5));
    assert_eq!(canvas.x_scale().unwrap().domain(), (200.0, 400.0));

    // Test: An empty window falls back to the tallest peak overall
    canvas
        .set_extent_by_coordinate(Some(500.0), Some(600.0), Some(0.0), Timestamp(1.0))
        .unwrap();
    assert_eq!(canvas.y_scale().unwrap().domain(), (0.0, 105.0));
}

#[test]
fn test_zoom_ignores_peaks_outside_window() {
    let mut canvas = Canvas::new(CanvasKind::Spectrum, Arc::new(CanvasConfig::default()));
    let peaks = [(100.0, 10.0), (200.0, 50.0), (300.0, 30.0), (400.0, 80.0), (500.0, 20.0)];
    canvas
        .add_layers([Layer::Centroid(CentroidLayer::new(
            peaks.iter().map(|(mz, i)| MzPoint::new(*mz, *i)).collect(),
        ))])
        .unwrap();
    canvas.render().unwrap();
    canvas
        .set_extent_by_coordinate(Some(200.0), Some(400.0), None, Timestamp(0.0))
        .unwrap();
    // Test: The 80 peak sits on the open end of the window
    assert_eq!(canvas.y_scale().unwrap().domain(), (0.0, 52.5));
}

#[test]
fn test_brush_commit_zooms_and_notifies() {
    let mut canvas = centroid_canvas();
    canvas.render().unwrap();
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    canvas.add_redraw_listener(move |event| sink.borrow_mut().push(*event));

    let x_scale = canvas.x_scale().unwrap();
    let selection = Selection::Range(x_scale.apply(200.0), x_scale.apply(400.0));
    canvas.brush_start();
    canvas.brush_move(selection);
    canvas.brush_end(selection, Timestamp(0.0));

    canvas.tick(Timestamp(199.0)).unwrap();
    assert_eq!(canvas.extent(), (50.0, 1050.0));

    canvas.tick(Timestamp(200.0)).unwrap();
    let (lo, hi) = canvas.extent();
    assert!(close(lo, 200.0) && close(hi, 400.0));
    assert!(canvas.has_pending_redraw());
    assert!(events.borrow().is_empty());

    // Test: The redraw notification is debounced by 5ms
    canvas.tick(Timestamp(204.0)).unwrap();
    assert!(events.borrow().is_empty());
    canvas.tick(Timestamp(205.0)).unwrap();
    let delivered = events.borrow();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].canvas, canvas.id());
    assert!(close(delivered[0].extent.0, 200.0));
}

#[test]
fn test_late_tick_still_resets_zoom() {
    let mut canvas = centroid_canvas();
    canvas.render().unwrap();
    canvas
        .set_extent_by_coordinate(Some(200.0), Some(400.0), None, Timestamp(0.0))
        .unwrap();

    canvas.brush_end(Selection::Empty, Timestamp(1000.0));
    canvas.tick(Timestamp(1200.0)).unwrap();
    canvas.brush_end(Selection::Empty, Timestamp(1300.0));
    // Test: The host ticks after both the throttle and the idle timeout
    canvas.tick(Timestamp(1600.0)).unwrap();
    assert!(!canvas.idle_armed());
    assert_eq!(canvas.extent(), (50.0, 1050.0));
}

#[test]
fn test_double_empty_brush_resets_zoom() {
    let mut canvas = centroid_canvas();
    canvas.render().unwrap();
    canvas
        .set_extent_by_coordinate(Some(200.0), Some(400.0), None, Timestamp(0.0))
        .unwrap();

    canvas.brush_end(Selection::Empty, Timestamp(1000.0));
    canvas.tick(Timestamp(1200.0)).unwrap();
    assert!(canvas.idle_armed());
    assert_eq!(canvas.extent(), (200.0, 400.0));

    canvas.brush_end(Selection::Empty, Timestamp(1300.0));
    canvas.tick(Timestamp(1500.0)).unwrap();
    assert!(!canvas.idle_armed());
    assert_eq!(canvas.extent(), (50.0, 1050.0));
}

#[test]
fn test_hover_updates_readouts_and_labels() {
    let mut canvas = centroid_canvas();
    canvas.render().unwrap();
    let (x_scale, y_scale) = (canvas.x_scale().unwrap(), canvas.y_scale().unwrap());
    canvas.pointer_move(x_scale.apply(300.0), y_scale.apply(40.0));
    assert!(canvas.scene().find_by_class("peak-label").is_empty());

    canvas.animation_frame().unwrap();
    let (x_text, y_text) = canvas.readouts();
    assert_eq!(x_text, Some("m/z = 300.000"));
    assert!(y_text.is_some_and(|t| t.starts_with("Int. = 4.00e1")));
    assert_eq!(canvas.scene().find_by_class("peak-label").len(), 1);

    // Test: Without a new pointer event the frame is a no-op
    canvas.animation_frame().unwrap();
    assert_eq!(canvas.scene().find_by_class("peak-label").len(), 1);
}

#[test]
fn test_remove_leaves_no_artifacts() {
    let mut canvas = centroid_canvas();
    canvas.render().unwrap();
    canvas.add_redraw_listener(|_| {});
    let x_scale = canvas.x_scale().unwrap();
    canvas.pointer_move(x_scale.apply(300.0), 10.0);
    canvas.animation_frame().unwrap();
    canvas
        .set_extent_by_coordinate(Some(200.0), Some(400.0), None, Timestamp(0.0))
        .unwrap();
    assert!(canvas.scene().len() > 1);

    canvas.remove();
    assert_eq!(canvas.scene().len(), 1);
    assert!(canvas.artists().is_empty());
    assert!(!canvas.is_materialized());
    assert!(!canvas.has_pending_redraw());
    assert_eq!(canvas.listener_count(), 0);
    // Layers survive for the next render.
    assert_eq!(canvas.layers().len(), 1);

    canvas.render().unwrap();
    assert!(canvas.artists()[0].is_drawn());
}

#[test]
fn test_render_twice_does_not_duplicate() {
    let mut canvas = centroid_canvas();
    canvas.render().unwrap();
    let size = canvas.scene().len();
    canvas.render().unwrap();
    assert_eq!(canvas.scene().len(), size);
    assert_eq!(canvas.scene().find_by_class("canvas").len(), 1);
}

#[test]
fn test_clear_forgets_everything() {
    let mut canvas = centroid_canvas();
    canvas.render().unwrap();
    canvas.add_redraw_listener(|_| {});
    canvas.clear();
    assert!(canvas.layers().is_empty());
    assert_eq!(canvas.listener_count(), 0);
    assert_eq!(canvas.extent(), (0.0, 0.0));
    assert!(canvas.x_scale().is_none());
    assert_eq!(canvas.scene().len(), 1);
}

#[test]
fn test_mz_range_filters_original_traces() {
    let config = Arc::new(CanvasConfig::default());
    let mut canvas = Canvas::new(CanvasKind::FeatureProfile, config);
    let members = vec![
        FeatureProfileLayer::new(FeatureRef::Feature(feature(500.0, &[1.0, 1.1, 1.2]))),
        FeatureProfileLayer::new(FeatureRef::Feature(feature(700.0, &[1.05, 1.15]))),
    ];
    canvas
        .add_layer(Layer::FeatureProfiles(FeatureProfileCollection::new(members, 1000)))
        .unwrap();
    canvas.render().unwrap();
    assert_eq!(canvas.layers()[0].len(), 5);

    canvas.set_mz_range(Some(450.0), Some(550.0)).unwrap();
    assert_eq!(canvas.layers()[0].len(), 3);
    assert_eq!(canvas.original_layers().map(|l| l[0].len()), Some(5));
    // Test: The time extent follows the remaining trace
    let (lo, hi) = canvas.extent();
    assert!(close(lo, 0.9) && close(hi, 1.3));

    // Test: A second filter starts from the original traces again
    canvas.set_mz_range(Some(600.0), Some(800.0)).unwrap();
    assert_eq!(canvas.layers()[0].len(), 2);
    let (lo, hi) = canvas.extent();
    assert!(close(lo, 0.95) && close(hi, 1.25));
    assert!(canvas.is_materialized());

    canvas.set_mz_range(None, Some(800.0)).unwrap();
    assert_eq!(canvas.layers()[0].len(), 5);
}

#[test]
fn test_profile_canvas_has_no_scan_range() {
    let config = Arc::new(CanvasConfig::default());
    let mut canvas = Canvas::new(CanvasKind::FeatureProfile, config);
    assert_eq!(canvas.scan_range(), None);
    canvas.set_scan_range(None);
    assert_eq!(canvas.scan_range(), None);

    let mut spectrum = centroid_canvas();
    spectrum.set_scan_range(None);
    assert_eq!(spectrum.scan_range(), Some(ScanRange::new(80.0, 2000.0)));
}

#[test]
fn test_canvas_ids_are_unique() {
    let config = Arc::new(CanvasConfig::default());
    let a = Canvas::new(CanvasKind::Spectrum, Arc::clone(&config));
    let b = Canvas::new(CanvasKind::Spectrum, config);
    assert_ne!(a.id(), b.id());
    assert!(a.id().to_string().starts_with("canvas-"));
}
