//! Lifecycle of the viewports behind one view.
//!
//! [`CanvasState`] owns the main viewport and, for feature maps, an optional
//! linked profile viewport. Every transition goes through
//! [`CanvasState::dispatch`], which consumes the state and hands back the next
//! one.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use tracing::{
    debug,
    info,
    instrument,
};

use crate::canvas::{
    Canvas,
    CanvasKind,
    RedrawEvent,
    Timestamp,
};
use crate::config::CanvasConfig;
use crate::errors::CanvasError;
use crate::layers::Layer;
use crate::models::ViewData;

#[derive(Debug, Clone)]
pub enum CanvasAction {
    /// New data, or `None` to show nothing.
    SetData(Option<Arc<ViewData>>),
    /// Make sure the current data is on screen.
    RenderCanvas,
    ToggleLinkedView,
}

pub struct CanvasState {
    id: String,
    current_data: Option<Arc<ViewData>>,
    viewport: Option<Canvas>,
    linked_viewport: Option<Canvas>,
    show_linked_view: bool,
    config: Arc<CanvasConfig>,
    link_queue: Rc<RefCell<Vec<RedrawEvent>>>,
}

impl CanvasState {
    pub fn new(id: impl Into<String>, config: Arc<CanvasConfig>) -> Self {
        Self {
            id: id.into(),
            current_data: None,
            viewport: None,
            linked_viewport: None,
            show_linked_view: false,
            config,
            link_queue: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn with_linked_view(mut self, show: bool) -> Self {
        self.show_linked_view = show;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn current_data(&self) -> Option<&Arc<ViewData>> {
        self.current_data.as_ref()
    }

    pub fn viewport(&self) -> Option<&Canvas> {
        self.viewport.as_ref()
    }

    /// Mutable access for pointer and brush events.
    pub fn viewport_mut(&mut self) -> Option<&mut Canvas> {
        self.viewport.as_mut()
    }

    pub fn linked_viewport(&self) -> Option<&Canvas> {
        self.linked_viewport.as_ref()
    }

    pub fn linked_viewport_mut(&mut self) -> Option<&mut Canvas> {
        self.linked_viewport.as_mut()
    }

    pub fn show_linked_view(&self) -> bool {
        self.show_linked_view
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    #[instrument(skip(self, action), fields(state = %self.id))]
    pub fn dispatch(mut self, action: CanvasAction, now: Timestamp) -> Result<Self, CanvasError> {
        match action {
            CanvasAction::SetData(data) => {
                debug!(
                    "Setting data to {:?}",
                    data.as_ref().map(|d| d.id.as_str())
                );
                self.current_data = data;
                self.render_canvas(now)?;
            }
            CanvasAction::RenderCanvas => self.render_canvas(now)?,
            CanvasAction::ToggleLinkedView => {
                self.show_linked_view = !self.show_linked_view;
                info!("Linked view is now {}", if self.show_linked_view { "on" } else { "off" });
                self.recreate_viewports();
                self.render_canvas(now)?;
            }
        }
        Ok(self)
    }

    /// Advances the timers of both viewports, then hands the redraw
    /// notifications of the main viewport to the linked one.
    pub fn tick(&mut self, now: Timestamp) -> Result<(), CanvasError> {
        if let Some(viewport) = self.viewport.as_mut() {
            viewport.tick(now)?;
        }
        if let Some(linked) = self.linked_viewport.as_mut() {
            linked.tick(now)?;
        }
        let events: Vec<RedrawEvent> = self.link_queue.borrow_mut().drain(..).collect();
        let Some(linked) = self.linked_viewport.as_mut() else {
            return Ok(());
        };
        for event in events {
            if linked.source() != Some(event.canvas) {
                continue;
            }
            debug!(
                "Following {} to [{:.3}, {:.3}]",
                event.canvas, event.extent.0, event.extent.1
            );
            linked.set_mz_range(Some(event.extent.0), Some(event.extent.1))?;
        }
        Ok(())
    }

    fn teardown(&mut self) {
        for canvas in [self.viewport.as_mut(), self.linked_viewport.as_mut()]
            .into_iter()
            .flatten()
        {
            canvas.clear();
        }
        self.viewport = None;
        self.linked_viewport = None;
        self.link_queue.borrow_mut().clear();
    }

    /// Replaces the viewports with fresh ones. The new main viewport keeps
    /// the entity id and extent of the old one.
    fn recreate_viewports(&mut self) {
        if let Some(mut linked) = self.linked_viewport.take() {
            linked.clear();
        }
        if let Some(mut previous) = self.viewport.take() {
            let mut canvas = Canvas::new(previous.kind(), Arc::clone(&self.config));
            canvas.inherit(&previous);
            previous.clear();
            self.viewport = Some(canvas);
        }
        self.link_queue.borrow_mut().clear();
    }

    fn render_canvas(&mut self, now: Timestamp) -> Result<(), CanvasError> {
        let Some(data) = self.current_data.clone() else {
            self.teardown();
            return Ok(());
        };
        let kind = data.kind();
        if self.viewport.as_ref().is_some_and(|v| v.kind() != kind) {
            info!("Switching viewport to {:?}", kind);
            self.teardown();
        }
        let config = Arc::clone(&self.config);
        let viewport = self
            .viewport
            .get_or_insert_with(|| Canvas::new(kind, Arc::clone(&config)));
        if viewport.displays(&data.layers) {
            return Ok(());
        }

        let captured = viewport.extent();
        let same_entity = viewport.entity_id() == Some(data.id.as_str());
        viewport.clear();
        if let Some(linked) = self.linked_viewport.as_mut() {
            linked.clear();
        }
        self.link_queue.borrow_mut().clear();

        viewport.set_entity_id(Some(data.id.clone()));
        viewport.set_scan_range(data.scan_range);

        let linked_layers = if self.show_linked_view {
            data.profile_collection(config.max_profile_features)
        } else {
            None
        };
        match linked_layers {
            Some(collection) => {
                let linked = self.linked_viewport.get_or_insert_with(|| {
                    Canvas::new(CanvasKind::FeatureProfile, Arc::clone(&config))
                });
                linked.set_source(Some(viewport.id()));
                linked.set_entity_id(Some(data.id.clone()));
                linked.add_layers([Layer::FeatureProfiles(collection)])?;
                let queue = Rc::clone(&self.link_queue);
                viewport.add_redraw_listener(move |event| queue.borrow_mut().push(*event));
            }
            None => {
                if let Some(mut linked) = self.linked_viewport.take() {
                    linked.clear();
                }
            }
        }

        viewport.attach(&data.layers)?;
        viewport.render()?;
        if let Some(linked) = self.linked_viewport.as_mut() {
            linked.render()?;
        }

        if same_entity && captured != (0.0, 0.0) {
            debug!("Keeping extent [{:.3}, {:.3}]", captured.0, captured.1);
            viewport.set_extent_by_coordinate(Some(captured.0), Some(captured.1), Some(0.0), now)
        } else {
            viewport.reset_zoom(now)
        }
    }
}
