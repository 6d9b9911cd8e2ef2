use super::{
    CanvasId,
    CanvasKind,
};
use crate::config::{
    CanvasConfig,
    Margins,
};
use crate::errors::CanvasError;
use crate::layers::Frame;
use crate::render::scale::{
    format_tick,
    tick_step,
};
use crate::render::{
    ArtifactId,
    ColorCycle,
    Element,
    LinearScale,
    Scene,
    Tag,
};

const TICK_COUNT: usize = 10;

#[derive(Debug, Clone, Copy)]
enum Orient {
    Bottom,
    Left,
}

/// The scene of one canvas plus the handles of its fixed furniture.
#[derive(Debug)]
pub(crate) struct Surface {
    pub scene: Scene,
    pub colors: ColorCycle,
    pub container: Option<ArtifactId>,
    pub x_scale: Option<LinearScale>,
    pub y_scale: Option<LinearScale>,
    x_axis: Option<ArtifactId>,
    y_axis: Option<ArtifactId>,
    x_readout: Option<ArtifactId>,
    y_readout: Option<ArtifactId>,
    pub width: f64,
    pub height: f64,
    margins: Margins,
}

impl Surface {
    pub fn new(width: f64, height: f64, margins: Margins, colors: ColorCycle) -> Self {
        Self {
            scene: Scene::new(
                width + margins.left + margins.right,
                height + margins.top + margins.bottom,
            ),
            colors,
            container: None,
            x_scale: None,
            y_scale: None,
            x_axis: None,
            y_axis: None,
            x_readout: None,
            y_readout: None,
            width,
            height,
            margins,
        }
    }

    pub fn scales(&self, id: CanvasId) -> Result<(LinearScale, LinearScale), CanvasError> {
        match (self.x_scale, self.y_scale) {
            (Some(x), Some(y)) => Ok((x, y)),
            _ => Err(CanvasError::UninitializedScales(id)),
        }
    }

    pub fn frame<'a>(
        &'a mut self,
        id: CanvasId,
        config: &'a CanvasConfig,
    ) -> Result<Frame<'a>, CanvasError> {
        let container = self
            .container
            .ok_or(CanvasError::UninitializedContainer(id))?;
        let (x_scale, y_scale) = self.scales(id)?;
        Ok(Frame {
            scene: &mut self.scene,
            container,
            x_scale,
            y_scale,
            width: self.width,
            height: self.height,
            colors: &mut self.colors,
            config,
        })
    }

    /// Builds the container, scales, axes, clip path, axis labels and pointer
    /// readouts from scratch.
    pub fn init_container(
        &mut self,
        kind: CanvasKind,
        x_domain: (f64, f64),
        y_domain: (f64, f64),
    ) -> Result<ArtifactId, CanvasError> {
        let (width, height) = (self.width, self.height);
        let root = self.scene.root();
        let container = self.scene.append(
            root,
            Element::group().class("canvas").attr(
                "transform",
                format!("translate({}, {})", self.margins.left, self.margins.top),
            ),
        )?;
        self.container = Some(container);
        self.x_scale = Some(LinearScale::new(x_domain, (0.0, width)));
        self.y_scale = Some(LinearScale::new(y_domain, (height, 0.0)));

        self.x_axis = Some(self.scene.append(
            container,
            Element::group()
                .class("axis x-axis")
                .attr("transform", format!("translate(0, {})", height)),
        )?);
        self.y_axis = Some(
            self.scene
                .append(container, Element::group().class("axis y-axis"))?,
        );
        self.draw_axes(0.0)?;

        let defs = self.scene.append(container, Element::new(Tag::Defs))?;
        let clip = self
            .scene
            .append(defs, Element::new(Tag::ClipPath).attr("id", "clip"))?;
        self.scene.append(
            clip,
            Element::new(Tag::Rect)
                .attr("width", width)
                .attr("height", height)
                .attr("x", 0)
                .attr("y", 0),
        )?;
        if kind == CanvasKind::FeatureProfile {
            let marker = self.scene.append(
                defs,
                Element::new(Tag::Marker)
                    .attr("id", "marker-circle")
                    .attr("markerWidth", 3)
                    .attr("markerHeight", 3)
                    .attr("refX", 3)
                    .attr("refY", 3)
                    .attr("markerUnits", "strokeWidth"),
            )?;
            self.scene.append(
                marker,
                Element::new(Tag::Circle)
                    .attr("cx", 3)
                    .attr("cy", 3)
                    .attr("r", 2)
                    .attr("stroke", "context-stroke")
                    .attr("fill", "context-fill"),
            )?;
        }

        let (x_label, y_label) = kind.dimension_labels();
        self.scene.append(
            container,
            Element::new(Tag::Text)
                .class("axis-label")
                .attr("transform", "rotate(-90)")
                .attr("y", -self.margins.left)
                .attr("x", -height / 2.0)
                .attr("dy", "1em")
                .attr("text-anchor", "middle")
                .content(y_label),
        )?;
        self.scene.append(
            container,
            Element::new(Tag::Text)
                .class("axis-label")
                .attr(
                    "transform",
                    format!("translate({} ,{})", width / 2.0, height + self.margins.top + 20.0),
                )
                .attr("text-anchor", "middle")
                .content(x_label),
        )?;

        let readout = |offset: f64| {
            Element::new(Tag::Text)
                .class("cursor-label")
                .attr(
                    "transform",
                    format!("translate({},{})", width * 0.01, height * offset),
                )
                .content("")
        };
        self.x_readout = Some(self.scene.append(container, readout(0.02))?);
        self.y_readout = Some(
            self.scene
                .append(container, readout(kind.readout_offset()))?,
        );
        Ok(container)
    }

    /// Redraws both axes against the current scales.
    pub fn draw_axes(&mut self, duration: f64) -> Result<(), CanvasError> {
        if let (Some(axis), Some(scale)) = (self.x_axis, self.x_scale) {
            draw_axis(&mut self.scene, axis, &scale, Orient::Bottom, duration)?;
        }
        if let (Some(axis), Some(scale)) = (self.y_axis, self.y_scale) {
            draw_axis(&mut self.scene, axis, &scale, Orient::Left, duration)?;
        }
        Ok(())
    }

    pub fn set_readouts(&mut self, x_text: &str, y_text: &str) -> Result<(), CanvasError> {
        if let Some(id) = self.x_readout {
            self.scene.set_text(id, x_text)?;
        }
        if let Some(id) = self.y_readout {
            self.scene.set_text(id, y_text)?;
        }
        Ok(())
    }

    pub fn readouts(&self) -> (Option<&str>, Option<&str>) {
        (
            self.x_readout.and_then(|id| self.scene.text(id)),
            self.y_readout.and_then(|id| self.scene.text(id)),
        )
    }

    /// Drops the container and everything under it. Scales are kept.
    pub fn teardown(&mut self) {
        if let Some(container) = self.container.take() {
            self.scene.remove(container);
        }
        self.x_axis = None;
        self.y_axis = None;
        self.x_readout = None;
        self.y_readout = None;
    }
}

fn draw_axis(
    scene: &mut Scene,
    axis: ArtifactId,
    scale: &LinearScale,
    orient: Orient,
    duration: f64,
) -> Result<(), CanvasError> {
    scene.clear_children(axis);
    scene.set_attr(axis, "data-duration", duration)?;
    let (r0, r1) = scale.range();
    let (lo, hi) = (r0.min(r1), r0.max(r1));
    let domain = match orient {
        Orient::Bottom => format!("M{},6V0H{}V6", lo, hi),
        Orient::Left => format!("M-6,{}H0V{}H-6", lo, hi),
    };
    scene.append(
        axis,
        Element::path(domain)
            .class("domain")
            .attr("stroke", "currentColor")
            .attr("fill", "none"),
    )?;

    let (d0, d1) = scale.domain();
    let step = tick_step(d0.min(d1), d0.max(d1), TICK_COUNT);
    for value in scale.ticks(TICK_COUNT) {
        let position = scale.apply(value);
        let label = format_tick(value, step);
        let (transform, line, text) = match orient {
            Orient::Bottom => (
                format!("translate({},0)", position),
                Element::new(Tag::Line).attr("y2", 6),
                Element::text_at(0.0, 9.0, label)
                    .attr("dy", "0.71em")
                    .attr("text-anchor", "middle"),
            ),
            Orient::Left => (
                format!("translate(0,{})", position),
                Element::new(Tag::Line).attr("x2", -6),
                Element::text_at(-9.0, 0.0, label)
                    .attr("dy", "0.32em")
                    .attr("text-anchor", "end"),
            ),
        };
        let tick = scene.append(
            axis,
            Element::group().class("tick").attr("transform", transform),
        )?;
        scene.append(tick, line.attr("stroke", "currentColor"))?;
        scene.append(tick, text)?;
    }
    Ok(())
}
