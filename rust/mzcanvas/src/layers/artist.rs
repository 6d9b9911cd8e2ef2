use crate::config::CanvasConfig;
use crate::errors::CanvasError;
use crate::render::{
    ArtifactId,
    ColorCycle,
    Element,
    LinearScale,
    Scene,
};

/// Per-canvas drawing state of one layer.
///
/// Layer data is shared between canvases, artists are not: each canvas keeps
/// one `Artist` per layer slot holding the handles of everything that layer
/// put on its scene.
#[derive(Debug, Default)]
pub struct Artist {
    pub(crate) root: Option<ArtifactId>,
    pub(crate) brush: Option<ArtifactId>,
    pub(crate) labels: Vec<ArtifactId>,
    pub(crate) hover: Vec<ArtifactId>,
    pub(crate) pattern: Vec<ArtifactId>,
    pub(crate) children: Vec<Artist>,
    pub(crate) color: Option<String>,
    pub(crate) pattern_color: Option<String>,
    pub(crate) brush_extent: Option<(f64, f64)>,
}

impl Artist {
    pub fn is_drawn(&self) -> bool {
        self.root.is_some() || self.children.iter().any(|c| c.is_drawn())
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn root(&self) -> Option<ArtifactId> {
        self.root
    }

    pub fn hover_annotations(&self) -> &[ArtifactId] {
        &self.hover
    }

    pub fn pattern_annotations(&self) -> &[ArtifactId] {
        &self.pattern
    }

    pub fn children(&self) -> &[Artist] {
        &self.children
    }

    /// Releases every artifact, including those of child artists. The color
    /// is kept so a redraw looks the same.
    pub fn release(&mut self, scene: &mut Scene) {
        self.clear_hover(scene);
        self.clear_pattern(scene);
        for id in self.labels.drain(..) {
            scene.remove(id);
        }
        if let Some(root) = self.root.take() {
            scene.remove(root);
        }
        self.brush = None;
        for child in self.children.iter_mut() {
            child.release(scene);
        }
        self.children.clear();
    }

    pub fn clear_hover(&mut self, scene: &mut Scene) {
        for id in self.hover.drain(..) {
            scene.remove(id);
        }
    }

    pub fn clear_pattern(&mut self, scene: &mut Scene) {
        for id in self.pattern.drain(..) {
            scene.remove(id);
        }
    }
}

/// Pointer position in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub x: f64,
    pub y: f64,
}

/// Everything a layer needs from its canvas while drawing.
pub struct Frame<'a> {
    pub scene: &'a mut Scene,
    pub container: ArtifactId,
    pub x_scale: LinearScale,
    pub y_scale: LinearScale,
    pub width: f64,
    pub height: f64,
    pub colors: &'a mut ColorCycle,
    pub config: &'a CanvasConfig,
}

impl Frame<'_> {
    pub fn x(&self, value: f64) -> f64 {
        self.x_scale.apply(value)
    }

    pub fn y(&self, value: f64) -> f64 {
        self.y_scale.apply(value)
    }

    /// Clears whatever `artist` drew before and opens a fresh clipped group
    /// for it. The artist's color is kept if it has one, otherwise the
    /// layer's own color or the next palette color is used.
    pub fn begin(
        &mut self,
        artist: &mut Artist,
        class: &str,
        color: Option<&str>,
    ) -> Result<ArtifactId, CanvasError> {
        artist.release(self.scene);
        if artist.color.is_none() {
            artist.color = Some(match color {
                Some(c) => c.to_string(),
                None => self.colors.next_color(),
            });
        }
        let root = self.scene.append(
            self.container,
            Element::group()
                .class(&format!("layer {}", class))
                .attr("clip-path", "url(#clip)"),
        )?;
        artist.root = Some(root);
        let mut patch = Element::group().class("brush");
        if let Some((lo, hi)) = artist.brush_extent {
            patch = patch.attr("data-extent", format!("{},{}", lo, hi));
        }
        artist.brush = Some(self.scene.append(root, patch)?);
        Ok(root)
    }

    /// Text label above a data point, kept until the next hover. Layers that
    /// are not drawn get no label.
    pub fn hover_label(
        &mut self,
        artist: &mut Artist,
        x: f64,
        y: f64,
        text: String,
        class: &str,
    ) -> Result<(), CanvasError> {
        let Some(parent) = artist.root else {
            return Ok(());
        };
        let label = Element::text_at(self.x(x), self.y(y) - 10.0, text)
            .class(class)
            .attr("text-anchor", "middle");
        let id = self.scene.append(parent, label)?;
        artist.hover.push(id);
        Ok(())
    }
}

/// Records a committed extent on the artist's brush patch and clears any
/// stale selection or overlay.
pub fn reset_brush(
    artist: &mut Artist,
    scene: &mut Scene,
    extent: (f64, f64),
) -> Result<(), CanvasError> {
    artist.brush_extent = Some(extent);
    artist.clear_hover(scene);
    artist.clear_pattern(scene);
    if let Some(brush) = artist.brush {
        scene.clear_children(brush);
        scene.set_attr(brush, "data-extent", format!("{},{}", extent.0, extent.1))?;
    }
    for child in artist.children.iter_mut() {
        reset_brush(child, scene, extent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_removes_everything() {
        let mut scene = Scene::new(100.0, 100.0);
        let mut colors = ColorCycle::default();
        let config = CanvasConfig::default();
        let container = scene.append(scene.root(), Element::group()).unwrap();
        let mut artist = Artist::default();
        {
            let mut frame = Frame {
                scene: &mut scene,
                container,
                x_scale: LinearScale::new((0.0, 1.0), (0.0, 100.0)),
                y_scale: LinearScale::new((0.0, 1.0), (100.0, 0.0)),
                width: 100.0,
                height: 100.0,
                colors: &mut colors,
                config: &config,
            };
            frame.begin(&mut artist, "test", None).unwrap();
            frame
                .hover_label(&mut artist, 0.5, 0.5, "label".into(), "peak-label")
                .unwrap();
        }
        assert_eq!(artist.color(), Some("steelblue"));
        // container + root group + brush patch + label
        assert_eq!(scene.len(), 5);

        artist.release(&mut scene);
        assert_eq!(scene.len(), 2);
        assert!(!artist.is_drawn());
        // Test: Color survives the release so a redraw keeps it
        assert_eq!(artist.color(), Some("steelblue"));
    }
}
