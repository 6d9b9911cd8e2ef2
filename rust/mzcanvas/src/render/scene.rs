use std::collections::{
    BTreeMap,
    HashMap,
};
use svg::Node as _;

use crate::errors::CanvasError;

/// Handle to an element attached to a [`Scene`].
///
/// Ids are never reused, so a stale handle can only miss, never alias a
/// newer element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Svg,
    Group,
    Path,
    Circle,
    Rect,
    Line,
    Text,
    TSpan,
    Defs,
    ClipPath,
    Marker,
}

impl Tag {
    pub fn name(&self) -> &'static str {
        match self {
            Tag::Svg => "svg",
            Tag::Group => "g",
            Tag::Path => "path",
            Tag::Circle => "circle",
            Tag::Rect => "rect",
            Tag::Line => "line",
            Tag::Text => "text",
            Tag::TSpan => "tspan",
            Tag::Defs => "defs",
            Tag::ClipPath => "clipPath",
            Tag::Marker => "marker",
        }
    }
}

/// Detached description of an element, attached with [`Scene::append`].
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: Tag,
    pub attributes: BTreeMap<String, String>,
    pub text: Option<String>,
}

impl Element {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: BTreeMap::new(),
            text: None,
        }
    }

    pub fn group() -> Self {
        Self::new(Tag::Group)
    }

    pub fn path(d: impl Into<String>) -> Self {
        Self::new(Tag::Path).attr("d", d.into())
    }

    pub fn text_at(x: f64, y: f64, content: impl Into<String>) -> Self {
        Self::new(Tag::Text)
            .attr("x", x)
            .attr("y", y)
            .content(content)
    }

    pub fn attr(mut self, name: &str, value: impl ToString) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn content(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

#[derive(Debug)]
struct Node {
    element: Element,
    parent: Option<ArtifactId>,
    children: Vec<ArtifactId>,
}

/// Retained drawing surface.
///
/// Every artifact a canvas or layer draws lives here until it is removed.
/// Removing an element removes its whole subtree, so teardown only needs the
/// top-level handles.
#[derive(Debug)]
pub struct Scene {
    nodes: HashMap<ArtifactId, Node>,
    root: ArtifactId,
    next_id: u64,
}

impl Scene {
    pub fn new(width: f64, height: f64) -> Self {
        let root = ArtifactId(0);
        let element = Element::new(Tag::Svg)
            .attr("width", width)
            .attr("height", height)
            .attr("xmlns", "http://www.w3.org/2000/svg");
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                element,
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            nodes,
            root,
            next_id: 1,
        }
    }

    pub fn root(&self) -> ArtifactId {
        self.root
    }

    pub fn append(&mut self, parent: ArtifactId, element: Element) -> Result<ArtifactId, CanvasError> {
        let id = ArtifactId(self.next_id);
        let parent_node = self
            .nodes
            .get_mut(&parent)
            .ok_or(CanvasError::MissingArtifact(parent))?;
        parent_node.children.push(id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                element,
                parent: Some(parent),
                children: Vec::new(),
            },
        );
        Ok(id)
    }

    pub fn set_attr(&mut self, id: ArtifactId, name: &str, value: impl ToString) -> Result<(), CanvasError> {
        let node = self.nodes.get_mut(&id).ok_or(CanvasError::MissingArtifact(id))?;
        node.element
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn set_text(&mut self, id: ArtifactId, text: impl Into<String>) -> Result<(), CanvasError> {
        let node = self.nodes.get_mut(&id).ok_or(CanvasError::MissingArtifact(id))?;
        node.element.text = Some(text.into());
        Ok(())
    }

    pub fn attr(&self, id: ArtifactId, name: &str) -> Option<&str> {
        self.nodes
            .get(&id)?
            .element
            .attributes
            .get(name)
            .map(|v| v.as_str())
    }

    pub fn text(&self, id: ArtifactId) -> Option<&str> {
        self.nodes.get(&id)?.element.text.as_deref()
    }

    pub fn tag(&self, id: ArtifactId) -> Option<Tag> {
        self.nodes.get(&id).map(|n| n.element.tag)
    }

    pub fn children(&self, id: ArtifactId) -> &[ArtifactId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, id: ArtifactId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of live elements, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Detaches `id` and drops its subtree. Missing ids are ignored.
    /// Returns how many elements were dropped.
    pub fn remove(&mut self, id: ArtifactId) -> usize {
        if id == self.root {
            return self.clear_children(id);
        }
        let parent = match self.nodes.get(&id) {
            Some(node) => node.parent,
            None => return 0,
        };
        if let Some(parent_node) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent_node.children.retain(|c| *c != id);
        }
        self.drop_subtree(id)
    }

    /// Drops every descendant of `id`, keeping `id` itself.
    pub fn clear_children(&mut self, id: ArtifactId) -> usize {
        let children = match self.nodes.get_mut(&id) {
            Some(node) => std::mem::take(&mut node.children),
            None => return 0,
        };
        children.into_iter().map(|c| self.drop_subtree(c)).sum()
    }

    fn drop_subtree(&mut self, id: ArtifactId) -> usize {
        let mut stack = vec![id];
        let mut dropped = 0;
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                dropped += 1;
                stack.extend(node.children);
            }
        }
        dropped
    }

    /// Elements carrying `class`, in document order.
    pub fn find_by_class(&self, class: &str) -> Vec<ArtifactId> {
        let mut found = Vec::new();
        let mut stack = vec![self.root];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            let matches = node
                .element
                .attributes
                .get("class")
                .is_some_and(|c| c.split_whitespace().any(|c| c == class));
            if matches {
                found.push(current);
            }
            stack.extend(node.children.iter().rev());
        }
        found
    }

    fn build(&self, id: ArtifactId) -> Option<svg::node::element::Element> {
        let node = self.nodes.get(&id)?;
        let mut element = svg::node::element::Element::new(node.element.tag.name());
        for (name, value) in &node.element.attributes {
            element.assign(name.as_str(), value.as_str());
        }
        if let Some(text) = &node.element.text {
            element.append(svg::node::Text::new(text.as_str()));
        }
        for child in &node.children {
            if let Some(child) = self.build(*child) {
                element.append(child);
            }
        }
        Some(element)
    }

    pub fn to_document(&self) -> svg::Document {
        let mut document = svg::Document::new();
        if let Some(root) = self.nodes.get(&self.root) {
            for (name, value) in &root.element.attributes {
                document = document.set(name.as_str(), value.as_str());
            }
            for child in &root.children {
                if let Some(child) = self.build(*child) {
                    document = document.add(child);
                }
            }
        }
        document
    }

    pub fn to_svg_string(&self) -> String {
        self.to_document().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_drops_subtree() {
        let mut scene = Scene::new(100.0, 100.0);
        let group = scene.append(scene.root(), Element::group()).unwrap();
        let inner = scene.append(group, Element::group()).unwrap();
        scene.append(inner, Element::path("M0,0L1,1")).unwrap();
        assert_eq!(scene.len(), 4);

        assert_eq!(scene.remove(group), 3);
        assert_eq!(scene.len(), 1);
        assert!(scene.children(scene.root()).is_empty());
        // Test: Removing twice is a no-op
        assert_eq!(scene.remove(group), 0);
    }

    #[test]
    fn test_append_to_missing_parent_fails() {
        let mut scene = Scene::new(10.0, 10.0);
        let group = scene.append(scene.root(), Element::group()).unwrap();
        scene.remove(group);
        assert!(matches!(
            scene.append(group, Element::group()),
            Err(CanvasError::MissingArtifact(_))
        ));
    }

    #[test]
    fn test_find_by_class_in_document_order() {
        let mut scene = Scene::new(10.0, 10.0);
        let a = scene
            .append(scene.root(), Element::group().class("layer profile"))
            .unwrap();
        let b = scene
            .append(scene.root(), Element::group().class("layer"))
            .unwrap();
        assert_eq!(scene.find_by_class("layer"), vec![a, b]);
        assert_eq!(scene.find_by_class("profile"), vec![a]);
    }

    #[test]
    fn test_svg_output_contains_elements() {
        let mut scene = Scene::new(20.0, 10.0);
        let group = scene.append(scene.root(), Element::group()).unwrap();
        scene
            .append(group, Element::text_at(1.0, 2.0, "m/z = 100.000"))
            .unwrap();
        let svg = scene.to_svg_string();
        assert!(svg.contains("<g>"));
        assert!(svg.contains("m/z = 100.000"));
        assert!(svg.contains("width=\"20\""));
    }
}
