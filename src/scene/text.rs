//! Keeps exactly one centered text mesh in the scene graph.

use log::debug;

use crate::gfx::geometry::text::{build_text_geometry, TextError, TextOptions};
use crate::gfx::geometry::typeface::Typeface;
use crate::gfx::scene::{GeometryId, NodeId, NodeKind, SceneGraph, Transform};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOutcome {
    /// A new mesh was built and swapped in
    Replaced { node: NodeId, vertices: usize },
    /// No font yet; the rebuild happens once one arrives
    Deferred,
}

#[derive(Debug, Clone, Copy)]
struct TextMesh {
    node: NodeId,
    geometry: GeometryId,
}

/// Rebuilds the text mesh whenever a text parameter changes
#[derive(Debug, Default)]
pub struct TextRegenerator {
    current: Option<TextMesh>,
    pending: bool,
}

impl TextRegenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current text mesh with one built from `options`
    ///
    /// Without a font nothing is shown and the request is remembered. If the
    /// build fails the previous mesh stays in place.
    pub fn update_text(
        &mut self,
        graph: &mut SceneGraph,
        font: Option<&Typeface>,
        options: &TextOptions,
    ) -> Result<TextOutcome, TextError> {
        let Some(font) = font else {
            self.pending = true;
            return Ok(TextOutcome::Deferred);
        };

        let mut geometry = build_text_geometry(font, options)?;
        geometry.center();
        let vertices = geometry.vertex_count();

        if let Some(previous) = self.current.take() {
            graph.remove_node(previous.node);
            graph.release_geometry(previous.geometry);
        }

        let geometry = graph.register_geometry(geometry);
        let node = graph.add_node(NodeKind::Text, geometry, Transform::default());
        self.current = Some(TextMesh { node, geometry });
        self.pending = false;

        debug!("Text mesh {node} rebuilt with {vertices} vertices");
        Ok(TextOutcome::Replaced { node, vertices })
    }

    /// Whether a rebuild is waiting for the font
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Node of the mesh currently shown
    pub fn current(&self) -> Option<NodeId> {
        self.current.map(|mesh| mesh.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::typeface::tests::fixture;

    fn options(content: &str) -> TextOptions {
        TextOptions {
            content: content.to_string(),
            ..TextOptions::default()
        }
    }

    #[test]
    fn defers_without_font() {
        let mut graph = SceneGraph::new();
        let mut text = TextRegenerator::new();

        let outcome = text.update_text(&mut graph, None, &options("AO")).unwrap();
        assert_eq!(outcome, TextOutcome::Deferred);
        assert!(text.is_pending());
        assert_eq!(graph.count_kind(NodeKind::Text), 0);
    }

    #[test]
    fn swaps_previous_mesh() {
        let font = fixture();
        let mut graph = SceneGraph::new();
        let mut text = TextRegenerator::new();

        text.update_text(&mut graph, Some(&font), &options("AAA")).unwrap();
        let first = text.current().unwrap();
        let first_geometry = graph.node(first).unwrap().geometry;

        text.update_text(&mut graph, Some(&font), &options("C")).unwrap();
        assert_eq!(graph.count_kind(NodeKind::Text), 1);
        assert!(graph.node(first).is_none());
        assert!(graph.geometry(first_geometry).is_none());
        assert_eq!(graph.statistics().geometries, 1);
    }

    #[test]
    fn mesh_is_centered() {
        let font = fixture();
        let mut graph = SceneGraph::new();
        let mut text = TextRegenerator::new();

        text.update_text(&mut graph, Some(&font), &options("AO\nC")).unwrap();
        let node = graph.node(text.current().unwrap()).unwrap();
        let center = graph.geometry(node.geometry).unwrap().bounding_box().unwrap().center();
        assert!(center.x.abs() < 1e-5 && center.y.abs() < 1e-5 && center.z.abs() < 1e-5);
    }

    #[test]
    fn identical_options_rebuild_identical_vertices() {
        let font = fixture();
        let mut graph = SceneGraph::new();
        let mut text = TextRegenerator::new();
        let opts = options("OCA");

        text.update_text(&mut graph, Some(&font), &opts).unwrap();
        let first = graph
            .geometry(graph.node(text.current().unwrap()).unwrap().geometry)
            .cloned()
            .unwrap();
        text.update_text(&mut graph, Some(&font), &opts).unwrap();
        let second = graph
            .geometry(graph.node(text.current().unwrap()).unwrap().geometry)
            .cloned()
            .unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn whitespace_still_creates_a_node() {
        let font = fixture();
        let mut graph = SceneGraph::new();
        let mut text = TextRegenerator::new();

        let outcome = text.update_text(&mut graph, Some(&font), &options("   ")).unwrap();
        assert!(matches!(outcome, TextOutcome::Replaced { vertices: 0, .. }));
        assert_eq!(graph.count_kind(NodeKind::Text), 1);
    }
}
