use std::collections::BTreeMap;
use std::fmt;

use cgmath::{Matrix4, Rad, Vector3};

use crate::gfx::geometry::GeometryData;
use crate::scene::shapes::ShapeFamily;

/// Handle to a node in a [`SceneGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

/// Handle to geometry registered with a [`SceneGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

impl fmt::Display for GeometryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "geometry#{}", self.0)
    }
}

/// What a node represents, used to count and filter nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Shape(ShapeFamily),
    Text,
}

/// Position, XYZ Euler rotation in radians, uniform scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: 1.0,
        }
    }
}

impl Transform {
    /// Model matrix, `T * Rx * Ry * Rz * S`
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from_angle_x(Rad(self.rotation.x))
            * Matrix4::from_angle_y(Rad(self.rotation.y))
            * Matrix4::from_angle_z(Rad(self.rotation.z))
            * Matrix4::from_scale(self.scale)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub kind: NodeKind,
    pub geometry: GeometryId,
    pub transform: Transform,
    pub visible: bool,
}

/// Aggregate numbers for the control panel and logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStatistics {
    pub nodes: usize,
    pub visible_nodes: usize,
    pub geometries: usize,
    /// Triangles drawn per frame across visible nodes
    pub triangles: usize,
}

/// Registered geometry plus the nodes that draw it
///
/// Nodes iterate in creation order. Releasing geometry that nodes still
/// reference leaves those nodes in place; the renderer skips them.
#[derive(Debug, Default)]
pub struct SceneGraph {
    geometries: BTreeMap<GeometryId, GeometryData>,
    nodes: BTreeMap<NodeId, SceneNode>,
    next_geometry: u64,
    next_node: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_geometry(&mut self, data: GeometryData) -> GeometryId {
        let id = GeometryId(self.next_geometry);
        self.next_geometry += 1;
        self.geometries.insert(id, data);
        id
    }

    /// Drops the geometry, returning it if it was registered
    pub fn release_geometry(&mut self, id: GeometryId) -> Option<GeometryData> {
        self.geometries.remove(&id)
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&GeometryData> {
        self.geometries.get(&id)
    }

    pub fn geometries(&self) -> impl Iterator<Item = (GeometryId, &GeometryData)> {
        self.geometries.iter().map(|(id, data)| (*id, data))
    }

    pub fn add_node(&mut self, kind: NodeKind, geometry: GeometryId, transform: Transform) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(
            id,
            SceneNode {
                kind,
                geometry,
                transform,
                visible: true,
            },
        );
        id
    }

    pub fn remove_node(&mut self, id: NodeId) -> Option<SceneNode> {
        self.nodes.remove(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes.values().filter(|node| node.kind == kind).count()
    }

    pub fn statistics(&self) -> SceneStatistics {
        let visible: Vec<&SceneNode> = self.nodes.values().filter(|n| n.visible).collect();
        let triangles = visible
            .iter()
            .filter_map(|node| self.geometries.get(&node.geometry))
            .map(GeometryData::triangle_count)
            .sum();

        SceneStatistics {
            nodes: self.nodes.len(),
            visible_nodes: visible.len(),
            geometries: self.geometries.len(),
            triangles,
        }
    }
}
