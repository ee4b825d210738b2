//! # Scene Graph Module
//!
//! Flat scene graph shared by the scene logic and the renderer. Geometry is
//! registered once and referenced by id from any number of nodes, so all
//! 200 donuts share one torus mesh.
//!
//! ## Key Components
//!
//! - [`SceneGraph`] - Owns registered geometry and the node table
//! - [`SceneNode`] - A drawable instance: kind tag, geometry id, transform
//! - [`Transform`] - Position, XYZ Euler rotation and uniform scale
//! - [`Vertex3D`] - GPU vertex format with position and normal
//!
//! ## Usage
//!
//! ```rust
//! use typescape::gfx::geometry::generate_box;
//! use typescape::gfx::scene::{NodeKind, SceneGraph, Transform};
//! use typescape::scene::shapes::ShapeFamily;
//!
//! let mut graph = SceneGraph::new();
//! let cube = graph.register_geometry(generate_box(0.2, 0.2, 0.2));
//! graph.add_node(NodeKind::Shape(ShapeFamily::Cube), cube, Transform::default());
//!
//! assert_eq!(graph.count_kind(NodeKind::Shape(ShapeFamily::Cube)), 1);
//! ```

pub mod graph;
pub mod vertex;

pub use graph::{GeometryId, NodeId, NodeKind, SceneGraph, SceneNode, SceneStatistics, Transform};
pub use vertex::Vertex3D;
