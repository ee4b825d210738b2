//! # Procedural Geometry Generation
//!
//! CPU-side mesh data for everything the scene draws: the three shape
//! primitives and the extruded text mesh.
//!
//! ## Supported Geometry
//!
//! - **Box**: axis-aligned box with per-face normals
//! - **Tetrahedron**: regular tetrahedron inscribed in a sphere of given radius
//! - **Torus**: ring torus with configurable tessellation
//! - **Text**: glyph outlines extruded with an optional bevel ([`text`])
//!
//! ## Usage
//!
//! ```rust
//! use typescape::gfx::geometry::{generate_box, generate_torus};
//!
//! let cube = generate_box(0.2, 0.2, 0.2);
//! assert_eq!(cube.triangle_count(), 12);
//!
//! let donut = generate_torus(0.03, 0.02, 64, 128);
//! assert!(donut.vertex_count() > 0);
//! ```

pub mod primitives;
pub mod text;
pub mod typeface;

pub use primitives::*;

use cgmath::{InnerSpace, Vector3};

use crate::gfx::scene::vertex::Vertex3D;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }
}

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    /// Create a new empty geometry data structure
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of vertices in this geometry
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles in this geometry
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Appends a flat-shaded triangle; vertices are not shared
    ///
    /// Degenerate triangles (zero area) are dropped.
    pub fn push_triangle(&mut self, a: [f32; 3], b: [f32; 3], c: [f32; 3]) {
        let (va, vb, vc) = (Vector3::from(a), Vector3::from(b), Vector3::from(c));
        let cross = (vb - va).cross(vc - va);
        if cross.magnitude2() <= f32::EPSILON * f32::EPSILON {
            return;
        }
        let normal: [f32; 3] = cross.normalize().into();

        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&[a, b, c]);
        self.normals.extend_from_slice(&[normal, normal, normal]);
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }

    /// Bounding box of all vertices, `None` when there are none
    pub fn bounding_box(&self) -> Option<Aabb> {
        let first = Vector3::from(*self.vertices.first()?);
        let (min, max) = self.vertices.iter().skip(1).fold((first, first), |(min, max), v| {
            (
                Vector3::new(min.x.min(v[0]), min.y.min(v[1]), min.z.min(v[2])),
                Vector3::new(max.x.max(v[0]), max.y.max(v[1]), max.z.max(v[2])),
            )
        });
        Some(Aabb { min, max })
    }

    pub fn translate(&mut self, offset: Vector3<f32>) {
        for v in &mut self.vertices {
            v[0] += offset.x;
            v[1] += offset.y;
            v[2] += offset.z;
        }
    }

    /// Moves the geometry so its bounding box is centered on the origin
    ///
    /// Returns the translation that was applied.
    pub fn center(&mut self) -> Vector3<f32> {
        match self.bounding_box() {
            Some(bounds) => {
                let offset = -bounds.center();
                self.translate(offset);
                offset
            }
            None => Vector3::new(0.0, 0.0, 0.0),
        }
    }

    /// Convert to the interleaved vertex format used by the renderer
    pub fn to_vertices(&self) -> Vec<Vertex3D> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, position)| Vertex3D {
                position: *position,
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_moves_bounds_to_origin() {
        let mut data = GeometryData::new();
        data.push_triangle([1.0, 1.0, 1.0], [3.0, 1.0, 1.0], [3.0, 5.0, 2.0]);

        let offset = data.center();
        assert_eq!(offset, Vector3::new(-2.0, -3.0, -1.5));

        let bounds = data.bounding_box().unwrap();
        assert_eq!(bounds.center(), Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(bounds.size(), Vector3::new(2.0, 4.0, 1.0));
    }

    #[test]
    fn degenerate_triangles_are_skipped() {
        let mut data = GeometryData::new();
        data.push_triangle([0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]);
        assert!(data.is_empty());
        assert!(data.bounding_box().is_none());
    }

    #[test]
    fn flat_normals_follow_winding() {
        let mut data = GeometryData::new();
        data.push_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        assert_eq!(data.normals[0], [0.0, 0.0, 1.0]);
        assert_eq!(data.to_vertices().len(), 3);
    }
}
