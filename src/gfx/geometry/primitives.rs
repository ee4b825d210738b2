//! # Primitive Shape Generation
//!
//! The three shape families scattered around the text. All shapes are
//! centered at the origin with outward normals and counter-clockwise
//! winding.

use super::GeometryData;
use cgmath::{InnerSpace, Vector3};
use std::f32::consts::PI;

/// Generate a box centered at the origin
///
/// Each face has its own four vertices so normals stay flat.
pub fn generate_box(width: f32, height: f32, depth: f32) -> GeometryData {
    let (x, y, z) = (width * 0.5, height * 0.5, depth * 0.5);
    let mut data = GeometryData::new();

    #[rustfmt::skip]
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        // Front (+Z)
        ([0.0, 0.0, 1.0], [[-x, -y,  z], [ x, -y,  z], [ x,  y,  z], [-x,  y,  z]]),
        // Back (-Z)
        ([0.0, 0.0, -1.0], [[ x, -y, -z], [-x, -y, -z], [-x,  y, -z], [ x,  y, -z]]),
        // Left (-X)
        ([-1.0, 0.0, 0.0], [[-x, -y, -z], [-x, -y,  z], [-x,  y,  z], [-x,  y, -z]]),
        // Right (+X)
        ([1.0, 0.0, 0.0], [[ x, -y,  z], [ x, -y, -z], [ x,  y, -z], [ x,  y,  z]]),
        // Top (+Y)
        ([0.0, 1.0, 0.0], [[-x,  y,  z], [ x,  y,  z], [ x,  y, -z], [-x,  y, -z]]),
        // Bottom (-Y)
        ([0.0, -1.0, 0.0], [[-x, -y, -z], [ x, -y, -z], [ x, -y,  z], [-x, -y,  z]]),
    ];

    for (normal, corners) in faces {
        let base = data.vertices.len() as u32;
        data.vertices.extend_from_slice(&corners);
        data.normals.extend_from_slice(&[normal; 4]);
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    data
}

/// Generate a regular tetrahedron inscribed in a sphere of `radius`
pub fn generate_tetrahedron(radius: f32) -> GeometryData {
    let corners = [
        Vector3::new(1.0, 1.0, 1.0),
        Vector3::new(-1.0, -1.0, 1.0),
        Vector3::new(-1.0, 1.0, -1.0),
        Vector3::new(1.0, -1.0, -1.0),
    ]
    .map(|c: Vector3<f32>| -> [f32; 3] { (c.normalize() * radius).into() });

    let mut data = GeometryData::new();
    for [a, b, c] in [[2, 1, 0], [0, 3, 2], [1, 3, 0], [2, 3, 1]] {
        data.push_triangle(corners[a], corners[b], corners[c]);
    }
    data
}

/// Generate a torus lying in the XY plane
///
/// # Arguments
/// * `radius` - Distance from the torus center to the tube center
/// * `tube` - Radius of the tube
/// * `radial_segments` - Subdivisions around the tube
/// * `tubular_segments` - Subdivisions around the ring
pub fn generate_torus(
    radius: f32,
    tube: f32,
    radial_segments: u32,
    tubular_segments: u32,
) -> GeometryData {
    let mut data = GeometryData::new();

    let radial = radial_segments.max(2);
    let tubular = tubular_segments.max(3);

    for j in 0..=radial {
        let v = j as f32 / radial as f32 * 2.0 * PI;
        for i in 0..=tubular {
            let u = i as f32 / tubular as f32 * 2.0 * PI;

            let position = Vector3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            let ring_center = Vector3::new(radius * u.cos(), radius * u.sin(), 0.0);

            data.vertices.push(position.into());
            data.normals.push((position - ring_center).normalize().into());
        }
    }

    let stride = tubular + 1;
    for j in 1..=radial {
        for i in 1..=tubular {
            let a = stride * j + i - 1;
            let b = stride * (j - 1) + i - 1;
            let c = stride * (j - 1) + i;
            let d = stride * j + i;

            data.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    data
}
