//! Extruded text meshes
//!
//! Glyph contours from a [`Typeface`] are swept along +Z into a solid with
//! an optional rounded bevel on both faces. Caps are filled with lyon's
//! tessellator; side walls are stitched between consecutive contour rings.

use std::f32::consts::FRAC_PI_2;

use cgmath::{InnerSpace, Vector2};
use lyon::math::point;
use lyon::path::Path;
use lyon::tessellation::{BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers};
use log::debug;
use thiserror::Error;

use super::typeface::{Contour, GlyphOutline, Typeface};
use super::GeometryData;
use crate::params::DEFAULT_TEXT;

#[derive(Debug, Error)]
pub enum TextError {
    #[error("failed to tessellate the cap of glyph {glyph:?}: {reason}")]
    Tessellation { glyph: char, reason: String },
}

/// Snapshot of every parameter that shapes the text mesh
#[derive(Debug, Clone, PartialEq)]
pub struct TextOptions {
    pub content: String,
    pub size: f32,
    pub depth: f32,
    pub bevel_enabled: bool,
    pub bevel_thickness: f32,
    pub bevel_size: f32,
    pub bevel_offset: f32,
    pub curve_segments: u32,
    pub bevel_segments: u32,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            content: DEFAULT_TEXT.to_string(),
            size: 0.5,
            depth: 0.2,
            bevel_enabled: true,
            bevel_thickness: 0.03,
            bevel_size: 0.02,
            bevel_offset: 0.0,
            curve_segments: 5,
            bevel_segments: 4,
        }
    }
}

/// One extrusion step: contours pushed out by `offset` at height `z`
#[derive(Debug, Clone, Copy, PartialEq)]
struct Layer {
    z: f32,
    offset: f32,
}

fn layers(options: &TextOptions) -> Vec<Layer> {
    if !options.bevel_enabled {
        return vec![
            Layer { z: 0.0, offset: 0.0 },
            Layer {
                z: options.depth,
                offset: 0.0,
            },
        ];
    }

    let segments = options.bevel_segments.max(1);
    let bevel = |b: u32| {
        let t = b as f32 / segments as f32;
        let z = options.bevel_thickness * (t * FRAC_PI_2).cos();
        let offset = options.bevel_size * (t * FRAC_PI_2).sin() + options.bevel_offset;
        (z, offset)
    };

    let mut out = Vec::with_capacity(2 * segments as usize + 2);
    for b in 0..=segments {
        let (z, offset) = bevel(b);
        out.push(Layer { z: -z, offset });
    }
    out.push(Layer {
        z: options.depth,
        offset: options.bevel_size + options.bevel_offset,
    });
    for b in (0..segments).rev() {
        let (z, offset) = bevel(b);
        out.push(Layer {
            z: options.depth + z,
            offset,
        });
    }
    out
}

fn signed_area(contour: &Contour) -> f32 {
    let n = contour.len();
    (0..n)
        .map(|i| {
            let (a, b) = (contour[i], contour[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum::<f32>()
        * 0.5
}

fn edge_normal(from: Vector2<f32>, to: Vector2<f32>) -> Vector2<f32> {
    let d = to - from;
    let n = Vector2::new(d.y, -d.x);
    if n.magnitude2() > 0.0 {
        n.normalize()
    } else {
        n
    }
}

/// Per-vertex miter directions pointing away from the glyph material
///
/// Expects outer contours counter-clockwise and holes clockwise.
fn miter_vectors(contour: &Contour) -> Vec<Vector2<f32>> {
    let n = contour.len();
    (0..n)
        .map(|i| {
            let prev = contour[(i + n - 1) % n];
            let here = contour[i];
            let next = contour[(i + 1) % n];

            let n_in = edge_normal(prev, here);
            let n_out = edge_normal(here, next);
            let sum = n_in + n_out;
            if sum.magnitude2() < 1e-12 {
                return n_out;
            }
            let dir = sum.normalize();
            // Sharp corners get a bounded spike instead of an unbounded one
            let cos_half = dir.dot(n_out).max(0.25);
            dir / cos_half
        })
        .collect()
}

/// Contours of one glyph with consistent winding and their miters
struct PreparedGlyph {
    character: char,
    contours: Vec<(Contour, Vec<Vector2<f32>>)>,
}

fn prepare(outline: &GlyphOutline) -> PreparedGlyph {
    let areas: Vec<f32> = outline.contours.iter().map(signed_area).collect();
    let outer_sign = areas
        .iter()
        .copied()
        .fold(0.0f32, |best, a| if a.abs() > best.abs() { a } else { best })
        .signum();

    let contours = outline
        .contours
        .iter()
        .zip(&areas)
        .map(|(contour, &area)| {
            let is_hole = area.signum() != outer_sign;
            let counter_clockwise = area > 0.0;
            let mut contour = contour.clone();
            if is_hole == counter_clockwise {
                contour.reverse();
            }
            let miters = miter_vectors(&contour);
            (contour, miters)
        })
        .collect();

    PreparedGlyph {
        character: outline.character,
        contours,
    }
}

fn ring(contour: &Contour, miters: &[Vector2<f32>], offset: f32) -> Contour {
    contour
        .iter()
        .zip(miters)
        .map(|(p, m)| *p + *m * offset)
        .collect()
}

fn tessellate_cap(
    tessellator: &mut FillTessellator,
    character: char,
    rings: &[Contour],
) -> Result<VertexBuffers<[f32; 2], u32>, TextError> {
    let mut builder = Path::builder();
    for contour in rings {
        let Some((first, rest)) = contour.split_first() else {
            continue;
        };
        builder.begin(point(first.x, first.y));
        for p in rest {
            builder.line_to(point(p.x, p.y));
        }
        builder.end(true);
    }
    let path = builder.build();

    let mut buffers: VertexBuffers<[f32; 2], u32> = VertexBuffers::new();
    tessellator
        .tessellate_path(
            &path,
            &FillOptions::non_zero(),
            &mut BuffersBuilder::new(&mut buffers, |vertex: FillVertex| {
                vertex.position().to_array()
            }),
        )
        .map_err(|err| TextError::Tessellation {
            glyph: character,
            reason: format!("{err:?}"),
        })?;

    Ok(buffers)
}

/// Builds the extruded mesh for `options.content`
///
/// The mesh sits in glyph space: the first baseline at y = 0 and the back
/// face at z = 0 (or `-bevel_thickness` with bevel). Text that lays out to
/// no contours yields an empty mesh.
pub fn build_text_geometry(font: &Typeface, options: &TextOptions) -> Result<GeometryData, TextError> {
    let outlines = font.layout(&options.content, options.size, options.curve_segments);
    let layers = layers(options);
    let mut tessellator = FillTessellator::new();
    let mut data = GeometryData::new();

    let (Some(back), Some(front)) = (layers.first().copied(), layers.last().copied()) else {
        return Ok(data);
    };

    for outline in &outlines {
        let glyph = prepare(outline);

        // Side walls between consecutive rings
        for (contour, miters) in &glyph.contours {
            let rings: Vec<Contour> = layers
                .iter()
                .map(|layer| ring(contour, miters, layer.offset))
                .collect();
            let n = contour.len();

            for (k, pair) in layers.windows(2).enumerate() {
                let (lower, upper) = (&rings[k], &rings[k + 1]);
                let (z0, z1) = (pair[0].z, pair[1].z);
                for i in 0..n {
                    let j = (i + 1) % n;
                    let a = [lower[i].x, lower[i].y, z0];
                    let b = [lower[j].x, lower[j].y, z0];
                    let c = [upper[j].x, upper[j].y, z1];
                    let d = [upper[i].x, upper[i].y, z1];
                    data.push_triangle(a, b, c);
                    data.push_triangle(a, c, d);
                }
            }
        }

        // Both caps share the outermost offset
        let cap_rings: Vec<Contour> = glyph
            .contours
            .iter()
            .map(|(contour, miters)| ring(contour, miters, back.offset))
            .collect();
        let cap = tessellate_cap(&mut tessellator, glyph.character, &cap_rings)?;

        for tri in cap.indices.chunks_exact(3) {
            let [p0, p1, p2] = [0, 1, 2].map(|k| cap.vertices[tri[k] as usize]);
            let area = (p1[0] - p0[0]) * (p2[1] - p0[1]) - (p2[0] - p0[0]) * (p1[1] - p0[1]);
            let (p1, p2) = if area >= 0.0 { (p1, p2) } else { (p2, p1) };

            data.push_triangle(
                [p0[0], p0[1], front.z],
                [p1[0], p1[1], front.z],
                [p2[0], p2[1], front.z],
            );
            data.push_triangle(
                [p0[0], p0[1], back.z],
                [p2[0], p2[1], back.z],
                [p1[0], p1[1], back.z],
            );
        }
    }

    debug!(
        "Built text mesh for {} glyphs: {} triangles across {} layers",
        outlines.len(),
        data.triangle_count(),
        layers.len()
    );

    Ok(data)
}
