//! Instanced drawing of scene graph nodes
//!
//! Every registered geometry gets one vertex/index buffer pair, uploaded the
//! first time a visible node uses it. Visible nodes sharing a geometry are
//! batched into a per-instance buffer of model matrices and drawn in a single
//! call, so hundreds of shapes cost one draw per family.

use std::collections::{BTreeMap, HashMap};

use bytemuck::{Pod, Zeroable};
use log::debug;
use wgpu::util::DeviceExt;
use wgpu::{Buffer, Device, Queue, RenderPass};

use crate::gfx::scene::{GeometryId, SceneGraph, Transform};

/// Per-instance model matrix, columns at shader locations 2 to 5
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    pub model: [[f32; 4]; 4],
}

impl InstanceData {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
    ];

    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            model: transform.matrix().into(),
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Groups visible nodes by geometry, skipping nodes whose geometry is gone
pub fn collect_batches(graph: &SceneGraph) -> BTreeMap<GeometryId, Vec<InstanceData>> {
    let mut batches: BTreeMap<GeometryId, Vec<InstanceData>> = BTreeMap::new();
    for (_, node) in graph.nodes() {
        if !node.visible || graph.geometry(node.geometry).is_none() {
            continue;
        }
        batches
            .entry(node.geometry)
            .or_default()
            .push(InstanceData::from_transform(&node.transform));
    }
    batches
}

struct GpuMesh {
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: u32,
    instance_buffer: Option<Buffer>,
    instance_capacity: usize,
    instance_count: u32,
}

impl GpuMesh {
    fn upload_instances(&mut self, device: &Device, queue: &Queue, instances: &[InstanceData]) {
        self.instance_count = instances.len() as u32;
        if instances.is_empty() {
            return;
        }

        if instances.len() <= self.instance_capacity {
            if let Some(buffer) = &self.instance_buffer {
                queue.write_buffer(buffer, 0, bytemuck::cast_slice(instances));
                return;
            }
        }

        // Grow by reallocating; the old buffer is dropped with the assignment
        self.instance_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Instance Buffer"),
            contents: bytemuck::cast_slice(instances),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        }));
        self.instance_capacity = instances.len();
    }
}

/// GPU-side mirror of the scene graph
#[derive(Default)]
pub struct InstancedRenderer {
    meshes: HashMap<GeometryId, GpuMesh>,
}

impl InstancedRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Syncs GPU buffers with the graph ahead of [`draw`](Self::draw)
    ///
    /// Buffers of released geometry are dropped here.
    pub fn prepare(&mut self, device: &Device, queue: &Queue, graph: &SceneGraph) {
        let before = self.meshes.len();
        self.meshes.retain(|id, _| graph.geometry(*id).is_some());
        if self.meshes.len() != before {
            debug!("Released {} GPU meshes", before - self.meshes.len());
        }

        for mesh in self.meshes.values_mut() {
            mesh.instance_count = 0;
        }

        for (id, instances) in collect_batches(graph) {
            let Some(data) = graph.geometry(id) else {
                continue;
            };
            if data.is_empty() {
                continue;
            }
            let mesh = self.meshes.entry(id).or_insert_with(|| {
                let vertices = data.to_vertices();
                GpuMesh {
                    vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("{id} Vertex Buffer")),
                        contents: bytemuck::cast_slice(&vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                    index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("{id} Index Buffer")),
                        contents: bytemuck::cast_slice(&data.indices),
                        usage: wgpu::BufferUsages::INDEX,
                    }),
                    index_count: data.indices.len() as u32,
                    instance_buffer: None,
                    instance_capacity: 0,
                    instance_count: 0,
                }
            });
            mesh.upload_instances(device, queue, &instances);
        }
    }

    /// Issues one instanced draw per geometry with visible nodes
    pub fn draw(&self, render_pass: &mut RenderPass<'_>) {
        for mesh in self.meshes.values() {
            let Some(instances) = &mesh.instance_buffer else {
                continue;
            };
            if mesh.instance_count == 0 {
                continue;
            }
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, instances.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..mesh.instance_count);
        }
    }

    /// Number of geometries currently resident on the GPU
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::generate_box;
    use crate::gfx::scene::NodeKind;
    use crate::scene::ShapeFamily;
    use cgmath::Vector3;

    #[test]
    fn batches_group_visible_nodes_by_geometry() {
        let mut graph = SceneGraph::new();
        let cube = graph.register_geometry(generate_box(1.0, 1.0, 1.0));
        let text = graph.register_geometry(generate_box(2.0, 1.0, 0.2));

        let kind = NodeKind::Shape(ShapeFamily::Cube);
        graph.add_node(kind, cube, Transform::default());
        let hidden = graph.add_node(kind, cube, Transform::default());
        graph.add_node(
            kind,
            cube,
            Transform {
                position: Vector3::new(1.0, 2.0, 3.0),
                ..Transform::default()
            },
        );
        graph.add_node(NodeKind::Text, text, Transform::default());
        if let Some(node) = graph.node_mut(hidden) {
            node.visible = false;
        }

        let batches = collect_batches(&graph);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[&cube].len(), 2);
        assert_eq!(batches[&text].len(), 1);
        assert_eq!(batches[&cube][1].model[3], [1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn released_geometry_is_not_batched() {
        let mut graph = SceneGraph::new();
        let geometry = graph.register_geometry(generate_box(1.0, 1.0, 1.0));
        graph.add_node(NodeKind::Text, geometry, Transform::default());
        graph.release_geometry(geometry);
        assert!(collect_batches(&graph).is_empty());
    }

    #[test]
    fn instance_layout_follows_vertex_attributes() {
        let layout = InstanceData::desc();
        assert_eq!(layout.array_stride, 64);
        assert_eq!(layout.attributes[0].shader_location, 2);
        assert_eq!(layout.attributes[3].offset, 48);
    }
}
