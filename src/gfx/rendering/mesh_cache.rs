//! GPU copies of scene meshes, keyed by [`MeshId`]
//!
//! Meshes are uploaded the first time they are drawn. Their per-object
//! uniform (world transform and material) is refreshed every frame, which
//! is how emissive highlight changes reach the shader.

use std::collections::HashMap;

use cgmath::{Matrix, Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;

use crate::{
    gfx::scene::{Material, Mesh, MeshId},
    wgpu_utils::{uniform_layout_entry, UniformBuffer},
};

/// Per-object uniform content.
/// MUST match the Object struct in the mesh shader exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    model: [[f32; 4]; 4],
    /// Inverse transpose of `model`, for normals
    normal: [[f32; 4]; 4],
    base_color: [f32; 4],
    emissive: [f32; 4],
}

impl ObjectUniform {
    pub fn new(world: &Matrix4<f32>, material: &Material) -> Self {
        let normal = world
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix4::identity);
        let [r, g, b] = material.emissive;
        Self {
            model: (*world).into(),
            normal: normal.into(),
            base_color: material.base_color,
            emissive: [r, g, b, 0.0],
        }
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    object: UniformBuffer<ObjectUniform>,
    bind_group: wgpu::BindGroup,
}

impl GpuMesh {
    fn destroy(&self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
        self.object.destroy();
    }
}

pub struct MeshCache {
    layout: wgpu::BindGroupLayout,
    meshes: HashMap<MeshId, GpuMesh>,
}

impl MeshCache {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object Bind Group Layout"),
            entries: &[uniform_layout_entry(0)],
        });
        Self {
            layout,
            meshes: HashMap::new(),
        }
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Uploads the mesh if needed and refreshes its object uniform
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        mesh: &Mesh,
        world: &Matrix4<f32>,
    ) {
        let content = ObjectUniform::new(world, &mesh.material);
        if let Some(gpu) = self.meshes.get_mut(&mesh.id()) {
            gpu.object.update_content(queue, content);
            return;
        }

        let label = format!("{:?}", mesh.id());
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(mesh.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(mesh.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });
        let object = UniformBuffer::new_with_data(device, &content);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} Object Bind Group")),
            layout: &self.layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: object.binding_resource(),
            }],
        });

        self.meshes.insert(
            mesh.id(),
            GpuMesh {
                vertex_buffer,
                index_buffer,
                index_count: mesh.index_count(),
                object,
                bind_group,
            },
        );
    }

    /// Destroys the GPU buffers of released meshes; returns how many existed
    pub fn release(&mut self, ids: impl IntoIterator<Item = MeshId>) -> usize {
        let mut destroyed = 0;
        for id in ids {
            if let Some(gpu) = self.meshes.remove(&id) {
                gpu.destroy();
                destroyed += 1;
            }
        }
        if destroyed > 0 {
            log::debug!("Destroyed GPU buffers of {} meshes", destroyed);
        }
        destroyed
    }

    /// Records the draw of one prepared mesh
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, id: MeshId) {
        let Some(gpu) = self.meshes.get(&id) else {
            return;
        };
        pass.set_bind_group(1, &gpu.bind_group, &[]);
        pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
        pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..gpu.index_count, 0, 0..1);
    }
}
