//! Global uniform bindings for camera and scene data
//!
//! Everything shared by all meshes of a frame: the camera, the lights of the
//! active scene, the background color and the fog density. Bound to slot 0
//! of the mesh pipeline.

use crate::{
    config::{Environment, LightKind, LightSpec},
    gfx::camera::CameraUniform,
    wgpu_utils::{uniform_layout_entry, UniformBuffer},
};

/// Lights beyond this count are ignored by the shader
pub const MAX_LIGHTS: usize = 8;

const LIGHT_AMBIENT: f32 = 0.0;
const LIGHT_DIRECTIONAL: f32 = 1.0;
const LIGHT_POINT: f32 = 2.0;

/// One light as the shader sees it
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuLight {
    /// xyz: position (point) or the point the light shines from (directional),
    /// w: light kind
    pub position: [f32; 4],
    /// rgb: color premultiplied by intensity, w: range (0 = unlimited)
    pub color: [f32; 4],
}

impl From<&LightSpec> for GpuLight {
    fn from(light: &LightSpec) -> Self {
        let [r, g, b] = light.color;
        let i = light.intensity;
        let (position, kind, range): ([f32; 3], f32, f32) = match light.kind {
            LightKind::Ambient => ([0.0; 3], LIGHT_AMBIENT, 0.0),
            LightKind::Directional { position } => (position.into(), LIGHT_DIRECTIONAL, 0.0),
            LightKind::Point { position, range } => (position.into(), LIGHT_POINT, range),
        };
        Self {
            position: [position[0], position[1], position[2], kind],
            color: [r * i, g * i, b * i, range],
        }
    }
}

/// Global uniform buffer content.
/// MUST match the Globals struct in the mesh shader exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    /// rgb: background color, w: exp2 fog density
    background: [f32; 4],
    /// x: number of valid entries in `lights`
    light_count: [u32; 4],
    lights: [GpuLight; MAX_LIGHTS],
}

impl GlobalUniform {
    pub fn new(camera: &CameraUniform, environment: Environment, lights: &[LightSpec]) -> Self {
        if lights.len() > MAX_LIGHTS {
            log::warn!("{} lights in scene, only {} are used", lights.len(), MAX_LIGHTS);
        }

        let mut gpu_lights = [GpuLight {
            position: [0.0; 4],
            color: [0.0; 4],
        }; MAX_LIGHTS];
        let count = lights.len().min(MAX_LIGHTS);
        for (slot, light) in gpu_lights.iter_mut().zip(lights) {
            *slot = GpuLight::from(light);
        }

        let [r, g, b] = environment.background;
        Self {
            view_position: camera.view_position,
            view_proj: camera.view_proj,
            background: [r, g, b, environment.fog_density],
            light_count: [count as u32, 0, 0, 0],
            lights: gpu_lights,
        }
    }

    pub fn light_count(&self) -> usize {
        self.light_count[0] as usize
    }

    pub fn lights(&self) -> &[GpuLight] {
        &self.lights[..self.light_count()]
    }
}

pub type GlobalUBO = UniformBuffer<GlobalUniform>;

/// Bind group layout and bind group for the global uniform
pub struct GlobalBindings {
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    ubo: GlobalUBO,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, initial: &GlobalUniform) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Bind Group Layout"),
            entries: &[uniform_layout_entry(0)],
        });
        let ubo = GlobalUBO::new_with_data(device, initial);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Global Bind Group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.binding_resource(),
            }],
        });

        Self {
            layout,
            bind_group,
            ubo,
        }
    }

    pub fn update(&mut self, queue: &wgpu::Queue, content: GlobalUniform) {
        self.ubo.update_content(queue, content);
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
