//! Draws a [`Scene`] with depth testing.
//!
//! The renderer owns the pipeline, the depth target and the
//! [`ConstantBuffers`]. Each frame it clears the targets, pushes the view
//! matrix once, then for every mesh pushes its world matrix and lets the
//! mesh issue its own draw call.
//!
//! # Pipeline Configuration
//!
//! - Left-handed view and projection, depth range 0..1
//! - Back-face culling with clockwise front faces
//! - Depth write and Less-than comparison

use crate::camera::Camera;
use crate::constant_buffers::ConstantBuffers;
use crate::gpu::{GpuContext, GpuError};
use crate::mesh::{Mesh, SimpleVertex};
use crate::scene::Scene;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub struct Renderer {
    pipeline: wgpu::RenderPipeline,
    constants: ConstantBuffers,
    depth_view: wgpu::TextureView,
    camera: Camera,
    clear_color: wgpu::Color,
}

impl Renderer {
    /// Build the pipeline and buffers and push the initial projection.
    pub fn new(
        gpu: &GpuContext,
        camera: Camera,
        clear_color: wgpu::Color,
        primitives: usize,
    ) -> Result<Self, GpuError> {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Cube Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/cube.wgsl").into()),
        });

        let constants = ConstantBuffers::new(gpu, primitives)?;

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Cube Pipeline Layout"),
            bind_group_layouts: &constants.bind_group_layouts(),
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Cube Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[SimpleVertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                front_face: wgpu::FrontFace::Cw,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let renderer = Self {
            pipeline,
            constants,
            depth_view: create_depth_view(gpu),
            camera,
            clear_color,
        };
        renderer.push_projection(gpu);
        Ok(renderer)
    }

    /// Recreate size-dependent targets and push the new projection.
    ///
    /// Call after the surface has been reconfigured to its new size.
    pub fn resize(&mut self, gpu: &GpuContext) {
        self.depth_view = create_depth_view(gpu);
        self.push_projection(gpu);
        log::debug!("Renderer resized to {}x{}", gpu.width(), gpu.height());
    }

    fn push_projection(&self, gpu: &GpuContext) {
        let projection = self.camera.projection_matrix(gpu.width(), gpu.height());
        self.constants.set_changes_on_resize(gpu, projection);
    }

    /// Draw one frame and present it.
    pub fn render(&mut self, gpu: &GpuContext, scene: &mut Scene) -> Result<(), GpuError> {
        let output = match gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                gpu.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out acquiring the next frame");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.constants.reserve_primitives(gpu, scene.len())?;
        self.constants
            .set_changes_every_frame(gpu, self.camera.view_matrix());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            self.constants.bind_shared(&mut render_pass);

            for (index, mesh) in scene.meshes_mut().iter_mut().enumerate() {
                self.constants.set_changes_every_primitive(
                    gpu,
                    &mut render_pass,
                    index,
                    mesh.world_matrix(),
                );
                mesh.render(gpu, &mut render_pass)?;
            }
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: gpu.width(),
            height: gpu.height(),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
