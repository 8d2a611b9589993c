//! Uniform ("constant") buffers for the three transform blocks.
//!
//! Each block is grouped by how often it changes, and each has its own bind
//! group so a change in one never re-uploads the others:
//!
//! | Group | Block                     | Rewritten           |
//! |-------|---------------------------|---------------------|
//! | 0     | [`ChangesEveryPrimitive`] | per mesh, per frame |
//! | 1     | [`ChangesEveryFrame`]     | once per frame      |
//! | 2     | [`ChangesOnResize`]       | on resize           |
//!
//! The per-primitive buffer holds one slot per mesh, each aligned to the
//! device's `min_uniform_buffer_offset_alignment`, and is bound with a
//! dynamic offset. All `Queue::write_buffer` calls land before the pass
//! executes, so a single shared slot would leave every mesh drawn with the
//! last mesh's world matrix.

use crate::gpu::{GpuContext, GpuError};
use glam::Mat4;

/// World matrix of the mesh being drawn.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ChangesEveryPrimitive {
    pub world: [[f32; 4]; 4],
}

/// Camera view matrix.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ChangesEveryFrame {
    pub view: [[f32; 4]; 4],
}

/// Perspective projection matrix.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ChangesOnResize {
    pub projection: [[f32; 4]; 4],
}

/// Distance between per-primitive slots for a given offset alignment.
pub fn primitive_slot_stride(alignment: u64) -> u64 {
    let size = std::mem::size_of::<ChangesEveryPrimitive>() as u64;
    size.div_ceil(alignment.max(1)) * alignment.max(1)
}

/// GPU buffers, layouts and bind groups for the transform blocks.
pub struct ConstantBuffers {
    primitive_layout: wgpu::BindGroupLayout,
    frame_layout: wgpu::BindGroupLayout,
    resize_layout: wgpu::BindGroupLayout,

    primitive_buffer: wgpu::Buffer,
    primitive_bind_group: wgpu::BindGroup,
    primitive_stride: u64,
    primitive_capacity: usize,

    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,

    resize_buffer: wgpu::Buffer,
    resize_bind_group: wgpu::BindGroup,
}

impl ConstantBuffers {
    /// Create the three buffers, with room for `primitives` per-mesh slots.
    pub fn new(gpu: &GpuContext, primitives: usize) -> Result<Self, GpuError> {
        let device = &gpu.device;
        let primitive_stride = primitive_slot_stride(
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let primitive_capacity = primitives.max(1);

        let primitive_layout = uniform_layout(
            device,
            "Changes Every Primitive Layout",
            true,
            std::mem::size_of::<ChangesEveryPrimitive>() as u64,
        );
        let frame_layout = uniform_layout(
            device,
            "Changes Every Frame Layout",
            false,
            std::mem::size_of::<ChangesEveryFrame>() as u64,
        );
        let resize_layout = uniform_layout(
            device,
            "Changes On Resize Layout",
            false,
            std::mem::size_of::<ChangesOnResize>() as u64,
        );

        let primitive_buffer = gpu.create_buffer(
            "Changes Every Primitive",
            primitive_stride * primitive_capacity as u64,
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        )?;
        let frame_buffer = gpu.create_buffer(
            "Changes Every Frame",
            std::mem::size_of::<ChangesEveryFrame>() as u64,
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        )?;
        let resize_buffer = gpu.create_buffer(
            "Changes On Resize",
            std::mem::size_of::<ChangesOnResize>() as u64,
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        )?;

        let primitive_bind_group = primitive_bind_group(device, &primitive_layout, &primitive_buffer);
        let frame_bind_group = whole_buffer_bind_group(
            device,
            "Changes Every Frame Bind Group",
            &frame_layout,
            &frame_buffer,
        );
        let resize_bind_group = whole_buffer_bind_group(
            device,
            "Changes On Resize Bind Group",
            &resize_layout,
            &resize_buffer,
        );

        Ok(Self {
            primitive_layout,
            frame_layout,
            resize_layout,
            primitive_buffer,
            primitive_bind_group,
            primitive_stride,
            primitive_capacity,
            frame_buffer,
            frame_bind_group,
            resize_buffer,
            resize_bind_group,
        })
    }

    /// Layouts in bind group order, for building the pipeline layout.
    pub fn bind_group_layouts(&self) -> [&wgpu::BindGroupLayout; 3] {
        [&self.primitive_layout, &self.frame_layout, &self.resize_layout]
    }

    /// Grow the per-primitive buffer so it holds at least `count` slots.
    ///
    /// Must be called before the render pass that binds those slots begins.
    pub fn reserve_primitives(&mut self, gpu: &GpuContext, count: usize) -> Result<(), GpuError> {
        if count <= self.primitive_capacity {
            return Ok(());
        }
        let capacity = count.next_power_of_two();
        self.primitive_buffer = gpu.create_buffer(
            "Changes Every Primitive",
            self.primitive_stride * capacity as u64,
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        )?;
        self.primitive_bind_group =
            primitive_bind_group(&gpu.device, &self.primitive_layout, &self.primitive_buffer);
        self.primitive_capacity = capacity;
        log::debug!("Per-primitive buffer grown to {} slots", capacity);
        Ok(())
    }

    pub fn set_changes_on_resize(&self, gpu: &GpuContext, projection: Mat4) {
        let cb = ChangesOnResize {
            projection: projection.to_cols_array_2d(),
        };
        gpu.queue
            .write_buffer(&self.resize_buffer, 0, bytemuck::cast_slice(&[cb]));
    }

    pub fn set_changes_every_frame(&self, gpu: &GpuContext, view: Mat4) {
        let cb = ChangesEveryFrame {
            view: view.to_cols_array_2d(),
        };
        gpu.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::cast_slice(&[cb]));
    }

    /// Bind the per-frame and on-resize blocks (groups 1 and 2).
    pub fn bind_shared(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_bind_group(1, &self.frame_bind_group, &[]);
        render_pass.set_bind_group(2, &self.resize_bind_group, &[]);
    }

    /// Write `world` into slot `index` and bind that slot as group 0.
    ///
    /// `index` must be below the count last passed to
    /// [`reserve_primitives`](Self::reserve_primitives).
    pub fn set_changes_every_primitive(
        &self,
        gpu: &GpuContext,
        render_pass: &mut wgpu::RenderPass<'_>,
        index: usize,
        world: Mat4,
    ) {
        debug_assert!(index < self.primitive_capacity);
        let offset = self.primitive_stride * index as u64;
        let cb = ChangesEveryPrimitive {
            world: world.to_cols_array_2d(),
        };
        gpu.queue
            .write_buffer(&self.primitive_buffer, offset, bytemuck::cast_slice(&[cb]));
        render_pass.set_bind_group(0, &self.primitive_bind_group, &[offset as u32]);
    }
}

fn uniform_layout(
    device: &wgpu::Device,
    label: &str,
    has_dynamic_offset: bool,
    size: u64,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset,
                min_binding_size: wgpu::BufferSize::new(size),
            },
            count: None,
        }],
    })
}

fn primitive_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Changes Every Primitive Bind Group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer,
                offset: 0,
                size: wgpu::BufferSize::new(std::mem::size_of::<ChangesEveryPrimitive>() as u64),
            }),
        }],
    })
}

fn whole_buffer_bind_group(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    })
}
