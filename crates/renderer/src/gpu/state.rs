use std::mem;

use anyhow::Result;
use chaoscore::{DeviceError, PointBatch, PointVertex, RenderDevice};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, warn};
use winit::dpi::PhysicalSize;

use crate::types::{AdapterProfile, RendererConfig};

use super::context::GpuContext;
use super::glow::GlowTexture;
use super::pipeline::{BlitPipeline, PointPipeline, ACCUMULATION_FORMAT};
use super::uniforms::PointUniforms;

struct AccumulationTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    blit_group: wgpu::BindGroup,
    size: PhysicalSize<u32>,
}

impl AccumulationTarget {
    fn new(device: &wgpu::Device, blit: &BlitPipeline, size: PhysicalSize<u32>) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("accumulation texture"),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: ACCUMULATION_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let blit_group = blit.bind(device, &view);
        Self {
            _texture: texture,
            view,
            blit_group,
            size,
        }
    }
}

/// The accumulation target only follows the surface once new points are drawn.
fn accumulation_is_stale(target: PhysicalSize<u32>, surface: PhysicalSize<u32>) -> bool {
    target != surface
}

/// wgpu-backed [`RenderDevice`]: points accumulate in an offscreen texture that
/// is blitted to the swapchain on every present.
///
/// One validation error scope is kept open at all times; `check_device_error`
/// pops it, reports what it caught and opens the next one.
pub(crate) struct GpuState {
    context: GpuContext,
    points: PointPipeline,
    blit: BlitPipeline,
    accumulation: AccumulationTarget,
    _glow: GlowTexture,
    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    uniforms: PointUniforms,
    background: wgpu::Color,
    pending_clear: bool,
    released: bool,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        config: &RendererConfig,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size, config.vsync)?;
        context
            .device
            .push_error_scope(wgpu::ErrorFilter::Validation);

        let uniforms = PointUniforms::new(
            config.point_size,
            config.sensitivity,
            config.trails,
            context.size,
        );
        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("point uniform buffer"),
            size: mem::size_of::<PointUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        context
            .queue
            .write_buffer(&uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let vertex_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("point vertex stream"),
            size: (config.particle_count.max(1) * PointVertex::STRIDE) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let glow = GlowTexture::load(
            &context.device,
            &context.queue,
            config.glow_texture.as_deref(),
        );
        let points = PointPipeline::new(&context.device, &uniform_buffer, &glow);
        let blit = BlitPipeline::new(&context.device, context.surface_format);
        let accumulation = AccumulationTarget::new(&context.device, &blit, context.size);

        Ok(Self {
            context,
            points,
            blit,
            accumulation,
            _glow: glow,
            vertex_buffer,
            uniform_buffer,
            uniforms,
            background: config.clear_color(),
            pending_clear: true,
            released: false,
        })
    }

    pub(crate) fn adapter_profile(&self) -> &AdapterProfile {
        &self.context.adapter_profile
    }

    /// Reconfigures the swapchain only. Presents keep stretching the retained
    /// picture over the new surface until the next draw rebuilds the
    /// accumulation target at the new size and starts it from the background.
    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 || new_size == self.context.size {
            return;
        }
        self.context.resize(new_size);
        self.uniforms.set_surface(new_size);
        debug!(width = new_size.width, height = new_size.height, "resized surface");
    }

    fn sync_accumulation(&mut self) {
        if accumulation_is_stale(self.accumulation.size, self.context.size) {
            self.accumulation =
                AccumulationTarget::new(&self.context.device, &self.blit, self.context.size);
            self.pending_clear = true;
            debug!(
                width = self.context.size.width,
                height = self.context.size.height,
                "rebuilt accumulation target"
            );
        }
    }

    fn take_load_op(&mut self) -> wgpu::LoadOp<wgpu::Color> {
        if mem::take(&mut self.pending_clear) {
            wgpu::LoadOp::Clear(self.background)
        } else {
            wgpu::LoadOp::Load
        }
    }
}

impl RenderDevice for GpuState {
    fn check_device_error(&mut self) -> Result<(), DeviceError> {
        let device = &self.context.device;
        let error = pollster::block_on(device.pop_error_scope());
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        match error {
            None => Ok(()),
            Some(wgpu::Error::OutOfMemory { .. }) => Err(DeviceError::OutOfMemory),
            Some(other) => Err(DeviceError::Validation(other.to_string())),
        }
    }

    fn clear(&mut self) {
        self.pending_clear = true;
    }

    fn draw_points(&mut self, batch: PointBatch<'_>) -> Result<(), DeviceError> {
        if self.released {
            return Ok(());
        }
        if batch.bytes.len() as u64 > self.vertex_buffer.size() {
            return Err(DeviceError::Validation(format!(
                "{} bytes of vertices exceed the {} byte stream buffer",
                batch.bytes.len(),
                self.vertex_buffer.size()
            )));
        }

        self.sync_accumulation();
        self.uniforms.set_angle(batch.angle);
        let queue = &self.context.queue;
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));
        queue.write_buffer(&self.vertex_buffer, 0, batch.bytes);

        let load = self.take_load_op();
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("point encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("point pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.accumulation.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.points.pipeline);
            render_pass.set_bind_group(0, &self.points.bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..batch.bytes.len() as u64));
            render_pass.draw(0..4, 0..batch.vertices.len() as u32);
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn present(&mut self) -> Result<(), DeviceError> {
        if self.released {
            return Ok(());
        }
        let frame = match self.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("surface lost or outdated; reconfiguring");
                self.context.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timeout; skipping present");
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(DeviceError::OutOfMemory),
            Err(other) => {
                warn!(error = %other, "surface error");
                return Err(DeviceError::SurfaceLost);
            }
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("blit encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("blit pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.blit.pipeline);
            render_pass.set_bind_group(0, &self.accumulation.blit_group, &[]);
            render_pass.draw(0..3, 0..1);
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn release(&mut self) {
        if !self.released {
            debug!("releasing GPU resources");
            self.released = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulation_survives_until_sizes_differ() {
        let size = PhysicalSize::new(900, 750);
        assert!(!accumulation_is_stale(size, size));
        assert!(accumulation_is_stale(size, PhysicalSize::new(1280, 720)));
    }
}
