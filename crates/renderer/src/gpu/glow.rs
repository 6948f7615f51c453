use std::path::Path;

use anyhow::{Context, Result};
use image::imageops::flip_vertical_in_place;
use image::GenericImageView;
use wgpu::util::{DeviceExt, TextureDataOrder};

/// Edge length of the generated fallback sprite.
pub(crate) const PROCEDURAL_GLOW_SIZE: u32 = 64;

/// Sprite texture sampled by every point.
pub(crate) struct GlowTexture {
    pub _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub resolution: [u32; 2],
}

impl GlowTexture {
    /// Loads the sprite at `path`, falling back to a procedural glow if it is absent or unreadable.
    pub(crate) fn load(device: &wgpu::Device, queue: &wgpu::Queue, path: Option<&Path>) -> Self {
        if let Some(path) = path {
            match load_image(device, queue, path) {
                Ok(texture) => {
                    tracing::debug!(
                        path = %path.display(),
                        width = texture.resolution[0],
                        height = texture.resolution[1],
                        "loaded glow texture"
                    );
                    return texture;
                }
                Err(error) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %error,
                        "failed to load glow texture; using procedural glow"
                    );
                }
            }
        }
        procedural(device, queue)
    }
}

fn load_image(device: &wgpu::Device, queue: &wgpu::Queue, path: &Path) -> Result<GlowTexture> {
    let image = image::open(path)
        .with_context(|| format!("failed to open glow texture at {}", path.display()))?;
    let (width, height) = image.dimensions();
    let mut rgba = image.to_rgba8();
    flip_vertical_in_place(&mut rgba);
    Ok(upload(device, queue, "glow texture", width, height, &rgba))
}

fn procedural(device: &wgpu::Device, queue: &wgpu::Queue) -> GlowTexture {
    let pixels = radial_glow_pixels(PROCEDURAL_GLOW_SIZE);
    upload(
        device,
        queue,
        "procedural glow texture",
        PROCEDURAL_GLOW_SIZE,
        PROCEDURAL_GLOW_SIZE,
        &pixels,
    )
}

/// White RGBA sprite whose alpha falls off quadratically from the centre to the inscribed circle.
pub(crate) fn radial_glow_pixels(size: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    let half = size as f32 / 2.0;
    for y in 0..size {
        for x in 0..size {
            let dx = (x as f32 + 0.5 - half) / half;
            let dy = (y as f32 + 0.5 - half) / half;
            let falloff = (1.0 - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0);
            let alpha = (falloff * falloff * 255.0).round() as u8;
            pixels.extend([255, 255, 255, alpha]);
        }
    }
    pixels
}

fn upload(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    width: u32,
    height: u32,
    data: &[u8],
) -> GlowTexture {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        TextureDataOrder::LayerMajor,
        data,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("glow sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    GlowTexture {
        _texture: texture,
        view,
        sampler,
        resolution: [width, height],
    }
}
