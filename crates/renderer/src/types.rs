use std::path::PathBuf;
use std::time::Duration;

use chaosconfig::PresetConfig;

/// Surface and shading options derived from a preset.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    pub window_title: String,
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    pub vsync: bool,
    /// Sprite edge length in physical pixels.
    pub point_size: f32,
    pub sensitivity: f32,
    pub trails: bool,
    pub background: [f32; 4],
    /// Optional glow sprite; a procedural radial falloff is used otherwise.
    pub glow_texture: Option<PathBuf>,
    pub run_for: Option<Duration>,
    pub particle_count: usize,
}

impl RendererConfig {
    pub fn from_preset(preset: &PresetConfig) -> Self {
        Self {
            window_title: preset.window.title.clone(),
            surface_size: (preset.window.width, preset.window.height),
            vsync: preset.render.vsync,
            point_size: preset.render.point_size,
            sensitivity: preset.render.sensitivity,
            trails: preset.render.trails,
            background: preset.render.background,
            glow_texture: preset.render.glow_texture.clone(),
            run_for: preset.session.run_for,
            particle_count: preset.particle_count,
        }
    }

    pub(crate) fn clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.background;
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: a as f64,
        }
    }
}

/// Summary of the adapter wgpu picked, logged once at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
}

impl AdapterProfile {
    pub(crate) fn from_wgpu(info: &wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
        }
    }

    pub(crate) fn is_software(&self) -> bool {
        matches!(self.device_type, wgpu::DeviceType::Cpu)
            || self.name.to_ascii_lowercase().contains("llvmpipe")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrors_preset_render_settings() {
        let preset = chaosconfig::builtin("bubble").unwrap();
        let config = RendererConfig::from_preset(&preset);
        assert_eq!(config.window_title, "Bubble Universe");
        assert_eq!(config.surface_size, (1920, 1100));
        assert_eq!(config.point_size, 32.0);
        assert!(!config.trails);
        assert_eq!(config.clear_color(), wgpu::Color::BLACK);
    }

    #[test]
    fn detects_software_adapters() {
        let profile = AdapterProfile {
            name: "llvmpipe (LLVM 17.0.6, 256 bits)".into(),
            backend: wgpu::Backend::Vulkan,
            device_type: wgpu::DeviceType::Other,
        };
        assert!(profile.is_software());
    }
}
