//! Windowed GPU front end for the chaos game point cloud.
//!
//! The crate glues a `winit` window, the `wgpu` point pipeline and the
//! frame scheduler from `chaoscore` together. The overall flow is:
//!
//! ```text
//!   CLI / chaosgame
//!          │ PresetConfig
//!          ▼
//!   Renderer::run ──▶ GpuState ──▶ winit event loop ──▶ FrameScheduler::tick()
//!                                                          │
//!                    accumulation texture ◀── draw_points ─┘
//!                          │
//!                          └─▶ present() blits onto the swapchain
//! ```
//!
//! `GpuState` owns every GPU resource (surface, device, pipelines, buffers)
//! and implements `chaoscore::RenderDevice`, so the scheduler never sees wgpu
//! types. `Renderer` is the thin entry point the binary calls.

mod compile;
mod gpu;
mod types;
mod window;

use anyhow::Result;
use chaosconfig::PresetConfig;

pub use types::RendererConfig;

/// Entry point that owns a validated preset and the surface options derived from it.
#[derive(Debug, Clone)]
pub struct Renderer {
    preset: PresetConfig,
    config: RendererConfig,
}

impl Renderer {
    /// Builds a renderer for the supplied preset.
    pub fn new(preset: PresetConfig) -> Self {
        let config = RendererConfig::from_preset(&preset);
        Self { preset, config }
    }

    pub fn preset(&self) -> &PresetConfig {
        &self.preset
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Opens the window and renders until the user quits or the run limit expires.
    ///
    /// Returns an error if the window or graphics device cannot be created, or
    /// if the device reports an error while rendering.
    pub fn run(&mut self) -> Result<()> {
        window::run(&self.preset, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_surface_config_from_preset() {
        let preset = chaosconfig::builtin("dream").unwrap();
        let renderer = Renderer::new(preset.clone());
        assert_eq!(
            renderer.config().surface_size,
            (preset.window.width, preset.window.height)
        );
        assert_eq!(renderer.config().particle_count, preset.particle_count);
        assert_eq!(renderer.preset().name, preset.name);
    }
}
