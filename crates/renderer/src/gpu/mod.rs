//! GPU side of the point renderer.
//!
//! - `context` owns wgpu instance/device/surface wiring and reconfigures the
//!   swapchain on resize or loss.
//! - `glow` loads the sprite texture every point samples, or generates one.
//! - `pipeline` builds the instanced point pipeline and the accumulation blit.
//! - `uniforms` mirrors the `PointParams` block.
//! - `state` glues everything together behind `chaoscore::RenderDevice`.

mod context;
mod glow;
mod pipeline;
mod state;
mod uniforms;

pub(crate) use state::GpuState;
