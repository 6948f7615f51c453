//! Device-independent core of the attractor animation.
//!
//! A [`RenderCore`] holds the trajectory state, the vertex arena and the
//! counters for one preset; a [`FrameScheduler`] drives it one frame at a
//! time against anything implementing [`RenderDevice`].

mod attractor;
mod backpressure;
mod clock;
mod color;
mod error;
mod recurrence;
mod render_core;
mod sampler;
mod scheduler;
mod telemetry;
mod transform;
mod vertex;

pub use attractor::{angle_for, AttractorState, Coefficients, DriftPolicy, PHI};
pub use backpressure::BackpressureController;
pub use clock::{Clock, ManualClock, SystemClock};
pub use color::{hue, Rgba};
pub use error::{ChaosError, DeviceError};
pub use recurrence::Recurrence;
pub use render_core::RenderCore;
pub use sampler::{Sample, TrajectorySampler};
pub use scheduler::{FrameOutcome, FrameScheduler, PointBatch, RenderDevice, SchedulerState};
pub use telemetry::{FpsReport, FrameTelemetry, RunSummary};
pub use transform::ScreenTransform;
pub use vertex::{PointVertex, VertexStreamBuffer};
