use chaosconfig::ConfigError;

use crate::scheduler::SchedulerState;

/// Failures reported by a [`RenderDevice`](crate::RenderDevice) implementation.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("failed to create presentation surface: {0}")]
    SurfaceCreation(String),
    #[error("shader compilation failed: {0}")]
    ShaderCompile(String),
    #[error("pipeline creation failed: {0}")]
    Pipeline(String),
    #[error("presentation surface lost")]
    SurfaceLost,
    #[error("graphics device ran out of memory")]
    OutOfMemory,
    #[error("graphics validation error: {0}")]
    Validation(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ChaosError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error("cannot {action} while the scheduler is {from}")]
    InvalidTransition {
        from: SchedulerState,
        action: &'static str,
    },
}
