use std::num::NonZeroUsize;

use chaosconfig::{ConfigError, PresetConfig};

use crate::backpressure::BackpressureController;
use crate::error::ChaosError;
use crate::sampler::{Sample, TrajectorySampler};
use crate::telemetry::FrameTelemetry;
use crate::vertex::VertexStreamBuffer;

/// Everything one frame of the animation reads or mutates, owned by the event loop.
#[derive(Debug, Clone)]
pub struct RenderCore {
    pub(crate) sampler: TrajectorySampler,
    pub(crate) samples: Vec<Sample>,
    pub(crate) buffer: VertexStreamBuffer,
    pub(crate) backpressure: BackpressureController,
    pub(crate) telemetry: FrameTelemetry,
    pub(crate) iterations: NonZeroUsize,
    pub(crate) accumulate: bool,
}

impl RenderCore {
    pub fn from_config(config: &PresetConfig) -> Result<Self, ChaosError> {
        config.validate()?;
        let iterations = NonZeroUsize::new(config.particle_count).ok_or_else(|| {
            ConfigError::Invalid("particle_count must be greater than zero".to_string())
        })?;

        Ok(Self {
            sampler: TrajectorySampler::from_config(config),
            samples: Vec::with_capacity(iterations.get()),
            buffer: VertexStreamBuffer::new(iterations.get(), config.render.trails),
            backpressure: BackpressureController::from_config(config),
            telemetry: FrameTelemetry::new(),
            iterations,
            accumulate: config.render.accumulate,
        })
    }

    pub fn sampler(&self) -> &TrajectorySampler {
        &self.sampler
    }

    pub fn buffer(&self) -> &VertexStreamBuffer {
        &self.buffer
    }

    pub fn backpressure(&self) -> &BackpressureController {
        &self.backpressure
    }

    pub fn telemetry(&self) -> &FrameTelemetry {
        &self.telemetry
    }

    pub fn iterations(&self) -> NonZeroUsize {
        self.iterations
    }

    /// Whether frames build on each other instead of clearing every frame.
    pub fn accumulates(&self) -> bool {
        self.accumulate
    }
}
