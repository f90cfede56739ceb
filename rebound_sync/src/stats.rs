//! Smoothed one-way lag and jitter estimation
use bevy_ecs::component::Component;
use bevy_reflect::Reflect;
use core::time::Duration;
use tracing::trace;

#[derive(Clone, Copy, Debug, Reflect)]
pub struct LagStatsConfig {
    /// Weight given to a new sample in the exponential moving average, in `(0, 1]`
    pub smoothing_factor: f32,
}

impl Default for LagStatsConfig {
    fn default() -> Self {
        Self {
            smoothing_factor: 0.1,
        }
    }
}

/// Exponentially weighted moving average of the one-way lag of received updates.
///
/// Jitter is the moving average of the absolute deviation between a sample and the
/// current lag estimate.
#[derive(Component, Clone, Debug, Default, Reflect)]
pub struct LagStats {
    config: LagStatsConfig,
    lag: Duration,
    jitter: Duration,
    /// Lag of the most recent sample, unsmoothed
    last_sample: Duration,
    samples: u32,
}

impl LagStats {
    pub fn new(config: LagStatsConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Smoothed one-way lag
    pub fn lag(&self) -> Duration {
        self.lag
    }

    pub fn jitter(&self) -> Duration {
        self.jitter
    }

    pub fn last_sample(&self) -> Duration {
        self.last_sample
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn update_with_new_sample(&mut self, sample: Duration) {
        self.last_sample = sample;
        // the first sample seeds the estimate instead of being blended with zero
        if self.samples == 0 {
            self.lag = sample;
            self.jitter = Duration::ZERO;
        } else {
            let alpha = self.config.smoothing_factor.clamp(f32::EPSILON, 1.0);
            let deviation = if sample > self.lag {
                sample - self.lag
            } else {
                self.lag - sample
            };
            self.lag = self.lag.mul_f32(1.0 - alpha) + sample.mul_f32(alpha);
            self.jitter = self.jitter.mul_f32(1.0 - alpha) + deviation.mul_f32(alpha);
        }
        self.samples = self.samples.saturating_add(1);
        trace!(?sample, lag = ?self.lag, jitter = ?self.jitter, "updated lag statistics");
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }
}
