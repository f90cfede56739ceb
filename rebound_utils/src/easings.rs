//! Easing curves used to shape interpolation progress.
//!
//! Every curve maps `t` in `[0, 1]` to `[0, 1]`, with `f(0) = 0` and `f(1) = 1`.
use bevy_reflect::Reflect;

/// Selects which easing curve is applied to a normalized progress value
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect)]
pub enum Easing {
    /// Constant-speed blend
    #[default]
    Linear,
    /// Fast start, slow finish
    EaseOutQuad,
    /// Slow start and finish
    EaseInOutCubic,
}

impl Easing {
    /// Apply the curve. The input is clamped to `[0, 1]` first.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseOutQuad => ease_out_quad(t),
            Easing::EaseInOutCubic => ease_in_out_cubic(t),
        }
    }
}

pub fn ease_out_quad(x: f32) -> f32 {
    1.0 - (1.0 - x) * (1.0 - x)
}

pub fn ease_in_out_cubic(x: f32) -> f32 {
    if x < 0.5 {
        4.0 * x * x * x
    } else {
        let y = -2.0 * x + 2.0;
        1.0 - y * y * y / 2.0
    }
}
