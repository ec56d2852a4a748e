use std::time::Duration;

use crate::{math::normalize_rotation, sync::DriveInputs, PoseSample};

/// Values that can be blended between two received samples
pub trait Interpolate: Copy {
    fn interpolate(start: &Self, target: &Self, t: f32) -> Self;
}

impl Interpolate for PoseSample {
    fn interpolate(start: &Self, target: &Self, t: f32) -> Self {
        let from = normalize_rotation(start.rotation);
        let to = normalize_rotation(target.rotation);

        let start_secs = start.timestamp.as_secs_f64();
        let target_secs = target.timestamp.as_secs_f64();
        let timestamp = start_secs + (target_secs - start_secs) * f64::from(t);

        PoseSample {
            position: start.position.lerp(target.position, t),
            rotation: normalize_rotation(from.slerp(to, t)),
            timestamp: Duration::from_secs_f64(timestamp.max(0.0)),
        }
    }
}

impl Interpolate for DriveInputs {
    fn interpolate(start: &Self, target: &Self, t: f32) -> Self {
        let lerp = |a: f32, b: f32| a + (b - a) * t;
        DriveInputs {
            steering: lerp(start.steering, target.steering),
            throttle: lerp(start.throttle, target.throttle),
            brake: lerp(start.brake, target.brake),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InterpolationState<T> {
    pub start: T,
    pub target: T,
    pub elapsed: Duration,
    pub interval: Duration,
}

impl<T: Interpolate> InterpolationState<T> {
    fn progress(&self) -> f32 {
        if self.interval.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.interval.as_secs_f32()).clamp(0.0, 1.0)
    }

    fn current(&self) -> T {
        T::interpolate(&self.start, &self.target, self.progress())
    }
}

/// Receiver-side reconstruction of a remotely authored value. Each received
/// sample replaces the previous target, starting from wherever the blend
/// currently is. Past the interval the value holds at the target.
pub struct Interpolator<T: Interpolate> {
    interval: Duration,
    state: Option<InterpolationState<T>>,
}

impl<T: Interpolate> Interpolator<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: None,
        }
    }

    pub fn receive(&mut self, sample: T) {
        let start = match &self.state {
            Some(state) => state.current(),
            None => sample,
        };
        self.state = Some(InterpolationState {
            start,
            target: sample,
            elapsed: Duration::ZERO,
            interval: self.interval,
        });
    }

    pub fn advance(&mut self, delta: Duration) {
        if let Some(state) = &mut self.state {
            state.elapsed = state.elapsed.saturating_add(delta);
        }
    }

    /// Blended value, or `None` before the first sample arrives
    pub fn current(&self) -> Option<T> {
        self.state.as_ref().map(InterpolationState::current)
    }

    pub fn state(&self) -> Option<&InterpolationState<T>> {
        self.state.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }
}
