mod config;
mod inputs;
mod interpolator;
mod publisher;

pub use config::SyncConfig;
pub use inputs::DriveInputs;
pub use interpolator::{Interpolate, InterpolationState, Interpolator};
pub use publisher::SyncPublisher;
