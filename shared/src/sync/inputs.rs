/// Low-dimensional control vector synchronized alongside a vehicle's pose
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct DriveInputs {
    /// -1 full left, 1 full right
    pub steering: f32,
    /// -1 full reverse, 1 full forward
    pub throttle: f32,
    /// 0 released, 1 fully engaged
    pub brake: f32,
}

impl DriveInputs {
    /// Clamp the axes and derive the brake: it engages when neither
    /// steering nor throttle is applied.
    pub fn new(steering: f32, throttle: f32) -> Self {
        let steering = clamp_axis(steering);
        let throttle = clamp_axis(throttle);
        let brake = if steering == 0.0 && throttle == 0.0 {
            1.0
        } else {
            0.0
        };
        Self {
            steering,
            throttle,
            brake,
        }
    }

    /// Neutral inputs with the brake engaged
    pub fn parked() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn with_brake(steering: f32, throttle: f32, brake: f32) -> Self {
        Self {
            steering: clamp_axis(steering),
            throttle: clamp_axis(throttle),
            brake: if brake.is_finite() {
                brake.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }
}

fn clamp_axis(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}
