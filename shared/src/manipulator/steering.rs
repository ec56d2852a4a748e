use glam::{Quat, Vec3};

use crate::{
    manipulator::GrabFrame,
    math::{delta_angle, look_rotation},
    sync::DriveInputs,
    Pose,
};

const MAX_STEERING_ANGLE: f32 = 110.0;
const MAX_STEP_ANGLE: f32 = 15.0;
const INITIAL_ARM_LENGTH: f32 = 0.6;

/// Two-handed steering wheel. The wheel sits at the centroid of the grab
/// points facing the driver's chest; the roll of the hands around it steers
/// and the distance from the chest drives the throttle.
#[derive(Clone, Debug)]
pub struct SteeringGrab {
    cumulative_angle: f32,
    throttle: f32,
    arm_length: f32,
    first_index: usize,
}

impl SteeringGrab {
    pub fn new() -> Self {
        Self {
            cumulative_angle: 0.0,
            throttle: 0.0,
            arm_length: INITIAL_ARM_LENGTH,
            first_index: 0,
        }
    }

    pub fn begin(&mut self, frame: &GrabFrame) {
        self.cumulative_angle = 0.0;
        self.throttle = 0.0;
        self.first_index = match frame.grabs {
            [first, second, ..] => {
                let to_first = first.position.distance(frame.dominant_hand);
                let to_second = second.position.distance(frame.dominant_hand);
                if to_first < to_second {
                    0
                } else {
                    1
                }
            }
            _ => 0,
        };
    }

    /// Returns the wheel pose and the inputs it produces
    pub fn update(&mut self, frame: &GrabFrame) -> Option<(Pose, DriveInputs)> {
        if frame.grabs.is_empty() {
            return None;
        }

        let centroid = frame
            .grabs
            .iter()
            .fold(Vec3::ZERO, |sum, grab| sum + grab.position)
            / frame.grabs.len() as f32;
        let facing = look_rotation(frame.chest - centroid, Vec3::Y);
        let wheel = Pose::new(centroid, facing);

        if let [first, second, ..] = frame.grabs {
            self.steer(&wheel, first.position, second.position);
        }
        self.accelerate(centroid.distance(frame.chest));

        let rolled = Pose::new(
            wheel.position,
            wheel.rotation * Quat::from_rotation_z(self.cumulative_angle.to_radians()),
        );
        Some((rolled, self.inputs()))
    }

    /// Inputs go back to neutral once the wheel is let go
    pub fn end(&mut self) -> DriveInputs {
        self.cumulative_angle = 0.0;
        self.throttle = 0.0;
        self.arm_length = INITIAL_ARM_LENGTH;
        self.inputs()
    }

    pub fn inputs(&self) -> DriveInputs {
        DriveInputs::new(self.cumulative_angle / MAX_STEERING_ANGLE, self.throttle)
    }

    fn steer(&mut self, wheel: &Pose, first: Vec3, second: Vec3) {
        let local_first = wheel.inverse_transform_point(first);
        let local_second = wheel.inverse_transform_point(second);
        let direction = if self.first_index == 0 {
            local_second - local_first
        } else {
            local_first - local_second
        };
        let current = direction.y.atan2(direction.x).to_degrees();

        if self.cumulative_angle.abs() < f32::EPSILON {
            self.cumulative_angle = current;
        }

        let step = delta_angle(self.cumulative_angle, current).clamp(-MAX_STEP_ANGLE, MAX_STEP_ANGLE);
        self.cumulative_angle =
            (self.cumulative_angle + step).clamp(-MAX_STEERING_ANGLE, MAX_STEERING_ANGLE);
    }

    fn accelerate(&mut self, distance_to_chest: f32) {
        let ratio = distance_to_chest / self.arm_length;

        self.throttle = if ratio <= 0.45 {
            -1.0
        } else if ratio <= 0.55 {
            -1.0 + (ratio - 0.45) / 0.1
        } else if ratio <= 0.575 {
            0.0
        } else if ratio <= 0.85 {
            (ratio - 0.575) / 0.275
        } else {
            1.0
        };

        if distance_to_chest > self.arm_length {
            self.arm_length = distance_to_chest;
        }
    }
}

impl Default for SteeringGrab {
    fn default() -> Self {
        Self::new()
    }
}
