use std::{ops::Mul, time::Duration};

use glam::{EulerRot, Mat3, Quat, Vec3};

const ROTATION_EPSILON: f32 = 1e-6;

/// Rigid transform: rotation followed by translation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Normalizes a usable rotation. A non-finite or zero-length rotation is
    /// kept as given, so that `LocalizedPose` can reject it.
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        let rotation = if is_usable_rotation(rotation) {
            normalize_rotation(rotation)
        } else {
            rotation
        };
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    pub fn inverse(&self) -> Pose {
        let rotation = self.rotation.inverse();
        Pose {
            position: rotation * -self.position,
            rotation,
        }
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * point
    }

    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.position)
    }

    /// Heading around the up (Y) axis in radians. Pitch and roll are ignored.
    pub fn yaw(&self) -> f32 {
        yaw_of(self.rotation)
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite()
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Pose {
    type Output = Pose;

    fn mul(self, rhs: Pose) -> Pose {
        Pose {
            position: self.transform_point(rhs.position),
            rotation: normalize_rotation(self.rotation * rhs.rotation),
        }
    }
}

/// A pose observed at a point in session time
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseSample {
    pub position: Vec3,
    pub rotation: Quat,
    pub timestamp: Duration,
}

impl PoseSample {
    pub fn new(position: Vec3, rotation: Quat, timestamp: Duration) -> Self {
        Self {
            position,
            rotation: normalize_rotation(rotation),
            timestamp,
        }
    }

    pub fn from_pose(pose: Pose, timestamp: Duration) -> Self {
        Self::new(pose.position, pose.rotation, timestamp)
    }

    pub fn pose(&self) -> Pose {
        Pose {
            position: self.position,
            rotation: self.rotation,
        }
    }
}

/// Unit-length copy of `rotation`. Degenerate or non-finite input collapses
/// to identity.
pub fn normalize_rotation(rotation: Quat) -> Quat {
    if !is_usable_rotation(rotation) {
        return Quat::IDENTITY;
    }
    rotation / rotation.length()
}

/// Finite and long enough to normalize
pub fn is_usable_rotation(rotation: Quat) -> bool {
    rotation.is_finite() && rotation.length() >= ROTATION_EPSILON
}

pub fn is_normalized(rotation: Quat) -> bool {
    (rotation.length() - 1.0).abs() < 1e-4
}

/// Heading around the up (Y) axis in radians
pub fn yaw_of(rotation: Quat) -> f32 {
    let (yaw, _pitch, _roll) = normalize_rotation(rotation).to_euler(EulerRot::YXZ);
    yaw
}

/// Rotation whose +Z axis points along `forward` and whose +Y axis is as
/// close to `up` as possible.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let Some(forward) = forward.try_normalize() else {
        return Quat::IDENTITY;
    };
    let right = match up.cross(forward).try_normalize() {
        Some(right) => right,
        // forward is parallel to up
        None => return Quat::from_rotation_arc(Vec3::Z, forward),
    };
    let up = forward.cross(right);
    normalize_rotation(Quat::from_mat3(&Mat3::from_cols(right, up, forward)))
}

/// Shortest signed difference between two angles in degrees, in (-180, 180].
pub fn delta_angle(current: f32, target: f32) -> f32 {
    let mut delta = (target - current).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}
