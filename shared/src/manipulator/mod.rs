mod single_point;
mod steering;

pub use single_point::SinglePointGrab;
pub use steering::SteeringGrab;

use glam::Vec3;

use crate::{sync::DriveInputs, types::ObjectKind, Pose};

/// Everything a manipulator may look at during one interaction step
#[derive(Clone, Copy, Debug)]
pub struct GrabFrame<'a> {
    /// Current pose of the grabbed object
    pub target: Pose,
    /// Active grab points, in the order they began
    pub grabs: &'a [Pose],
    /// Driver's chest, used by steering
    pub chest: Vec3,
    /// Dominant hand attach point, used by steering to order the grabs
    pub dominant_hand: Vec3,
}

impl<'a> GrabFrame<'a> {
    pub fn new(target: Pose, grabs: &'a [Pose]) -> Self {
        Self {
            target,
            grabs,
            chest: Vec3::ZERO,
            dominant_hand: Vec3::ZERO,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ManipulatorOutput {
    pub pose: Pose,
    pub inputs: Option<DriveInputs>,
}

/// How grabbing an object moves it. Chosen per object at spawn time.
#[derive(Clone, Debug)]
pub enum Manipulator {
    /// Grabbing does not move the object
    Fixed,
    SinglePoint(SinglePointGrab),
    Steering(SteeringGrab),
}

impl Manipulator {
    pub fn for_kind(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Grabbable | ObjectKind::Marker => {
                Manipulator::SinglePoint(SinglePointGrab::new())
            }
            ObjectKind::Vehicle => Manipulator::Steering(SteeringGrab::new()),
        }
    }

    pub fn begin(&mut self, frame: &GrabFrame) {
        match self {
            Manipulator::Fixed => {}
            Manipulator::SinglePoint(grab) => grab.begin(frame),
            Manipulator::Steering(grab) => grab.begin(frame),
        }
    }

    /// New pose and inputs for this step, or `None` when nothing moves
    pub fn update(&mut self, frame: &GrabFrame) -> Option<ManipulatorOutput> {
        match self {
            Manipulator::Fixed => None,
            Manipulator::SinglePoint(grab) => grab.update(frame).map(|pose| ManipulatorOutput {
                pose,
                inputs: None,
            }),
            Manipulator::Steering(grab) => {
                grab.update(frame)
                    .map(|(pose, inputs)| ManipulatorOutput {
                        pose,
                        inputs: Some(inputs),
                    })
            }
        }
    }

    /// Inputs to publish once the interaction is over, if any
    pub fn end(&mut self) -> Option<DriveInputs> {
        match self {
            Manipulator::Fixed => None,
            Manipulator::SinglePoint(grab) => {
                grab.end();
                None
            }
            Manipulator::Steering(grab) => Some(grab.end()),
        }
    }
}
