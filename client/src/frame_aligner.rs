use log::info;

use colocate_shared::{yaw_of, AlignmentError, LocalizedPose, Pose, Quat};

/// Keeps the transform from this device's tracking space into the shared
/// session space. Aligning makes a reference pose the shared origin; only
/// the yaw of the reference is used so that the up axis is never tilted.
#[derive(Clone, Debug)]
pub struct FrameAligner {
    root: Pose,
}

impl FrameAligner {
    pub fn new() -> Self {
        Self {
            root: Pose::IDENTITY,
        }
    }

    /// Align tracking space so that `reference` becomes the shared origin.
    /// Starts over from an identity root, so repeated alignments to the same
    /// reference give the same result.
    pub fn align_to(&mut self, reference: &LocalizedPose) {
        self.root = Pose::IDENTITY;
        self.apply(&reference.pose());
        info!(
            "Aligned to reference at {:?}, yaw {:.1}°",
            reference.pose().position,
            yaw_of(reference.pose().rotation).to_degrees()
        );
    }

    /// Move the shared origin onto `marker`, a pose in the current shared
    /// space. Successive re-roots compose.
    pub fn reroot_on_marker(&mut self, marker: &Pose) -> Result<(), AlignmentError> {
        let marker = LocalizedPose::try_from(*marker)?;
        self.apply(&marker.pose());
        info!("Re-rooted on marker at {:?}", marker.pose().position);
        Ok(())
    }

    fn apply(&mut self, reference: &Pose) {
        let inverse_yaw = Quat::from_rotation_y(-reference.yaw());
        self.root = Pose::new(
            inverse_yaw * self.root.position - inverse_yaw * reference.position,
            inverse_yaw * self.root.rotation,
        );
    }

    /// Tracking space to shared space
    pub fn to_shared(&self, pose: &Pose) -> Pose {
        self.root * *pose
    }

    /// Shared space to tracking space
    pub fn to_tracking(&self, pose: &Pose) -> Pose {
        self.root.inverse() * *pose
    }

    pub fn root(&self) -> Pose {
        self.root
    }

    pub fn reset(&mut self) {
        self.root = Pose::IDENTITY;
    }
}

impl Default for FrameAligner {
    fn default() -> Self {
        Self::new()
    }
}
