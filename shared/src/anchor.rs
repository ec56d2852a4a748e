use async_trait::async_trait;
use glam::{Quat, Vec3};
use thiserror::Error;
use uuid::Uuid;

use crate::{discovery::GroupId, math::normalize_rotation, Pose};

/// A platform anchor created by this peer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnchorHandle {
    pub id: Uuid,
}

/// An anchor shared by another peer that has not been resolved in local
/// space yet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UnboundAnchor {
    pub id: Uuid,
}

/// The shared reference published by the coordinator, once per session
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferencePose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl ReferencePose {
    pub fn origin() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// A reference pose that has been resolved in this peer's tracking space.
/// Only valid poses can be constructed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalizedPose(Pose);

impl LocalizedPose {
    pub fn try_new(position: Vec3, rotation: Quat) -> Result<Self, AlignmentError> {
        if !position.is_finite() {
            return Err(AlignmentError::NonFinite { what: "position" });
        }
        if !rotation.is_finite() {
            return Err(AlignmentError::NonFinite { what: "rotation" });
        }
        if rotation.length() < 1e-6 {
            return Err(AlignmentError::DegenerateRotation);
        }
        Ok(Self(Pose {
            position,
            rotation: normalize_rotation(rotation),
        }))
    }

    pub fn pose(&self) -> Pose {
        self.0
    }
}

impl TryFrom<Pose> for LocalizedPose {
    type Error = AlignmentError;

    fn try_from(pose: Pose) -> Result<Self, Self::Error> {
        Self::try_new(pose.position, pose.rotation)
    }
}

/// Errors raised when a pose cannot serve as an alignment reference
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignmentError {
    #[error("Reference {what} is not finite")]
    NonFinite { what: &'static str },

    #[error("Reference rotation has zero length")]
    DegenerateRotation,
}

/// Errors reported by an anchor repository
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnchorError {
    #[error("Failed to create anchor: {reason}")]
    Create { reason: String },

    #[error("Failed to save anchor {id}: {reason}")]
    Save { id: Uuid, reason: String },

    #[error("Failed to share anchor {id} with group {group}: {reason}")]
    Share {
        id: Uuid,
        group: GroupId,
        reason: String,
    },

    #[error("Failed to load anchors for group {group}: {reason}")]
    Load { group: GroupId, reason: String },

    #[error("Anchor {id} could not be localized")]
    Localize { id: Uuid },
}

/// Persists, loads and shares the session's single reference pose, keyed by
/// group id. Every operation may fail and be retried.
#[async_trait]
pub trait AnchorRepository: Send + Sync {
    async fn create(&self, pose: ReferencePose) -> Result<AnchorHandle, AnchorError>;

    async fn save(&self, handle: &AnchorHandle) -> Result<(), AnchorError>;

    async fn share(&self, handle: &AnchorHandle, group: GroupId) -> Result<(), AnchorError>;

    async fn load_by_group(&self, group: GroupId) -> Result<Vec<UnboundAnchor>, AnchorError>;

    async fn localize(&self, anchor: &UnboundAnchor) -> Result<LocalizedPose, AnchorError>;
}
