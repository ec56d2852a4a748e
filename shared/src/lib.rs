//! # Colocate Shared
//! Common functionality shared between colocate-server & colocate-client crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use colocate_serde::{
    BitReader, BitWrite, BitWriter, ConstBitLength, Serde, SerdeErr, SignedFloat,
    SignedInteger, SignedVariableFloat, SignedVariableInteger, UnsignedFloat, UnsignedInteger,
    UnsignedVariableFloat, UnsignedVariableInteger,
};

mod anchor;
mod authority;
pub mod discovery;
mod events;
mod manipulator;
mod math;
mod messages;
mod reset;
mod retry;
mod sync;
mod types;

pub use anchor::{
    AlignmentError, AnchorError, AnchorHandle, AnchorRepository, LocalizedPose, ReferencePose,
    UnboundAnchor,
};
pub use authority::{AuthResult, AuthorityRecord, AuthorityReplica, AuthorityState, ReplicaEntry};
pub use discovery::{DiscoveryConfig, DiscoveryError, DiscoveryRace, GroupId, SessionDescriptor};
pub use events::{EventStream, PointerEvent, PointerEventKind, Subscription};
pub use manipulator::{GrabFrame, Manipulator, ManipulatorOutput, SinglePointGrab, SteeringGrab};
pub use math::{delta_angle, is_normalized, look_rotation, normalize_rotation, yaw_of, Pose, PoseSample};
pub use messages::{ClientMessage, MessageError, ServerMessage};
pub use reset::{FullReset, ResetManager};
pub use retry::{RetryError, RetryPolicy, RetryState};
pub use sync::{DriveInputs, Interpolate, InterpolationState, Interpolator, SyncConfig, SyncPublisher};
pub use types::{Generation, IdGenerator, ObjectId, ObjectKind, PeerId};

pub use async_trait::async_trait;
pub use glam::{EulerRot, Quat, Vec3};
pub use tokio_util::sync::CancellationToken;
