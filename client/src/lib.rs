//! # Colocate Client
//! A participant in a colocated shared space: joins a session by aligning to
//! its shared anchor, mirrors object authority, interpolates objects held by
//! others and publishes the ones it holds.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

mod client;
mod error;
mod events;
mod frame_aligner;
mod grab_bridge;
mod join;

pub use client::{Client, ClientConfig, RemoteObject};
pub use error::{ClientError, JoinError};
pub use events::{
    AuthGrantEvent, AuthLossEvent, AuthorityEvent, ConnectEvent, DespawnEvent, ErrorEvent, Event,
    Events, ReRootEvent, RejectEvent, SpawnAssignedEvent, SpawnEvent, TeleportEvent,
};
pub use frame_aligner::FrameAligner;
pub use grab_bridge::GrabBridge;
pub use join::SessionJoiner;
