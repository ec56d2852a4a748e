//! # Colocate Server
//! The session coordinator of a colocated shared space: owns who may move
//! which object, relays transforms between peers, publishes the shared
//! reference anchor and advertises the session until it is full.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use colocate_shared::{
        BitReader, BitWrite, BitWriter, ConstBitLength, Serde, SerdeErr, SignedInteger,
        SignedVariableInteger, UnsignedInteger, UnsignedVariableInteger,
    };
}

mod authority_table;
mod error;
mod events;
mod object_registry;
mod prefabs;
mod server;
mod session;

pub use authority_table::{AuthorityChange, AuthorityTable};
pub use error::{ConnectError, ServerError};
pub use events::{
    AuthGrantEvent, AuthResetEvent, ConnectEvent, DespawnEvent, DisconnectEvent, ErrorEvent,
    Event, Events, PlacementEvent, RefuseEvent, SpawnEvent,
};
pub use object_registry::{ObjectRecord, ObjectRegistry};
pub use prefabs::{PrefabRegistry, CAR_PREFAB, CUBE_PREFAB, MARKER_PREFAB};
pub use server::{Server, ServerConfig};
pub use session::{SessionConfig, SessionCoordinator, SessionError};
