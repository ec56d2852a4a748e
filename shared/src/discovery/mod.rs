mod config;
mod descriptor;
mod error;
mod lan;
mod proximity;
mod race;

pub use config::DiscoveryConfig;
pub use descriptor::{decode_payload, encode_payload, GroupId, SessionDescriptor};
pub use error::DiscoveryError;
pub use lan::LanChannel;
pub use proximity::{Advertisement, ProximityChannel, ProximityService};
pub use race::{DiscoveryChannel, DiscoveryRace};
