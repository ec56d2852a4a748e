use std::default::Default;

use colocate_shared::SyncConfig;

use crate::prefabs::PrefabRegistry;

/// Contains Config properties which will be used by the Server
#[derive(Clone)]
pub struct ServerConfig {
    /// Number of peers admitted at once. Connections past it receive
    /// `SessionFull`.
    pub max_peers: usize,
    /// Used to configure how often held objects are published
    pub sync: SyncConfig,
    /// Prefab tags peers may spawn
    pub prefabs: PrefabRegistry,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_peers: 4,
            sync: SyncConfig::default(),
            prefabs: PrefabRegistry::default(),
        }
    }
}
