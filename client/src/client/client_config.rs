use colocate_shared::SyncConfig;

/// Contains Config properties which will be used by a Client
#[derive(Clone, Default)]
pub struct ClientConfig {
    /// Publish rate of held objects, and interpolation window of remote ones
    pub sync: SyncConfig,
}
