mod client;
pub use client::{Client, RemoteObject};

mod client_config;
pub use client_config::ClientConfig;
