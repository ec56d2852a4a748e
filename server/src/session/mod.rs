mod session_config;
pub use session_config::SessionConfig;

mod session_coordinator;
pub use session_coordinator::{SessionCoordinator, SessionError};
