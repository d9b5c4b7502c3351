//! Value Objects - Immutable, identity-less domain primitives

mod credentials;
mod log_path;
mod log_pattern;
mod remote_target;

pub use credentials::{Credentials, DEFAULT_USERNAME};
pub use log_path::LogPath;
pub use log_pattern::LogPattern;
pub use remote_target::{DEFAULT_SSH_PORT, RemoteTarget};
