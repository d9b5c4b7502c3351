//! Application layer - Use cases and orchestration
//!
//! Contains the log listener, the action dispatcher and the scenario
//! orchestrator, plus the port definitions they depend on. Infrastructure
//! adapters implement the ports.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
