//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod remote_shell_port;
mod run_observer_port;

#[cfg(test)]
pub use remote_shell_port::MockRemoteShellPort;
pub use remote_shell_port::{CommandOutput, LineSink, LineStream, RemoteShellPort};
#[cfg(test)]
pub use run_observer_port::MockRunObserverPort;
pub use run_observer_port::{NoopObserver, RunEvent, RunObserverPort, SkipReason};
