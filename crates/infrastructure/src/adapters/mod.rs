//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod console_observer;
mod ssh_shell_adapter;

pub use console_observer::ConsoleObserver;
pub use ssh_shell_adapter::{LineSplitter, SshConfig, SshShellAdapter};
