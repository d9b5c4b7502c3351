//! Domain entities - scenarios and the parts they are built from

mod action;
mod listener_spec;
mod scenario;

pub use action::{Action, ActionKind};
pub use listener_spec::ListenerSpec;
pub use scenario::Scenario;
