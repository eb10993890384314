//! Hook implementations

pub mod gatekeeper;
pub mod vanilla;

pub use gatekeeper::{GatekeeperHook, SharedTracker};
pub use vanilla::VanillaHook;
