pub mod action;
mod state;
#[allow(clippy::module_inception)]
mod state_store;
pub mod typing;

pub use state::{AuthStatus, State};
pub use state_store::StateStore;
