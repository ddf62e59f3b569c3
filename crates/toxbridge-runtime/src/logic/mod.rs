//! Bridge logic: state, callback and command handlers, and the task loop

pub mod handlers;
pub mod state;
pub mod task;

pub use handlers::{CommandHandlers, EventHandlers, ADD_FRIEND_ERROR_TITLE};
pub use state::{AccountStatus, BridgeState, BridgeStats};
pub use task::BridgeTask;
