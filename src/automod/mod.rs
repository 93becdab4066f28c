//! Automatic moderation: sliding-window detection, action execution,
//! background trimming.

pub mod activity;
pub mod executor;
pub mod monitor;
pub mod sweeper;
pub mod types;

pub use activity::ActivityTracker;
pub use executor::ActionExecutor;
pub use monitor::Monitor;
pub use sweeper::run_sweeper;
pub use types::ModerationEvent;
