//! Dashboard control-plane bridge.
//!
//! One persistent WebSocket to the dashboard: authenticate, stream stats and
//! heartbeats, receive remote commands and settings updates, reconnect
//! forever.

pub mod protocol;
pub mod session;
pub mod stats;

pub use protocol::{BotFrame, BotStats, DashboardFrame};
pub use session::{Bridge, BridgeDeps, BridgeHandle, BridgeStatus};
pub use stats::Metrics;
