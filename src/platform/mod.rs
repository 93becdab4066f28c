//! Chat platform capability surface.
//!
//! The bot never talks to a concrete chat platform directly — everything goes
//! through the [`ChatGateway`] trait. [`local::LocalGateway`] is the
//! in-memory implementation used by the CLI driver and the test suite; real
//! platform adapters implement the same trait.

pub mod gateway;
pub mod local;
pub mod types;

pub use gateway::ChatGateway;
pub use local::{Effect, LocalGateway};
pub use types::{ChannelId, ChannelInfo, ChatMessage, GuildId, GuildInfo, MessageId, UserId};
