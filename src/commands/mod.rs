//! Command parsing, registry and dispatch.
//!
//! Organic chat messages and remote dashboard requests both reduce to an
//! [`Invocation`] and run through the same [`CommandPipeline`], so behavior
//! cannot diverge between origins.

pub mod builtin;
pub mod dispatcher;
pub mod invocation;
pub mod pipeline;
pub mod prefix;
pub mod registry;

pub use dispatcher::CommandDispatcher;
pub use invocation::{Invocation, Origin};
pub use pipeline::CommandPipeline;
pub use prefix::PrefixStore;
pub use registry::{Command, CommandContext, CommandRegistry};
