//! Command trait and name registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::bridge::Metrics;
use crate::commands::invocation::Invocation;
use crate::error::DispatchError;
use crate::platform::ChatGateway;
use crate::rules::RuleStore;

/// Shared dependencies handed to every command.
#[derive(Clone)]
pub struct CommandContext {
    pub gateway: Arc<dyn ChatGateway>,
    pub rules: Arc<RuleStore>,
    pub metrics: Arc<Metrics>,
}

impl CommandContext {
    /// Require the message-management capability (or bot authorship).
    pub async fn require_moderator(&self, inv: &Invocation) -> Result<(), DispatchError> {
        if inv.author == self.gateway.bot_user() {
            return Ok(());
        }
        let allowed = self
            .gateway
            .member_can_manage_messages(inv.guild, inv.author)
            .await?;
        if allowed {
            Ok(())
        } else {
            Err(DispatchError::Forbidden("manage messages"))
        }
    }
}

/// A single named command.
#[async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> &'static str;

    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    fn description(&self) -> &'static str;

    async fn execute(&self, inv: &Invocation, ctx: &CommandContext)
    -> Result<(), DispatchError>;
}

/// Case-insensitive name → command map, aliases included.
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
    /// Primary names only, for help listings.
    names: Vec<&'static str>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            names: Vec::new(),
        }
    }

    /// A registry pre-loaded with the built-in command set.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for command in crate::commands::builtin::all() {
            registry.register(command);
        }
        registry
    }

    pub fn register(&mut self, command: Arc<dyn Command>) {
        self.names.push(command.name());
        for alias in command.aliases() {
            self.commands
                .insert(alias.to_lowercase(), Arc::clone(&command));
        }
        self.commands
            .insert(command.name().to_lowercase(), command);
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(&name.to_lowercase()).cloned()
    }

    /// Primary command names, registration order.
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
