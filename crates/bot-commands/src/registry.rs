//! Command registry
//!
//! Local command declarations and their handlers, keyed by `(kind, name)`.
//! Filled before the client starts and read-only afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bot_core::{CommandDeclaration, CommandKey, DomainError};

use crate::handler::CommandHandler;

/// A declaration together with the handler that serves it
#[derive(Clone)]
pub struct RegisteredCommand {
    pub declaration: CommandDeclaration,
    pub handler: Arc<dyn CommandHandler>,
}

impl fmt::Debug for RegisteredCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredCommand")
            .field("declaration", &self.declaration)
            .finish_non_exhaustive()
    }
}

/// Ordered by kind, then name
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<CommandKey, RegisteredCommand>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a command
    ///
    /// Fails on an invalid declaration or when `(kind, name)` is taken.
    pub fn add<H>(&mut self, declaration: CommandDeclaration, handler: H) -> Result<(), DomainError>
    where
        H: CommandHandler + 'static,
    {
        self.add_shared(declaration, Arc::new(handler))
    }

    pub fn add_shared(
        &mut self,
        declaration: CommandDeclaration,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<(), DomainError> {
        declaration.check()?;

        let key = declaration.key();
        if self.commands.contains_key(&key) {
            return Err(DomainError::DuplicateCommand(key));
        }

        tracing::debug!(command = %key, "Command registered");
        self.commands.insert(
            key,
            RegisteredCommand {
                declaration,
                handler,
            },
        );
        Ok(())
    }

    pub fn get(&self, key: &CommandKey) -> Option<&RegisteredCommand> {
        self.commands.get(key)
    }

    pub fn contains(&self, key: &CommandKey) -> bool {
        self.commands.contains_key(key)
    }

    pub fn declarations(&self) -> impl Iterator<Item = &CommandDeclaration> {
        self.commands.values().map(|c| &c.declaration)
    }

    pub fn keys(&self) -> impl Iterator<Item = &CommandKey> {
        self.commands.keys()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
