//! # bot-commands
//!
//! Application commands: the local registry, reconciliation against the
//! remote registry, and routing of inbound invocations to handlers.

pub mod args;
pub mod context;
pub mod error;
pub mod handler;
pub mod registry;
pub mod router;
pub mod sync;

pub use args::CommandArgs;
pub use context::{InteractionResponder, InvocationContext};
pub use error::{CommandError, CommandResult};
pub use handler::CommandHandler;
pub use registry::{CommandRegistry, RegisteredCommand};
pub use router::{InvocationRouter, RouteOutcome};
pub use sync::{synchronize, CommandStore, CommandSyncHandler, SyncReport};
