//! Command handler trait

use std::future::Future;

use async_trait::async_trait;

use crate::args::CommandArgs;
use crate::context::InvocationContext;
use crate::error::CommandResult;

/// Runs one command invocation
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn invoke(&self, ctx: InvocationContext, args: CommandArgs) -> CommandResult;
}

#[async_trait]
impl<F, Fut> CommandHandler for F
where
    F: Fn(InvocationContext, CommandArgs) -> Fut + Send + Sync,
    Fut: Future<Output = CommandResult> + Send,
{
    async fn invoke(&self, ctx: InvocationContext, args: CommandArgs) -> CommandResult {
        (self)(ctx, args).await
    }
}
