//! Invocation context
//!
//! Everything a command handler needs to answer one interaction.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bot_core::{Interaction, Snowflake};
use bot_rest::{InteractionResponse, InteractionsApi, RestError};
use tracing::debug;

use crate::error::{CommandError, CommandResult};

/// Sends interaction callbacks
#[async_trait]
pub trait InteractionResponder: Send + Sync {
    async fn respond(
        &self,
        interaction_id: Snowflake,
        token: &str,
        response: &InteractionResponse,
    ) -> Result<(), RestError>;

    async fn edit_original(
        &self,
        application_id: Snowflake,
        token: &str,
        content: &str,
    ) -> Result<(), RestError>;
}

#[async_trait]
impl InteractionResponder for InteractionsApi {
    async fn respond(
        &self,
        interaction_id: Snowflake,
        token: &str,
        response: &InteractionResponse,
    ) -> Result<(), RestError> {
        self.create_response(interaction_id, token, response).await
    }

    async fn edit_original(
        &self,
        application_id: Snowflake,
        token: &str,
        content: &str,
    ) -> Result<(), RestError> {
        InteractionsApi::edit_original(self, application_id, token, content).await
    }
}

/// One invocation of a command
///
/// Clones share the single-reply guard.
#[derive(Clone)]
pub struct InvocationContext {
    interaction: Arc<Interaction>,
    responder: Arc<dyn InteractionResponder>,
    replied: Arc<AtomicBool>,
}

impl InvocationContext {
    pub fn new(interaction: Arc<Interaction>, responder: Arc<dyn InteractionResponder>) -> Self {
        Self {
            interaction,
            responder,
            replied: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn interaction_id(&self) -> Snowflake {
        self.interaction.id
    }

    pub fn application_id(&self) -> Snowflake {
        self.interaction.application_id
    }

    pub fn token(&self) -> &str {
        &self.interaction.token
    }

    pub fn guild_id(&self) -> Option<Snowflake> {
        self.interaction.guild_id
    }

    pub fn channel_id(&self) -> Option<Snowflake> {
        self.interaction.channel_id
    }

    pub fn invoker_id(&self) -> Option<Snowflake> {
        self.interaction.invoker_id()
    }

    pub fn command_name(&self) -> Option<&str> {
        self.interaction.data.as_ref().map(|d| d.name.as_str())
    }

    pub fn has_replied(&self) -> bool {
        self.replied.load(Ordering::SeqCst)
    }

    /// Reply with a plain message
    pub async fn reply(&self, content: impl Into<String>) -> CommandResult {
        self.respond(InteractionResponse::message(content)).await
    }

    /// Reply visible only to the invoking user
    pub async fn reply_ephemeral(&self, content: impl Into<String>) -> CommandResult {
        self.respond(InteractionResponse::ephemeral(content)).await
    }

    /// Acknowledge now, answer later with [`edit_reply`](Self::edit_reply)
    pub async fn defer(&self) -> CommandResult {
        self.respond(InteractionResponse::deferred()).await
    }

    /// Send the initial response; an interaction takes exactly one
    pub async fn respond(&self, response: InteractionResponse) -> CommandResult {
        if self.replied.swap(true, Ordering::SeqCst) {
            return Err(CommandError::AlreadyReplied);
        }

        if let Err(e) = self
            .responder
            .respond(self.interaction.id, &self.interaction.token, &response)
            .await
        {
            // Nothing was delivered, so a retry is still a first reply
            self.replied.store(false, Ordering::SeqCst);
            return Err(e.into());
        }

        debug!(
            interaction_id = %self.interaction.id,
            command = ?self.command_name(),
            "Interaction answered"
        );
        Ok(())
    }

    /// Replace the content of the reply already sent
    pub async fn edit_reply(&self, content: &str) -> CommandResult {
        if !self.has_replied() {
            return Err(CommandError::NotReplied);
        }
        self.responder
            .edit_original(self.interaction.application_id, &self.interaction.token, content)
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationContext")
            .field("interaction_id", &self.interaction.id)
            .field("command", &self.command_name())
            .field("replied", &self.has_replied())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use bot_rest::InteractionResponseKind;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Records every callback; fails the next one when asked
    #[derive(Default)]
    pub(crate) struct RecordingResponder {
        pub responses: Mutex<Vec<(Snowflake, String, InteractionResponse)>>,
        pub edits: Mutex<Vec<String>>,
        pub fail_next: AtomicBool,
    }

    #[async_trait]
    impl InteractionResponder for RecordingResponder {
        async fn respond(
            &self,
            interaction_id: Snowflake,
            token: &str,
            response: &InteractionResponse,
        ) -> Result<(), RestError> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(RestError::Status {
                    status: 500,
                    code: None,
                    message: "try again".to_string(),
                });
            }
            self.responses
                .lock()
                .push((interaction_id, token.to_string(), response.clone()));
            Ok(())
        }

        async fn edit_original(
            &self,
            _application_id: Snowflake,
            _token: &str,
            content: &str,
        ) -> Result<(), RestError> {
            self.edits.lock().push(content.to_string());
            Ok(())
        }
    }

    pub(crate) fn slash(name: &str) -> Interaction {
        serde_json::from_value(json!({
            "id": "900",
            "application_id": "5",
            "type": 2,
            "token": "tok",
            "channel_id": "33",
            "user": {"id": "42"},
            "data": {"id": "101", "name": name, "type": 1}
        }))
        .unwrap()
    }

    fn context(responder: &Arc<RecordingResponder>) -> InvocationContext {
        InvocationContext::new(Arc::new(slash("ping")), responder.clone())
    }

    #[tokio::test]
    async fn test_reply_posts_channel_message() {
        let responder = Arc::new(RecordingResponder::default());
        let ctx = context(&responder);

        assert_eq!(ctx.command_name(), Some("ping"));
        assert_eq!(ctx.invoker_id(), Some(Snowflake::new(42)));

        ctx.reply("pong").await.unwrap();
        assert!(ctx.has_replied());

        let responses = responder.responses.lock();
        let (id, token, response) = &responses[0];
        assert_eq!(*id, Snowflake::new(900));
        assert_eq!(token, "tok");
        assert_eq!(response.kind, InteractionResponseKind::ChannelMessageWithSource);
    }

    #[tokio::test]
    async fn test_second_reply_is_rejected() {
        let responder = Arc::new(RecordingResponder::default());
        let ctx = context(&responder);
        let copy = ctx.clone();

        ctx.defer().await.unwrap();
        assert!(matches!(
            copy.reply("late").await,
            Err(CommandError::AlreadyReplied)
        ));
        assert_eq!(responder.responses.lock().len(), 1);

        copy.edit_reply("done").await.unwrap();
        assert_eq!(*responder.edits.lock(), vec!["done".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_reply_can_be_retried() {
        let responder = Arc::new(RecordingResponder::default());
        responder.fail_next.store(true, Ordering::SeqCst);
        let ctx = context(&responder);

        assert!(matches!(ctx.reply("one").await, Err(CommandError::Rest(_))));
        assert!(!ctx.has_replied());
        ctx.reply("two").await.unwrap();
    }

    #[tokio::test]
    async fn test_edit_before_reply() {
        let responder = Arc::new(RecordingResponder::default());
        let ctx = context(&responder);
        assert!(matches!(
            ctx.edit_reply("x").await,
            Err(CommandError::NotReplied)
        ));
    }
}
