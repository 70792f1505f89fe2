// Discord-specific denylist handling - translates serenity messages into core
// types and core deletions into Discord API calls.

use crate::core::moderation::{InboundMessage, MessagePlatform, ModerationError};
use crate::discord::Data;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// `MessagePlatform` backed by the serenity HTTP client.
pub struct SerenityPlatform {
    http: Arc<serenity::Http>,
}

impl SerenityPlatform {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl MessagePlatform for SerenityPlatform {
    async fn delete_message(
        &self,
        channel_id: u64,
        message_id: u64,
    ) -> Result<(), ModerationError> {
        serenity::ChannelId::new(channel_id)
            .delete_message(&self.http, serenity::MessageId::new(message_id))
            .await
            .map_err(|e| ModerationError::PlatformError(e.to_string()))
    }
}

/// Extract the fields moderation cares about.
pub fn to_inbound(msg: &serenity::Message) -> InboundMessage {
    InboundMessage {
        message_id: msg.id.get(),
        channel_id: msg.channel_id.get(),
        author_id: msg.author.id.get(),
        author_name: msg.author.name.clone(),
        content: msg.content.clone(),
    }
}

/// Check a new message against the denylist and delete it if needed.
pub async fn handle_message_for_denylist(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) {
    let bot_id = ctx.cache.current_user().id.get();
    let platform = SerenityPlatform::new(Arc::clone(&ctx.http));

    let deleted = data
        .moderation
        .moderate(&platform, &to_inbound(msg), bot_id)
        .await
        .is_some();
    tracing::debug!(
        message_id = msg.id.get(),
        channel_id = msg.channel_id.get(),
        deleted,
        "Checked message against denylist"
    );
}
