// Discord layer - commands and event handlers.

#[path = "moderation/mod.rs"]
pub mod moderation;

use crate::core::moderation::ModerationService;
use crate::infra::denylist::FileDenylistSource;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state handed to every command and event.
pub struct Data {
    pub moderation: Arc<ModerationService>,
    pub denylist_source: Arc<FileDenylistSource>,
}
