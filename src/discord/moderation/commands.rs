// Denylist slash commands for moderators.

use crate::core::moderation::{InboundMessage, ModerationDecision};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Denylist moderation commands.
///
/// Inspect and reload the message denylist.
#[poise::command(
    slash_command,
    subcommands("status", "reload", "test"),
    required_permissions = "MANAGE_MESSAGES",
    guild_only
)]
pub async fn denylist(_ctx: Context<'_>) -> Result<(), Error> {
    // Parent command - shows help
    Ok(())
}

/// Show the active denylist and its exemptions.
#[poise::command(slash_command, guild_only)]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let moderation = &ctx.data().moderation;
    let snapshot = moderation.store().snapshot();

    let last_reload = snapshot
        .loaded_at()
        .map(|t| format!("<t:{}:R>", t.timestamp()))
        .unwrap_or_else(|| "never".to_string());

    let exemptions = moderation
        .exemptions()
        .entries()
        .iter()
        .map(|e| format!("• {}", e))
        .collect::<Vec<_>>()
        .join("\n");

    let embed = serenity::CreateEmbed::new()
        .title("🛡️ Denylist Status")
        .color(if snapshot.is_empty() { 0xFF0000 } else { 0x00FF00 })
        .field("Active rules", format!("{}", snapshot.len()), true)
        .field("Generation", format!("{}", snapshot.generation()), true)
        .field("Last reload", last_reload, true)
        .field(
            "File",
            format!("`{}`", ctx.data().denylist_source.path().display()),
            false,
        )
        .field(
            "Exemptions",
            if exemptions.is_empty() {
                "None".to_string()
            } else {
                exemptions
            },
            false,
        );

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Reload the denylist file now.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn reload(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let store = data.moderation.store();

    match store.reload(data.denylist_source.as_ref()).await {
        Ok(count) => {
            ctx.say(format!(
                "✅ Denylist reloaded: **{}** rules active (generation {}).",
                count,
                store.snapshot().generation()
            ))
            .await?;
        }
        Err(e) => {
            ctx.say(format!(
                "❌ Reload rejected: {}\nStill using the previous **{}** rules.",
                e,
                store.snapshot().len()
            ))
            .await?;
        }
    }

    Ok(())
}

/// Check what the denylist would do with a message in this channel.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn test(
    ctx: Context<'_>,
    #[description = "Message text to check"] text: String,
) -> Result<(), Error> {
    let moderation = &ctx.data().moderation;
    let bot_id = ctx.cache().current_user().id.get();

    let message = InboundMessage {
        message_id: 0,
        channel_id: ctx.channel_id().get(),
        author_id: ctx.author().id.get(),
        author_name: ctx.author().name.clone(),
        content: text,
    };

    let reply = match moderation.check_message(&message, bot_id) {
        ModerationDecision::Delete { rule_source } => {
            format!("🗑️ Would be deleted by rule `{}`.", rule_source)
        }
        ModerationDecision::Ignore => "🤖 Messages from the bot are never checked.".to_string(),
        ModerationDecision::Allow => {
            let snapshot = moderation.store().snapshot();
            let exempted = snapshot
                .rules()
                .iter()
                .filter(|rule| rule.is_match(&message.content))
                .find_map(|rule| {
                    moderation
                        .exemptions()
                        .find(rule.source(), message.channel_id, &message.content)
                        .map(|exemption| (rule.source().to_string(), exemption.to_string()))
                });

            match exempted {
                Some((rule, exemption)) => format!(
                    "✅ Allowed here: matches `{}` but {}.",
                    rule, exemption
                ),
                None => "✅ Allowed: no rule matches.".to_string(),
            }
        }
    };

    ctx.send(poise::CreateReply::default().content(reply).ephemeral(true))
        .await?;
    Ok(())
}
