// Denylist moderation service - core business logic for message moderation.
//
// This service handles:
// - Deciding whether a message breaks an active rule (pure, no I/O)
// - Asking the platform to delete it
// - Producing the audit record for the deletion
//
// NO Discord dependencies here - just pure domain logic.

use super::denylist_store::DenylistStore;
use super::exemptions::Exemptions;
use super::moderation_models::{AuditRecord, Denylist, InboundMessage, ModerationDecision};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Discord snowflakes count milliseconds from 2015-01-01T00:00:00Z.
pub const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Platform error: {0}")]
    PlatformError(String),

    #[error("Snowflake {0} was created in the future")]
    CreatedInFuture(u64),
}

// ============================================================================
// PLATFORM TRAIT (PORT)
// ============================================================================

/// The chat platform operations moderation needs.
#[async_trait]
pub trait MessagePlatform: Send + Sync {
    /// Remove a message from a channel.
    async fn delete_message(&self, channel_id: u64, message_id: u64)
        -> Result<(), ModerationError>;
}

// ============================================================================
// ACCOUNT AGE
// ============================================================================

/// Creation time embedded in a Discord snowflake id.
///
/// The top 42 bits are milliseconds since the Discord epoch, so every id maps
/// to a timestamp well inside chrono's range.
pub fn snowflake_timestamp(id: u64) -> DateTime<Utc> {
    let millis = (id >> 22) + DISCORD_EPOCH_MS;
    DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::milliseconds(millis as i64)
}

/// How old the account with this id was at `now`.
pub fn account_age(id: u64, now: DateTime<Utc>) -> Result<Duration, ModerationError> {
    let created = snowflake_timestamp(id);
    (now - created)
        .to_std()
        .map_err(|_| ModerationError::CreatedInFuture(id))
}

// ============================================================================
// EVALUATION
// ============================================================================

/// Decide what to do with one message.
///
/// Rules are tried in list order. A matching rule that some exemption covers
/// is skipped and evaluation continues with the next rule; the first matching
/// rule with no exemption decides the deletion.
pub fn evaluate(
    message: &InboundMessage,
    denylist: &Denylist,
    exemptions: &Exemptions,
    bot_user_id: u64,
) -> ModerationDecision {
    if message.author_id == bot_user_id {
        return ModerationDecision::Ignore;
    }

    for rule in denylist.rules() {
        if !rule.is_match(&message.content) {
            continue;
        }

        if let Some(exemption) =
            exemptions.find(rule.source(), message.channel_id, &message.content)
        {
            tracing::debug!(
                rule = %rule.source(),
                channel_id = message.channel_id,
                exemption = %exemption,
                "Matching rule exempted"
            );
            continue;
        }

        return ModerationDecision::Delete {
            rule_source: rule.source().to_string(),
        };
    }

    ModerationDecision::Allow
}

/// Build the audit record for a deleted message.
///
/// An undecodable account age is logged and left out rather than dropping
/// the record.
pub fn audit_record(
    message: &InboundMessage,
    rule_source: &str,
    now: DateTime<Utc>,
) -> AuditRecord {
    let account_age = match account_age(message.author_id, now) {
        Ok(age) => Some(age),
        Err(e) => {
            tracing::error!(error = %e, "Could not determine user's timestamp");
            None
        }
    };

    AuditRecord {
        username: message.author_name.clone(),
        author_id: message.author_id,
        content: message.content.clone(),
        account_age,
        matched_pattern: rule_source.to_string(),
        deleted_at: now,
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Moderates messages against the shared denylist.
pub struct ModerationService {
    store: Arc<DenylistStore>,
    exemptions: Exemptions,
}

impl ModerationService {
    /// Create a new moderation service reading from the given store.
    pub fn new(store: Arc<DenylistStore>, exemptions: Exemptions) -> Self {
        Self { store, exemptions }
    }

    pub fn store(&self) -> &Arc<DenylistStore> {
        &self.store
    }

    pub fn exemptions(&self) -> &Exemptions {
        &self.exemptions
    }

    /// Evaluate a message against the current denylist without acting on it.
    pub fn check_message(&self, message: &InboundMessage, bot_user_id: u64) -> ModerationDecision {
        let denylist = self.store.snapshot();
        evaluate(message, &denylist, &self.exemptions, bot_user_id)
    }

    /// Evaluate a message and delete it if a rule applies.
    ///
    /// Returns the audit record when a deletion happened. A failed delete
    /// call is logged and reported as `None`.
    pub async fn moderate<P: MessagePlatform + ?Sized>(
        &self,
        platform: &P,
        message: &InboundMessage,
        bot_user_id: u64,
    ) -> Option<AuditRecord> {
        let rule_source = match self.check_message(message, bot_user_id) {
            ModerationDecision::Delete { rule_source } => rule_source,
            ModerationDecision::Allow | ModerationDecision::Ignore => return None,
        };

        if let Err(e) = platform
            .delete_message(message.channel_id, message.message_id)
            .await
        {
            tracing::error!(
                error = %e,
                channel_id = message.channel_id,
                message_id = message.message_id,
                "Failed to delete denied message"
            );
            return None;
        }

        let record = audit_record(message, &rule_source, Utc::now());
        record.emit();
        Some(record)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::denylist_store::{DenylistError, DenylistSource};
    use std::sync::Mutex;

    const BOT_ID: u64 = 1;
    const SOCIAL: u64 = 10;
    const FAUCET_A: u64 = 20;
    const FAUCET_B: u64 = 21;
    const GENERAL: u64 = 30;
    const ADDRESS: &str = "0x52908400098527886E0F7030069857D2E4169EE7";
    // Created 2021-01-01T00:00:00Z
    const AUTHOR_ID: u64 = 794_354_201_395_200_000;

    /// In-memory platform for testing
    struct MockPlatform {
        deleted: Mutex<Vec<(u64, u64)>>,
        fail: bool,
    }

    impl MockPlatform {
        fn new() -> Self {
            Self {
                deleted: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                deleted: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn deleted(&self) -> Vec<(u64, u64)> {
            self.deleted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessagePlatform for MockPlatform {
        async fn delete_message(
            &self,
            channel_id: u64,
            message_id: u64,
        ) -> Result<(), ModerationError> {
            if self.fail {
                return Err(ModerationError::PlatformError("Missing Permissions".into()));
            }
            self.deleted.lock().unwrap().push((channel_id, message_id));
            Ok(())
        }
    }

    struct StaticSource(&'static str);

    #[async_trait]
    impl DenylistSource for StaticSource {
        fn location(&self) -> String {
            "static".to_string()
        }

        async fn read(&self) -> Result<String, DenylistError> {
            Ok(self.0.to_string())
        }
    }

    async fn service(rules: &'static str) -> ModerationService {
        let store = Arc::new(DenylistStore::new());
        store.reload(&StaticSource(rules)).await.unwrap();
        ModerationService::new(
            store,
            Exemptions::standard("gm", SOCIAL, vec![FAUCET_A, FAUCET_B]),
        )
    }

    fn message(channel_id: u64, content: &str) -> InboundMessage {
        InboundMessage {
            message_id: 555,
            channel_id,
            author_id: AUTHOR_ID,
            author_name: "spammer".to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_clean_message_is_allowed() {
        let service = service("spam\nscam").await;
        let decision = service.check_message(&message(GENERAL, "hello there"), BOT_ID);
        assert_eq!(decision, ModerationDecision::Allow);
    }

    #[tokio::test]
    async fn test_matching_is_case_insensitive() {
        let service = service("spam").await;
        let decision = service.check_message(&message(GENERAL, "SPAM content"), BOT_ID);
        assert_eq!(
            decision,
            ModerationDecision::Delete {
                rule_source: "spam".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_first_matching_rule_is_cited() {
        let service = service("free\nnitro\nfree nitro").await;
        let decision = service.check_message(&message(GENERAL, "free nitro here"), BOT_ID);
        assert_eq!(
            decision,
            ModerationDecision::Delete {
                rule_source: "free".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_own_messages_are_ignored() {
        let service = service("spam\n.*").await;
        let mut msg = message(GENERAL, "spam spam spam");
        msg.author_id = BOT_ID;
        assert_eq!(service.check_message(&msg, BOT_ID), ModerationDecision::Ignore);

        let platform = MockPlatform::new();
        assert!(service.moderate(&platform, &msg, BOT_ID).await.is_none());
        assert!(platform.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_greeting_allowed_in_social_channel_only() {
        let service = service("^gm$").await;

        let social = service.check_message(&message(SOCIAL, "GM"), BOT_ID);
        assert_eq!(social, ModerationDecision::Allow);

        let general = service.check_message(&message(GENERAL, "GM"), BOT_ID);
        assert!(general.is_delete());
    }

    #[tokio::test]
    async fn test_exempted_rule_falls_through_to_next_rule() {
        let service = service("gm\nmorning").await;
        let decision = service.check_message(&message(SOCIAL, "gm good morning"), BOT_ID);
        assert_eq!(
            decision,
            ModerationDecision::Delete {
                rule_source: "morning".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_address_never_deleted_outside_faucets() {
        let service = service("0x\n.*").await;
        for channel in [GENERAL, SOCIAL] {
            let decision = service.check_message(&message(channel, ADDRESS), BOT_ID);
            assert_eq!(decision, ModerationDecision::Allow);
        }
    }

    #[tokio::test]
    async fn test_address_in_faucet_follows_normal_rules() {
        let matching = service("0x[0-9a-f]{40}").await;
        for channel in [FAUCET_A, FAUCET_B] {
            assert!(matching
                .check_message(&message(channel, ADDRESS), BOT_ID)
                .is_delete());
        }

        let unrelated = service("spam").await;
        for channel in [FAUCET_A, FAUCET_B] {
            assert_eq!(
                unrelated.check_message(&message(channel, ADDRESS), BOT_ID),
                ModerationDecision::Allow
            );
        }
    }

    #[tokio::test]
    async fn test_moderate_deletes_and_audits() {
        let service = service("scam").await;
        let platform = MockPlatform::new();
        let msg = message(GENERAL, "totally not a Scam");

        let record = service.moderate(&platform, &msg, BOT_ID).await.unwrap();

        assert_eq!(platform.deleted(), vec![(GENERAL, 555)]);
        assert_eq!(record.username, "spammer");
        assert_eq!(record.author_id, AUTHOR_ID);
        assert_eq!(record.content, "totally not a Scam");
        assert_eq!(record.matched_pattern, "scam");
        assert!(record.account_age.is_some());
    }

    #[tokio::test]
    async fn test_one_deletion_per_message() {
        let service = service("scam\nnot\ntotally").await;
        let platform = MockPlatform::new();

        service
            .moderate(&platform, &message(GENERAL, "totally not a scam"), BOT_ID)
            .await;

        assert_eq!(platform.deleted().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_delete_is_not_audited() {
        let service = service("scam").await;
        let platform = MockPlatform::failing();

        let record = service
            .moderate(&platform, &message(GENERAL, "scam"), BOT_ID)
            .await;

        assert!(record.is_none());
    }

    #[test]
    fn test_snowflake_timestamp() {
        let ts = snowflake_timestamp(AUTHOR_ID);
        assert_eq!(ts.to_rfc3339(), "2021-01-01T00:00:00+00:00");
        assert_eq!(
            snowflake_timestamp(0).timestamp_millis() as u64,
            DISCORD_EPOCH_MS
        );
    }

    #[test]
    fn test_largest_snowflake_decodes() {
        let ts = snowflake_timestamp(u64::MAX);
        assert_eq!(
            ts.timestamp_millis() as u64,
            (u64::MAX >> 22) + DISCORD_EPOCH_MS
        );
    }

    #[test]
    fn test_account_age() {
        let created = snowflake_timestamp(AUTHOR_ID);
        let now = created + chrono::Duration::days(2);
        assert_eq!(
            account_age(AUTHOR_ID, now).unwrap(),
            Duration::from_secs(2 * 24 * 60 * 60)
        );
    }

    #[test]
    fn test_future_account_age_is_an_error() {
        let created = snowflake_timestamp(AUTHOR_ID);
        let before = created - chrono::Duration::days(1);
        assert!(matches!(
            account_age(AUTHOR_ID, before),
            Err(ModerationError::CreatedInFuture(_))
        ));
    }

    #[test]
    fn test_audit_record_survives_bad_timestamp() {
        let msg = message(GENERAL, "scam");
        let created = snowflake_timestamp(AUTHOR_ID);
        let record = audit_record(&msg, "scam", created - chrono::Duration::seconds(1));

        assert!(record.account_age.is_none());
        assert_eq!(record.matched_pattern, "scam");
        assert_eq!(record.username, "spammer");
    }
}
