// Moderation domain models - data structures for the denylist engine.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer converts serenity messages into `InboundMessage` and
// turns a `ModerationDecision` back into Discord actions.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::time::Duration;

/// A single compiled denylist entry.
///
/// Keeps the line exactly as it appeared in the file so audit logs and
/// exemptions can refer to what the moderator actually wrote.
#[derive(Debug, Clone)]
pub struct Rule {
    source: String,
    pattern: Regex,
}

impl Rule {
    pub(crate) fn new(source: String, pattern: Regex) -> Self {
        Self { source, pattern }
    }

    /// The original line from the denylist file.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Case-insensitive match anywhere in the text.
    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// The ordered set of active rules. Replaced as a whole, never edited.
#[derive(Debug, Clone, Default)]
pub struct Denylist {
    rules: Vec<Rule>,
    /// Bumped by the store on every successful swap (0 = never loaded)
    generation: u64,
    loaded_at: Option<DateTime<Utc>>,
}

impl Denylist {
    pub fn new(rules: Vec<Rule>, generation: u64) -> Self {
        Self {
            rules,
            generation,
            loaded_at: Some(Utc::now()),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// When this list was swapped in; `None` for the initial empty list.
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    /// Source lines in file order.
    pub fn sources(&self) -> Vec<&str> {
        self.rules.iter().map(Rule::source).collect()
    }
}

/// Minimal read-only view of a platform message.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub message_id: u64,
    pub channel_id: u64,
    pub author_id: u64,
    pub author_name: String,
    pub content: String,
}

/// What the evaluator decided for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationDecision {
    /// Message was not evaluated at all (our own message)
    Ignore,
    /// No rule matched, or every matching rule was exempted
    Allow,
    /// Delete the message; `rule_source` is the first rule that applied
    Delete { rule_source: String },
}

impl ModerationDecision {
    #[allow(dead_code)]
    pub fn is_delete(&self) -> bool {
        matches!(self, ModerationDecision::Delete { .. })
    }
}

/// Structured record emitted after a successful deletion.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub username: String,
    pub author_id: u64,
    pub content: String,
    /// `None` when the account creation time could not be decoded
    pub account_age: Option<Duration>,
    pub matched_pattern: String,
    pub deleted_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Account age in whole seconds, the unit it is logged in.
    pub fn account_age_secs(&self) -> Option<u64> {
        self.account_age.map(|age| age.as_secs())
    }

    /// Hand the record to the log sink. An unknown age leaves `accountAge` unset.
    pub fn emit(&self) {
        tracing::info!(
            target: "audit",
            username = %self.username,
            id = self.author_id,
            content = %self.content,
            accountAge = self.account_age_secs(),
            regexp = %self.matched_pattern,
            deletedAt = %self.deleted_at.to_rfc3339(),
            "Message deleted"
        );
    }
}
