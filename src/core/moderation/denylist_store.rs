// Denylist store - the shared, hot-swappable list of active rules.
//
// Readers take an `Arc` snapshot with one atomic load. Reloads (read + compile
// + swap) are serialized behind an async mutex so overlapping file-change
// notifications apply one after another.
//
// NO Discord or filesystem dependencies here - file access goes through the
// `DenylistSource` port, implemented in infra.

use super::moderation_models::Denylist;
use super::pattern_compiler::compile_rules;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum DenylistError {
    #[error("Failed to read denylist from {location}: {reason}")]
    ReadError { location: String, reason: String },

    #[error("Denylist at {location} contains no valid rules")]
    NoValidRules { location: String },
}

// ============================================================================
// SOURCE TRAIT (PORT)
// ============================================================================

/// Where the raw denylist text comes from.
#[async_trait]
pub trait DenylistSource: Send + Sync {
    /// Human-readable location, used in logs.
    fn location(&self) -> String;

    /// Read the full raw text.
    async fn read(&self) -> Result<String, DenylistError>;
}

// ============================================================================
// STORE
// ============================================================================

pub struct DenylistStore {
    current: ArcSwap<Denylist>,
    reload_lock: Mutex<()>,
}

impl Default for DenylistStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DenylistStore {
    /// Start with an empty list; nothing is deleted until the first reload.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Denylist::default()),
            reload_lock: Mutex::new(()),
        }
    }

    /// The list produced by the latest successful reload.
    pub fn snapshot(&self) -> Arc<Denylist> {
        self.current.load_full()
    }

    /// Re-read the source and swap in the new rules.
    ///
    /// A read failure or a file with no valid rules leaves the current list in
    /// place. Returns the new rule count on success.
    pub async fn reload(&self, source: &dyn DenylistSource) -> Result<usize, DenylistError> {
        let _guard = self.reload_lock.lock().await;

        let content = match source.read().await {
            Ok(content) => content,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read denylist");
                return Err(e);
            }
        };

        let rules = compile_rules(&content);
        if rules.is_empty() {
            let err = DenylistError::NoValidRules {
                location: source.location(),
            };
            tracing::error!(
                error = %err,
                kept = self.current.load().len(),
                "Rejected denylist reload, keeping previous rules"
            );
            return Err(err);
        }

        let count = rules.len();
        let generation = self.current.load().generation() + 1;
        let denylist = Arc::new(Denylist::new(rules, generation));
        tracing::debug!(rules = ?denylist.sources(), "Compiled denylist");
        self.current.store(denylist);

        tracing::info!(count, generation, "Updated deny list");
        Ok(count)
    }
}

// ============================================================================
// TESTS
// ============================================================================
