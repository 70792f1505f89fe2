// Core moderation module - the denylist matching and hot-reload engine.

pub mod denylist_store;
pub mod exemptions;
pub mod moderation_models;
pub mod moderation_service;
pub mod pattern_compiler;

pub use denylist_store::*;
pub use exemptions::*;
pub use moderation_models::*;
pub use moderation_service::*;
