// Discord moderation glue.
// - `denylist_handler.rs` runs incoming messages through the denylist.
// - `commands.rs` exposes the `/denylist` slash commands.

#[path = "commands.rs"]
pub mod commands;

#[path = "denylist_handler.rs"]
pub mod denylist_handler;
