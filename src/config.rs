// Process configuration.
//
// Every flag can also come from the environment (a `.env` file is loaded
// before parsing), so the bot can be started with just `DISCORD_TOKEN` and
// `DENYLIST_PATH` set.

use crate::core::moderation::{
    Exemptions, DEFAULT_FAUCET_CHANNEL_IDS, DEFAULT_GREETING_KEYWORD, DEFAULT_SOCIAL_CHANNEL_ID,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "denylist-bot")]
#[command(about = "Deletes Discord messages matching a hot-reloaded denylist of regular expressions")]
pub struct Config {
    /// Discord bot token
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Filepath to denylist of regular expressions, separated by new line delimiters
    #[arg(long = "denylist", env = "DENYLIST_PATH")]
    pub denylist_path: PathBuf,

    /// Channel where rules containing the greeting keyword are not enforced
    #[arg(long, env = "DENYLIST_SOCIAL_CHANNEL_ID", default_value_t = DEFAULT_SOCIAL_CHANNEL_ID)]
    pub social_channel: u64,

    /// Channels where wallet addresses may be posted (comma separated)
    #[arg(
        long,
        env = "DENYLIST_FAUCET_CHANNEL_IDS",
        value_delimiter = ',',
        default_values_t = DEFAULT_FAUCET_CHANNEL_IDS
    )]
    pub faucet_channels: Vec<u64>,

    /// Rules containing this keyword are allowed in the social channel
    #[arg(long, env = "DENYLIST_GREETING_KEYWORD", default_value = DEFAULT_GREETING_KEYWORD)]
    pub greeting_keyword: String,

    /// Seconds between attempts to watch the denylist file when watching fails
    #[arg(long, env = "DENYLIST_WATCH_RETRY_SECS", default_value_t = 30)]
    pub watch_retry_secs: u64,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Config {
    pub fn exemptions(&self) -> Exemptions {
        Exemptions::standard(
            &self.greeting_keyword,
            self.social_channel,
            self.faucet_channels.clone(),
        )
    }

    pub fn watch_retry_interval(&self) -> Duration {
        Duration::from_secs(self.watch_retry_secs.max(1))
    }
}
