// Exemptions - conditions under which a matching rule is not enforced.
//
// Kept as data so the evaluator can walk them uniformly instead of carrying
// channel ids in its control flow.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

// Defaults used when no channel ids are configured.
pub const DEFAULT_GREETING_KEYWORD: &str = "gm";
pub const DEFAULT_SOCIAL_CHANNEL_ID: u64 = 1060935278315642910;
pub const DEFAULT_FAUCET_CHANNEL_IDS: [u64; 2] = [1060936431891861544, 1060936486262628422];

/// "0x" followed by 40 hex digits, anywhere in the message.
const WALLET_ADDRESS_PATTERN: &str = r"(?i)0x[0-9a-f]{40}";

fn wallet_address() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(WALLET_ADDRESS_PATTERN).expect("wallet pattern is valid"))
}

/// Does the text contain something shaped like a wallet address?
pub fn looks_like_wallet_address(text: &str) -> bool {
    wallet_address().is_match(text)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exemption {
    /// Rules whose source mentions `keyword` are not enforced in `channel_id`.
    KeywordInChannel { keyword: String, channel_id: u64 },
    /// Messages carrying a wallet address are left alone everywhere except
    /// `allowed_channels`, where the regular rules apply.
    WalletAddressOutside { allowed_channels: Vec<u64> },
}

impl Exemption {
    /// Whether this exemption spares the message from the given rule.
    pub fn applies(&self, rule_source: &str, channel_id: u64, content: &str) -> bool {
        match self {
            Exemption::KeywordInChannel {
                keyword,
                channel_id: exempt_channel,
            } => {
                channel_id == *exempt_channel
                    && rule_source
                        .to_lowercase()
                        .contains(&keyword.to_lowercase())
            }
            Exemption::WalletAddressOutside { allowed_channels } => {
                !allowed_channels.contains(&channel_id) && looks_like_wallet_address(content)
            }
        }
    }
}

impl fmt::Display for Exemption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exemption::KeywordInChannel {
                keyword,
                channel_id,
            } => write!(f, "rules containing \"{}\" are allowed in <#{}>", keyword, channel_id),
            Exemption::WalletAddressOutside { allowed_channels } => {
                let channels: Vec<String> = allowed_channels
                    .iter()
                    .map(|id| format!("<#{}>", id))
                    .collect();
                write!(
                    f,
                    "wallet addresses are only moderated in {}",
                    channels.join(", ")
                )
            }
        }
    }
}

/// The ordered list of exemptions checked for every matching rule.
#[derive(Debug, Clone, Default)]
pub struct Exemptions {
    entries: Vec<Exemption>,
}

impl Exemptions {
    pub fn new(entries: Vec<Exemption>) -> Self {
        Self { entries }
    }

    /// The greeting-channel and faucet-channel exemptions for the given ids.
    pub fn standard(keyword: &str, social_channel: u64, faucet_channels: Vec<u64>) -> Self {
        Self::new(vec![
            Exemption::KeywordInChannel {
                keyword: keyword.to_string(),
                channel_id: social_channel,
            },
            Exemption::WalletAddressOutside {
                allowed_channels: faucet_channels,
            },
        ])
    }

    /// First exemption sparing the message from this rule, if any.
    pub fn find(&self, rule_source: &str, channel_id: u64, content: &str) -> Option<&Exemption> {
        self.entries
            .iter()
            .find(|e| e.applies(rule_source, channel_id, content))
    }

    pub fn entries(&self) -> &[Exemption] {
        &self.entries
    }
}
