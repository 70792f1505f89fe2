// Turns denylist file text into compiled rules.
//
// One rule per non-empty line. A bad line never aborts the whole file.

use super::moderation_models::Rule;
use regex::Regex;

/// Prefix applied to every line so matching ignores case.
const CASE_INSENSITIVE_FLAG: &str = "(?i)";

/// Compile a single line into a rule.
pub fn compile_rule(line: &str) -> Result<Rule, regex::Error> {
    let pattern = Regex::new(&format!("{}{}", CASE_INSENSITIVE_FLAG, line))?;
    Ok(Rule::new(line.to_string(), pattern))
}

/// Compile every non-empty line of `content`, in file order.
///
/// Lines that fail to compile are logged and skipped.
pub fn compile_rules(content: &str) -> Vec<Rule> {
    let mut rules = Vec::new();

    for line in content.split('\n') {
        if line.is_empty() {
            continue;
        }

        match compile_rule(line) {
            Ok(rule) => rules.push(rule),
            Err(e) => {
                tracing::error!(line = %line, error = %e, "Failed to parse regex");
            }
        }
    }

    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_are_dropped() {
        let rules = compile_rules("spam\n\n\nscam\n");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].source(), "spam");
        assert_eq!(rules[1].source(), "scam");
    }

    #[test]
    fn test_invalid_line_is_skipped() {
        let rules = compile_rules("spam\n(unclosed\nfree nitro");
        let sources: Vec<&str> = rules.iter().map(|r| r.source()).collect();
        assert_eq!(sources, vec!["spam", "free nitro"]);
    }

    #[test]
    fn test_only_invalid_lines_gives_nothing() {
        assert!(compile_rules("(\n[\n").is_empty());
        assert!(compile_rules("").is_empty());
        assert!(compile_rules("\n\n").is_empty());
    }

    #[test]
    fn test_matching_ignores_case() {
        let rule = compile_rule("spam").unwrap();
        assert!(rule.is_match("SPAM content"));
        assert!(rule.is_match("some sPaM here"));
        assert!(!rule.is_match("ham"));
    }

    #[test]
    fn test_regex_syntax_is_honoured() {
        let rule = compile_rule(r"discord\.gift/\w+").unwrap();
        assert!(rule.is_match("claim at DISCORD.GIFT/abc123"));
        assert!(!rule.is_match("discord gift"));
    }
}
