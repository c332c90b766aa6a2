//! Streaming ruleset builder
//!
//! Consumes an ordered sequence of raw list lines and produces one immutable
//! [`RuleSet`]. The input may come from any line source; nothing requires the
//! caller to materialize a whole list file up front. Exact-duplicate lines
//! are dropped during the build, so building twice from identical input
//! yields rulesets that answer identically for every URL.

use std::collections::HashSet;
use std::io::BufRead;

use log::{debug, warn};

use veto_core::ruleset::{Rule, RuleSet};

use crate::parser::parse_line;

/// Error building a ruleset from an I/O line source. The engine itself never
/// performs I/O; this only surfaces failures of the caller-supplied reader as
/// a distinct "list unavailable" condition.
#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("failed to read filter list: {0}")]
    Io(#[from] std::io::Error),
}

/// Build a ruleset from an iterator of raw list lines.
///
/// Lines that carry no rule are discarded; a malformed line never aborts the
/// rest of the load. An empty or entirely-unparseable input yields a ruleset
/// that blocks nothing.
pub fn build_ruleset<I, S>(lines: I) -> RuleSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut rules: Vec<Rule> = Vec::new();

    for line in lines {
        if let Some(rule) = parse_line(line.as_ref()) {
            if seen.insert(rule.raw.clone()) {
                rules.push(rule);
            } else {
                debug!("dropping duplicate rule: {}", rule.raw);
            }
        }
    }

    RuleSet::from_rules(rules)
}

/// Build a ruleset by streaming lines from a reader.
pub fn build_ruleset_from_reader<R: BufRead>(reader: R) -> Result<RuleSet, ListError> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut rules: Vec<Rule> = Vec::new();

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            // A line that cannot be decoded as text loses only itself
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                warn!("skipping undecodable list line: {e}");
                continue;
            }
            Err(e) => return Err(ListError::Io(e)),
        };
        if let Some(rule) = parse_line(&line) {
            if seen.insert(rule.raw.clone()) {
                rules.push(rule);
            } else {
                debug!("dropping duplicate rule: {}", rule.raw);
            }
        }
    }

    Ok(RuleSet::from_rules(rules))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use veto_core::types::RequestContext;

    use super::*;

    fn blocks(set: &RuleSet, url: &str) -> bool {
        set.should_block(&RequestContext::new(url))
    }

    #[test]
    fn test_empty_input_blocks_nothing() {
        let set = build_ruleset(Vec::<String>::new());
        assert!(set.is_empty());
        assert!(!blocks(&set, "http://anything.test/"));
    }

    #[test]
    fn test_build_from_mixed_lines() {
        let lines = [
            "[Adblock Plus 2.0]",
            "! title: test list",
            "",
            "||ads.example.com^",
            "@@||ads.example.com/ok",
            "*/banner/*.png",
        ];
        let set = build_ruleset(lines);
        assert_eq!(set.block_rule_count(), 2);
        assert_eq!(set.exception_rule_count(), 1);
        assert!(blocks(&set, "http://ads.example.com/pixel.gif"));
        assert!(!blocks(&set, "http://ads.example.com/ok.js"));
        assert!(blocks(&set, "http://x.test/path/banner/ad.png"));
    }

    #[test]
    fn test_duplicates_dropped() {
        let lines = ["||ads.test^", "||ads.test^", "  ||ads.test^  "];
        let set = build_ruleset(lines);
        assert_eq!(set.block_rule_count(), 1);
    }

    #[test]
    fn test_malformed_lines_do_not_disable_the_rest() {
        let mut lines: Vec<String> = vec!["||$".to_string(), "@@".to_string()];
        for i in 0..999 {
            lines.push(format!("||host{i}.test^"));
        }
        let set = build_ruleset(&lines);
        assert_eq!(set.block_rule_count(), 999);
        assert!(blocks(&set, "http://host0.test/x"));
        assert!(blocks(&set, "http://host998.test/x"));
        assert!(!blocks(&set, "http://clean.test/x"));
    }

    #[test]
    fn test_build_is_idempotent() {
        let lines = [
            "||ads.example.com^",
            "@@||ads.example.com/ok",
            "*/banner/*.png$image",
            "||tracker.test^$third-party",
        ];
        let a = build_ruleset(lines);
        let b = build_ruleset(lines);

        let urls = [
            "http://ads.example.com/pixel.gif",
            "http://ads.example.com/ok.js",
            "http://x.test/banner/a.png",
            "http://tracker.test/t",
            "http://clean.test/",
            "",
        ];
        for url in urls {
            assert_eq!(blocks(&a, url), blocks(&b, url), "url={url:?}");
        }
    }

    #[test]
    fn test_build_from_reader() {
        let list = "! comment\n||ads.example.com^\n@@||ads.example.com/ok\n";
        let set = build_ruleset_from_reader(Cursor::new(list)).unwrap();
        assert_eq!(set.block_rule_count(), 1);
        assert_eq!(set.exception_rule_count(), 1);
        assert!(blocks(&set, "http://ads.example.com/pixel.gif"));
    }

    #[test]
    fn test_undecodable_line_loses_only_itself() {
        let mut data = b"||ads.test^\n".to_vec();
        data.extend_from_slice(&[0xFF, 0xFE, b'\n']);
        data.extend_from_slice(b"||tracker.test^\n");
        let set = build_ruleset_from_reader(Cursor::new(data)).unwrap();
        assert_eq!(set.block_rule_count(), 2);
        assert!(blocks(&set, "http://tracker.test/t"));
    }

    #[test]
    fn test_reader_io_error_is_reported() {
        struct FailingReader;
        impl std::io::Read for FailingReader {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "gone"))
            }
        }
        let reader = std::io::BufReader::new(FailingReader);
        let err = build_ruleset_from_reader(reader).unwrap_err();
        assert!(matches!(err, ListError::Io(_)));
    }
}
