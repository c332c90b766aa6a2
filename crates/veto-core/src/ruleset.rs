//! Rule storage and the compiled, immutable `RuleSet`
//!
//! A `RuleSet` owns every rule it was built from. Rules are split into two
//! partitions (block rules and exception rules) so the exception-overrides
//! check in the matcher never re-scans the whole collection. Within each
//! partition, `||host`-anchored rules with a complete literal host are
//! bucketed by that host; everything else lands in a linear-scan remainder.
//!
//! Once built a `RuleSet` is never mutated; reloading a list means building a
//! fresh set and swapping the reference, so concurrent readers always see a
//! consistent snapshot.

use std::collections::HashMap;

use log::debug;

use crate::pattern::Pattern;
use crate::types::PartyMask;
use crate::types::RequestType;

/// `$domain=` constraint: originating-page domains the rule is limited to
/// (`include`) or excluded from (`exclude`, the `~`-prefixed entries).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DomainConstraint {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl DomainConstraint {
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

/// Parsed rule options. An empty mask means "no constraint".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOptions {
    /// Resource types the rule applies to (empty = all)
    pub types: RequestType,
    /// Party constraint (empty = both parties)
    pub party: PartyMask,
    /// `$domain=` constraint, if any
    pub domains: Option<DomainConstraint>,
    /// Unrecognized option tokens, preserved verbatim and always satisfied
    pub extra: Vec<String>,
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            types: RequestType::empty(),
            party: PartyMask::empty(),
            domains: None,
            extra: Vec::new(),
        }
    }
}

/// One compiled rule from a block-list line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Original line text, kept for diagnostics
    pub raw: String,
    /// Compiled URL pattern
    pub pattern: Pattern,
    /// `@@` allow-override rule
    pub is_exception: bool,
    /// Option constraints
    pub options: RuleOptions,
}

/// One partition of a ruleset: rule storage plus the host-bucket index.
/// Indices in `by_host` and `rest` point into `rules`.
#[derive(Debug, Default)]
pub(crate) struct Partition {
    pub(crate) rules: Vec<Rule>,
    pub(crate) by_host: HashMap<String, Vec<u32>>,
    pub(crate) rest: Vec<u32>,
}

impl Partition {
    fn push(&mut self, rule: Rule) {
        let idx = self.rules.len() as u32;
        match rule.pattern.host_bucket_key() {
            Some(host) => self.by_host.entry(host).or_default().push(idx),
            None => self.rest.push(idx),
        }
        self.rules.push(rule);
    }
}

/// The compiled collection of rules for one loaded list.
#[derive(Debug, Default)]
pub struct RuleSet {
    pub(crate) block: Partition,
    pub(crate) exception: Partition,
}

impl RuleSet {
    /// An empty ruleset: blocks nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a ruleset from already-parsed rules.
    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        let mut set = Self::default();
        for rule in rules {
            if rule.is_exception {
                set.exception.push(rule);
            } else {
                set.block.push(rule);
            }
        }
        debug!(
            "compiled ruleset: {} block rules, {} exception rules, {} bucketed",
            set.block_rule_count(),
            set.exception_rule_count(),
            set.bucketed_rule_count()
        );
        set
    }

    /// Number of block rules.
    pub fn block_rule_count(&self) -> usize {
        self.block.rules.len()
    }

    /// Number of exception rules.
    pub fn exception_rule_count(&self) -> usize {
        self.exception.rules.len()
    }

    /// Number of rules served by the host-bucket index (across both
    /// partitions); the remainder is matched by linear scan.
    pub fn bucketed_rule_count(&self) -> usize {
        let bucketed = |p: &Partition| p.rules.len() - p.rest.len();
        bucketed(&self.block) + bucketed(&self.exception)
    }

    pub fn is_empty(&self) -> bool {
        self.block.rules.is_empty() && self.exception.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str, is_exception: bool) -> Rule {
        Rule {
            raw: pattern.to_string(),
            pattern: Pattern::compile(pattern).unwrap(),
            is_exception,
            options: RuleOptions::default(),
        }
    }

    #[test]
    fn test_partitioning() {
        let set = RuleSet::from_rules(vec![
            rule("||ads.example.com^", false),
            rule("/banner/", false),
            rule("||ads.example.com/ok", true),
        ]);
        assert_eq!(set.block_rule_count(), 2);
        assert_eq!(set.exception_rule_count(), 1);
    }

    #[test]
    fn test_bucket_index() {
        let set = RuleSet::from_rules(vec![
            rule("||ads.example.com^", false),
            rule("||tracker.test^", false),
            rule("/banner/", false),
        ]);
        assert_eq!(set.bucketed_rule_count(), 2);
        assert_eq!(set.block.rest.len(), 1);
        assert!(set.block.by_host.contains_key("ads.example.com"));
        assert!(set.block.by_host.contains_key("tracker.test"));
    }

    #[test]
    fn test_empty_ruleset() {
        let set = RuleSet::empty();
        assert!(set.is_empty());
        assert_eq!(set.block_rule_count(), 0);
    }

    #[test]
    fn test_ruleset_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RuleSet>();
    }
}
