//! The request-level match predicate
//!
//! This is the hot path: the host's interception hook calls
//! [`RuleSet::should_block`] once per outgoing request, synchronously, so the
//! predicate performs no I/O, takes no locks, and returns a verdict for any
//! input string.
//!
//! Evaluation order:
//! 1. Exception rules: any match short-circuits to allow.
//! 2. Block rules: the first structural match with all options satisfied
//!    blocks.
//! 3. Default-allow when nothing matches.
//!
//! Within each partition, the request host selects the matching bucket of
//! `||host`-anchored rules; only the unbucketed remainder is scanned
//! linearly.

use crate::psl::{host_within_domain, is_third_party};
use crate::ruleset::{Partition, Rule, RuleSet};
use crate::types::{MatchDecision, MatchOutcome, PartyMask, RequestContext};
use crate::url::{extract_host, normalize_request};

impl RuleSet {
    /// Decide block/allow for one request. Pure function of the ruleset and
    /// the context; never fails for any URL string.
    pub fn should_block(&self, ctx: &RequestContext<'_>) -> bool {
        self.match_request(ctx).decision == MatchDecision::Block
    }

    /// Like [`RuleSet::should_block`], but reports the deciding rule.
    pub fn match_request(&self, ctx: &RequestContext<'_>) -> MatchOutcome<'_> {
        let url = normalize_request(ctx.url);
        let req_host = extract_host(&url);
        let site_domain = ctx.site_domain.map(|s| s.to_ascii_lowercase());
        let site_domain = site_domain.as_deref();

        // Exceptions win over any block match
        if let Some(rule) = self.find_match(&self.exception, &url, req_host, site_domain, ctx) {
            return MatchOutcome {
                decision: MatchDecision::Allow,
                rule: Some(rule.raw.as_str()),
            };
        }

        if let Some(rule) = self.find_match(&self.block, &url, req_host, site_domain, ctx) {
            return MatchOutcome {
                decision: MatchDecision::Block,
                rule: Some(rule.raw.as_str()),
            };
        }

        MatchOutcome::ALLOW
    }

    fn find_match<'s>(
        &'s self,
        partition: &'s Partition,
        url: &str,
        req_host: Option<&str>,
        site_domain: Option<&str>,
        ctx: &RequestContext<'_>,
    ) -> Option<&'s Rule> {
        if let Some(host) = req_host {
            if let Some(bucket) = partition.by_host.get(host) {
                for &idx in bucket {
                    let rule = &partition.rules[idx as usize];
                    if rule_applies(rule, url, req_host, site_domain, ctx) {
                        return Some(rule);
                    }
                }
            }
        }

        for &idx in &partition.rest {
            let rule = &partition.rules[idx as usize];
            if rule_applies(rule, url, req_host, site_domain, ctx) {
                return Some(rule);
            }
        }

        None
    }
}

fn rule_applies(
    rule: &Rule,
    url: &str,
    req_host: Option<&str>,
    site_domain: Option<&str>,
    ctx: &RequestContext<'_>,
) -> bool {
    options_satisfied(rule, req_host, site_domain, ctx) && rule.pattern.matches(url)
}

/// Check a rule's option constraints against the request context.
/// A constraint that keys on an absent context field is unsatisfied: such a
/// rule neither blocks nor excepts the request.
fn options_satisfied(
    rule: &Rule,
    req_host: Option<&str>,
    site_domain: Option<&str>,
    ctx: &RequestContext<'_>,
) -> bool {
    let opts = &rule.options;

    // Resource type
    if !opts.types.is_empty() {
        match ctx.request_type {
            Some(request_type) => {
                if !opts.types.intersects(request_type) {
                    return false;
                }
            }
            None => return false,
        }
    }

    // Party
    if !opts.party.is_empty() && opts.party != PartyMask::ALL {
        let (site, host) = match (site_domain, req_host) {
            (Some(site), Some(host)) => (site, host),
            _ => return false,
        };
        let request_party = if is_third_party(site, host) {
            PartyMask::THIRD_PARTY
        } else {
            PartyMask::FIRST_PARTY
        };
        if !opts.party.contains(request_party) {
            return false;
        }
    }

    // $domain= constraint
    if let Some(constraint) = &opts.domains {
        if !constraint.include.is_empty() {
            let site = match site_domain {
                Some(site) => site,
                None => return false,
            };
            if !constraint
                .include
                .iter()
                .any(|d| host_within_domain(site, d))
            {
                return false;
            }
        }
        if let Some(site) = site_domain {
            if constraint.exclude.iter().any(|d| host_within_domain(site, d)) {
                return false;
            }
        }
    }

    // opts.extra: unrecognized tokens are always satisfied
    true
}
