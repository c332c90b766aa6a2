//! Per-line rule parsing
//!
//! One raw list line in, `Option<Rule>` out. Comments (`!`), list metadata
//! headers (`[`), blank lines, and element-hiding rules (`##` and friends)
//! are discarded. Everything else degrades gracefully: unrecognized option
//! tokens are preserved as always-satisfied extras, and odd pattern syntax
//! compiles to literal tokens. A single bad line never aborts a load.

use log::debug;

use veto_core::pattern::Pattern;
use veto_core::ruleset::{DomainConstraint, Rule, RuleOptions};
use veto_core::types::{PartyMask, RequestType};

/// Parse one raw line into a rule. Returns `None` for lines that carry no
/// network rule (comments, metadata, cosmetics, empty patterns, rules whose
/// options are self-contradictory and could never match).
pub fn parse_line(raw_line: &str) -> Option<Rule> {
    let line = raw_line.trim();
    if line.is_empty() || is_comment_line(line) {
        return None;
    }

    if is_cosmetic_line(line) {
        debug!("skipping element-hiding rule: {line}");
        return None;
    }

    let mut rest = line;
    let mut is_exception = false;
    if let Some(stripped) = rest.strip_prefix("@@") {
        is_exception = true;
        rest = stripped.trim_start();
    }

    let (pattern_part, options_text) = split_rule_options(rest);

    let options = match options_text {
        Some(text) => match parse_options(text) {
            Some(options) => options,
            None => {
                debug!("skipping rule that can match no request: {line}");
                return None;
            }
        },
        None => RuleOptions::default(),
    };

    let pattern = match Pattern::compile(pattern_part.trim()) {
        Some(pattern) => pattern,
        None => {
            debug!("skipping rule with empty pattern: {line}");
            return None;
        }
    };

    Some(Rule {
        raw: line.to_string(),
        pattern,
        is_exception,
        options,
    })
}

fn is_comment_line(line: &str) -> bool {
    line.starts_with('!') || line.starts_with('[')
}

fn is_cosmetic_line(line: &str) -> bool {
    line.contains("##") || line.contains("#@#") || line.contains("#?#")
}

/// Split a rule on the first unescaped `$` into (pattern, options).
fn split_rule_options(line: &str) -> (&str, Option<&str>) {
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'$' && (i == 0 || bytes[i - 1] != b'\\') {
            return (&line[..i], Some(&line[i + 1..]));
        }
    }
    (line, None)
}

/// Parse a comma-separated options string. Unknown tokens land in `extra`.
/// Returns `None` only when the recognized constraints are self-contradictory
/// (e.g. `script,~script`), which is equivalent to a rule that matches
/// nothing.
fn parse_options(text: &str) -> Option<RuleOptions> {
    let mut type_include = RequestType::empty();
    let mut type_exclude = RequestType::empty();
    let mut party_include = PartyMask::empty();
    let mut party_exclude = PartyMask::empty();
    let mut domains: Option<DomainConstraint> = None;
    let mut extra: Vec<String> = Vec::new();

    for raw in text.split(',') {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let lower = raw.to_ascii_lowercase();

        if let Some(value) = lower.strip_prefix("domain=") {
            if let Some(parsed) = parse_domain_option(value) {
                domains = Some(merge_constraints(domains.take(), parsed));
            }
            continue;
        }

        let (negated, name) = match lower.strip_prefix('~') {
            Some(stripped) => (true, stripped),
            None => (false, lower.as_str()),
        };

        if let Some(mask) = RequestType::parse(name) {
            if negated {
                type_exclude |= mask;
            } else {
                type_include |= mask;
            }
            continue;
        }

        if let Some(mask) = party_option(name) {
            if negated {
                party_exclude |= mask;
            } else {
                party_include |= mask;
            }
            continue;
        }

        // Unknown or future syntax: keep the token, never reject the rule
        debug!("preserving unrecognized option token: {raw}");
        extra.push(raw.to_string());
    }

    let types = finalize_mask(type_include, type_exclude, RequestType::ALL)?;
    let party = finalize_party(party_include, party_exclude)?;

    Some(RuleOptions {
        types,
        party,
        domains,
        extra,
    })
}

/// Reduce include/exclude masks to a single constraint mask.
/// Empty result = unconstrained; `None` = contradictory (matches nothing).
fn finalize_mask(
    include: RequestType,
    exclude: RequestType,
    all: RequestType,
) -> Option<RequestType> {
    let mask = if include.is_empty() {
        all & !exclude
    } else {
        include & !exclude
    };
    if mask.is_empty() {
        return None;
    }
    if mask == all {
        return Some(RequestType::empty());
    }
    Some(mask)
}

fn finalize_party(include: PartyMask, exclude: PartyMask) -> Option<PartyMask> {
    let mask = if include.is_empty() {
        PartyMask::ALL & !exclude
    } else {
        include & !exclude
    };
    if mask.is_empty() {
        return None;
    }
    if mask == PartyMask::ALL {
        return Some(PartyMask::empty());
    }
    Some(mask)
}

fn party_option(name: &str) -> Option<PartyMask> {
    match name {
        "third-party" | "thirdparty" | "3p" => Some(PartyMask::THIRD_PARTY),
        "first-party" | "firstparty" | "1p" => Some(PartyMask::FIRST_PARTY),
        _ => None,
    }
}

fn merge_constraints(
    existing: Option<DomainConstraint>,
    incoming: DomainConstraint,
) -> DomainConstraint {
    match existing {
        Some(mut current) => {
            current.include.extend(incoming.include);
            current.exclude.extend(incoming.exclude);
            current
        }
        None => incoming,
    }
}

/// Parse `domain=example.com|~sub.example.com` values.
fn parse_domain_option(value: &str) -> Option<DomainConstraint> {
    let mut constraint = DomainConstraint::default();

    for raw in value.split('|') {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let (is_exclude, domain_raw) = match raw.strip_prefix('~') {
            Some(stripped) => (true, stripped),
            None => (false, raw),
        };

        let domain = match normalize_domain(domain_raw) {
            Some(domain) => domain,
            None => {
                debug!("ignoring malformed domain option entry: {raw}");
                continue;
            }
        };

        if is_exclude {
            constraint.exclude.push(domain);
        } else {
            constraint.include.push(domain);
        }
    }

    if constraint.is_empty() {
        None
    } else {
        Some(constraint)
    }
}

fn normalize_domain(host: &str) -> Option<String> {
    let trimmed = host.trim().trim_matches('.');
    if trimmed.is_empty() {
        return None;
    }

    if !trimmed
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-')
    {
        return None;
    }

    Some(trimmed.to_ascii_lowercase())
}
