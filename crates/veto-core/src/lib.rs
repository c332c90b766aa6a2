//! urlveto Core Library
//!
//! This crate provides the match-time engine for the urlveto request filter:
//! an immutable, compiled view over an Adblock-style block list plus a
//! synchronous per-request predicate a host networking stack calls from its
//! interception hook.
//!
//! # Architecture
//!
//! A [`RuleSet`] is built once from raw list lines (see the `veto-compiler`
//! crate), after which it is immutable and safe to share across threads.
//! The hot path, [`RuleSet::should_block`], does no I/O, takes no locks,
//! and returns a verdict for any input string.
//!
//! # Modules
//!
//! - `types`: shared type definitions (request context, masks, decisions)
//! - `url`: fast URL slicing without allocations
//! - `psl`: registrable-domain heuristics for party checks
//! - `pattern`: compiled patterns and the backtracking matcher
//! - `ruleset`: rule storage and the host-bucket index
//! - `matcher`: the request-level match predicate

pub mod matcher;
pub mod pattern;
pub mod psl;
pub mod ruleset;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use pattern::Pattern;
pub use psl::{get_etld1, is_third_party};
pub use ruleset::{DomainConstraint, Rule, RuleOptions, RuleSet};
pub use types::{MatchDecision, MatchOutcome, RequestContext, RequestType};
