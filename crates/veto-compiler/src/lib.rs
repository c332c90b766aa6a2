//! urlveto Filter List Compiler
//!
//! This crate turns raw Adblock-style list lines into an immutable
//! [`veto_core::RuleSet`]. Loading the lines (file, network, embedded
//! string) is the host's concern; the builder only ever sees text.

pub mod builder;
pub mod parser;

pub use builder::{build_ruleset, build_ruleset_from_reader, ListError};
pub use parser::parse_line;
