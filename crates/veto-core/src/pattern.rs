//! Compiled URL patterns and the backtracking matcher
//!
//! A pattern is one Adblock-style pattern string compiled into an anchor plus
//! a token sequence of literal runs, `*` wildcards, and `^` separator
//! placeholders. Matching walks the URL with backtracking at wildcards; the
//! result is equivalent to matching a regex derived from the pattern, without
//! building one.
//!
//! Anchor semantics:
//! - leading `||`: the match must begin at the start of the request hostname
//! - leading `|`: the match must begin at the start of the URL
//! - trailing `|`: the match must end at the end of the URL
//! - unanchored: the pattern may match anywhere in the URL
//!
//! `^` matches exactly one of `/ ? : = &`, or the end of the URL (consuming
//! nothing). Literals compare ASCII case-insensitively.

use crate::url::{
    find_case_insensitive, get_host_position, is_separator_char, starts_with_case_insensitive,
};

/// One element of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternToken {
    /// Literal run, matched contiguously and case-insensitively
    Literal(String),
    /// `*`: zero or more arbitrary characters
    Wildcard,
    /// `^`: one separator character or end-of-string
    Separator,
}

/// Left-edge anchoring of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    /// Pattern may begin anywhere in the URL
    #[default]
    None,
    /// `|`: pattern begins at the start of the URL
    Start,
    /// `||`: pattern begins at the start of the hostname
    Host,
}

/// A compiled URL-matching pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    anchor: Anchor,
    right_anchored: bool,
    tokens: Vec<PatternToken>,
}

impl Pattern {
    /// Compile a pattern string (the part of a rule line before `$`).
    ///
    /// Returns `None` only for patterns that compile to an empty token list
    /// (e.g. `||` alone), which would otherwise match every URL. Any other
    /// character sequence degrades to literal tokens rather than failing.
    pub fn compile(text: &str) -> Option<Self> {
        let mut rest = text;

        let anchor = if let Some(stripped) = rest.strip_prefix("||") {
            rest = stripped;
            Anchor::Host
        } else if let Some(stripped) = rest.strip_prefix('|') {
            rest = stripped;
            Anchor::Start
        } else {
            Anchor::None
        };

        let right_anchored = if let Some(stripped) = rest.strip_suffix('|') {
            rest = stripped;
            true
        } else {
            false
        };

        let mut tokens: Vec<PatternToken> = Vec::new();
        let mut literal = String::new();

        for ch in rest.chars() {
            match ch {
                '*' => {
                    flush_literal(&mut tokens, &mut literal);
                    // Collapse runs of wildcards
                    if tokens.last() != Some(&PatternToken::Wildcard) {
                        tokens.push(PatternToken::Wildcard);
                    }
                }
                '^' => {
                    flush_literal(&mut tokens, &mut literal);
                    tokens.push(PatternToken::Separator);
                }
                _ => literal.push(ch),
            }
        }
        flush_literal(&mut tokens, &mut literal);

        if tokens.is_empty() {
            return None;
        }

        Some(Self {
            anchor,
            right_anchored,
            tokens,
        })
    }

    /// The exact hostname this pattern is keyed on, if it is `||`-anchored
    /// with a complete literal host. Used for the ruleset's bucket index;
    /// patterns without a key go to the linear-scan remainder.
    pub fn host_bucket_key(&self) -> Option<String> {
        if self.anchor != Anchor::Host {
            return None;
        }

        let first = match self.tokens.first() {
            Some(PatternToken::Literal(s)) => s.as_str(),
            _ => return None,
        };

        // Host literal terminated inside the first token?
        if let Some(end) = first.find(['/', ':', '?']) {
            return validate_host(&first[..end]);
        }

        // Whole first token is host characters; the host is only complete if
        // the pattern cannot extend it past the hostname.
        let complete = match self.tokens.get(1) {
            Some(PatternToken::Separator) => true,
            Some(_) => false,
            None => self.right_anchored,
        };
        if complete {
            validate_host(first)
        } else {
            None
        }
    }

    /// Match this pattern against a (normalized) request URL.
    pub fn matches(&self, url: &str) -> bool {
        let bytes = url.as_bytes();

        match self.anchor {
            Anchor::Start => self.match_at(bytes, 0, 0),
            Anchor::Host => match get_host_position(url) {
                Some((host_start, _)) => self.match_at(bytes, host_start, 0),
                None => false,
            },
            // An unanchored pattern behaves as if prefixed by a wildcard
            Anchor::None => self.match_wildcard_from(bytes, 0, 0),
        }
    }

    /// Match tokens[ti..] against url[pos..] exactly at `pos`.
    fn match_at(&self, url: &[u8], pos: usize, ti: usize) -> bool {
        let token = match self.tokens.get(ti) {
            Some(t) => t,
            None => return !self.right_anchored || pos == url.len(),
        };

        match token {
            PatternToken::Literal(lit) => {
                starts_with_case_insensitive(&url[pos..], lit.as_bytes())
                    && self.match_at(url, pos + lit.len(), ti + 1)
            }
            PatternToken::Separator => {
                if pos < url.len() && is_separator_char(url[pos]) && self.match_at(url, pos + 1, ti + 1)
                {
                    return true;
                }
                // End-of-string counts as a separator without consuming input
                pos == url.len() && self.match_at(url, pos, ti + 1)
            }
            PatternToken::Wildcard => self.match_wildcard_from(url, pos, ti + 1),
        }
    }

    /// Match tokens[ti..] starting anywhere at or after `pos`.
    /// When the next token is a literal, this jumps between its occurrences
    /// instead of probing every position.
    fn match_wildcard_from(&self, url: &[u8], pos: usize, ti: usize) -> bool {
        match self.tokens.get(ti) {
            // Trailing wildcard consumes the rest of the URL
            None => true,
            Some(PatternToken::Wildcard) => self.match_wildcard_from(url, pos, ti + 1),
            Some(PatternToken::Literal(lit)) => {
                let mut search = pos;
                loop {
                    let found = match find_case_insensitive(&url[search..], lit.as_bytes()) {
                        Some(offset) => search + offset,
                        None => return false,
                    };
                    if self.match_at(url, found + lit.len(), ti + 1) {
                        return true;
                    }
                    search = found + 1;
                }
            }
            Some(PatternToken::Separator) => {
                for next in pos..=url.len() {
                    if self.match_at(url, next, ti) {
                        return true;
                    }
                }
                false
            }
        }
    }
}

fn flush_literal(tokens: &mut Vec<PatternToken>, literal: &mut String) {
    if !literal.is_empty() {
        tokens.push(PatternToken::Literal(std::mem::take(literal)));
    }
}

fn validate_host(host: &str) -> Option<String> {
    let trimmed = host.trim_matches('.');
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

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled(text: &str) -> Pattern {
        Pattern::compile(text).expect("pattern should compile")
    }

    #[test]
    fn test_compile_tokens() {
        let p = compiled("*/banner/*.png");
        assert_eq!(
            p.tokens,
            vec![
                PatternToken::Wildcard,
                PatternToken::Literal("/banner/".into()),
                PatternToken::Wildcard,
                PatternToken::Literal(".png".into()),
            ]
        );
        assert_eq!(p.anchor, Anchor::None);
        assert!(!p.right_anchored);
    }

    #[test]
    fn test_compile_anchors() {
        assert_eq!(compiled("||ads.example.com^").anchor, Anchor::Host);
        assert_eq!(compiled("|https://example.com").anchor, Anchor::Start);
        assert!(compiled("example.com/exact|").right_anchored);
    }

    #[test]
    fn test_compile_collapses_wildcard_runs() {
        let p = compiled("a***b");
        assert_eq!(p.tokens.len(), 3);
    }

    #[test]
    fn test_compile_empty_pattern() {
        assert!(Pattern::compile("").is_none());
        assert!(Pattern::compile("||").is_none());
        assert!(Pattern::compile("|").is_none());
    }

    #[test]
    fn test_substring_match() {
        let p = compiled("/ads/");
        assert!(p.matches("http://example.com/ads/banner.gif"));
        assert!(!p.matches("http://example.com/news/"));
    }

    #[test]
    fn test_case_insensitive_literals() {
        let p = compiled("/Ads/Banner");
        assert!(p.matches("http://example.com/ads/banner.gif"));
        assert!(compiled("/ads/").matches("http://example.com/ADS/x"));
    }

    #[test]
    fn test_wildcard_match() {
        let p = compiled("*/banner/*.png");
        assert!(p.matches("http://x.test/path/banner/ad.png"));
        assert!(!p.matches("http://x.test/path/other/ad.png"));
    }

    #[test]
    fn test_host_anchor_match() {
        let p = compiled("||ads.example.com^");
        assert!(p.matches("https://ads.example.com/track"));
        assert!(p.matches("http://ads.example.com/pixel.gif"));
        assert!(p.matches("https://ads.example.com:8080/x"));
        // Host anchor binds to the hostname start
        assert!(!p.matches("https://sub.ads.example.com/x"));
        assert!(!p.matches("http://notads.example.com/pixel.gif"));
        // No hostname at all
        assert!(!p.matches("ads.example.com plain text"));
    }

    #[test]
    fn test_start_anchor_match() {
        let p = compiled("|http://ads.");
        assert!(p.matches("http://ads.test/x"));
        assert!(!p.matches("https://site.test/?u=http://ads.test/x"));
    }

    #[test]
    fn test_right_anchor_match() {
        let p = compiled("swf|");
        assert!(p.matches("http://example.com/annoyingflash.swf"));
        assert!(!p.matches("http://example.com/swf/index.html"));
    }

    #[test]
    fn test_separator_matches_listed_chars_and_end() {
        let p = compiled("||example.com^");
        assert!(p.matches("http://example.com/"));
        assert!(p.matches("http://example.com?q=1"));
        assert!(p.matches("http://example.com:8000/"));
        // End-of-string separator
        assert!(p.matches("http://example.com"));
        // '.' is not a separator
        assert!(!p.matches("http://example.common/"));
        assert!(!p.matches("http://example.com.evil.test/"));
    }

    #[test]
    fn test_separator_mid_pattern() {
        let p = compiled("/track^pixel");
        assert!(p.matches("http://t.test/track=pixel"));
        assert!(p.matches("http://t.test/track&pixel"));
        assert!(!p.matches("http://t.test/track-pixel"));
    }

    #[test]
    fn test_host_bucket_key() {
        assert_eq!(
            compiled("||ads.example.com^").host_bucket_key(),
            Some("ads.example.com".to_string())
        );
        assert_eq!(
            compiled("||ads.example.com/banner").host_bucket_key(),
            Some("ads.example.com".to_string())
        );
        assert_eq!(
            compiled("||ads.example.com:8080/x").host_bucket_key(),
            Some("ads.example.com".to_string())
        );
        assert_eq!(
            compiled("||Ads.Example.Com^").host_bucket_key(),
            Some("ads.example.com".to_string())
        );
        // Open-ended host prefix cannot be bucketed
        assert_eq!(compiled("||ads.example.com").host_bucket_key(), None);
        assert_eq!(compiled("||ads.example.*/x").host_bucket_key(), None);
        // Not host-anchored
        assert_eq!(compiled("/banner/").host_bucket_key(), None);
        assert_eq!(compiled("|http://x.test/").host_bucket_key(), None);
    }

    #[test]
    fn test_matches_never_panics_on_odd_input() {
        let p = compiled("||ads.example.com^");
        assert!(!p.matches(""));
        assert!(!p.matches("::::"));
        let long = format!("https://x.test/{}", "a".repeat(10_000));
        assert!(!p.matches(&long));
    }
}
