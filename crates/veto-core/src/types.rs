//! Core type definitions for urlveto
//!
//! These types are shared between the list compiler and the matching engine.

// =============================================================================
// Request Types (bit mask for type filtering)
// =============================================================================

bitflags::bitflags! {
    /// Request type bit mask.
    ///
    /// On a rule this is the set of resource types the rule applies to
    /// (empty = all types). On a request context it is a single bit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RequestType: u32 {
        const OTHER = 1 << 0;
        const SCRIPT = 1 << 1;
        const IMAGE = 1 << 2;
        const STYLESHEET = 1 << 3;
        const OBJECT = 1 << 4;
        const SUBDOCUMENT = 1 << 5;  // iframe/frame
        const MAIN_FRAME = 1 << 6;   // main document
        const XMLHTTPREQUEST = 1 << 7;
        const WEBSOCKET = 1 << 8;
        const FONT = 1 << 9;
        const MEDIA = 1 << 10;
        const PING = 1 << 11;

        /// All request types
        const ALL = 0xFFF;
        /// Document types (main_frame + sub_frame)
        const DOCUMENT = Self::MAIN_FRAME.bits() | Self::SUBDOCUMENT.bits();
    }
}

impl RequestType {
    /// Parse a single request type from its browser/list name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "main_frame" | "document" => Some(Self::MAIN_FRAME),
            "sub_frame" | "subdocument" => Some(Self::SUBDOCUMENT),
            "stylesheet" => Some(Self::STYLESHEET),
            "script" => Some(Self::SCRIPT),
            "image" => Some(Self::IMAGE),
            "font" => Some(Self::FONT),
            "object" => Some(Self::OBJECT),
            "xmlhttprequest" | "xhr" => Some(Self::XMLHTTPREQUEST),
            "ping" => Some(Self::PING),
            "media" => Some(Self::MEDIA),
            "websocket" => Some(Self::WEBSOCKET),
            "other" => Some(Self::OTHER),
            _ => None,
        }
    }
}

// =============================================================================
// Party Masks
// =============================================================================

bitflags::bitflags! {
    /// Party (first-party / third-party) mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PartyMask: u8 {
        /// Matches first-party requests
        const FIRST_PARTY = 1 << 0;
        /// Matches third-party requests
        const THIRD_PARTY = 1 << 1;
        /// Matches both
        const ALL = Self::FIRST_PARTY.bits() | Self::THIRD_PARTY.bits();
    }
}

// =============================================================================
// Request Context
// =============================================================================

/// Context for a request being matched.
///
/// Constructed fresh by the host for each intercepted request and discarded
/// after the predicate returns. Only the URL is required; rules whose options
/// key on an absent field are treated as non-matching for that request.
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    /// Full request URL
    pub url: &'a str,
    /// Hostname of the originating page, if known
    pub site_domain: Option<&'a str>,
    /// Resource type classification, if known
    pub request_type: Option<RequestType>,
}

impl<'a> RequestContext<'a> {
    /// Context carrying only a URL.
    pub fn new(url: &'a str) -> Self {
        Self {
            url,
            site_domain: None,
            request_type: None,
        }
    }
}

// =============================================================================
// Match Outcome
// =============================================================================

/// Final decision for a matched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDecision {
    /// Request is allowed (no matching block rule, or an exception matched)
    Allow,
    /// Request is blocked
    Block,
}

/// Result of matching a request, with the deciding rule for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct MatchOutcome<'a> {
    /// The final decision for this request
    pub decision: MatchDecision,
    /// Raw text of the rule that determined the decision, if any
    pub rule: Option<&'a str>,
}

impl MatchOutcome<'_> {
    /// The default outcome: nothing matched, request proceeds.
    pub const ALLOW: MatchOutcome<'static> = MatchOutcome {
        decision: MatchDecision::Allow,
        rule: None,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_type_parse() {
        assert_eq!(RequestType::parse("script"), Some(RequestType::SCRIPT));
        assert_eq!(RequestType::parse("xhr"), Some(RequestType::XMLHTTPREQUEST));
        assert_eq!(RequestType::parse("document"), Some(RequestType::MAIN_FRAME));
        assert_eq!(RequestType::parse("bogus"), None);
    }

    #[test]
    fn test_document_covers_frames() {
        assert!(RequestType::DOCUMENT.contains(RequestType::MAIN_FRAME));
        assert!(RequestType::DOCUMENT.contains(RequestType::SUBDOCUMENT));
        assert!(!RequestType::DOCUMENT.contains(RequestType::SCRIPT));
    }
}
