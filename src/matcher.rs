// 🎫 Ticket Matcher - Recognizes ticket identifiers in arbitrary text
//
// Single source of truth for what a ticket ID looks like. Every other
// module that needs to find tickets in plain text goes through this one.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ============================================================================
// TICKET ID
// ============================================================================

/// TicketId - A ticket identifier like "CSMVP-643"
///
/// Immutable value type. Equality is exact string equality; the system
/// tracks nothing about a ticket beyond its text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    pub fn new(text: impl Into<String>) -> Self {
        TicketId(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TicketId {
    fn from(text: &str) -> Self {
        TicketId::new(text)
    }
}

// ============================================================================
// TICKET MATCHER
// ============================================================================

/// Plain-text grammar: 2-10 uppercase letters, a dash, 1-6 digits,
/// anchored on word boundaries.
const TICKET_PATTERN: &str = r"\b[A-Z]{2,10}-\d{1,6}\b";

/// Bracketed variant used by structured item titles: "[ABC-123] Description"
const BRACKETED_TICKET_PATTERN: &str = r"\[([A-Z]{2,10}-\d{1,6})\]";

/// TicketMatcher - Compiled ticket grammar
///
/// Stateless once built; safe to share across evaluation calls.
pub struct TicketMatcher {
    plain: Regex,
    bracketed: Regex,
}

impl Default for TicketMatcher {
    fn default() -> Self {
        TicketMatcher {
            plain: Regex::new(TICKET_PATTERN).unwrap(),
            bracketed: Regex::new(BRACKETED_TICKET_PATTERN).unwrap(),
        }
    }
}

impl TicketMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find every ticket identifier in `text`, left to right.
    ///
    /// Matching is non-overlapping. Duplicates are dropped keeping the
    /// first occurrence, so the returned order is first-mention order.
    /// Empty input yields an empty list, never an error.
    pub fn find_all(&self, text: &str) -> Vec<TicketId> {
        let mut seen = HashSet::new();
        let mut tickets = Vec::new();

        for m in self.plain.find_iter(text) {
            if seen.insert(m.as_str()) {
                tickets.push(TicketId::new(m.as_str()));
            }
        }

        tickets
    }

    /// Extract the first bracketed ticket identifier from an item title,
    /// e.g. "[CSMVP-643] Fix login flow" -> CSMVP-643.
    pub fn first_bracketed(&self, title: &str) -> Option<TicketId> {
        self.bracketed
            .captures(title)
            .map(|caps| TicketId::new(&caps[1]))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_all_order_and_dedup() {
        let matcher = TicketMatcher::new();

        let tickets = matcher.find_all("AB-1 CD-2 AB-1 EF-3");

        assert_eq!(
            tickets,
            vec![TicketId::from("AB-1"), TicketId::from("CD-2"), TicketId::from("EF-3")]
        );
    }

    #[test]
    fn test_find_all_empty_input() {
        let matcher = TicketMatcher::new();

        assert!(matcher.find_all("").is_empty());
        assert!(matcher.find_all("no tickets here").is_empty());
    }

    #[test]
    fn test_grammar_bounds() {
        let matcher = TicketMatcher::new();

        // Single letter project keys are not tickets
        assert!(matcher.find_all("A-1").is_empty());

        // Lowercase keys are not tickets
        assert!(matcher.find_all("bug-123").is_empty());

        // More than 10 letters or more than 6 digits never matches,
        // not even a shorter substring (word boundaries forbid it)
        assert!(matcher.find_all("ABCDEFGHIJK-123").is_empty());
        assert!(matcher.find_all("ABC-1234567").is_empty());

        // Boundary sizes match
        assert_eq!(matcher.find_all("AB-1"), vec![TicketId::from("AB-1")]);
        assert_eq!(
            matcher.find_all("ABCDEFGHIJ-123456"),
            vec![TicketId::from("ABCDEFGHIJ-123456")]
        );
    }

    #[test]
    fn test_find_all_is_idempotent() {
        let matcher = TicketMatcher::new();

        let first = matcher.find_all("Analysis of CSMVP-643 and BUG-123 shows CSMVP-643 regressed.");
        let joined = first
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let second = matcher.find_all(&joined);

        assert_eq!(first, second);
    }

    #[test]
    fn test_matches_inside_brackets_and_punctuation() {
        let matcher = TicketMatcher::new();

        let tickets = matcher.find_all("[CSMVP-643] done; see BUG-123, FEAT-456.");

        assert_eq!(
            tickets,
            vec![
                TicketId::from("CSMVP-643"),
                TicketId::from("BUG-123"),
                TicketId::from("FEAT-456"),
            ]
        );
    }

    #[test]
    fn test_first_bracketed() {
        let matcher = TicketMatcher::new();

        assert_eq!(
            matcher.first_bracketed("[CSMVP-643] Fix login flow"),
            Some(TicketId::from("CSMVP-643"))
        );
        assert_eq!(
            matcher.first_bracketed("[CSMVP-643] then [CSMVP-601]"),
            Some(TicketId::from("CSMVP-643"))
        );

        // Plain mentions without brackets do not count for titles
        assert_eq!(matcher.first_bracketed("CSMVP-643 Fix login flow"), None);
        assert_eq!(matcher.first_bracketed(""), None);
    }
}
