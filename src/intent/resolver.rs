//! Transcript → intent resolution

use super::patterns::{CommandPattern, table};
use super::{Intent, normalize};

/// Fixed confidence attached to every match; the table does no scoring
const MATCH_CONFIDENCE: f32 = 0.9;

/// A resolved command: intent plus the fixed confidence constant
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    /// The resolved intent with extracted parameters
    pub intent: Intent,
    /// Fixed constant; present for parity with recognizer output shapes
    pub confidence: f32,
    /// Table entry that matched, for logging and tests
    pub matched_rule: &'static str,
}

/// Deterministic, synchronous transcript parser
pub struct IntentResolver {
    entries: Vec<CommandPattern>,
}

impl IntentResolver {
    /// Compile the pattern table
    #[must_use]
    pub fn new() -> Self {
        Self { entries: table() }
    }

    /// Resolve a transcript to an intent, or `None` when no entry matches.
    ///
    /// Pure: same transcript in, structurally equal result out. Evaluation
    /// is top-to-bottom over the ordered table and stops at the first
    /// pattern whose extractor produces an intent.
    #[must_use]
    pub fn parse(&self, transcript: &str) -> Option<ParsedCommand> {
        let normalized = normalize(transcript);
        if normalized.is_empty() {
            return None;
        }

        for entry in &self.entries {
            for regex in &entry.regexes {
                if let Some(caps) = regex.captures(&normalized) {
                    if let Some(intent) = (entry.build)(&caps) {
                        tracing::debug!(rule = entry.name, transcript = %normalized, "intent matched");
                        return Some(ParsedCommand {
                            intent,
                            confidence: MATCH_CONFIDENCE,
                            matched_rule: entry.name,
                        });
                    }
                }
            }
        }

        tracing::debug!(transcript = %normalized, "no intent matched");
        None
    }

    /// Names of every table entry, in evaluation order
    #[must_use]
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    /// Names of every entry that would match a transcript, in table order.
    /// `parse` returns the first; this exists so tests can audit overlaps.
    #[must_use]
    pub fn matching_rules(&self, transcript: &str) -> Vec<&'static str> {
        let normalized = normalize(transcript);
        self.entries
            .iter()
            .filter(|entry| {
                entry.regexes.iter().any(|regex| {
                    regex
                        .captures(&normalized)
                        .is_some_and(|caps| (entry.build)(&caps).is_some())
                })
            })
            .map(|entry| entry.name)
            .collect()
    }
}

impl Default for IntentResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(transcript: &str) -> Option<Intent> {
        IntentResolver::new().parse(transcript).map(|c| c.intent)
    }

    #[test]
    fn navigation_phrases() {
        assert_eq!(parse("open my cart"), Some(Intent::NavigateCart));
        assert_eq!(parse("  Go To Checkout  "), Some(Intent::Checkout));
        assert_eq!(parse("take me home"), Some(Intent::NavigateHome));
    }

    #[test]
    fn cart_mutations() {
        assert_eq!(parse("add this to my cart"), Some(Intent::AddToCart));
        assert_eq!(parse("add to basket"), Some(Intent::AddToCart));
        assert_eq!(parse("remove it from the cart"), Some(Intent::RemoveItem));
        assert_eq!(
            parse("set quantity to three"),
            Some(Intent::ChangeQuantity { quantity: 3 })
        );
    }

    #[test]
    fn search_extracts_query() {
        assert_eq!(
            parse("search for walnut desk organizer"),
            Some(Intent::Search {
                query: "walnut desk organizer".to_string()
            })
        );
        assert_eq!(
            parse("show me reading lamps"),
            Some(Intent::Search {
                query: "reading lamps".to_string()
            })
        );
    }

    #[test]
    fn pin_digits_are_joined() {
        assert_eq!(
            parse("pin 1 2 3 4"),
            Some(Intent::PinLogin {
                pin: "1234".to_string()
            })
        );
    }

    #[test]
    fn unmatched_returns_none() {
        assert_eq!(parse("the weather is nice today"), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
    }

    #[test]
    fn parse_is_pure() {
        let resolver = IntentResolver::new();
        let a = resolver.parse("add to cart");
        let b = resolver.parse("add to cart");
        assert_eq!(a, b);
    }

    #[test]
    fn order_priority_cart_phrases() {
        // "check out my cart" is about the cart, but the checkout entry is
        // listed first and wins; the documented cost of ordered matching.
        let resolver = IntentResolver::new();
        let parsed = resolver.parse("check out my cart").unwrap();
        assert_eq!(parsed.intent, Intent::Checkout);
        assert_eq!(parsed.matched_rule, "checkout");
    }

    #[test]
    fn confidence_is_fixed() {
        let resolver = IntentResolver::new();
        let a = resolver.parse("help").unwrap();
        let b = resolver.parse("go to checkout").unwrap();
        assert!((a.confidence - b.confidence).abs() < f32::EPSILON);
    }
}
