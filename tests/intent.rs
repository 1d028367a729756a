//! Intent resolver properties
//!
//! Covers purity, order-priority tie-breaking, and an overlap audit over a
//! phrasing corpus: no two table entries may both match an utterance unless
//! the pair is a documented order dependency.

use voxcart::{Intent, IntentResolver};

/// Overlapping entry pairs that are intentional: the first-listed entry
/// wins by table order.
const DOCUMENTED_OVERLAPS: &[(&str, &str)] = &[
    // "check out my cart" reads as checkout first
    ("checkout", "navigate_cart"),
    // "show me ..." / "find ..." phrasings fall through to search when no
    // specific entry takes them; any entry above search may share one
    ("navigate_cart", "search"),
    ("checkout", "search"),
    ("read_product", "search"),
    ("show_help", "search"),
    ("navigate_home", "search"),
    ("next_product", "search"),
    ("previous_product", "search"),
];

fn corpus() -> Vec<&'static str> {
    vec![
        "go home",
        "take me to the home page",
        "open my cart",
        "what's in my cart",
        "show me my cart",
        "add to cart",
        "add this to my cart",
        "put it in the basket",
        "buy it now",
        "go to checkout",
        "check out",
        "check out my cart",
        "confirm my order",
        "place order",
        "remove it from the cart",
        "set quantity to 3",
        "change the quantity to five",
        "search for standing desks",
        "find reading lamps",
        "show me kitchen gear",
        "read this page",
        "where am i",
        "read the product",
        "tell me about this",
        "help",
        "what can i say",
        "enable high contrast",
        "turn off high contrast",
        "bigger text",
        "make the text smaller",
        "sign out",
        "log out",
        "pin 1 2 3 4",
        "log in with pin 987654",
        "open the assistant",
        "start conversation",
        "next product",
        "previous result",
    ]
}

#[test]
fn every_corpus_phrase_resolves() {
    let resolver = IntentResolver::new();
    for phrase in corpus() {
        assert!(
            resolver.parse(phrase).is_some(),
            "corpus phrase failed to resolve: {phrase:?}"
        );
    }
}

#[test]
fn overlaps_are_documented_order_dependencies() {
    let resolver = IntentResolver::new();
    for phrase in corpus() {
        let matches = resolver.matching_rules(phrase);
        for pair in matches.windows(2) {
            let (first, second) = (pair[0], pair[1]);
            assert!(
                DOCUMENTED_OVERLAPS.contains(&(first, second)),
                "undocumented overlap on {phrase:?}: {first} and {second} both match"
            );
        }
    }
}

#[test]
fn first_listed_entry_wins() {
    let resolver = IntentResolver::new();
    for phrase in corpus() {
        let matches = resolver.matching_rules(phrase);
        let parsed = resolver.parse(phrase).unwrap();
        assert_eq!(
            parsed.matched_rule, matches[0],
            "parse did not pick the first matching entry for {phrase:?}"
        );
    }
}

#[test]
fn parse_is_idempotent_and_pure() {
    let resolver = IntentResolver::new();
    for phrase in corpus() {
        assert_eq!(resolver.parse(phrase), resolver.parse(phrase));
    }
}

#[test]
fn whitespace_and_case_are_ignored() {
    let resolver = IntentResolver::new();
    let variants = ["open my cart", "  OPEN MY CART  ", "Open   my Cart!"];
    for variant in variants {
        assert_eq!(
            resolver.parse(variant).map(|c| c.intent),
            Some(Intent::NavigateCart),
            "variant failed: {variant:?}"
        );
    }
}

#[test]
fn recognizer_noise_misses_cleanly() {
    let resolver = IntentResolver::new();
    // "cart" misheard as "court": no entry should fire
    assert!(resolver.parse("add this to my court").is_none());
    assert!(resolver.parse("open my court").is_none());
}

#[test]
fn parameters_extract() {
    let resolver = IntentResolver::new();

    match resolver.parse("search for walnut desk organizer").unwrap().intent {
        Intent::Search { query } => assert_eq!(query, "walnut desk organizer"),
        other => panic!("expected search, got {other:?}"),
    }

    match resolver.parse("set quantity to seven").unwrap().intent {
        Intent::ChangeQuantity { quantity } => assert_eq!(quantity, 7),
        other => panic!("expected quantity change, got {other:?}"),
    }

    match resolver.parse("pin code 1 2 3 4").unwrap().intent {
        Intent::PinLogin { pin } => assert_eq!(pin, "1234"),
        other => panic!("expected pin login, got {other:?}"),
    }
}
