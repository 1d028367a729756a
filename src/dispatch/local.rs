//! Local command executor
//!
//! The power-user surface behind the global push-to-talk shortcut: a dense
//! hand-tuned ruleset matching raw transcripts directly, including phrasings
//! the structured table doesn't carry (quantities inline with product names,
//! zip codes, wishlist and address commands). Every rule resolves to the
//! shared [`CommerceActions`] layer, so behavior stays consistent with the
//! other dispatch surfaces.

use std::sync::Arc;

use regex::Regex;

use crate::Result;
use crate::commerce::{ActionOutcome, CommerceActions, ProductRef};
use crate::intent::{normalize, parse_quantity};
use crate::store::Route;

use super::NOT_UNDERSTOOD;

/// Words that refer to the current page's product rather than naming one
const DEICTIC_WORDS: &[&str] = &["this", "it", "that", "this one", "this item", "this product"];

struct Rules {
    add_named: Regex,
    add_bare: Regex,
    buy_now: Regex,
    remove: Regex,
    quantity: Regex,
    search: Regex,
    zip: Regex,
    pin: Regex,
    street: Regex,
    city: Regex,
    wishlist_add: Regex,
    wishlist_remove: Regex,
    order_status: Regex,
    compare: Regex,
}

impl Rules {
    fn new() -> Self {
        let re = |p: &str| Regex::new(p).expect("local ruleset regex");
        Self {
            add_named: re(r"^add (?:(\w+) )?(.+?) to (?:my |the )?(?:cart|basket)$"),
            add_bare: re(r"\badd (?:this |it |that )?to (?:my |the )?(?:cart|basket)\b"),
            buy_now: re(r"\bbuy (?:(\w+) )?(?:(.+?) )?now\b"),
            remove: re(r"^remove (.+?)(?: from (?:my |the )?cart)?$"),
            quantity: re(r"\b(?:change|set|update|make) (?:the )?quantity (?:to )?(\w+)\b|\bquantity (\w+)\b"),
            search: re(r"^(?:search for|search|find|look for|show me) (.+)$"),
            zip: re(r"\b(?:zip|postal)(?: code)?(?: is)?\s+(\d[\d\s]{3,})"),
            pin: re(r"\b(?:pin|p i n)(?:\s+(?:code|number))?\s+(\d[\d\s]{3,})"),
            street: re(r"^(?:my )?street(?: is| address is)?\s+(.+)$"),
            city: re(r"^(?:my )?city(?: is)?\s+(.+)$"),
            wishlist_add: re(r"^(?:add (.+?) to (?:my )?wishlist|save (?:this|it|that)(?: for later)?)$"),
            wishlist_remove: re(r"^remove (.+?) from (?:my )?wishlist$"),
            order_status: re(r"\b(?:where'?s my order|order status|track my order)\b"),
            compare: re(r"^compare (.+?) (?:with|and|to) (.+)$"),
        }
    }
}

/// Executes raw transcripts against the dense ruleset
pub struct LocalExecutor {
    actions: Arc<CommerceActions>,
    rules: Rules,
}

impl LocalExecutor {
    /// Create an executor over the shared action layer
    #[must_use]
    pub fn new(actions: Arc<CommerceActions>) -> Self {
        Self {
            actions,
            rules: Rules::new(),
        }
    }

    /// Execute a transcript. Never returns an error: failures become
    /// `success: false` outcomes with a spoken message.
    pub async fn execute(&self, transcript: &str) -> ActionOutcome {
        let normalized = normalize(transcript);
        if normalized.is_empty() {
            return ActionOutcome::fail(NOT_UNDERSTOOD);
        }

        match self.run(&normalized).await {
            Ok(Some(outcome)) => outcome,
            Ok(None) => {
                tracing::debug!(transcript = %normalized, "no local rule matched");
                ActionOutcome::fail(NOT_UNDERSTOOD)
            }
            Err(e) => {
                tracing::warn!(transcript = %normalized, error = %e, "command failed");
                ActionOutcome::fail(e.spoken_message())
            }
        }
    }

    /// Match the normalized transcript against the ruleset.
    /// `Ok(None)` means no rule recognized the input.
    #[allow(clippy::too_many_lines)]
    async fn run(&self, t: &str) -> Result<Option<ActionOutcome>> {
        let actions = &self.actions;

        // Account and session
        if let Some(caps) = self.rules.pin.captures(t) {
            let pin: String = caps[1].chars().filter(char::is_ascii_digit).collect();
            return actions.pin_login(&pin).await.map(Some);
        }
        if contains_any(t, &["sign out", "log out", "log off"]) {
            return actions.sign_out().map(Some);
        }

        // Checkout flow sits ahead of cart phrases, same precedence the
        // structured table uses
        if contains_any(t, &["confirm order", "confirm my order", "place my order", "place order", "submit order"])
        {
            return actions.confirm_order().await.map(Some);
        }
        if contains_any(t, &["checkout", "check out"]) {
            return actions.checkout().await.map(Some);
        }
        if let Some(caps) = self.rules.zip.captures(t) {
            let zip: String = caps[1].chars().filter(char::is_ascii_digit).collect();
            return actions.set_zip(&zip).await.map(Some);
        }
        if let Some(caps) = self.rules.street.captures(t) {
            return actions.update_address(Some(caps[1].trim()), None).map(Some);
        }
        if let Some(caps) = self.rules.city.captures(t) {
            return actions.update_address(None, Some(caps[1].trim())).map(Some);
        }

        // Wishlist rules run before cart add/remove so "remove X from
        // wishlist" never falls through to the cart rule
        if let Some(caps) = self.rules.wishlist_remove.captures(t) {
            let target = product_ref_from(caps[1].trim());
            return actions.wishlist_remove(&target).await.map(Some);
        }
        if let Some(caps) = self.rules.wishlist_add.captures(t) {
            let target = caps
                .get(1)
                .map_or_else(ProductRef::current_page, |m| product_ref_from(m.as_str().trim()));
            return actions.wishlist_add(&target).await.map(Some);
        }
        if contains_any(t, &["read my wishlist", "open my wishlist", "show my wishlist", "view wishlist"]) {
            return actions.wishlist_view().await.map(Some);
        }

        // Cart mutations
        if self.rules.add_bare.is_match(t) {
            return actions.add_to_cart(&ProductRef::current_page(), None).await.map(Some);
        }
        if let Some(caps) = self.rules.add_named.captures(t) {
            let quantity = caps.get(1).and_then(|m| parse_quantity(m.as_str()));
            // First word wasn't a quantity: it belongs to the product name
            let name = if quantity.is_some() {
                caps[2].to_string()
            } else {
                match caps.get(1) {
                    Some(m) => format!("{} {}", m.as_str(), &caps[2]),
                    None => caps[2].to_string(),
                }
            };
            let target = product_ref_from(name.trim());
            return actions.add_to_cart(&target, quantity).await.map(Some);
        }
        if let Some(caps) = self.rules.buy_now.captures(t) {
            let quantity = caps.get(1).and_then(|m| parse_quantity(m.as_str()));
            // A non-quantity first word is part of the product name
            let name = match (quantity, caps.get(1), caps.get(2)) {
                (None, Some(head), Some(rest)) => {
                    Some(format!("{} {}", head.as_str(), rest.as_str()))
                }
                (_, _, Some(rest)) => Some(rest.as_str().to_string()),
                (None, Some(head), None) => Some(head.as_str().to_string()),
                _ => None,
            };
            let target = name.as_deref().map_or_else(ProductRef::current_page, |n| {
                product_ref_from(n.trim())
            });
            return actions.buy_now(&target, quantity).await.map(Some);
        }
        if let Some(caps) = self.rules.quantity.captures(t) {
            let word = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
            let Some(quantity) = word.and_then(parse_quantity) else {
                return Ok(Some(ActionOutcome::fail(
                    "I didn't catch the quantity. Try: set quantity to two.",
                )));
            };
            return actions
                .change_quantity(&ProductRef::current_page(), quantity)
                .await
                .map(Some);
        }
        if let Some(caps) = self.rules.remove.captures(t) {
            let target = product_ref_from(caps[1].trim());
            return actions.remove_item(&target).await.map(Some);
        }

        // Cart and order reads
        if contains_any(t, &["what's in my cart", "whats in my cart", "read my cart", "read the cart"]) {
            return actions.view_cart().await.map(Some);
        }
        if contains_any(t, &["open my cart", "open the cart", "open cart", "go to cart", "go to my cart", "view cart", "show cart"])
        {
            return actions.navigate(Route::Cart).map(Some);
        }
        if self.rules.order_status.is_match(t) {
            return actions.order_status(None).await.map(Some);
        }
        if contains_any(t, &["my orders", "view orders", "order history"]) {
            return actions.view_orders().await.map(Some);
        }

        // Catalog
        if let Some(caps) = self.rules.compare.captures(t) {
            let a = product_ref_from(caps[1].trim());
            let b = product_ref_from(caps[2].trim());
            return actions.compare(&a, &b).await.map(Some);
        }
        if contains_any(t, &["read the reviews", "read reviews", "any reviews"]) {
            return actions.read_reviews(&ProductRef::current_page()).await.map(Some);
        }
        if contains_any(t, &["recommend", "what do you suggest", "suggest something"]) {
            return actions.recommend().await.map(Some);
        }
        if contains_any(t, &["next product", "next result", "next item", "next one"]) {
            return actions.step_product(true).map(Some);
        }
        if contains_any(t, &["previous product", "previous result", "previous item", "last one"]) {
            return actions.step_product(false).map(Some);
        }
        if let Some(caps) = self.rules.search.captures(t) {
            return actions.search(caps[1].trim()).await.map(Some);
        }

        // Page reading and navigation
        if contains_any(t, &["read this product", "read the product", "describe this", "tell me about this"]) {
            return actions.read_product().await.map(Some);
        }
        if contains_any(t, &["read this page", "read the page", "read page", "where am i"]) {
            return actions.read_page().await.map(Some);
        }
        if contains_any(t, &["go back", "back up"]) {
            return actions.go_back().map(Some);
        }
        if contains_any(t, &["go home", "home page", "take me home", "main page"]) {
            return actions.navigate(Route::Home).map(Some);
        }

        // Preferences and assistant
        if contains_any(t, &["high contrast on", "enable high contrast", "turn on high contrast"]) {
            return actions.set_high_contrast(true).map(Some);
        }
        if contains_any(t, &["high contrast off", "disable high contrast", "turn off high contrast"]) {
            return actions.set_high_contrast(false).map(Some);
        }
        if contains_any(t, &["bigger text", "larger text", "increase text", "text bigger", "text larger"]) {
            return actions.adjust_text_size(true).map(Some);
        }
        if contains_any(t, &["smaller text", "decrease text", "text smaller"]) {
            return actions.adjust_text_size(false).map(Some);
        }
        if contains_any(t, &["open assistant", "open the assistant", "start conversation", "talk to the assistant"])
        {
            return actions.open_assistant().map(Some);
        }
        if contains_any(t, &["help", "what can i say", "what can you do"]) {
            return actions.show_help().map(Some);
        }

        Ok(None)
    }
}

/// True when the transcript contains any of the listed phrases
fn contains_any(t: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| t.contains(p))
}

/// Turn a spoken object into a product reference: deictic words mean the
/// current page, anything else is a name lookup
fn product_ref_from(object: &str) -> ProductRef {
    if DEICTIC_WORDS.contains(&object) {
        ProductRef::current_page()
    } else {
        ProductRef::by_name(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deictic_words_mean_current_page() {
        assert!(product_ref_from("this").name.is_none());
        assert!(product_ref_from("that").name.is_none());
        assert_eq!(
            product_ref_from("walnut organizer").name.as_deref(),
            Some("walnut organizer")
        );
    }

    #[test]
    fn rules_compile() {
        let _ = Rules::new();
    }
}
