//! The ordered pattern table
//!
//! Table order is authoritative: more specific entries sit above general
//! ones that could also match the same utterance. Known order dependencies
//! are noted on the entries that rely on them.

use regex::Regex;

use super::{Intent, parse_quantity};

/// One entry of the ordered table
pub(crate) struct CommandPattern {
    /// Stable name for logging and the order-dependency test
    pub name: &'static str,
    /// Any of these matching selects the entry
    pub regexes: Vec<Regex>,
    /// Build the intent from the first matching capture set
    pub build: fn(&regex::Captures<'_>) -> Option<Intent>,
}

fn entry(
    name: &'static str,
    patterns: &[&str],
    build: fn(&regex::Captures<'_>) -> Option<Intent>,
) -> CommandPattern {
    CommandPattern {
        name,
        regexes: patterns
            .iter()
            .map(|p| Regex::new(p).expect("pattern table regex"))
            .collect(),
        build,
    }
}

/// Build the ordered pattern table
#[allow(clippy::too_many_lines)]
pub(crate) fn table() -> Vec<CommandPattern> {
    vec![
        entry(
            "pin_login",
            &[
                r"\b(?:pin|p i n)(?:\s+(?:code|number))?\s+(\d[\d\s]{3,})",
                r"\blog in with (?:pin\s+)?(\d[\d\s]{3,})",
            ],
            |caps| {
                let pin: String = caps.get(1)?.as_str().chars().filter(char::is_ascii_digit).collect();
                Some(Intent::PinLogin { pin })
            },
        ),
        entry(
            "confirm_order",
            &[r"\b(?:confirm|place|submit) (?:my |the )?order\b"],
            |_| Some(Intent::ConfirmOrder),
        ),
        // Above navigate_cart: "check out my cart" resolves here by design
        entry(
            "checkout",
            &[r"\b(?:go to |proceed to |take me to )?check ?out\b"],
            |_| Some(Intent::Checkout),
        ),
        entry(
            "buy_now",
            &[r"\bbuy (?:it |this |that )?now\b", r"\bpurchase (?:this |it )?now\b"],
            |_| Some(Intent::BuyNow),
        ),
        entry(
            "change_quantity",
            &[
                r"\b(?:change|set|update|make) (?:the )?quantity (?:to )?(\w+)\b",
                r"\bquantity (\w+)\b",
            ],
            |caps| {
                let quantity = parse_quantity(caps.get(1)?.as_str())?;
                Some(Intent::ChangeQuantity { quantity })
            },
        ),
        // Above navigate_cart: "remove this from my cart" mentions "cart"
        entry(
            "remove_item",
            &[
                r"\bremove (?:this|it|that)\b(?: from (?:my |the )?cart)?",
                r"\bremove (?:this |it |that )?from (?:my |the )?cart\b",
                r"\b(?:delete|take) (?:this|it|that) (?:out of|from) (?:my |the )?cart\b",
            ],
            |_| Some(Intent::RemoveItem),
        ),
        // Above navigate_cart: "add to cart" mentions "cart"
        entry(
            "add_to_cart",
            &[
                r"\badd (?:this |it |that )?to (?:my |the )?(?:cart|basket)\b",
                r"\bput (?:this|it|that) in (?:my |the )?(?:cart|basket)\b",
            ],
            |_| Some(Intent::AddToCart),
        ),
        entry(
            "navigate_cart",
            &[
                r"\b(?:open|show me|show|view|go to|take me to) (?:my |the )?cart\b",
                r"\bwhat'?s in my cart\b",
            ],
            |_| Some(Intent::NavigateCart),
        ),
        entry(
            "navigate_home",
            &[r"\b(?:go |navigate |take me )?(?:to )?(?:the )?home ?(?:page)?$", r"\bmain page\b"],
            |_| Some(Intent::NavigateHome),
        ),
        entry(
            "read_product",
            &[
                r"\b(?:read|describe) (?:this |the )?(?:product|item)\b",
                r"\btell me about (?:this|it)\b",
            ],
            |_| Some(Intent::ReadProduct),
        ),
        entry(
            "read_page",
            &[r"\bread (?:this |the )?page\b", r"\bwhere am i\b"],
            |_| Some(Intent::ReadPage),
        ),
        entry(
            "enable_high_contrast",
            &[r"\b(?:enable|turn on) high contrast\b", r"\bhigh contrast on\b"],
            |_| Some(Intent::EnableHighContrast),
        ),
        entry(
            "disable_high_contrast",
            &[r"\b(?:disable|turn off) high contrast\b", r"\bhigh contrast off\b"],
            |_| Some(Intent::DisableHighContrast),
        ),
        entry(
            "increase_text_size",
            &[
                r"\b(?:increase|bigger|larger) text\b",
                r"\bmake (?:the )?text (?:bigger|larger)\b",
            ],
            |_| Some(Intent::IncreaseTextSize),
        ),
        entry(
            "decrease_text_size",
            &[
                r"\b(?:decrease|smaller) text\b",
                r"\bmake (?:the )?text smaller\b",
            ],
            |_| Some(Intent::DecreaseTextSize),
        ),
        entry(
            "sign_out",
            &[r"\b(?:sign|log) (?:out|off)\b"],
            |_| Some(Intent::SignOut),
        ),
        entry(
            "open_assistant",
            &[
                r"\b(?:open|start) (?:the )?(?:assistant|conversation)\b",
                r"\btalk to (?:the )?assistant\b",
            ],
            |_| Some(Intent::OpenAssistant),
        ),
        entry(
            "next_product",
            &[r"\bnext (?:product|result|item|one)\b"],
            |_| Some(Intent::NextProduct),
        ),
        entry(
            "previous_product",
            &[r"\b(?:previous|last) (?:product|result|item|one)\b"],
            |_| Some(Intent::PreviousProduct),
        ),
        entry(
            "show_help",
            &[r"\bhelp\b", r"\bwhat can (?:i|you) (?:say|do)\b"],
            |_| Some(Intent::ShowHelp),
        ),
        // Last: the query capture is greedy and would swallow most of the
        // phrasings above ("show me my cart", "find the checkout")
        entry(
            "search",
            &[r"\b(?:search for|search|find|look for|show me) (.+)$"],
            |caps| {
                let query = caps.get(1)?.as_str().trim().to_string();
                if query.is_empty() {
                    return None;
                }
                Some(Intent::Search { query })
            },
        ),
    ]
}
