//! Intent resolution
//!
//! Maps free-form utterances to a closed set of intents with deterministic
//! tie-breaking: an ordered pattern table, evaluated top to bottom, first
//! match wins. No scoring; confidence is a fixed constant.

mod patterns;
mod resolver;

pub use resolver::{IntentResolver, ParsedCommand};

/// The closed enumeration of user request purposes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Go to the landing page
    NavigateHome,
    /// Open the cart page
    NavigateCart,
    /// Search the catalog
    Search {
        /// Free-text query
        query: String,
    },
    /// Add the current or named product to the cart
    AddToCart,
    /// Add to cart and jump to checkout
    BuyNow,
    /// Go to the checkout page
    Checkout,
    /// Read the current page aloud
    ReadPage,
    /// List available commands
    ShowHelp,
    /// Turn the high contrast theme on
    EnableHighContrast,
    /// Turn the high contrast theme off
    DisableHighContrast,
    /// Step the text size up
    IncreaseTextSize,
    /// Step the text size down
    DecreaseTextSize,
    /// Sign the current user out
    SignOut,
    /// Set the quantity of the current cart item
    ChangeQuantity {
        /// Requested quantity
        quantity: u32,
    },
    /// Remove the current or named product from the cart
    RemoveItem,
    /// Log in with an accessibility PIN
    PinLogin {
        /// Spoken PIN digits
        pin: String,
    },
    /// Open the assistant panel
    OpenAssistant,
    /// Step to the next search result
    NextProduct,
    /// Step to the previous search result
    PreviousProduct,
    /// Read the current product aloud
    ReadProduct,
    /// Place the order on the checkout page
    ConfirmOrder,
}

/// Normalize a transcript for matching: lowercase, strip punctuation,
/// collapse whitespace
#[must_use]
pub fn normalize(transcript: &str) -> String {
    let lowered = transcript.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() || c == '\'' {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a spoken quantity: digits or small number words
#[must_use]
pub fn parse_quantity(word: &str) -> Option<u32> {
    if let Ok(n) = word.parse::<u32>() {
        return Some(n);
    }
    match word {
        "one" | "a" | "an" => Some(1),
        "two" | "to" | "too" => Some(2),
        "three" => Some(3),
        "four" | "for" => Some(4),
        "five" => Some(5),
        "six" => Some(6),
        "seven" => Some(7),
        "eight" => Some(8),
        "nine" => Some(9),
        "ten" => Some(10),
        "eleven" => Some(11),
        "twelve" => Some(12),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_noise() {
        assert_eq!(normalize("  Add to CART!  "), "add to cart");
        assert_eq!(normalize("what's   in my cart?"), "what's in my cart");
    }

    #[test]
    fn quantity_words_and_recognizer_homophones() {
        assert_eq!(parse_quantity("3"), Some(3));
        assert_eq!(parse_quantity("three"), Some(3));
        // Recognizers commonly emit "to"/"for" for "two"/"four"
        assert_eq!(parse_quantity("to"), Some(2));
        assert_eq!(parse_quantity("for"), Some(4));
        assert_eq!(parse_quantity("lots"), None);
    }
}
