//! Application state stores
//!
//! Each store is an explicitly constructed service object: interior-mutable
//! behind a mutex, with a `watch` channel so UI readers can subscribe to
//! snapshots. Mutations are serialized at the store boundary; whichever
//! executor runs last wins. Derived values (cart count, totals) are always
//! recomputed from the authoritative backend snapshot handed to `replace`,
//! never from a pre-mutation local copy.

mod nav;

pub use nav::{NavState, Route};

use std::sync::Mutex;

use tokio::sync::watch;

use crate::{Error, Result};

/// Minimum text scale, percent
const TEXT_SCALE_MIN: u16 = 80;

/// Maximum text scale, percent
const TEXT_SCALE_MAX: u16 = 160;

/// Text scale adjustment step, percent
const TEXT_SCALE_STEP: u16 = 10;

/// A signed-in storefront user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    /// Backend user id
    pub user_id: String,
    /// Display name for spoken confirmations
    pub display_name: String,
}

/// Holds the current authentication session, if any
pub struct AuthState {
    session: Mutex<Option<UserSession>>,
}

impl AuthState {
    /// Create a signed-out auth store
    #[must_use]
    pub const fn new() -> Self {
        Self {
            session: Mutex::new(None),
        }
    }

    /// Install a session after a successful login
    pub fn sign_in(&self, session: UserSession) {
        tracing::info!(user = %session.user_id, "signed in");
        if let Ok(mut current) = self.session.lock() {
            *current = Some(session);
        }
    }

    /// Clear the session
    pub fn sign_out(&self) {
        if let Ok(mut current) = self.session.lock() {
            *current = None;
        }
    }

    /// Current session, if signed in
    #[must_use]
    pub fn current(&self) -> Option<UserSession> {
        self.session.lock().ok().and_then(|s| s.clone())
    }

    /// Current session or a reportable not-authenticated failure
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAuthenticated`] when no user is signed in.
    pub fn require(&self) -> Result<UserSession> {
        self.current()
            .ok_or_else(|| Error::NotAuthenticated("no active user session".to_string()))
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}

/// One line of the cart as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// Product id
    pub product_id: String,
    /// Product name
    pub name: String,
    /// Unit price in cents
    pub unit_price_cents: u64,
    /// Quantity in cart
    pub quantity: u32,
}

/// Derived cart summary broadcast to subscribed readers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CartSummary {
    /// Total number of units across all lines
    pub item_count: u32,
    /// Total price in cents
    pub total_cents: u64,
}

/// Client-side view of the server-backed cart
pub struct CartView {
    lines: Mutex<Vec<CartLine>>,
    summary_tx: watch::Sender<CartSummary>,
}

impl CartView {
    /// Create an empty cart view
    #[must_use]
    pub fn new() -> Self {
        let (summary_tx, _) = watch::channel(CartSummary::default());
        Self {
            lines: Mutex::new(Vec::new()),
            summary_tx,
        }
    }

    /// Replace the view with a fresh backend snapshot and rebroadcast
    /// the derived summary
    pub fn replace(&self, lines: Vec<CartLine>) {
        let summary = CartSummary {
            item_count: lines.iter().map(|l| l.quantity).sum(),
            total_cents: lines
                .iter()
                .map(|l| l.unit_price_cents * u64::from(l.quantity))
                .sum(),
        };
        if let Ok(mut current) = self.lines.lock() {
            *current = lines;
        }
        self.summary_tx.send_replace(summary);
    }

    /// Current lines
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Current derived summary
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        *self.summary_tx.borrow()
    }

    /// Subscribe to summary changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSummary> {
        self.summary_tx.subscribe()
    }
}

impl Default for CartView {
    fn default() -> Self {
        Self::new()
    }
}

/// One saved wishlist entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishlistLine {
    /// Product id
    pub product_id: String,
    /// Product name
    pub name: String,
}

/// Client-side view of the server-backed wishlist
pub struct WishlistView {
    lines: Mutex<Vec<WishlistLine>>,
    count_tx: watch::Sender<usize>,
}

impl WishlistView {
    /// Create an empty wishlist view
    #[must_use]
    pub fn new() -> Self {
        let (count_tx, _) = watch::channel(0);
        Self {
            lines: Mutex::new(Vec::new()),
            count_tx,
        }
    }

    /// Replace the view with a fresh backend snapshot
    pub fn replace(&self, lines: Vec<WishlistLine>) {
        self.count_tx.send_replace(lines.len());
        if let Ok(mut current) = self.lines.lock() {
            *current = lines;
        }
    }

    /// Current entries
    #[must_use]
    pub fn lines(&self) -> Vec<WishlistLine> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Subscribe to entry-count changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.count_tx.subscribe()
    }
}

impl Default for WishlistView {
    fn default() -> Self {
        Self::new()
    }
}

/// Shipping address being assembled on the checkout page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    /// Street line
    pub street: String,
    /// City
    pub city: String,
    /// Region / state
    pub region: String,
    /// ZIP / postal code
    pub zip: String,
}

impl Address {
    /// True when enough of the address is present to place an order
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.street.is_empty() && !self.city.is_empty() && !self.zip.is_empty()
    }
}

/// Checkout address store
pub struct CheckoutAddress {
    tx: watch::Sender<Address>,
}

impl CheckoutAddress {
    /// Create an empty address store
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Address::default());
        Self { tx }
    }

    /// Current address snapshot
    #[must_use]
    pub fn current(&self) -> Address {
        self.tx.borrow().clone()
    }

    /// Set the ZIP code, optionally filling city and region from a lookup
    pub fn set_zip(&self, zip: &str, city_region: Option<(String, String)>) {
        self.tx.send_modify(|addr| {
            addr.zip = zip.to_string();
            if let Some((city, region)) = city_region {
                addr.city = city;
                addr.region = region;
            }
        });
    }

    /// Set the street line
    pub fn set_street(&self, street: &str) {
        self.tx.send_modify(|addr| addr.street = street.to_string());
    }

    /// Set the city
    pub fn set_city(&self, city: &str) {
        self.tx.send_modify(|addr| addr.city = city.to_string());
    }

    /// Subscribe to address changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Address> {
        self.tx.subscribe()
    }
}

impl Default for CheckoutAddress {
    fn default() -> Self {
        Self::new()
    }
}

/// Accessibility preferences snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefsSnapshot {
    /// High contrast theme enabled
    pub high_contrast: bool,
    /// Text scale, percent of default
    pub text_scale: u16,
}

impl Default for PrefsSnapshot {
    fn default() -> Self {
        Self {
            high_contrast: false,
            text_scale: 100,
        }
    }
}

/// Accessibility preference store
pub struct Preferences {
    tx: watch::Sender<PrefsSnapshot>,
}

impl Preferences {
    /// Create a preference store with defaults
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(PrefsSnapshot::default());
        Self { tx }
    }

    /// Current snapshot
    #[must_use]
    pub fn current(&self) -> PrefsSnapshot {
        *self.tx.borrow()
    }

    /// Enable or disable the high contrast theme
    pub fn set_high_contrast(&self, enabled: bool) {
        self.tx.send_modify(|p| p.high_contrast = enabled);
    }

    /// Step the text scale up or down, clamped to the supported range.
    /// Returns the new scale.
    pub fn adjust_text_scale(&self, increase: bool) -> u16 {
        let mut result = 0;
        self.tx.send_modify(|p| {
            p.text_scale = if increase {
                (p.text_scale + TEXT_SCALE_STEP).min(TEXT_SCALE_MAX)
            } else {
                p.text_scale.saturating_sub(TEXT_SCALE_STEP).max(TEXT_SCALE_MIN)
            };
            result = p.text_scale;
        });
        result
    }

    /// Subscribe to preference changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PrefsSnapshot> {
        self.tx.subscribe()
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self::new()
    }
}

/// Voice UI indicator snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoiceUiSnapshot {
    /// Microphone is actively capturing
    pub listening: bool,
    /// Assistant panel is open
    pub assistant_open: bool,
}

/// Voice UI state store (listening indicator, assistant panel)
pub struct VoiceUi {
    tx: watch::Sender<VoiceUiSnapshot>,
}

impl VoiceUi {
    /// Create with all indicators off
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(VoiceUiSnapshot::default());
        Self { tx }
    }

    /// Current snapshot
    #[must_use]
    pub fn current(&self) -> VoiceUiSnapshot {
        *self.tx.borrow()
    }

    /// Set the listening indicator
    pub fn set_listening(&self, listening: bool) {
        self.tx.send_modify(|s| s.listening = listening);
    }

    /// Open or close the assistant panel
    pub fn set_assistant_open(&self, open: bool) {
        self.tx.send_modify(|s| s.assistant_open = open);
    }

    /// Subscribe to indicator changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<VoiceUiSnapshot> {
        self.tx.subscribe()
    }
}

impl Default for VoiceUi {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cart_summary_recomputed_on_replace() {
        let cart = CartView::new();
        assert_eq!(cart.summary(), CartSummary::default());

        cart.replace(vec![
            CartLine {
                product_id: "42".into(),
                name: "Walnut desk organizer".into(),
                unit_price_cents: 1000,
                quantity: 2,
            },
            CartLine {
                product_id: "7".into(),
                name: "Brass bookend".into(),
                unit_price_cents: 2500,
                quantity: 1,
            },
        ]);

        let summary = cart.summary();
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.total_cents, 4500);
    }

    #[test]
    fn auth_require_reports_not_authenticated() {
        let auth = AuthState::new();
        assert!(matches!(auth.require(), Err(Error::NotAuthenticated(_))));

        auth.sign_in(UserSession {
            user_id: "u1".into(),
            display_name: "Ada".into(),
        });
        assert_eq!(auth.require().unwrap().user_id, "u1");

        auth.sign_out();
        assert!(auth.current().is_none());
    }

    #[test]
    fn zip_sets_even_without_lookup_result() {
        let address = CheckoutAddress::new();
        address.set_zip("10001", None);
        assert_eq!(address.current().zip, "10001");
        assert!(address.current().city.is_empty());

        address.set_zip("10001", Some(("New York".into(), "NY".into())));
        let addr = address.current();
        assert_eq!(addr.city, "New York");
        assert_eq!(addr.region, "NY");
    }

    #[test]
    fn text_scale_clamps() {
        let prefs = Preferences::new();
        for _ in 0..20 {
            prefs.adjust_text_scale(true);
        }
        assert_eq!(prefs.current().text_scale, TEXT_SCALE_MAX);

        for _ in 0..20 {
            prefs.adjust_text_scale(false);
        }
        assert_eq!(prefs.current().text_scale, TEXT_SCALE_MIN);
    }
}
