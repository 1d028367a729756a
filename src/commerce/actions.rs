//! Business operations shared by every dispatch surface
//!
//! Each operation performs at most one primary mutation or navigation,
//! re-derives page context at execution time, and returns an
//! [`ActionOutcome`] whose `success` flag reflects whether the mutation
//! actually occurred, not merely whether the command was recognized.
//! Server-backed mutations gate on the auth store first, so a missing
//! session is reported before any side effect.

use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::store::{
    AuthState, CartView, CheckoutAddress, NavState, Preferences, Route, VoiceUi, WishlistLine,
    WishlistView,
};
use crate::{Error, Result};

use super::backend::{OrderLine, Product, StorefrontBackend};
use super::format_usd;

/// How a command referred to a product, in resolution priority order:
/// explicit id, then name lookup, then current-page context.
#[derive(Debug, Clone, Default)]
pub struct ProductRef {
    /// Explicit backend product id
    pub id: Option<String>,
    /// Free-text product name to search for
    pub name: Option<String>,
}

impl ProductRef {
    /// Refer to the product on the current page
    #[must_use]
    pub const fn current_page() -> Self {
        Self {
            id: None,
            name: None,
        }
    }

    /// Refer to a product by explicit id
    #[must_use]
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: None,
        }
    }

    /// Refer to a product by name
    #[must_use]
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
        }
    }
}

/// Result of one business operation
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    /// Whether the mutation/navigation actually occurred
    pub success: bool,
    /// Human-readable confirmation or guidance, spoken and toasted
    pub message: String,
    /// Structured payload for the streaming tool surface
    pub data: serde_json::Value,
}

impl ActionOutcome {
    /// Successful outcome with no extra payload
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: serde_json::Value::Null,
        }
    }

    /// Successful outcome with a structured payload
    #[must_use]
    pub fn ok_with(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }

    /// Recognized command that could not be carried out
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: serde_json::Value::Null,
        }
    }
}

/// Search results the user is stepping through with next/previous
#[derive(Default)]
struct BrowseState {
    results: Vec<Product>,
    cursor: usize,
}

/// The single implementation of every storefront operation
pub struct CommerceActions {
    backend: Arc<dyn StorefrontBackend>,
    auth: Arc<AuthState>,
    nav: Arc<NavState>,
    cart: Arc<CartView>,
    wishlist: Arc<WishlistView>,
    address: Arc<CheckoutAddress>,
    prefs: Arc<Preferences>,
    voice_ui: Arc<VoiceUi>,
    browse: Mutex<BrowseState>,
}

impl CommerceActions {
    /// Wire the action layer to its stores and backend
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        backend: Arc<dyn StorefrontBackend>,
        auth: Arc<AuthState>,
        nav: Arc<NavState>,
        cart: Arc<CartView>,
        wishlist: Arc<WishlistView>,
        address: Arc<CheckoutAddress>,
        prefs: Arc<Preferences>,
        voice_ui: Arc<VoiceUi>,
    ) -> Self {
        Self {
            backend,
            auth,
            nav,
            cart,
            wishlist,
            address,
            prefs,
            voice_ui,
            browse: Mutex::new(BrowseState::default()),
        }
    }

    /// Resolve a product reference: explicit id, then name search, then the
    /// product page the user is currently on. This priority order is
    /// canonical across all three dispatch surfaces.
    async fn resolve_product(&self, target: &ProductRef) -> Result<Product> {
        if let Some(id) = &target.id {
            return self
                .backend
                .product(id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("product {id}")));
        }

        if let Some(name) = &target.name {
            let hits = self.backend.search(name).await?;
            return hits
                .into_iter()
                .next()
                .ok_or_else(|| Error::NotFound(format!("a product called {name}")));
        }

        // Context is re-derived here, at execution time
        if let Some(id) = self.nav.current().product_id() {
            return self
                .backend
                .product(id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("product {id}")));
        }

        Err(Error::NotFound(
            "a product to act on. No product was specified".to_string(),
        ))
    }

    /// Re-read the authoritative cart and update the view
    async fn refresh_cart(&self, user_id: &str) -> Result<()> {
        let lines = self.backend.cart_items(user_id).await?;
        self.cart.replace(lines);
        Ok(())
    }

    /// Re-read the authoritative wishlist and update the view
    async fn refresh_wishlist(&self, user_id: &str) -> Result<()> {
        let products = self.backend.wishlist(user_id).await?;
        self.wishlist.replace(
            products
                .into_iter()
                .map(|p| WishlistLine {
                    product_id: p.id,
                    name: p.name,
                })
                .collect(),
        );
        Ok(())
    }

    /// Add a product to the cart
    ///
    /// # Errors
    ///
    /// Returns error when the user is not signed in, the product cannot be
    /// resolved, or the backend rejects the mutation.
    pub async fn add_to_cart(
        &self,
        target: &ProductRef,
        quantity: Option<u32>,
    ) -> Result<ActionOutcome> {
        let user = self.auth.require()?;
        let product = self.resolve_product(target).await?;

        if !product.in_stock {
            return Ok(ActionOutcome::fail(format!(
                "{} is currently out of stock.",
                product.name
            )));
        }

        let quantity = quantity.unwrap_or(1).max(1);
        self.backend
            .add_cart_item(&user.user_id, &product.id, quantity)
            .await?;
        self.refresh_cart(&user.user_id).await?;

        let summary = self.cart.summary();
        let line_total = product.price_cents * u64::from(quantity);
        let message = if quantity == 1 {
            format!(
                "Added {} to your cart for {}. Cart total is {}.",
                product.name,
                format_usd(line_total),
                format_usd(summary.total_cents)
            )
        } else {
            format!(
                "Added {quantity} of {} to your cart for {}. Cart total is {}.",
                product.name,
                format_usd(line_total),
                format_usd(summary.total_cents)
            )
        };

        tracing::info!(product = %product.id, quantity, "added to cart");
        Ok(ActionOutcome::ok_with(
            message,
            json!({
                "product_id": product.id,
                "quantity": quantity,
                "cart_item_count": summary.item_count,
                "cart_total_cents": summary.total_cents,
            }),
        ))
    }

    /// Add to cart and go straight to checkout
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::add_to_cart`].
    pub async fn buy_now(
        &self,
        target: &ProductRef,
        quantity: Option<u32>,
    ) -> Result<ActionOutcome> {
        let added = self.add_to_cart(target, quantity).await?;
        if !added.success {
            return Ok(added);
        }
        self.nav.navigate(Route::Checkout);
        Ok(ActionOutcome::ok_with(
            format!("{} Taking you to checkout.", added.message),
            added.data,
        ))
    }

    /// Set the quantity of a product already in the cart
    ///
    /// # Errors
    ///
    /// Returns error when the user is not signed in or the backend rejects
    /// the mutation.
    pub async fn change_quantity(
        &self,
        target: &ProductRef,
        quantity: u32,
    ) -> Result<ActionOutcome> {
        let user = self.auth.require()?;
        let product = self.resolve_product(target).await?;

        self.refresh_cart(&user.user_id).await?;
        if !self.cart.lines().iter().any(|l| l.product_id == product.id) {
            return Ok(ActionOutcome::fail(format!(
                "{} isn't in your cart.",
                product.name
            )));
        }

        self.backend
            .update_cart_quantity(&user.user_id, &product.id, quantity)
            .await?;
        self.refresh_cart(&user.user_id).await?;

        let summary = self.cart.summary();
        Ok(ActionOutcome::ok_with(
            format!(
                "Set {} to {quantity}. Cart total is {}.",
                product.name,
                format_usd(summary.total_cents)
            ),
            json!({ "product_id": product.id, "quantity": quantity }),
        ))
    }

    /// Remove a product from the cart
    ///
    /// # Errors
    ///
    /// Returns error when the user is not signed in or the backend rejects
    /// the mutation.
    pub async fn remove_item(&self, target: &ProductRef) -> Result<ActionOutcome> {
        let user = self.auth.require()?;
        let product = self.resolve_product(target).await?;

        self.refresh_cart(&user.user_id).await?;
        if !self.cart.lines().iter().any(|l| l.product_id == product.id) {
            return Ok(ActionOutcome::fail(format!(
                "{} isn't in your cart.",
                product.name
            )));
        }

        self.backend
            .remove_cart_item(&user.user_id, &product.id)
            .await?;
        self.refresh_cart(&user.user_id).await?;

        let summary = self.cart.summary();
        Ok(ActionOutcome::ok_with(
            format!(
                "Removed {} from your cart. {} left, totaling {}.",
                product.name,
                summary.item_count,
                format_usd(summary.total_cents)
            ),
            json!({ "product_id": product.id }),
        ))
    }

    /// Describe the current cart contents
    ///
    /// # Errors
    ///
    /// Returns error when the user is not signed in or the cart cannot be
    /// read.
    pub async fn view_cart(&self) -> Result<ActionOutcome> {
        let user = self.auth.require()?;
        self.refresh_cart(&user.user_id).await?;

        let lines = self.cart.lines();
        if lines.is_empty() {
            return Ok(ActionOutcome::ok("Your cart is empty."));
        }

        let summary = self.cart.summary();
        let listing = lines
            .iter()
            .map(|l| format!("{} {}", l.quantity, l.name))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(ActionOutcome::ok_with(
            format!(
                "Your cart has {} items totaling {}: {listing}.",
                summary.item_count,
                format_usd(summary.total_cents)
            ),
            json!({
                "item_count": summary.item_count,
                "total_cents": summary.total_cents,
            }),
        ))
    }

    /// Navigate to a page. Exactly one navigation per call.
    ///
    /// # Errors
    ///
    /// Infallible today; kept fallible for parity with the other operations.
    pub fn navigate(&self, route: Route) -> Result<ActionOutcome> {
        let spoken = route.spoken_name();
        self.nav.navigate(route);
        Ok(ActionOutcome::ok(format!("Opened {spoken}.")))
    }

    /// Navigate back to the previous page
    ///
    /// # Errors
    ///
    /// Infallible today; kept fallible for parity with the other operations.
    pub fn go_back(&self) -> Result<ActionOutcome> {
        match self.nav.back() {
            Some(route) => Ok(ActionOutcome::ok(format!("Back to {}.", route.spoken_name()))),
            None => Ok(ActionOutcome::fail("There's no previous page.")),
        }
    }

    /// Search the catalog and open the results page
    ///
    /// # Errors
    ///
    /// Returns error when the backend search fails.
    pub async fn search(&self, query: &str) -> Result<ActionOutcome> {
        let results = self.backend.search(query).await?;
        self.nav.navigate(Route::Search(query.to_string()));

        let message = if results.is_empty() {
            format!("No results for {query}.")
        } else {
            let top = results
                .iter()
                .take(3)
                .map(|p| format!("{}, {}", p.name, format_usd(p.price_cents)))
                .collect::<Vec<_>>()
                .join("; ");
            format!("Found {} results for {query}. Top results: {top}.", results.len())
        };

        let data = json!({
            "query": query,
            "count": results.len(),
            "results": results.iter().take(5).collect::<Vec<_>>(),
        });

        if let Ok(mut browse) = self.browse.lock() {
            browse.results = results;
            browse.cursor = 0;
        }

        Ok(ActionOutcome::ok_with(message, data))
    }

    /// Step to the next or previous search result and open its page
    ///
    /// # Errors
    ///
    /// Returns error when the navigation target product cannot be read.
    pub fn step_product(&self, forward: bool) -> Result<ActionOutcome> {
        let Ok(mut browse) = self.browse.lock() else {
            return Ok(ActionOutcome::fail(
                "Search results are unavailable right now.",
            ));
        };
        if browse.results.is_empty() {
            return Ok(ActionOutcome::fail(
                "No search results to move through. Try searching for something first.",
            ));
        }

        let last = browse.results.len() - 1;
        let next = if forward {
            if browse.cursor >= last {
                return Ok(ActionOutcome::fail("You're at the last result."));
            }
            browse.cursor + 1
        } else {
            if browse.cursor == 0 {
                return Ok(ActionOutcome::fail("You're at the first result."));
            }
            browse.cursor - 1
        };

        browse.cursor = next;
        let product = browse.results[next].clone();
        drop(browse);

        self.nav.navigate(Route::Product(product.id.clone()));
        Ok(ActionOutcome::ok_with(
            format!(
                "Result {} of {}: {}, {}.",
                next + 1,
                last + 1,
                product.name,
                format_usd(product.price_cents)
            ),
            json!({ "product_id": product.id }),
        ))
    }

    /// Resolve a product and open its detail page
    ///
    /// # Errors
    ///
    /// Returns error when the product cannot be resolved.
    pub async fn open_product(&self, target: &ProductRef) -> Result<ActionOutcome> {
        let product = self.resolve_product(target).await?;
        self.nav.navigate(Route::Product(product.id.clone()));
        Ok(ActionOutcome::ok_with(
            format!(
                "{}, {}. {}",
                product.name,
                format_usd(product.price_cents),
                product.description
            ),
            serde_json::to_value(&product)?,
        ))
    }

    /// Read out the product on the current page
    ///
    /// # Errors
    ///
    /// Returns error when the product cannot be read from the backend.
    pub async fn read_product(&self) -> Result<ActionOutcome> {
        let Some(id) = self.nav.current().product_id().map(ToString::to_string) else {
            return Ok(ActionOutcome::fail(
                "You're not on a product page. Open a product first.",
            ));
        };

        let product = self
            .backend
            .product(&id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("product {id}")))?;

        let rating = product
            .rating
            .map_or_else(String::new, |r| format!(" Rated {r:.1} out of 5."));
        let stock = if product.in_stock {
            "In stock."
        } else {
            "Currently out of stock."
        };
        Ok(ActionOutcome::ok_with(
            format!(
                "{}, {}. {}{rating} {stock}",
                product.name,
                format_usd(product.price_cents),
                product.description
            ),
            serde_json::to_value(&product)?,
        ))
    }

    /// Describe the current page
    ///
    /// # Errors
    ///
    /// Returns error when reading page contents from the backend fails.
    pub async fn read_page(&self) -> Result<ActionOutcome> {
        match self.nav.current() {
            Route::Product(_) => self.read_product().await,
            Route::Cart => self.view_cart().await,
            Route::Checkout => {
                let addr = self.address.current();
                if addr.is_complete() {
                    Ok(ActionOutcome::ok(format!(
                        "You're on checkout. Shipping to {} in {}, zip {}. Say confirm order to place it.",
                        addr.street, addr.city, addr.zip
                    )))
                } else {
                    Ok(ActionOutcome::ok(
                        "You're on checkout. Your shipping address is incomplete. Tell me your street, city, and zip code.",
                    ))
                }
            }
            Route::Search(query) => {
                let count = self.browse.lock().map(|b| b.results.len()).unwrap_or(0);
                Ok(ActionOutcome::ok(format!(
                    "Search results for {query}: {count} items. Say next product to step through them.",
                )))
            }
            route => Ok(ActionOutcome::ok(format!(
                "You're on {}.",
                route.spoken_name()
            ))),
        }
    }

    /// Go to checkout if the cart has anything in it
    ///
    /// # Errors
    ///
    /// Returns error when the user is not signed in or the cart cannot be
    /// read.
    pub async fn checkout(&self) -> Result<ActionOutcome> {
        let user = self.auth.require()?;
        self.refresh_cart(&user.user_id).await?;

        if self.cart.lines().is_empty() {
            return Ok(ActionOutcome::fail(
                "Your cart is empty. Add something before checking out.",
            ));
        }

        self.nav.navigate(Route::Checkout);
        let summary = self.cart.summary();
        Ok(ActionOutcome::ok(format!(
            "Checkout: {} items, {}. Tell me your shipping address, then say confirm order.",
            summary.item_count,
            format_usd(summary.total_cents)
        )))
    }

    /// Place the order being assembled on the checkout page
    ///
    /// # Errors
    ///
    /// Returns error when the user is not signed in, the cart cannot be
    /// read, or order creation fails.
    pub async fn confirm_order(&self) -> Result<ActionOutcome> {
        let user = self.auth.require()?;

        if self.nav.current() != Route::Checkout {
            return Ok(ActionOutcome::fail(
                "You're not on the checkout page. Say go to checkout first.",
            ));
        }

        self.refresh_cart(&user.user_id).await?;
        let lines = self.cart.lines();
        if lines.is_empty() {
            return Ok(ActionOutcome::fail("Your cart is empty."));
        }

        let addr = self.address.current();
        if !addr.is_complete() {
            return Ok(ActionOutcome::fail(
                "Your shipping address is incomplete. Tell me your street, city, and zip code first.",
            ));
        }

        let items: Vec<OrderLine> = lines
            .iter()
            .map(|l| OrderLine {
                product_id: l.product_id.clone(),
                name: l.name.clone(),
                quantity: l.quantity,
                unit_price_cents: l.unit_price_cents,
            })
            .collect();
        let total = self.cart.summary().total_cents;

        let order_id = self.backend.create_order(&user.user_id, &items, &addr).await?;
        self.refresh_cart(&user.user_id).await?;
        self.nav.navigate(Route::Orders);

        tracing::info!(order_id = %order_id, total_cents = total, "order placed");
        Ok(ActionOutcome::ok_with(
            format!(
                "Order placed! Your order number is {order_id}, total {}.",
                format_usd(total)
            ),
            json!({ "order_id": order_id, "total_cents": total }),
        ))
    }

    /// Set the checkout ZIP code, filling city and region when the lookup
    /// collaborator recognizes it. Lookup failure is tolerated: the ZIP is
    /// still set and the confirmation stays generic.
    ///
    /// # Errors
    ///
    /// Infallible today; kept fallible for parity with the other operations.
    pub async fn set_zip(&self, zip: &str) -> Result<ActionOutcome> {
        let city_region = match self.backend.lookup_zip(zip).await {
            Ok(Some(found)) => Some((found.city, found.region)),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(zip, error = %e, "zip lookup failed, setting zip without city");
                None
            }
        };

        let resolved_city = city_region.as_ref().map(|(city, _)| city.clone());
        self.address.set_zip(zip, city_region);

        let message = resolved_city.map_or_else(
            || format!("Zip code updated to {zip}."),
            |city| format!("Zip code updated to {zip}, {city}."),
        );
        Ok(ActionOutcome::ok(message))
    }

    /// Update individual shipping address fields
    ///
    /// # Errors
    ///
    /// Infallible today; kept fallible for parity with the other operations.
    pub fn update_address(
        &self,
        street: Option<&str>,
        city: Option<&str>,
    ) -> Result<ActionOutcome> {
        if street.is_none() && city.is_none() {
            return Ok(ActionOutcome::fail(
                "Tell me which part of the address to update.",
            ));
        }
        if let Some(street) = street {
            self.address.set_street(street);
        }
        if let Some(city) = city {
            self.address.set_city(city);
        }
        Ok(ActionOutcome::ok("Shipping address updated."))
    }

    /// Add a product to the wishlist
    ///
    /// # Errors
    ///
    /// Returns error when the user is not signed in, the product cannot be
    /// resolved, or the backend rejects the mutation.
    pub async fn wishlist_add(&self, target: &ProductRef) -> Result<ActionOutcome> {
        let user = self.auth.require()?;
        let product = self.resolve_product(target).await?;

        self.backend
            .add_wishlist_item(&user.user_id, &product.id)
            .await?;
        self.refresh_wishlist(&user.user_id).await?;

        Ok(ActionOutcome::ok_with(
            format!("Saved {} to your wishlist.", product.name),
            json!({ "product_id": product.id }),
        ))
    }

    /// Remove a product from the wishlist
    ///
    /// # Errors
    ///
    /// Returns error when the user is not signed in, the product cannot be
    /// resolved, or the backend rejects the mutation.
    pub async fn wishlist_remove(&self, target: &ProductRef) -> Result<ActionOutcome> {
        let user = self.auth.require()?;
        let product = self.resolve_product(target).await?;

        self.backend
            .remove_wishlist_item(&user.user_id, &product.id)
            .await?;
        self.refresh_wishlist(&user.user_id).await?;

        Ok(ActionOutcome::ok_with(
            format!("Removed {} from your wishlist.", product.name),
            json!({ "product_id": product.id }),
        ))
    }

    /// Describe the wishlist contents
    ///
    /// # Errors
    ///
    /// Returns error when the user is not signed in or the wishlist cannot
    /// be read.
    pub async fn wishlist_view(&self) -> Result<ActionOutcome> {
        let user = self.auth.require()?;
        self.refresh_wishlist(&user.user_id).await?;

        let lines = self.wishlist.lines();
        if lines.is_empty() {
            return Ok(ActionOutcome::ok("Your wishlist is empty."));
        }
        let listing = lines
            .iter()
            .map(|l| l.name.clone())
            .collect::<Vec<_>>()
            .join(", ");
        Ok(ActionOutcome::ok(format!(
            "Your wishlist has {} items: {listing}.",
            lines.len()
        )))
    }

    /// Enable or disable the high contrast theme
    ///
    /// # Errors
    ///
    /// Infallible today; kept fallible for parity with the other operations.
    pub fn set_high_contrast(&self, enabled: bool) -> Result<ActionOutcome> {
        self.prefs.set_high_contrast(enabled);
        Ok(ActionOutcome::ok(if enabled {
            "High contrast is on."
        } else {
            "High contrast is off."
        }))
    }

    /// Step the text size up or down
    ///
    /// # Errors
    ///
    /// Infallible today; kept fallible for parity with the other operations.
    pub fn adjust_text_size(&self, increase: bool) -> Result<ActionOutcome> {
        let scale = self.prefs.adjust_text_scale(increase);
        Ok(ActionOutcome::ok(format!(
            "Text size {} to {scale} percent.",
            if increase { "increased" } else { "decreased" }
        )))
    }

    /// Sign the current user out and return to the home page
    ///
    /// # Errors
    ///
    /// Infallible today; kept fallible for parity with the other operations.
    pub fn sign_out(&self) -> Result<ActionOutcome> {
        if self.auth.current().is_none() {
            return Ok(ActionOutcome::fail("You're not signed in."));
        }
        self.auth.sign_out();
        self.cart.replace(Vec::new());
        self.wishlist.replace(Vec::new());
        self.nav.navigate(Route::Home);
        Ok(ActionOutcome::ok("Signed out. See you soon."))
    }

    /// Exchange an accessibility PIN for a session
    ///
    /// # Errors
    ///
    /// Returns error when the backend PIN check fails.
    pub async fn pin_login(&self, pin: &str) -> Result<ActionOutcome> {
        let Some(session) = self.backend.verify_pin(pin).await? else {
            return Ok(ActionOutcome::fail(
                "That PIN wasn't recognized. Please try again.",
            ));
        };

        let name = session.display_name.clone();
        let user_id = session.user_id.clone();
        self.auth.sign_in(session);
        self.refresh_cart(&user_id).await?;
        self.refresh_wishlist(&user_id).await?;

        Ok(ActionOutcome::ok(format!("Welcome back, {name}.")))
    }

    /// Open the assistant panel
    ///
    /// # Errors
    ///
    /// Infallible today; kept fallible for parity with the other operations.
    pub fn open_assistant(&self) -> Result<ActionOutcome> {
        self.voice_ui.set_assistant_open(true);
        Ok(ActionOutcome::ok("Assistant open. How can I help?"))
    }

    /// Open the help page and describe what can be said
    ///
    /// # Errors
    ///
    /// Infallible today; kept fallible for parity with the other operations.
    pub fn show_help(&self) -> Result<ActionOutcome> {
        self.nav.navigate(Route::Help);
        Ok(ActionOutcome::ok(
            "You can say things like: search for lamps, add to cart, go to checkout, \
             what's in my cart, zip code one zero zero zero one, or confirm order.",
        ))
    }

    /// Describe order history
    ///
    /// # Errors
    ///
    /// Returns error when the user is not signed in or orders cannot be
    /// read.
    pub async fn view_orders(&self) -> Result<ActionOutcome> {
        let user = self.auth.require()?;
        let orders = self.backend.orders(&user.user_id).await?;

        if orders.is_empty() {
            return Ok(ActionOutcome::ok("You haven't placed any orders yet."));
        }

        let latest = &orders[0];
        Ok(ActionOutcome::ok_with(
            format!(
                "You have {} orders. The latest, number {}, is {} with a total of {}.",
                orders.len(),
                latest.id,
                latest.status,
                format_usd(latest.total_cents)
            ),
            json!({ "count": orders.len(), "latest": latest }),
        ))
    }

    /// Status of a specific order, or the latest when no id is given
    ///
    /// # Errors
    ///
    /// Returns error when the user is not signed in or the order cannot be
    /// read.
    pub async fn order_status(&self, order_id: Option<&str>) -> Result<ActionOutcome> {
        let user = self.auth.require()?;

        let order = match order_id {
            Some(id) => self
                .backend
                .order(&user.user_id, id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("order {id}")))?,
            None => {
                let mut orders = self.backend.orders(&user.user_id).await?;
                if orders.is_empty() {
                    return Ok(ActionOutcome::ok("You haven't placed any orders yet."));
                }
                orders.remove(0)
            }
        };

        Ok(ActionOutcome::ok_with(
            format!(
                "Order {} is {}. Total {}.",
                order.id,
                order.status,
                format_usd(order.total_cents)
            ),
            serde_json::to_value(&order)?,
        ))
    }

    /// Read out reviews for a product
    ///
    /// # Errors
    ///
    /// Returns error when the product cannot be resolved or reviews cannot
    /// be read.
    pub async fn read_reviews(&self, target: &ProductRef) -> Result<ActionOutcome> {
        let product = self.resolve_product(target).await?;
        let reviews = self.backend.reviews(&product.id).await?;

        if reviews.is_empty() {
            return Ok(ActionOutcome::ok(format!(
                "{} has no reviews yet.",
                product.name
            )));
        }

        let first = &reviews[0];
        Ok(ActionOutcome::ok_with(
            format!(
                "{} has {} reviews. {} says, {} stars: {}",
                product.name,
                reviews.len(),
                first.author,
                first.rating,
                first.body
            ),
            json!({ "product_id": product.id, "reviews": reviews }),
        ))
    }

    /// Compare two products by price and rating
    ///
    /// # Errors
    ///
    /// Returns error when either product cannot be resolved.
    pub async fn compare(&self, a: &ProductRef, b: &ProductRef) -> Result<ActionOutcome> {
        let first = self.resolve_product(a).await?;
        let second = self.resolve_product(b).await?;

        let cheaper = if first.price_cents <= second.price_cents {
            &first
        } else {
            &second
        };
        Ok(ActionOutcome::ok_with(
            format!(
                "{} costs {} and {} costs {}. {} is cheaper.",
                first.name,
                format_usd(first.price_cents),
                second.name,
                format_usd(second.price_cents),
                cheaper.name
            ),
            json!({ "products": [first, second] }),
        ))
    }

    /// Recommend products similar to the current page or cart contents
    ///
    /// # Errors
    ///
    /// Returns error when the backend search fails.
    pub async fn recommend(&self) -> Result<ActionOutcome> {
        // Seed from the current product page, then the cart, then fall back
        // to a generic popularity query
        let seed = if let Some(id) = self.nav.current().product_id() {
            self.backend.product(id).await?.map(|p| p.category)
        } else {
            None
        };

        let seed = match seed {
            Some(category) => category,
            None => match self.cart.lines().first() {
                Some(line) => self
                    .backend
                    .product(&line.product_id)
                    .await?
                    .map_or_else(|| "popular".to_string(), |p| p.category),
                None => "popular".to_string(),
            },
        };

        let results = self.backend.search(&seed).await?;
        if results.is_empty() {
            return Ok(ActionOutcome::ok(
                "I don't have any recommendations right now.",
            ));
        }

        let listing = results
            .iter()
            .take(3)
            .map(|p| format!("{}, {}", p.name, format_usd(p.price_cents)))
            .collect::<Vec<_>>()
            .join("; ");
        Ok(ActionOutcome::ok_with(
            format!("You might like: {listing}."),
            json!({ "results": results.iter().take(3).collect::<Vec<_>>() }),
        ))
    }
}
