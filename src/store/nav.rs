//! Navigation state
//!
//! Routes are the storefront's page identities. Executors re-derive page
//! context from this store at execution time, never from the trigger event,
//! because the user may have navigated between utterance and dispatch.

use std::sync::Mutex;

use tokio::sync::watch;

/// A storefront page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Landing page
    Home,
    /// Product detail page
    Product(String),
    /// Search results page
    Search(String),
    /// Cart page
    Cart,
    /// Wishlist page
    Wishlist,
    /// Checkout page
    Checkout,
    /// Order history page
    Orders,
    /// Login page
    Login,
    /// Help page
    Help,
}

impl Route {
    /// URL path for this route
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Product(id) => format!("/product/{id}"),
            Self::Search(query) => format!("/search?q={}", urlencoding::encode(query)),
            Self::Cart => "/cart".to_string(),
            Self::Wishlist => "/wishlist".to_string(),
            Self::Checkout => "/checkout".to_string(),
            Self::Orders => "/orders".to_string(),
            Self::Login => "/login".to_string(),
            Self::Help => "/help".to_string(),
        }
    }

    /// Spoken name of the page
    #[must_use]
    pub fn spoken_name(&self) -> String {
        match self {
            Self::Home => "the home page".to_string(),
            Self::Product(id) => format!("the product page for item {id}"),
            Self::Search(query) => format!("search results for {query}"),
            Self::Cart => "your cart".to_string(),
            Self::Wishlist => "your wishlist".to_string(),
            Self::Checkout => "checkout".to_string(),
            Self::Orders => "your orders".to_string(),
            Self::Login => "the login page".to_string(),
            Self::Help => "the help page".to_string(),
        }
    }

    /// Product id when this is a product detail page
    #[must_use]
    pub fn product_id(&self) -> Option<&str> {
        match self {
            Self::Product(id) => Some(id),
            _ => None,
        }
    }
}

struct NavInner {
    route: Route,
    history: Vec<Route>,
    navigations: u64,
}

/// Current route plus history, with a subscription channel
pub struct NavState {
    inner: Mutex<NavInner>,
    route_tx: watch::Sender<Route>,
}

impl NavState {
    /// Create nav state at the home page
    #[must_use]
    pub fn new() -> Self {
        let (route_tx, _) = watch::channel(Route::Home);
        Self {
            inner: Mutex::new(NavInner {
                route: Route::Home,
                history: Vec::new(),
                navigations: 0,
            }),
            route_tx,
        }
    }

    /// Navigate to a route, pushing the previous one onto history
    pub fn navigate(&self, route: Route) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        tracing::debug!(from = %inner.route.path(), to = %route.path(), "navigate");
        let previous = std::mem::replace(&mut inner.route, route.clone());
        inner.history.push(previous);
        inner.navigations += 1;
        drop(inner);
        self.route_tx.send_replace(route);
    }

    /// Navigate back to the previous route, if any. Returns the new route.
    pub fn back(&self) -> Option<Route> {
        let mut inner = self.inner.lock().ok()?;
        let previous = inner.history.pop()?;
        inner.route = previous.clone();
        inner.navigations += 1;
        drop(inner);
        self.route_tx.send_replace(previous.clone());
        Some(previous)
    }

    /// Current route
    #[must_use]
    pub fn current(&self) -> Route {
        self.inner
            .lock()
            .map_or(Route::Home, |inner| inner.route.clone())
    }

    /// Total navigations performed; tests assert a command navigates
    /// exactly once
    #[must_use]
    pub fn navigation_count(&self) -> u64 {
        self.inner.lock().map_or(0, |inner| inner.navigations)
    }

    /// Subscribe to route changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.route_tx.subscribe()
    }
}

impl Default for NavState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigate_updates_route_and_counter() {
        let nav = NavState::new();
        assert_eq!(nav.current(), Route::Home);
        assert_eq!(nav.navigation_count(), 0);

        nav.navigate(Route::Cart);
        assert_eq!(nav.current(), Route::Cart);
        assert_eq!(nav.navigation_count(), 1);
    }

    #[test]
    fn back_pops_history() {
        let nav = NavState::new();
        nav.navigate(Route::Product("42".into()));
        nav.navigate(Route::Cart);

        assert_eq!(nav.back(), Some(Route::Product("42".into())));
        assert_eq!(nav.current(), Route::Product("42".into()));

        assert_eq!(nav.back(), Some(Route::Home));
        assert_eq!(nav.back(), None);
    }

    #[test]
    fn search_path_is_encoded() {
        let route = Route::Search("desk organizer".into());
        assert_eq!(route.path(), "/search?q=desk%20organizer");
    }

    #[test]
    fn product_context_only_on_product_pages() {
        assert_eq!(Route::Product("42".into()).product_id(), Some("42"));
        assert_eq!(Route::Cart.product_id(), None);
    }
}
