//! Shared test utilities

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use voxcart::commerce::{
    CityRegion, CommerceActions, OrderLine, OrderRecord, Product, Review, StorefrontBackend,
};
use voxcart::store::{
    Address, AuthState, CartLine, CheckoutAddress, NavState, Preferences, UserSession, VoiceUi,
    WishlistView, CartView,
};
use voxcart::{Error, Result};

/// In-memory storefront backend for tests
pub struct MockBackend {
    products: Mutex<HashMap<String, Product>>,
    carts: Mutex<HashMap<String, Vec<(String, u32)>>>,
    wishlists: Mutex<HashMap<String, Vec<String>>>,
    orders: Mutex<HashMap<String, Vec<OrderRecord>>>,
    reviews: Mutex<HashMap<String, Vec<Review>>>,
    pins: HashMap<String, UserSession>,
    zips: HashMap<String, CityRegion>,
    order_seq: AtomicU64,
    /// Raised to make ZIP lookups fail
    pub fail_zip_lookup: AtomicBool,
    /// Count of mutating calls, for no-side-effect assertions
    pub mutations: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        let mut products = HashMap::new();
        for product in [
            product("42", "Walnut desk organizer", 1000, "desk", true),
            product("7", "Brass bookend", 2500, "desk", true),
            product("9", "Ceramic mug", 1500, "kitchen", false),
        ] {
            products.insert(product.id.clone(), product);
        }

        let mut pins = HashMap::new();
        pins.insert(
            "2468".to_string(),
            UserSession {
                user_id: "u1".to_string(),
                display_name: "Ada".to_string(),
            },
        );

        let mut zips = HashMap::new();
        zips.insert(
            "10001".to_string(),
            CityRegion {
                city: "New York".to_string(),
                region: "NY".to_string(),
            },
        );

        Self {
            products: Mutex::new(products),
            carts: Mutex::new(HashMap::new()),
            wishlists: Mutex::new(HashMap::new()),
            orders: Mutex::new(HashMap::new()),
            reviews: Mutex::new(HashMap::new()),
            pins,
            zips,
            order_seq: AtomicU64::new(1000),
            fail_zip_lookup: AtomicBool::new(false),
            mutations: AtomicUsize::new(0),
        }
    }

    pub fn seed_review(&self, product_id: &str, author: &str, rating: u8, body: &str) {
        self.reviews
            .lock()
            .unwrap()
            .entry(product_id.to_string())
            .or_default()
            .push(Review {
                author: author.to_string(),
                rating,
                body: body.to_string(),
            });
    }

    pub fn cart_quantity(&self, user_id: &str, product_id: &str) -> u32 {
        self.carts
            .lock()
            .unwrap()
            .get(user_id)
            .and_then(|rows| {
                rows.iter()
                    .find(|(id, _)| id == product_id)
                    .map(|(_, qty)| *qty)
            })
            .unwrap_or(0)
    }

    fn count_mutation(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn product(id: &str, name: &str, price_cents: u64, category: &str, in_stock: bool) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("A fine {}.", name.to_lowercase()),
        price_cents,
        category: category.to_string(),
        rating: Some(4.2),
        in_stock,
    }
}

#[async_trait]
impl StorefrontBackend for MockBackend {
    async fn product(&self, id: &str) -> Result<Option<Product>> {
        Ok(self.products.lock().unwrap().get(id).cloned())
    }

    async fn search(&self, query: &str) -> Result<Vec<Product>> {
        // Token prefix matching either way, so "bookends" finds "bookend"
        let token_matches = |hay: &str, needle: &str| {
            hay.split_whitespace()
                .any(|word| word.starts_with(needle) || needle.starts_with(word))
        };
        let needle = query.to_lowercase();
        let mut hits: Vec<Product> = self
            .products
            .lock()
            .unwrap()
            .values()
            .filter(|p| {
                let name = p.name.to_lowercase();
                let category = p.category.to_lowercase();
                needle
                    .split_whitespace()
                    .all(|tok| token_matches(&name, tok) || token_matches(&category, tok))
            })
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(hits)
    }

    async fn cart_items(&self, user_id: &str) -> Result<Vec<CartLine>> {
        let products = self.products.lock().unwrap();
        Ok(self
            .carts
            .lock()
            .unwrap()
            .get(user_id)
            .map(|rows| {
                rows.iter()
                    .filter_map(|(id, qty)| {
                        products.get(id).map(|p| CartLine {
                            product_id: p.id.clone(),
                            name: p.name.clone(),
                            unit_price_cents: p.price_cents,
                            quantity: *qty,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn add_cart_item(&self, user_id: &str, product_id: &str, quantity: u32) -> Result<()> {
        self.count_mutation();
        let mut carts = self.carts.lock().unwrap();
        let rows = carts.entry(user_id.to_string()).or_default();
        if let Some(row) = rows.iter_mut().find(|(id, _)| id == product_id) {
            row.1 += quantity;
        } else {
            rows.push((product_id.to_string(), quantity));
        }
        Ok(())
    }

    async fn update_cart_quantity(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> Result<()> {
        self.count_mutation();
        let mut carts = self.carts.lock().unwrap();
        let rows = carts.entry(user_id.to_string()).or_default();
        if quantity == 0 {
            rows.retain(|(id, _)| id != product_id);
        } else if let Some(row) = rows.iter_mut().find(|(id, _)| id == product_id) {
            row.1 = quantity;
        }
        Ok(())
    }

    async fn remove_cart_item(&self, user_id: &str, product_id: &str) -> Result<()> {
        self.count_mutation();
        if let Some(rows) = self.carts.lock().unwrap().get_mut(user_id) {
            rows.retain(|(id, _)| id != product_id);
        }
        Ok(())
    }

    async fn wishlist(&self, user_id: &str) -> Result<Vec<Product>> {
        let products = self.products.lock().unwrap();
        Ok(self
            .wishlists
            .lock()
            .unwrap()
            .get(user_id)
            .map(|ids| ids.iter().filter_map(|id| products.get(id).cloned()).collect())
            .unwrap_or_default())
    }

    async fn add_wishlist_item(&self, user_id: &str, product_id: &str) -> Result<()> {
        self.count_mutation();
        let mut wishlists = self.wishlists.lock().unwrap();
        let ids = wishlists.entry(user_id.to_string()).or_default();
        if !ids.iter().any(|id| id == product_id) {
            ids.push(product_id.to_string());
        }
        Ok(())
    }

    async fn remove_wishlist_item(&self, user_id: &str, product_id: &str) -> Result<()> {
        self.count_mutation();
        if let Some(ids) = self.wishlists.lock().unwrap().get_mut(user_id) {
            ids.retain(|id| id != product_id);
        }
        Ok(())
    }

    async fn create_order(
        &self,
        user_id: &str,
        items: &[OrderLine],
        _address: &Address,
    ) -> Result<String> {
        self.count_mutation();
        let id = format!("ord-{}", self.order_seq.fetch_add(1, Ordering::SeqCst));
        let total_cents = items
            .iter()
            .map(|l| l.unit_price_cents * u64::from(l.quantity))
            .sum();
        self.orders
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_default()
            .insert(
                0,
                OrderRecord {
                    id: id.clone(),
                    items: items.to_vec(),
                    total_cents,
                    status: "processing".to_string(),
                    created_at: Utc::now(),
                },
            );
        // Order creation consumes the cart server-side
        self.carts.lock().unwrap().remove(user_id);
        Ok(id)
    }

    async fn order(&self, user_id: &str, order_id: &str) -> Result<Option<OrderRecord>> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .get(user_id)
            .and_then(|orders| orders.iter().find(|o| o.id == order_id).cloned()))
    }

    async fn orders(&self, user_id: &str) -> Result<Vec<OrderRecord>> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn reviews(&self, product_id: &str) -> Result<Vec<Review>> {
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .get(product_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn verify_pin(&self, pin: &str) -> Result<Option<UserSession>> {
        Ok(self.pins.get(pin).cloned())
    }

    async fn lookup_zip(&self, zip: &str) -> Result<Option<CityRegion>> {
        if self.fail_zip_lookup.load(Ordering::SeqCst) {
            return Err(Error::Upstream("zip lookup outage".to_string()));
        }
        Ok(self.zips.get(zip).cloned())
    }
}

/// A fully wired action layer over the mock backend
pub struct Harness {
    pub backend: Arc<MockBackend>,
    pub auth: Arc<AuthState>,
    pub nav: Arc<NavState>,
    pub cart: Arc<CartView>,
    pub wishlist: Arc<WishlistView>,
    pub address: Arc<CheckoutAddress>,
    pub prefs: Arc<Preferences>,
    pub voice_ui: Arc<VoiceUi>,
    pub actions: Arc<CommerceActions>,
}

impl Harness {
    pub fn new() -> Self {
        let backend = Arc::new(MockBackend::new());
        let auth = Arc::new(AuthState::new());
        let nav = Arc::new(NavState::new());
        let cart = Arc::new(CartView::new());
        let wishlist = Arc::new(WishlistView::new());
        let address = Arc::new(CheckoutAddress::new());
        let prefs = Arc::new(Preferences::new());
        let voice_ui = Arc::new(VoiceUi::new());

        let actions = Arc::new(CommerceActions::new(
            Arc::clone(&backend) as Arc<dyn StorefrontBackend>,
            Arc::clone(&auth),
            Arc::clone(&nav),
            Arc::clone(&cart),
            Arc::clone(&wishlist),
            Arc::clone(&address),
            Arc::clone(&prefs),
            Arc::clone(&voice_ui),
        ));

        Self {
            backend,
            auth,
            nav,
            cart,
            wishlist,
            address,
            prefs,
            voice_ui,
            actions,
        }
    }

    /// Sign in the seeded test user
    pub fn sign_in(&self) {
        self.auth.sign_in(UserSession {
            user_id: "u1".to_string(),
            display_name: "Ada".to_string(),
        });
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
