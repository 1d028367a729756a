//! Persistence/service boundary
//!
//! The storefront's product, cart, wishlist and order data live in a managed
//! backend; this trait is everything the gateway consumes from it. All
//! methods return plain data records. Authentication failures surface as
//! [`Error::NotAuthenticated`] from the implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::store::{Address, CartLine, UserSession};

/// A catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Backend product id
    pub id: String,
    /// Display name
    pub name: String,
    /// Short description, spoken on the product page
    pub description: String,
    /// Unit price in cents
    pub price_cents: u64,
    /// Category slug, used for recommendations
    pub category: String,
    /// Average review rating, if any reviews exist
    pub rating: Option<f32>,
    /// Whether the product can be added to the cart
    pub in_stock: bool,
}

/// A product review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Reviewer display name
    pub author: String,
    /// Star rating, 1 to 5
    pub rating: u8,
    /// Review text
    pub body: String,
}

/// One line of a placed order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    /// Product id
    pub product_id: String,
    /// Product name at order time
    pub name: String,
    /// Quantity ordered
    pub quantity: u32,
    /// Unit price at order time, cents
    pub unit_price_cents: u64,
}

/// A placed order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Backend order id
    pub id: String,
    /// Ordered lines
    pub items: Vec<OrderLine>,
    /// Order total in cents
    pub total_cents: u64,
    /// Fulfillment status, e.g. "processing", "shipped"
    pub status: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// City and region returned by the ZIP lookup collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityRegion {
    /// City name
    pub city: String,
    /// Region / state abbreviation
    pub region: String,
}

/// Everything the gateway consumes from the storefront backend
#[async_trait]
pub trait StorefrontBackend: Send + Sync {
    /// Fetch a product by id; `None` when the id does not exist
    async fn product(&self, id: &str) -> Result<Option<Product>>;

    /// Full-text product search, best matches first
    async fn search(&self, query: &str) -> Result<Vec<Product>>;

    /// Current cart rows for a user, product data joined in
    async fn cart_items(&self, user_id: &str) -> Result<Vec<CartLine>>;

    /// Add `quantity` units of a product to a user's cart
    async fn add_cart_item(&self, user_id: &str, product_id: &str, quantity: u32) -> Result<()>;

    /// Set the quantity of a cart row; implementations may treat 0 as removal
    async fn update_cart_quantity(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> Result<()>;

    /// Remove a cart row
    async fn remove_cart_item(&self, user_id: &str, product_id: &str) -> Result<()>;

    /// Current wishlist products for a user
    async fn wishlist(&self, user_id: &str) -> Result<Vec<Product>>;

    /// Add a product to a user's wishlist
    async fn add_wishlist_item(&self, user_id: &str, product_id: &str) -> Result<()>;

    /// Remove a product from a user's wishlist
    async fn remove_wishlist_item(&self, user_id: &str, product_id: &str) -> Result<()>;

    /// Create an order from the given lines and shipping address,
    /// returning the new order id
    async fn create_order(
        &self,
        user_id: &str,
        items: &[OrderLine],
        address: &Address,
    ) -> Result<String>;

    /// Fetch one order by id
    async fn order(&self, user_id: &str, order_id: &str) -> Result<Option<OrderRecord>>;

    /// All orders for a user, newest first
    async fn orders(&self, user_id: &str) -> Result<Vec<OrderRecord>>;

    /// Reviews for a product
    async fn reviews(&self, product_id: &str) -> Result<Vec<Review>>;

    /// Exchange an accessibility PIN for a user session; `None` when the
    /// PIN is not recognized
    async fn verify_pin(&self, pin: &str) -> Result<Option<UserSession>>;

    /// Resolve a ZIP/postal code to city and region; `None` when unknown
    async fn lookup_zip(&self, zip: &str) -> Result<Option<CityRegion>>;
}
