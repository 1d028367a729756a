//! HTTP implementation of the storefront backend
//!
//! Talks to the managed backend's REST surface plus the standalone ZIP
//! lookup collaborator. ZIP results are stable, so they sit behind a small
//! TTL cache; cart/wishlist/order reads always go to the network.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::store::{Address, CartLine, UserSession};
use crate::{Error, Result};

use super::backend::{CityRegion, OrderLine, OrderRecord, Product, Review, StorefrontBackend};

/// How long a resolved ZIP stays cached
const ZIP_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Upper bound on cached ZIP entries
const ZIP_CACHE_CAPACITY: u64 = 1024;

/// Request timeout for backend calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Storefront backend over HTTP
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    zip_lookup_url: String,
    api_key: Option<secrecy::SecretString>,
    zip_cache: mini_moka::sync::Cache<String, CityRegion>,
}

#[derive(Deserialize)]
struct CartRowWire {
    product: Product,
    quantity: u32,
}

#[derive(Deserialize)]
struct CreatedOrderWire {
    id: String,
}

#[derive(Deserialize)]
struct PinSessionWire {
    user_id: String,
    display_name: String,
}

/// Response shape of the ZIP lookup collaborator
#[derive(Deserialize)]
struct ZipResponseWire {
    places: Vec<ZipPlaceWire>,
}

#[derive(Deserialize)]
struct ZipPlaceWire {
    #[serde(rename = "place name")]
    place_name: String,
    #[serde(rename = "state abbreviation")]
    state_abbreviation: String,
}

impl HttpBackend {
    /// Create a backend client
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed.
    pub fn new(
        base_url: String,
        zip_lookup_url: String,
        api_key: Option<secrecy::SecretString>,
    ) -> Result<Self> {
        // Catch malformed endpoints at construction, not on first request
        let parsed = url::Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("invalid backend url {base_url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "backend url must be http(s): {base_url}"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            zip_lookup_url: zip_lookup_url.trim_end_matches('/').to_string(),
            api_key,
            zip_cache: mini_moka::sync::Cache::builder()
                .max_capacity(ZIP_CACHE_CAPACITY)
                .time_to_live(ZIP_CACHE_TTL)
                .build(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, format!("{}{path}", self.base_url));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }
        builder
    }

    /// Map a non-success backend status to the error taxonomy
    async fn fail(what: &str, response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!(status = %status, body = %body, what, "backend error");
        match status.as_u16() {
            401 | 403 => Error::NotAuthenticated(format!("{what}: {status}")),
            429 => Error::RateLimited(format!("{what}: {status}")),
            500..=599 => Error::Upstream(format!("{what}: {status}")),
            _ => Error::Backend(format!("{what}: {status}: {body}")),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        what: &str,
        path: &str,
    ) -> Result<T> {
        let response = self.request(reqwest::Method::GET, path).send().await?;
        if !response.status().is_success() {
            return Err(Self::fail(what, response).await);
        }
        Ok(response.json().await?)
    }

    async fn send_ok(
        &self,
        what: &str,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(Self::fail(what, response).await);
        }
        Ok(response)
    }
}

#[async_trait]
impl StorefrontBackend for HttpBackend {
    async fn product(&self, id: &str) -> Result<Option<Product>> {
        let response = self
            .request(reqwest::Method::GET, &format!("/rest/v1/products/{id}"))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::fail("product", response).await);
        }
        Ok(Some(response.json().await?))
    }

    async fn search(&self, query: &str) -> Result<Vec<Product>> {
        let path = format!("/rest/v1/products?search={}", urlencoding::encode(query));
        self.get_json("search", &path).await
    }

    async fn cart_items(&self, user_id: &str) -> Result<Vec<CartLine>> {
        let path = format!("/rest/v1/cart?user_id={}", urlencoding::encode(user_id));
        let rows: Vec<CartRowWire> = self.get_json("cart", &path).await?;
        Ok(rows
            .into_iter()
            .map(|row| CartLine {
                product_id: row.product.id,
                name: row.product.name,
                unit_price_cents: row.product.price_cents,
                quantity: row.quantity,
            })
            .collect())
    }

    async fn add_cart_item(&self, user_id: &str, product_id: &str, quantity: u32) -> Result<()> {
        let builder = self
            .request(reqwest::Method::POST, "/rest/v1/cart")
            .json(&serde_json::json!({
                "user_id": user_id,
                "product_id": product_id,
                "quantity": quantity,
            }));
        self.send_ok("add to cart", builder).await?;
        Ok(())
    }

    async fn update_cart_quantity(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> Result<()> {
        let builder = self
            .request(
                reqwest::Method::PATCH,
                &format!("/rest/v1/cart/{product_id}"),
            )
            .json(&serde_json::json!({ "user_id": user_id, "quantity": quantity }));
        self.send_ok("update cart quantity", builder).await?;
        Ok(())
    }

    async fn remove_cart_item(&self, user_id: &str, product_id: &str) -> Result<()> {
        let builder = self.request(
            reqwest::Method::DELETE,
            &format!(
                "/rest/v1/cart/{product_id}?user_id={}",
                urlencoding::encode(user_id)
            ),
        );
        self.send_ok("remove from cart", builder).await?;
        Ok(())
    }

    async fn wishlist(&self, user_id: &str) -> Result<Vec<Product>> {
        let path = format!("/rest/v1/wishlist?user_id={}", urlencoding::encode(user_id));
        self.get_json("wishlist", &path).await
    }

    async fn add_wishlist_item(&self, user_id: &str, product_id: &str) -> Result<()> {
        let builder = self
            .request(reqwest::Method::POST, "/rest/v1/wishlist")
            .json(&serde_json::json!({ "user_id": user_id, "product_id": product_id }));
        self.send_ok("add to wishlist", builder).await?;
        Ok(())
    }

    async fn remove_wishlist_item(&self, user_id: &str, product_id: &str) -> Result<()> {
        let builder = self.request(
            reqwest::Method::DELETE,
            &format!(
                "/rest/v1/wishlist/{product_id}?user_id={}",
                urlencoding::encode(user_id)
            ),
        );
        self.send_ok("remove from wishlist", builder).await?;
        Ok(())
    }

    async fn create_order(
        &self,
        user_id: &str,
        items: &[OrderLine],
        address: &Address,
    ) -> Result<String> {
        let builder = self
            .request(reqwest::Method::POST, "/rest/v1/orders")
            .json(&serde_json::json!({
                "user_id": user_id,
                "items": items,
                "street": address.street,
                "city": address.city,
                "region": address.region,
                "zip": address.zip,
            }));
        let response = self.send_ok("create order", builder).await?;
        let created: CreatedOrderWire = response.json().await?;
        tracing::info!(order_id = %created.id, "order created");
        Ok(created.id)
    }

    async fn order(&self, user_id: &str, order_id: &str) -> Result<Option<OrderRecord>> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!(
                    "/rest/v1/orders/{order_id}?user_id={}",
                    urlencoding::encode(user_id)
                ),
            )
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::fail("order", response).await);
        }
        Ok(Some(response.json().await?))
    }

    async fn orders(&self, user_id: &str) -> Result<Vec<OrderRecord>> {
        let path = format!("/rest/v1/orders?user_id={}", urlencoding::encode(user_id));
        self.get_json("orders", &path).await
    }

    async fn reviews(&self, product_id: &str) -> Result<Vec<Review>> {
        self.get_json("reviews", &format!("/rest/v1/products/{product_id}/reviews"))
            .await
    }

    async fn verify_pin(&self, pin: &str) -> Result<Option<UserSession>> {
        let response = self
            .request(reqwest::Method::POST, "/auth/v1/pin")
            .json(&serde_json::json!({ "pin": pin }))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND
            || response.status() == reqwest::StatusCode::UNAUTHORIZED
        {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::fail("pin login", response).await);
        }
        let session: PinSessionWire = response.json().await?;
        Ok(Some(UserSession {
            user_id: session.user_id,
            display_name: session.display_name,
        }))
    }

    async fn lookup_zip(&self, zip: &str) -> Result<Option<CityRegion>> {
        if let Some(hit) = self.zip_cache.get(&zip.to_string()) {
            tracing::trace!(zip, "zip cache hit");
            return Ok(Some(hit));
        }

        let url = format!("{}/{}", self.zip_lookup_url, urlencoding::encode(zip));
        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::fail("zip lookup", response).await);
        }

        let wire: ZipResponseWire = response.json().await?;
        let Some(place) = wire.places.first() else {
            return Ok(None);
        };
        let resolved = CityRegion {
            city: place.place_name.clone(),
            region: place.state_abbreviation.clone(),
        };
        self.zip_cache.insert(zip.to_string(), resolved.clone());
        Ok(Some(resolved))
    }
}
