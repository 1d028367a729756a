//! Tool registry for the streaming voice session
//!
//! Every tool mirrors one operation of the shared action layer, so the
//! agent-driven path stays semantically equivalent to the local executors:
//! same product-id resolution priority, same authentication gate, same
//! error vocabulary. The advertised schema set and the dispatch table are
//! the same list, asserted equal by test.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::commerce::{ActionOutcome, CommerceActions, ProductRef};
use crate::store::Route;
use crate::{Error, Result};

use super::events::ToolSchema;

/// Parameter schema fragments shared by the product-addressed tools
fn product_params() -> Value {
    json!({
        "type": "object",
        "properties": {
            "product_id": {"type": "string", "description": "Backend product id"},
            "name": {"type": "string", "description": "Product name to search for"},
        },
    })
}

fn product_params_with_quantity() -> Value {
    json!({
        "type": "object",
        "properties": {
            "product_id": {"type": "string", "description": "Backend product id"},
            "name": {"type": "string", "description": "Product name to search for"},
            "quantity": {"type": "integer", "minimum": 1},
        },
    })
}

fn empty_params() -> Value {
    json!({"type": "object", "properties": {}})
}

/// Read a product reference from tool arguments
fn product_ref(args: &Value) -> ProductRef {
    ProductRef {
        id: args
            .get("product_id")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        name: args
            .get("name")
            .and_then(Value::as_str)
            .map(ToString::to_string),
    }
}

fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quantity_arg(args: &Value) -> Option<u32> {
    args.get("quantity").and_then(Value::as_u64).map(|q| q as u32)
}

/// The fixed mapping of tool name to implementation
pub struct ToolRegistry {
    actions: Arc<CommerceActions>,
    schemas: Vec<ToolSchema>,
}

impl ToolRegistry {
    /// Build the registry over the shared action layer
    #[must_use]
    pub fn new(actions: Arc<CommerceActions>) -> Self {
        let schema = |name: &'static str, description: &'static str, parameters: Value| {
            ToolSchema {
                kind: "function",
                name,
                description,
                parameters,
            }
        };

        let schemas = vec![
            schema(
                "search_products",
                "Search the catalog and open the results page",
                json!({
                    "type": "object",
                    "properties": {"query": {"type": "string"}},
                    "required": ["query"],
                }),
            ),
            schema(
                "view_product",
                "Open a product's detail page and describe it",
                product_params(),
            ),
            schema(
                "add_to_cart",
                "Add a product to the shopper's cart",
                product_params_with_quantity(),
            ),
            schema("view_cart", "List the cart contents and total", empty_params()),
            schema(
                "update_cart_quantity",
                "Set the quantity of a product already in the cart",
                product_params_with_quantity(),
            ),
            schema(
                "remove_from_cart",
                "Remove a product from the cart",
                product_params(),
            ),
            schema(
                "add_to_wishlist",
                "Save a product to the shopper's wishlist",
                product_params(),
            ),
            schema("view_wishlist", "List the wishlist contents", empty_params()),
            schema(
                "remove_from_wishlist",
                "Remove a product from the wishlist",
                product_params(),
            ),
            schema(
                "navigate",
                "Open a storefront page",
                json!({
                    "type": "object",
                    "properties": {"page": {
                        "type": "string",
                        "enum": ["home", "cart", "wishlist", "checkout", "orders", "login", "help"],
                    }},
                    "required": ["page"],
                }),
            ),
            schema(
                "get_reviews",
                "Read reviews for a product",
                product_params(),
            ),
            schema(
                "compare_products",
                "Compare two products by price and rating",
                json!({
                    "type": "object",
                    "properties": {
                        "first": {"type": "string", "description": "First product name or id"},
                        "second": {"type": "string", "description": "Second product name or id"},
                    },
                    "required": ["first", "second"],
                }),
            ),
            schema(
                "recommend_products",
                "Recommend products similar to the current page or cart",
                empty_params(),
            ),
            schema("view_orders", "Summarize the shopper's order history", empty_params()),
            schema(
                "get_order_status",
                "Status of one order, or the latest when no id is given",
                json!({
                    "type": "object",
                    "properties": {"order_id": {"type": "string"}},
                }),
            ),
            schema(
                "update_preferences",
                "Change accessibility preferences",
                json!({
                    "type": "object",
                    "properties": {
                        "high_contrast": {"type": "boolean"},
                        "text_size": {"type": "string", "enum": ["increase", "decrease"]},
                    },
                }),
            ),
            schema(
                "update_shipping_address",
                "Update the checkout shipping address; zip triggers a city lookup",
                json!({
                    "type": "object",
                    "properties": {
                        "street": {"type": "string"},
                        "city": {"type": "string"},
                        "zip": {"type": "string"},
                    },
                }),
            ),
            schema("checkout", "Go to checkout with the current cart", empty_params()),
            schema(
                "place_order",
                "Place the order assembled on the checkout page",
                empty_params(),
            ),
            schema("sign_out", "Sign the shopper out", empty_params()),
        ];

        Self { actions, schemas }
    }

    /// Schemas advertised in the session configuration
    #[must_use]
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.schemas.clone()
    }

    /// Advertised tool names, in schema order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.schemas.iter().map(|s| s.name).collect()
    }

    /// Dispatch one tool invocation. Unknown names are a recoverable
    /// [`Error::Tool`], logged by the caller, never a crash.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tool`] for unregistered names and propagates the
    /// action layer's failures.
    #[allow(clippy::too_many_lines)]
    pub async fn invoke(&self, name: &str, args: &Value) -> Result<ActionOutcome> {
        let actions = &self.actions;
        match name {
            "search_products" => {
                let Some(query) = str_arg(args, "query") else {
                    return Ok(ActionOutcome::fail("A search needs a query."));
                };
                actions.search(query).await
            }
            "view_product" => actions.open_product(&product_ref(args)).await,
            "add_to_cart" => {
                actions
                    .add_to_cart(&product_ref(args), quantity_arg(args))
                    .await
            }
            "view_cart" => actions.view_cart().await,
            "update_cart_quantity" => {
                let Some(quantity) = quantity_arg(args) else {
                    return Ok(ActionOutcome::fail("A quantity update needs a quantity."));
                };
                actions.change_quantity(&product_ref(args), quantity).await
            }
            "remove_from_cart" => actions.remove_item(&product_ref(args)).await,
            "add_to_wishlist" => actions.wishlist_add(&product_ref(args)).await,
            "view_wishlist" => actions.wishlist_view().await,
            "remove_from_wishlist" => actions.wishlist_remove(&product_ref(args)).await,
            "navigate" => {
                let route = match str_arg(args, "page") {
                    Some("home") => Route::Home,
                    Some("cart") => Route::Cart,
                    Some("wishlist") => Route::Wishlist,
                    Some("checkout") => Route::Checkout,
                    Some("orders") => Route::Orders,
                    Some("login") => Route::Login,
                    Some("help") => Route::Help,
                    other => {
                        return Ok(ActionOutcome::fail(format!(
                            "I can't open {}.",
                            other.unwrap_or("that page")
                        )));
                    }
                };
                actions.navigate(route)
            }
            "get_reviews" => actions.read_reviews(&product_ref(args)).await,
            "compare_products" => {
                let (Some(first), Some(second)) =
                    (str_arg(args, "first"), str_arg(args, "second"))
                else {
                    return Ok(ActionOutcome::fail("A comparison needs two products."));
                };
                actions
                    .compare(&ProductRef::by_name(first), &ProductRef::by_name(second))
                    .await
            }
            "recommend_products" => actions.recommend().await,
            "view_orders" => actions.view_orders().await,
            "get_order_status" => actions.order_status(str_arg(args, "order_id")).await,
            "update_preferences" => {
                let mut messages = Vec::new();
                if let Some(enabled) = args.get("high_contrast").and_then(Value::as_bool) {
                    messages.push(actions.set_high_contrast(enabled)?.message);
                }
                match str_arg(args, "text_size") {
                    Some("increase") => messages.push(actions.adjust_text_size(true)?.message),
                    Some("decrease") => messages.push(actions.adjust_text_size(false)?.message),
                    _ => {}
                }
                if messages.is_empty() {
                    return Ok(ActionOutcome::fail(
                        "Tell me which preference to change.",
                    ));
                }
                Ok(ActionOutcome::ok(messages.join(" ")))
            }
            "update_shipping_address" => {
                let zip_outcome = match str_arg(args, "zip") {
                    Some(zip) => Some(actions.set_zip(zip).await?),
                    None => None,
                };
                let street = str_arg(args, "street");
                let city = str_arg(args, "city");
                if street.is_some() || city.is_some() {
                    let outcome = actions.update_address(street, city)?;
                    let message = zip_outcome.map_or(outcome.message.clone(), |z| {
                        format!("{} {}", outcome.message, z.message)
                    });
                    return Ok(ActionOutcome::ok(message));
                }
                zip_outcome.map_or_else(
                    || {
                        Ok(ActionOutcome::fail(
                            "Tell me which part of the address to update.",
                        ))
                    },
                    Ok,
                )
            }
            "checkout" => actions.checkout().await,
            "place_order" => actions.confirm_order().await,
            "sign_out" => actions.sign_out(),
            unknown => Err(Error::Tool(format!("unregistered tool: {unknown}"))),
        }
    }
}
