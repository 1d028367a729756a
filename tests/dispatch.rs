//! Executor behavior against the mock storefront
//!
//! Exercises the shared action layer through both dispatch surfaces:
//! auth gates, context re-derivation, refresh-after-mutate, and the
//! checkout flow.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::Harness;
use voxcart::store::Route;
use voxcart::{IntentResolver, LocalExecutor, StructuredExecutor};

fn executors(harness: &Harness) -> (LocalExecutor, StructuredExecutor, IntentResolver) {
    (
        LocalExecutor::new(Arc::clone(&harness.actions)),
        StructuredExecutor::new(Arc::clone(&harness.actions)),
        IntentResolver::new(),
    )
}

#[tokio::test]
async fn add_to_cart_on_product_page() {
    // Scenario: "add to cart" on /product/42, signed in, product 42 at $10
    let harness = Harness::new();
    harness.sign_in();
    harness.nav.navigate(Route::Product("42".to_string()));

    let (local, _, _) = executors(&harness);
    let outcome = local.execute("add to cart").await;

    assert!(outcome.success, "unexpected failure: {}", outcome.message);
    assert!(outcome.message.contains("Walnut desk organizer"));
    assert!(outcome.message.contains("$10.00"));
    assert_eq!(harness.cart.summary().item_count, 1);
    assert_eq!(harness.backend.cart_quantity("u1", "42"), 1);
}

#[tokio::test]
async fn add_to_cart_requires_login() {
    // Scenario: "add to cart" with no authenticated user
    let harness = Harness::new();
    harness.nav.navigate(Route::Product("42".to_string()));

    let (local, _, _) = executors(&harness);
    let mutations_before = harness.backend.mutations.load(Ordering::SeqCst);
    let outcome = local.execute("add to cart").await;

    assert!(!outcome.success);
    assert!(outcome.message.to_lowercase().contains("log in"));
    assert_eq!(
        harness.backend.mutations.load(Ordering::SeqCst),
        mutations_before,
        "auth failure must not mutate the cart"
    );
    assert_eq!(harness.cart.summary().item_count, 0);
}

#[tokio::test]
async fn add_to_cart_off_product_page_is_recognized_but_fails() {
    let harness = Harness::new();
    harness.sign_in();
    // Still on the home page: phrase recognized, no product context
    let (local, _, _) = executors(&harness);
    let outcome = local.execute("add to cart").await;

    assert!(!outcome.success);
    assert!(outcome.message.to_lowercase().contains("find"));
    assert_eq!(harness.cart.summary().item_count, 0);
}

#[tokio::test]
async fn quantity_phrase_adds_requested_units() {
    let harness = Harness::new();
    harness.sign_in();

    let (local, _, _) = executors(&harness);
    let outcome = local.execute("add two brass bookends to my cart").await;

    assert!(outcome.success, "unexpected failure: {}", outcome.message);
    assert_eq!(harness.backend.cart_quantity("u1", "7"), 2);
    assert!(outcome.message.contains("$50.00"), "line total in message");
}

#[tokio::test]
async fn navigation_phrase_navigates_exactly_once() {
    // Scenario: "go to checkout" → one navigation, no mutation
    let harness = Harness::new();
    harness.sign_in();
    harness
        .actions
        .add_to_cart(&voxcart::commerce::ProductRef::by_id("42"), None)
        .await
        .unwrap();

    let count_before = harness.nav.navigation_count();
    let mutations_before = harness.backend.mutations.load(Ordering::SeqCst);

    let (_, structured, resolver) = executors(&harness);
    let command = resolver.parse("  Go To Checkout  ").unwrap();
    let outcome = structured.execute(&command).await;

    assert!(outcome.success);
    assert_eq!(harness.nav.current(), Route::Checkout);
    assert_eq!(
        harness.nav.navigation_count(),
        count_before + 1,
        "navigation must be invoked exactly once"
    );
    assert_eq!(
        harness.backend.mutations.load(Ordering::SeqCst),
        mutations_before,
        "navigation must not mutate state"
    );
}

#[tokio::test]
async fn zip_code_fills_city_from_lookup() {
    // Scenario: "zip code 10001" on checkout; lookup knows the city
    let harness = Harness::new();
    harness.sign_in();
    harness.nav.navigate(Route::Checkout);

    let (local, _, _) = executors(&harness);
    let outcome = local.execute("zip code 10001").await;

    assert!(outcome.success);
    let address = harness.address.current();
    assert_eq!(address.zip, "10001");
    assert_eq!(address.city, "New York");
    assert_eq!(address.region, "NY");
}

#[tokio::test]
async fn zip_code_survives_lookup_outage() {
    // Lookup collaborator down: zip still set, confirmation stays generic
    let harness = Harness::new();
    harness.backend.fail_zip_lookup.store(true, Ordering::SeqCst);

    let (local, _, _) = executors(&harness);
    let outcome = local.execute("my zip is 10001").await;

    assert!(outcome.success, "lookup failure must not surface: {}", outcome.message);
    assert!(outcome.message.contains("10001"));
    assert_eq!(harness.address.current().zip, "10001");
    assert!(harness.address.current().city.is_empty());
}

#[tokio::test]
async fn unrecognized_input_has_no_side_effects() {
    let harness = Harness::new();
    harness.sign_in();

    let (local, _, _) = executors(&harness);
    let nav_before = harness.nav.navigation_count();
    let mutations_before = harness.backend.mutations.load(Ordering::SeqCst);

    let outcome = local.execute("the weather is nice today").await;

    assert!(!outcome.success);
    assert!(outcome.message.contains("didn't catch"));
    assert_eq!(harness.nav.navigation_count(), nav_before);
    assert_eq!(
        harness.backend.mutations.load(Ordering::SeqCst),
        mutations_before
    );
}

#[tokio::test]
async fn stale_context_is_rederived_at_execution() {
    // Utterance happened on product 42, but the user navigated to product 7
    // before dispatch: the command must act on 7
    let harness = Harness::new();
    harness.sign_in();
    harness.nav.navigate(Route::Product("42".to_string()));
    harness.nav.navigate(Route::Product("7".to_string()));

    let (local, _, _) = executors(&harness);
    let outcome = local.execute("add to cart").await;

    assert!(outcome.success);
    assert_eq!(harness.backend.cart_quantity("u1", "7"), 1);
    assert_eq!(harness.backend.cart_quantity("u1", "42"), 0);
}

#[tokio::test]
async fn out_of_stock_is_a_recognized_failure() {
    let harness = Harness::new();
    harness.sign_in();
    harness.nav.navigate(Route::Product("9".to_string()));

    let (local, _, _) = executors(&harness);
    let outcome = local.execute("add to cart").await;

    assert!(!outcome.success);
    assert!(outcome.message.contains("out of stock"));
    assert_eq!(harness.cart.summary().item_count, 0);
}

#[tokio::test]
async fn full_checkout_flow_places_order() {
    let harness = Harness::new();
    harness.sign_in();
    harness.nav.navigate(Route::Product("42".to_string()));

    let (local, _, _) = executors(&harness);

    assert!(local.execute("add to cart").await.success);
    assert!(local.execute("go to checkout").await.success);
    assert!(local.execute("my street is 12 main street").await.success);
    assert!(local.execute("zip code 10001").await.success);

    let outcome = local.execute("confirm my order").await;
    assert!(outcome.success, "order failed: {}", outcome.message);
    assert!(outcome.message.contains("ord-"));
    assert!(outcome.message.contains("$10.00"));

    // Cart refreshed from the authoritative source after the mutation
    assert_eq!(harness.cart.summary().item_count, 0);
    assert_eq!(harness.nav.current(), Route::Orders);
}

#[tokio::test]
async fn confirm_order_requires_checkout_page() {
    let harness = Harness::new();
    harness.sign_in();
    harness.nav.navigate(Route::Product("42".to_string()));

    let (local, _, _) = executors(&harness);
    assert!(local.execute("add to cart").await.success);

    // Still on the product page
    let outcome = local.execute("confirm my order").await;
    assert!(!outcome.success);
    assert!(outcome.message.contains("checkout"));
}

#[tokio::test]
async fn pin_login_installs_session_and_loads_views() {
    let harness = Harness::new();

    let (local, _, _) = executors(&harness);
    let outcome = local.execute("pin 2 4 6 8").await;

    assert!(outcome.success, "pin rejected: {}", outcome.message);
    assert!(outcome.message.contains("Ada"));
    assert_eq!(harness.auth.current().unwrap().user_id, "u1");

    let bad = local.execute("pin 0 0 0 0").await;
    assert!(!bad.success);
}

#[tokio::test]
async fn structured_and_local_agree_on_auth_gate() {
    // The two executors must share one error vocabulary
    let harness = Harness::new();
    harness.nav.navigate(Route::Product("42".to_string()));

    let (local, structured, resolver) = executors(&harness);
    let local_outcome = local.execute("add to cart").await;
    let command = resolver.parse("add to cart").unwrap();
    let structured_outcome = structured.execute(&command).await;

    assert!(!local_outcome.success);
    assert!(!structured_outcome.success);
    assert_eq!(local_outcome.message, structured_outcome.message);
}

#[tokio::test]
async fn search_then_step_through_results() {
    let harness = Harness::new();

    let (local, _, _) = executors(&harness);
    let outcome = local.execute("search for desk").await;
    assert!(outcome.success);
    assert!(outcome.message.contains("2 results"), "{}", outcome.message);

    let next = local.execute("next product").await;
    assert!(next.success, "{}", next.message);
    assert!(matches!(harness.nav.current(), Route::Product(_)));

    let prev = local.execute("previous product").await;
    assert!(prev.success);
}

#[tokio::test]
async fn wishlist_roundtrip() {
    let harness = Harness::new();
    harness.sign_in();
    harness.nav.navigate(Route::Product("42".to_string()));

    let (local, _, _) = executors(&harness);
    assert!(local.execute("save this for later").await.success);

    let view = local.execute("read my wishlist").await;
    assert!(view.message.contains("Walnut desk organizer"));

    assert!(
        local
            .execute("remove walnut desk organizer from my wishlist")
            .await
            .success
    );
    let empty = local.execute("read my wishlist").await;
    assert!(empty.message.contains("empty"));
}

#[tokio::test]
async fn preferences_toggle_and_clamp() {
    let harness = Harness::new();

    let (local, _, _) = executors(&harness);
    assert!(local.execute("enable high contrast").await.success);
    assert!(harness.prefs.current().high_contrast);

    assert!(local.execute("bigger text").await.success);
    assert_eq!(harness.prefs.current().text_scale, 110);
}
