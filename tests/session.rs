//! Streaming session tool bridge
//!
//! Drives the dispatcher with synthetic control-channel events: round
//! trips for registered tools, logged no-ops for unregistered names, and
//! semantic equivalence with the command executors.

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::Harness;
use serde_json::{Value, json};
use voxcart::session::{EventHandler, ToolDispatcher, ToolRegistry};
use voxcart::store::Route;
use voxcart::{Error, LocalExecutor};

struct Bridge {
    harness: Harness,
    registry: Arc<ToolRegistry>,
    dispatcher: ToolDispatcher,
    outbound: tokio::sync::mpsc::UnboundedReceiver<String>,
}

fn bridge() -> Bridge {
    let harness = Harness::new();
    let registry = Arc::new(ToolRegistry::new(Arc::clone(&harness.actions)));
    let (tx, outbound) = tokio::sync::mpsc::unbounded_channel();
    let dispatcher = ToolDispatcher::new(Arc::clone(&registry), tx);
    Bridge {
        harness,
        registry,
        dispatcher,
        outbound,
    }
}

fn function_call(call_id: &str, name: &str, arguments: &str) -> String {
    json!({
        "type": "response.function_call_arguments.done",
        "call_id": call_id,
        "name": name,
        "arguments": arguments,
    })
    .to_string()
}

fn noop_handler() -> EventHandler {
    Arc::new(|_| {})
}

/// Drain and parse everything queued on the outbound channel
fn drain(outbound: &mut tokio::sync::mpsc::UnboundedReceiver<String>) -> Vec<Value> {
    let mut messages = Vec::new();
    while let Ok(raw) = outbound.try_recv() {
        messages.push(serde_json::from_str(&raw).unwrap());
    }
    messages
}

#[tokio::test]
async fn registered_tool_round_trip() {
    let mut b = bridge();
    b.harness.sign_in();

    let event = function_call("call_1", "add_to_cart", r#"{"product_id":"42","quantity":2}"#);
    b.dispatcher.handle_raw(&event, &noop_handler()).await;

    let messages = drain(&mut b.outbound);
    assert_eq!(messages.len(), 2, "function output then response.create");

    assert_eq!(messages[0]["type"], "conversation.item.create");
    assert_eq!(messages[0]["item"]["type"], "function_call_output");
    assert_eq!(messages[0]["item"]["call_id"], "call_1");

    let output: Value =
        serde_json::from_str(messages[0]["item"]["output"].as_str().unwrap()).unwrap();
    assert_eq!(output["success"], true);
    assert_eq!(output["cart_item_count"], 2);

    assert_eq!(messages[1]["type"], "response.create");

    // The mutation landed on the same stores the executors use
    assert_eq!(b.harness.backend.cart_quantity("u1", "42"), 2);
}

#[tokio::test]
async fn unregistered_tool_is_logged_noop() {
    // Scenario: a tool-call event for an unknown name arrives
    let mut b = bridge();
    b.harness.sign_in();

    let event = function_call("call_2", "launch_rockets", "{}");
    b.dispatcher.handle_raw(&event, &noop_handler()).await;

    // No malformed message goes back on the channel
    assert!(drain(&mut b.outbound).is_empty());
}

#[tokio::test]
async fn tool_rejection_is_serialized_not_dropped() {
    // Not signed in: the tool fails, but the round trip still completes
    let mut b = bridge();

    let event = function_call("call_3", "add_to_cart", r#"{"product_id":"42"}"#);
    b.dispatcher.handle_raw(&event, &noop_handler()).await;

    let messages = drain(&mut b.outbound);
    assert_eq!(messages.len(), 2);

    let output: Value =
        serde_json::from_str(messages[0]["item"]["output"].as_str().unwrap()).unwrap();
    assert_eq!(output["success"], false);
    assert!(
        output["message"].as_str().unwrap().to_lowercase().contains("log in"),
        "same auth vocabulary as the executors"
    );
}

#[tokio::test]
async fn malformed_arguments_produce_failure_output() {
    let mut b = bridge();
    b.harness.sign_in();

    let event = function_call("call_4", "add_to_cart", "{not json");
    b.dispatcher.handle_raw(&event, &noop_handler()).await;

    let messages = drain(&mut b.outbound);
    assert_eq!(messages.len(), 2, "failure output still completes the round trip");
    let output: Value =
        serde_json::from_str(messages[0]["item"]["output"].as_str().unwrap()).unwrap();
    assert_eq!(output["success"], false);
    assert_eq!(messages[1]["type"], "response.create");

    // And nothing mutated
    assert_eq!(b.harness.backend.cart_quantity("u1", "42"), 0);
}

#[tokio::test]
async fn every_message_is_relayed_verbatim() {
    let mut b = bridge();

    let seen = Arc::new(AtomicUsize::new(0));
    let seen_in_handler = Arc::clone(&seen);
    let handler: EventHandler = Arc::new(move |value| {
        assert!(value.get("type").is_some());
        seen_in_handler.fetch_add(1, Ordering::SeqCst);
    });

    for raw in [
        json!({"type": "session.created"}).to_string(),
        json!({"type": "input_audio_buffer.speech_started"}).to_string(),
        json!({"type": "rate_limits.updated", "rate_limits": []}).to_string(),
        function_call("call_5", "not_a_tool", "{}"),
    ] {
        b.dispatcher.handle_raw(&raw, &handler).await;
    }

    // Unknown event types and unknown tools still reach the handler
    assert_eq!(seen.load(Ordering::SeqCst), 4);
    assert!(drain(&mut b.outbound).is_empty());
}

#[tokio::test]
async fn overlapping_calls_are_independent() {
    let mut b = bridge();
    b.harness.sign_in();

    // Two calls with distinct call ids dispatched back to back
    let first = function_call("call_a", "add_to_cart", r#"{"product_id":"42"}"#);
    let second = function_call("call_b", "add_to_cart", r#"{"product_id":"7"}"#);
    b.dispatcher.handle_raw(&first, &noop_handler()).await;
    b.dispatcher.handle_raw(&second, &noop_handler()).await;

    let messages = drain(&mut b.outbound);
    let call_ids: Vec<&str> = messages
        .iter()
        .filter(|m| m["type"] == "conversation.item.create")
        .map(|m| m["item"]["call_id"].as_str().unwrap())
        .collect();
    assert_eq!(call_ids, vec!["call_a", "call_b"]);

    assert_eq!(b.harness.backend.cart_quantity("u1", "42"), 1);
    assert_eq!(b.harness.backend.cart_quantity("u1", "7"), 1);
}

#[test]
fn advertised_schema_matches_registry() {
    let harness = Harness::new();
    let registry = ToolRegistry::new(Arc::clone(&harness.actions));

    let names = registry.names();
    assert_eq!(names.len(), 20, "the agent sees exactly twenty tools");

    let unique: HashSet<&str> = names.iter().copied().collect();
    assert_eq!(unique.len(), names.len(), "tool names must be unique");

    for schema in registry.schemas() {
        assert_eq!(schema.kind, "function");
        assert!(!schema.description.is_empty());
        assert!(schema.parameters.is_object());
    }
}

#[tokio::test]
async fn every_advertised_tool_is_implemented() {
    // Invoking any advertised name must reach an implementation: failures
    // are allowed, Error::Tool("unregistered ...") is not
    let harness = Harness::new();
    harness.sign_in();
    let registry = ToolRegistry::new(Arc::clone(&harness.actions));

    for name in registry.names() {
        let result = registry.invoke(name, &json!({})).await;
        assert!(
            !matches!(result, Err(Error::Tool(_))),
            "advertised tool {name} hit the unregistered path"
        );
    }
}

#[tokio::test]
async fn tool_and_executor_paths_stay_equivalent() {
    // Same operation through the agent bridge and the local executor:
    // same resolution priority, same refreshed totals
    let tool_side = bridge();
    tool_side.harness.sign_in();
    tool_side.harness.nav.navigate(Route::Product("42".to_string()));

    // No explicit id: the tool resolves from page context, like the executor
    let outcome = tool_side
        .registry
        .invoke("add_to_cart", &json!({}))
        .await
        .unwrap();
    assert!(outcome.success);

    let executor_side = Harness::new();
    executor_side.sign_in();
    executor_side.nav.navigate(Route::Product("42".to_string()));
    let local = LocalExecutor::new(Arc::clone(&executor_side.actions));
    let executor_outcome = local.execute("add to cart").await;

    assert_eq!(outcome.success, executor_outcome.success);
    assert_eq!(outcome.message, executor_outcome.message);
}
