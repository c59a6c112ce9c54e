//! Behaviour-driven tests for request dispatch.

use std::io;
use std::mem;
use std::sync::{Arc, Mutex};

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::cancellation::CancellationToken;
use crate::dispatcher::Dispatcher;
use crate::error::{DispatchError, HandlerResult};
use crate::handler::{Decorator, Next, RequestHandler};
use crate::message::{Capabilities, Request};
use crate::registry::Registry;

// ---------------------------------------------------------------------------
// Test world
// ---------------------------------------------------------------------------

type Journal = Arc<Mutex<Vec<String>>>;

#[derive(Debug)]
struct Lookup;

impl Request for Lookup {
    type Response = String;
    const CAPABILITIES: Capabilities = Capabilities::QUERY;
}

#[derive(Default)]
struct TestWorld {
    registry: Registry,
    journal: Journal,
    dispatcher: Option<Dispatcher>,
    outcome: Option<Result<String, DispatchError>>,
}

impl TestWorld {
    fn record(journal: &Journal, entry: &str) {
        journal.lock().expect("journal lock").push(entry.to_owned());
    }

    fn calls(&self) -> Vec<String> {
        self.journal.lock().expect("journal lock").clone()
    }

    fn send(&mut self, times: usize) {
        let registry = mem::take(&mut self.registry);
        let dispatcher = Dispatcher::new(Arc::new(registry));
        let token = CancellationToken::new();
        for _ in 0..times {
            self.outcome = Some(dispatcher.send(&Lookup, &token));
        }
        self.dispatcher = Some(dispatcher);
    }

    fn outcome(&self) -> &Result<String, DispatchError> {
        self.outcome.as_ref().expect("lookup was not sent")
    }
}

#[fixture]
fn world() -> TestWorld {
    TestWorld::default()
}

struct Answer {
    reply: Result<String, String>,
    journal: Journal,
}

impl RequestHandler<Lookup> for Answer {
    fn handle(&self, _request: &Lookup, _token: &CancellationToken) -> HandlerResult<String> {
        TestWorld::record(&self.journal, "handler");
        self.reply
            .clone()
            .map_err(|message| io::Error::other(message).into())
    }
}

struct Labelled {
    label: String,
    answer: Option<String>,
    journal: Journal,
}

impl Decorator<Lookup> for Labelled {
    fn handle(
        &self,
        _request: &Lookup,
        next: Next<'_, String>,
        _token: &CancellationToken,
    ) -> HandlerResult<String> {
        TestWorld::record(&self.journal, &self.label);
        match &self.answer {
            Some(answer) => Ok(answer.clone()),
            None => next.run(),
        }
    }
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

fn given_handler(world: &mut TestWorld, reply: Result<String, String>) {
    let handler = Answer {
        reply,
        journal: Arc::clone(&world.journal),
    };
    world
        .registry
        .register_handler::<Lookup, _>(handler)
        .expect("register lookup handler");
}

fn given_decorator(world: &mut TestWorld, label: &str, answer: Option<String>) {
    let decorator = Labelled {
        label: label.to_owned(),
        answer,
        journal: Arc::clone(&world.journal),
    };
    world.registry.register_decorator::<Lookup, _>(decorator);
}

#[given("a lookup handler answering \"{answer}\"")]
fn given_answering_handler(world: &mut TestWorld, answer: String) {
    given_handler(world, Ok(answer));
}

#[given("a lookup handler failing with \"{message}\"")]
fn given_failing_handler(world: &mut TestWorld, message: String) {
    given_handler(world, Err(message));
}

#[given("a lookup decorator \"{label}\"")]
fn given_passing_decorator(world: &mut TestWorld, label: String) {
    given_decorator(world, &label, None);
}

#[given("a lookup decorator \"{label}\" answering \"{answer}\" on its own")]
fn given_short_circuit(world: &mut TestWorld, label: String, answer: String) {
    given_decorator(world, &label, Some(answer));
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("the lookup is sent")]
fn when_sent(world: &mut TestWorld) {
    world.send(1);
}

#[when("the lookup is sent {count} times")]
fn when_sent_repeatedly(world: &mut TestWorld, count: usize) {
    world.send(count);
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("the lookup response is \"{expected}\"")]
fn then_response(world: &mut TestWorld, expected: String) {
    match world.outcome() {
        Ok(response) => assert_eq!(response, &expected),
        Err(error) => panic!("expected a response, got error: {error}"),
    }
}

#[then("the call order is \"{order}\"")]
fn then_call_order(world: &mut TestWorld, order: String) {
    let expected: Vec<String> = order.split(", ").map(str::to_owned).collect();
    assert_eq!(world.calls(), expected);
}

#[then("no decorator ran")]
fn then_nothing_ran(world: &mut TestWorld) {
    assert!(world.calls().is_empty(), "calls: {:?}", world.calls());
}

#[then("the lookup fails because no handler is registered")]
fn then_not_registered(world: &mut TestWorld) {
    let outcome = world.outcome();
    assert!(
        matches!(outcome, Err(DispatchError::HandlerNotRegistered { .. })),
        "unexpected outcome: {outcome:?}"
    );
    let dispatcher = world.dispatcher.as_ref().expect("dispatcher");
    assert!(dispatcher.cache().is_empty());
}

#[then("the lookup fails with the handler error \"{message}\"")]
fn then_handler_error(world: &mut TestWorld, message: String) {
    let Err(error) = world.outcome() else {
        panic!("expected the lookup to fail");
    };
    let inner = error.handler_error().expect("handler error");
    assert!(inner.is::<io::Error>(), "unexpected error type: {inner}");
    assert_eq!(inner.to_string(), message);
}

#[then("the invocation cache compiled {compiled} entry with {hits} hits")]
fn then_cache_stats(world: &mut TestWorld, compiled: u64, hits: u64) {
    let dispatcher = world.dispatcher.as_ref().expect("dispatcher");
    let stats = dispatcher.cache().stats();
    assert_eq!(stats.compiled, compiled);
    assert_eq!(stats.hits, hits);
    assert_eq!(world.outcome().as_deref().ok(), Some("7"));
}

// ---------------------------------------------------------------------------
// Scenario registration
// ---------------------------------------------------------------------------

#[scenario(path = "tests/features/dispatch.feature")]
fn dispatch_behaviour(world: TestWorld) {
    let _ = world;
}
