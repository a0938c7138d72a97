//! End-to-end flows through the engine with the concrete sinks and stores.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use flowcheck_core::assertions::{expect_eq, expect_present};
use flowcheck_core::{Clock, FlowRunner, ManualClock, ResultStore, Step, World};
use flowcheck_infra::config::{apply_env_overrides, parse_engine_config};
use flowcheck_infra::{InMemoryResultStore, JsonlResultStore, MemorySink, StdoutSink};
use flowcheck_types::{Cid, EngineConfig};
use serde_json::json;
use tempfile::TempDir;

fn runner(config: EngineConfig) -> (FlowRunner, MemorySink, InMemoryResultStore, Arc<ManualClock>) {
    let sink = MemorySink::new();
    let store = InMemoryResultStore::new();
    let clock = Arc::new(ManualClock::new());
    let runner = FlowRunner::new(config, Box::new(sink.clone()), Box::new(store.clone()))
        .unwrap()
        .with_clock(clock.clone());
    (runner, sink, store, clock)
}

fn signup_flow(created: Arc<AtomicU32>) -> Vec<Step> {
    vec![
        Step::transition("create user", move |w| {
            created.fetch_add(1, Ordering::SeqCst);
            Ok(w.with("user", json!({ "name": "ana", "active": false })).into_value())
        }),
        Step::transition("activate user", |w| {
            let mut user = w.get("user").cloned().unwrap_or_else(|| json!({}));
            user["active"] = json!(true);
            Ok(w.with("user", user).into_value())
        }),
        Step::query("load profile", |w| {
            let name = w
                .get_path("user.name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| anyhow::anyhow!("user has no name"))?;
            Ok(w.with("profile", json!({ "display": name.to_uppercase() })).into_value())
        }),
        Step::check("user is active", |w| expect_eq(w, "user", json!({ "name": "ana", "active": true }))),
        Step::check("profile loaded", |w| expect_present(w, "profile")),
    ]
}

#[test]
fn successful_flow_threads_world_and_records_checks() {
    let (mut runner, sink, store, _) = runner(EngineConfig::default());
    let created = Arc::new(AtomicU32::new(0));

    let outcome = runner.run_flow("signup", signup_flow(created.clone()));

    assert_eq!(outcome.verdict(), (true, String::new()));
    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert!(sink.lines().is_empty());

    let world = outcome.world.unwrap();
    assert_eq!(world.get_path("profile.display"), Some(&json!("ANA")));

    let records = store.records().unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.passed));
    assert_eq!(records[1].metadata["cid"], json!(outcome.cid.as_str()));
    assert_eq!(records[1].metadata["flow"], json!("signup"));
    assert!(records.iter().all(|r| r.cid.descends_from(&outcome.cid)));

    let snapshot = runner.debug_worlds();
    assert_eq!(snapshot.len(), 5);
    assert!(snapshot.values().all(Option::is_some));
    let dumped = serde_json::to_value(snapshot).unwrap();
    assert_eq!(dumped["create user"]["user"]["name"], json!("ana"));
}

#[test]
fn failed_check_writes_diagnostic_and_stops() {
    let (mut runner, sink, store, clock) = runner(EngineConfig::default());
    let after = Arc::new(AtomicU32::new(0));
    let seen = after.clone();

    let outcome = runner.run_flow(
        "broken counter",
        vec![
            Step::transition("count to one", |w| Ok(w.with("count", 1).into_value())),
            Step::check("count is two", |w| expect_eq(w, "count", 2)),
            Step::transition("never runs", move |w| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(w.clone().into_value())
            }),
        ],
    );

    let (success, diagnostic) = outcome.verdict();
    assert!(!success);
    assert_eq!(diagnostic, "count: expected 2, got 1");
    assert_eq!(sink.lines(), vec![diagnostic]);
    assert_eq!(after.load(Ordering::SeqCst), 0);
    // 300ms budget at 10ms intervals: 30 sleeps, 31 attempts.
    assert_eq!(clock.sleeps().len(), 30);
    assert_eq!(clock.now(), Duration::from_millis(300));

    let records = store.records().unwrap();
    assert_eq!(records.len(), 1);
    assert!(!records[0].passed);
    assert_eq!(records[0].message.as_deref(), Some("count: expected 2, got 1"));
    assert_eq!(records[0].metadata["cid"], json!(outcome.cid.as_str()));
}

#[test]
fn verbose_config_from_env_writes_step_lines() {
    let mut config = parse_engine_config("[retry]\ntimeout_ms = 0").unwrap();
    apply_env_overrides(&mut config, |key| {
        (key == "FLOWCHECK_VERBOSE").then(|| "yes".to_string())
    })
    .unwrap();
    let (mut runner, sink, _, _) = runner(config);

    let outcome = runner.run_flow(
        "verbose",
        vec![
            Step::transition("seed", |_| Ok(json!({ "n": 1 }))),
            Step::check("n is one", |w| expect_eq(w, "n", 1)),
        ],
    );

    assert!(outcome.success);
    assert_eq!(
        sink.lines(),
        vec![
            "transition seed: ok",
            "check n is one: ok",
            "retry retry [n is one]: ok",
        ]
    );
}

#[test]
fn jsonl_store_collects_results_across_flows() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("results.jsonl");
    let store = JsonlResultStore::open(&path).unwrap();
    let mut runner = FlowRunner::new(
        EngineConfig::default(),
        Box::new(MemorySink::new()),
        Box::new(store.clone()),
    )
    .unwrap()
    .with_clock(Arc::new(ManualClock::new()));

    let first = runner.run_flow(
        "first",
        vec![Step::check("empty world", |w| {
            flowcheck_core::assertions::expect_that(w.is_empty(), "world should start empty")
        })],
    );
    let second = runner.run_flow(
        "second",
        vec![
            Step::transition("seed", |_| Ok(json!({ "k": "v" }))),
            Step::check("k set", |w| expect_eq(w, "k", "v")),
            Step::check("k still set", |w| expect_present(w, "k")),
        ],
    );
    assert!(first.success && second.success);

    let records = store.records().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].metadata["cid"], json!(first.cid.as_str()));
    assert!(records[1].metadata.is_empty());
    assert_eq!(records[2].metadata["cid"], json!(second.cid.as_str()));
    assert_ne!(first.cid, second.cid);
}

#[test]
fn runners_on_separate_threads_are_independent() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let (mut runner, _, store, _) = runner(EngineConfig::default());
                let outcome = runner.run_flow(
                    "threaded",
                    vec![
                        Step::transition("seed", move |w| Ok(w.with("i", i).into_value())),
                        Step::check("seeded", move |w| expect_eq(w, "i", i)),
                    ],
                );
                (outcome.success, store.records().unwrap().len())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), (true, 1));
    }
}

#[test]
fn panicking_query_is_reported_not_propagated() {
    let (mut runner, sink, _, _) = runner(parse_engine_config("[retry]\ntimeout_ms = 20").unwrap());
    let outcome = runner.run_flow(
        "panics",
        vec![Step::query("explodes", |_| -> anyhow::Result<serde_json::Value> {
            let items: Vec<u32> = Vec::new();
            Ok(json!({ "first": items[0] }))
        })],
    );

    let (success, diagnostic) = outcome.verdict();
    assert!(!success);
    assert!(diagnostic.starts_with("query `explodes`"));
    assert!(diagnostic.contains("index out of bounds"));
    assert!(diagnostic.contains("stack trace:"));
    assert_eq!(sink.lines().len(), 1);
    assert_eq!(runner.debug_worlds().get("explodes"), Some(&None));
}

#[test]
fn nested_flow_cid_under_suite() {
    let suite = Cid::new_root();
    let (runner, _, store, _) = runner(EngineConfig::default());
    let mut runner = runner.with_parent_cid(suite.clone());
    let outcome = runner.run_flow(
        "nested",
        vec![Step::check("trivially true", |_: &World| Ok(()))],
    );
    assert!(outcome.cid.descends_from(&suite));
    assert_eq!(outcome.cid.depth(), suite.depth() + 1);
    assert_eq!(store.records().unwrap()[0].metadata["cid"], json!(outcome.cid.as_str()));
}

#[test]
fn stdout_sink_receives_failure_diagnostic() {
    let store = InMemoryResultStore::new();
    let mut runner = FlowRunner::new(EngineConfig::default(), Box::new(StdoutSink), Box::new(store.clone()))
        .unwrap()
        .with_clock(Arc::new(ManualClock::new()));
    let outcome = runner.run_flow(
        "stdout",
        vec![Step::transition("refuses", |_| anyhow::bail!("service unavailable"))],
    );
    assert!(!outcome.success);
    assert!(outcome.diagnostic.contains("service unavailable"));
    assert!(store.records().unwrap().is_empty());
}
