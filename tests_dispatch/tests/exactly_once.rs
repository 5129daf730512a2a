//! Exactly-once Dispatch Tests
//!
//! Validates that every registered callback runs once and only once,
//! including when the host queue and the registry drift apart.

use core_types::TaskId;
use host_api::HostApi;
use services_task_dispatch::{DispatchLoop, DispatchState, RegistryError};
use sim_host::fault_injection::{FaultPlan, HostFault};
use sim_host::SimHost;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tests_dispatch::{bootstrap_with, test_bootstrap};

type Counts = Arc<Mutex<HashMap<String, usize>>>;

fn counting(ctx: &mut services_task_dispatch::WorkerContext<SimHost>, ids: &[&str]) -> Counts {
    let counts: Counts = Arc::default();
    for id in ids {
        let counts = Arc::clone(&counts);
        let name = id.to_string();
        ctx.register(*id, move |_| {
            *counts.lock().unwrap().entry(name).or_default() += 1;
            Ok(())
        })
        .expect("register");
    }
    counts
}

/// Test: Every distinct id runs exactly once
#[test]
fn test_every_registered_callback_runs_once() {
    let (_host, mut ctx) = test_bootstrap();
    let ids: Vec<String> = (0..25).map(|i| format!("task-{i}")).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let counts = counting(&mut ctx, &id_refs);

    let report = ctx.drain().expect("drain");

    assert_eq!(report.executed.len(), 25);
    let counts = counts.lock().unwrap();
    assert_eq!(counts.len(), 25);
    assert!(counts.values().all(|&n| n == 1));
    assert!(ctx.registry().is_empty());
}

/// Test: Duplicate registration is refused and the first callback wins
#[test]
fn test_duplicate_registration_is_an_error() {
    let (host, mut ctx) = test_bootstrap();
    let counts = counting(&mut ctx, &["dup"]);

    let second = ctx.register("dup", |_| Ok(()));
    assert_eq!(second, Err(RegistryError::DuplicateTask(TaskId::from("dup"))));
    assert_eq!(host.queued_count(ctx.handle().context_id), 1);

    ctx.drain().expect("drain");
    assert_eq!(counts.lock().unwrap().get("dup"), Some(&1));
}

/// Test: A repeated pull does not resurrect a removed callback
#[test]
fn test_double_pull_skips_stale_id() {
    let (_host, mut ctx) = bootstrap_with(
        SimHost::new().with_fault_plan(
            FaultPlan::new()
                .with_fault(HostFault::RepeatNextPull)
                .with_fault(HostFault::RepeatNextPull),
        ),
    );
    let counts = counting(&mut ctx, &["a", "b"]);

    let report = ctx.drain().expect("drain");

    assert_eq!(counts.lock().unwrap().get("a"), Some(&1));
    assert_eq!(counts.lock().unwrap().get("b"), Some(&1));
    assert_eq!(report.executed, vec![TaskId::from("a"), TaskId::from("b")]);
    assert_eq!(report.skipped.len(), 2);
}

/// Test: A registration the host never saw is never invoked
#[test]
fn test_unobserved_registration_never_runs() {
    let (host, mut ctx) = bootstrap_with(
        SimHost::new()
            .with_fault_plan(FaultPlan::new().with_fault(HostFault::DropNextRegistration)),
    );
    let counts = counting(&mut ctx, &["lost", "kept"]);

    let report = ctx.drain().expect("drain");

    assert_eq!(report.executed, vec![TaskId::from("kept")]);
    assert!(counts.lock().unwrap().get("lost").is_none());
    assert_eq!(ctx.registry().ids(), vec![TaskId::from("lost")]);
    assert_eq!(host.queued_count(ctx.handle().context_id), 0);
}

/// Test: Host pulls an id registered by nobody
#[test]
fn test_foreign_id_is_skipped_silently() {
    let (host, mut ctx) = test_bootstrap();
    host.register_task(ctx.handle().context_id, &TaskId::from("ghost"))
        .expect("host accepts id");
    let counts = counting(&mut ctx, &["real"]);

    let report = ctx.drain().expect("drain");

    assert_eq!(report.skipped, vec![TaskId::from("ghost")]);
    assert_eq!(report.executed, vec![TaskId::from("real")]);
    assert_eq!(counts.lock().unwrap().len(), 1);
    // Skips are only logged at debug level, below the printing threshold.
    assert!(host.stderr_lines().is_empty());
}

/// Test: Once drained, draining again observes an empty queue
#[test]
fn test_drain_is_idempotent_terminal() {
    let (_host, mut ctx) = test_bootstrap();
    counting(&mut ctx, &["x", "y"]);

    let first = ctx.drain().expect("first drain");
    let second = ctx.drain().expect("second drain");

    assert_eq!(first.ran(), 2);
    assert!(second.is_empty());
}

/// Test: A stepped loop stays drained
#[test]
fn test_stepped_loop_stays_drained() {
    let (_host, mut ctx) = test_bootstrap();
    counting(&mut ctx, &["only"]);

    let mut dispatch = DispatchLoop::new();
    let mut steps = 0;
    while dispatch.state() != &DispatchState::Drained {
        dispatch.step(&mut ctx).expect("step");
        steps += 1;
    }
    assert_eq!(steps, 4);

    for _ in 0..3 {
        assert_eq!(dispatch.step(&mut ctx).expect("step"), &DispatchState::Drained);
    }
    assert_eq!(dispatch.report().ran(), 1);
}
