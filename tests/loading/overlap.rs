use controlkit::{LoadTracker, LoadingScope, OverlapPolicy};
use tokio::sync::oneshot;

async fn settle(tracker: &LoadTracker, scope: &LoadingScope, remaining: usize) {
    while tracker.in_flight(scope) > remaining {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_ref_counted_flag_stays_busy_until_last_operation() {
    let tracker = LoadTracker::new(OverlapPolicy::RefCounted);
    let scope = LoadingScope::tag("sync");
    let (release_first, first_gate) = oneshot::channel::<()>();
    let (release_second, second_gate) = oneshot::channel::<()>();

    let first = tracker.wait_tagged("sync", || async move { first_gate.await.ok() });
    let second = tracker.wait_tagged("sync", || async move { second_gate.await.ok() });
    let driver = async {
        tokio::task::yield_now().await;
        assert_eq!(tracker.in_flight(&scope), 2);

        release_first.send(()).ok();
        settle(&tracker, &scope, 1).await;
        assert!(tracker.is_loading_by_tag("sync"));

        release_second.send(()).ok();
    };

    tokio::join!(first, second, driver);

    assert!(!tracker.is_loading_by_tag("sync"));
    assert_eq!(tracker.in_flight(&scope), 0);
}

#[tokio::test]
async fn test_last_writer_policy_clears_on_first_completion() {
    let tracker = LoadTracker::new(OverlapPolicy::LastWriterClears);
    let scope = LoadingScope::tag("sync");
    let (release_first, first_gate) = oneshot::channel::<()>();
    let (release_second, second_gate) = oneshot::channel::<()>();

    let first = tracker.wait_tagged("sync", || async move { first_gate.await.ok() });
    let second = tracker.wait_tagged("sync", || async move { second_gate.await.ok() });
    let driver = async {
        tokio::task::yield_now().await;
        assert_eq!(tracker.in_flight(&scope), 2);

        release_first.send(()).ok();
        settle(&tracker, &scope, 1).await;
        // The second operation is still running but the flag is already clear
        assert!(!tracker.is_loading_by_tag("sync"));

        release_second.send(()).ok();
    };

    tokio::join!(first, second, driver);

    assert!(!tracker.is_loading_by_tag("sync"));
}

#[test]
fn test_manual_write_overrides_running_guards() {
    let tracker = LoadTracker::default();
    let guard = tracker.enter(&LoadingScope::Default);

    tracker.set_is_loading(false);
    assert!(!tracker.is_loading());
    assert_eq!(tracker.in_flight(&LoadingScope::Default), 1);

    drop(guard);
    assert!(!tracker.is_loading());
}

#[test]
fn test_nested_guards_on_same_scope() {
    let tracker = LoadTracker::default();
    let scope = LoadingScope::tag("nested");

    let outer = tracker.enter(&scope);
    let inner = tracker.enter(&scope);
    drop(inner);
    assert!(tracker.is_loading_in(&scope));

    drop(outer);
    assert!(!tracker.is_loading_in(&scope));
}
