use controlkit::{LoadTracker, LoadingScope};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

/// One thread finishes an operation while another starts the next one. The
/// idle transition's delivery is stalled inside a listener, so the busy
/// transition is committed behind it; subscribers must still end on busy.
#[test]
fn test_subscribers_see_transitions_in_commit_order_across_threads() {
    let tracker = LoadTracker::default();
    let scope = LoadingScope::Default;

    let (stalled_tx, stalled_rx) = mpsc::channel::<()>();
    let (resume_tx, resume_rx) = mpsc::channel::<()>();
    let stalled_tx = Mutex::new(stalled_tx);
    let resume_rx = Mutex::new(resume_rx);
    let stalled_once = AtomicBool::new(false);
    let _slow = tracker.subscribe(&scope, move |busy| {
        if !busy && !stalled_once.swap(true, Ordering::SeqCst) {
            stalled_tx.lock().unwrap().send(()).unwrap();
            resume_rx.lock().unwrap().recv().unwrap();
        }
    });

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _sub = tracker.subscribe(&scope, move |busy| sink.lock().unwrap().push(busy));

    let first = tracker.enter(&scope);
    let finisher = thread::spawn(move || drop(first));

    stalled_rx.recv().unwrap();
    let second = tracker.enter(&scope);
    assert!(tracker.is_loading());
    resume_tx.send(()).unwrap();
    finisher.join().unwrap();

    assert!(tracker.is_loading());
    assert_eq!(*seen.lock().unwrap(), vec![true, false, true]);
    assert_eq!(seen.lock().unwrap().last(), Some(&tracker.is_loading()));

    drop(second);
    assert_eq!(*seen.lock().unwrap(), vec![true, false, true, false]);
}

#[test]
fn test_concurrent_writers_leave_subscribers_on_final_state() {
    let tracker = LoadTracker::default();
    let scope = LoadingScope::tag("sync");
    let last = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&last);
    let _sub = tracker.subscribe(&scope, move |busy| *sink.lock().unwrap() = Some(busy));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let tracker = tracker.clone();
            let scope = scope.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    let guard = tracker.enter(&scope);
                    drop(guard);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert!(!tracker.is_loading_by_tag("sync"));
    assert_eq!(tracker.in_flight(&scope), 0);
    assert_eq!(*last.lock().unwrap(), Some(false));
}
