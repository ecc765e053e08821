//! Unit tests for the synchronous publish/subscribe primitive

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::notifications::emitter::Emitter;

#[test]
fn test_handlers_invoked_in_registration_order() {
    let emitter: Emitter<u32> = Emitter::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    for tag in ["a", "b", "c"] {
        let log = Arc::clone(&order);
        emitter.on(move |value: &u32| {
            log.lock().unwrap().push(format!("{tag}:{value}"));
        });
    }

    emitter.emit(&7);

    assert_eq!(*order.lock().unwrap(), vec!["a:7", "b:7", "c:7"]);
}

#[test]
fn test_off_removes_exactly_one_handler() {
    let emitter: Emitter<()> = Emitter::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    let first = emitter.on(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let counter = Arc::clone(&calls);
    emitter.on(move |_| {
        counter.fetch_add(10, Ordering::SeqCst);
    });

    assert!(emitter.off(first));
    assert_eq!(emitter.handler_count(), 1);

    emitter.emit(&());
    assert_eq!(calls.load(Ordering::SeqCst), 10);

    // Deregistering twice reports the miss.
    assert!(!emitter.off(first));
}

#[test]
fn test_emit_with_no_handlers_is_noop() {
    let emitter: Emitter<String> = Emitter::new();
    emitter.emit(&"nobody listening".to_string());
    assert_eq!(emitter.handler_count(), 0);
}

#[test]
fn test_handler_added_during_emit_not_invoked_for_that_emit() {
    let emitter: Arc<Emitter<u32>> = Arc::new(Emitter::new());
    let late_calls = Arc::new(AtomicUsize::new(0));
    let armed = Arc::new(AtomicBool::new(false));

    let inner = Arc::clone(&emitter);
    let counter = Arc::clone(&late_calls);
    let once = Arc::clone(&armed);
    emitter.on(move |_| {
        if !once.swap(true, Ordering::SeqCst) {
            let counter = Arc::clone(&counter);
            inner.on(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
    });

    emitter.emit(&1);
    assert_eq!(late_calls.load(Ordering::SeqCst), 0);

    emitter.emit(&2);
    assert_eq!(late_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_handler_removed_during_emit_still_runs_for_that_emit() {
    let emitter: Arc<Emitter<()>> = Arc::new(Emitter::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let inner = Arc::clone(&emitter);
    let victim_calls = Arc::clone(&calls);
    let victim = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&victim);
    emitter.on(move |_| {
        if let Some(id) = slot.lock().unwrap().take() {
            inner.off(id);
        }
    });
    let id = emitter.on(move |_| {
        victim_calls.fetch_add(1, Ordering::SeqCst);
    });
    *victim.lock().unwrap() = Some(id);

    // The fan-out snapshot was taken before the first handler ran, so the
    // victim still sees this emission but none after it.
    emitter.emit(&());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    emitter.emit(&());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
