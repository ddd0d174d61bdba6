use std::sync::Arc;
use std::thread;

use calltrace_trace::ObjectTracker;
use pretty_assertions::assert_eq;

#[test]
fn same_native_pointer_keeps_its_identity() {
    let tracker = ObjectTracker::new();
    let first = tracker.wrap(0x1000, Some("IDirect3DDevice9"), &[]).unwrap();
    let again = tracker.wrap(0x1000, Some("IDirect3DDevice9"), &[]).unwrap();
    assert_eq!(first.id(), again.id());
    assert_eq!(first.handle(), again.handle());
    assert_eq!(tracker.refs(0x1000), Some(2));

    let seen = tracker.identify(first.handle(), None, &[]).unwrap();
    assert_eq!(seen.id(), first.id());
    assert_eq!(tracker.refs(0x1000), Some(2));
}

#[test]
fn base_typed_view_resolves_to_the_same_wrapper() {
    let tracker = ObjectTracker::new();
    let derived = tracker
        .wrap(0x2000, Some("IDirect3DVertexBuffer9"), &[])
        .unwrap();
    let base = tracker.identify(0x2000, Some("IUnknown"), &[]).unwrap();
    assert_eq!(base.id(), derived.id());
    assert_eq!(base.interface().as_deref(), Some("IDirect3DVertexBuffer9"));
}

#[test]
fn released_address_gets_a_fresh_identity() {
    let tracker = ObjectTracker::new();
    let old = tracker.wrap(0x3000, None, &[]).unwrap();
    assert_eq!(tracker.acquire(old.handle()), Some(2));
    assert_eq!(tracker.release(old.handle()), Some(1));
    assert_eq!(tracker.release(0x3000), Some(0));
    assert!(tracker.lookup(0x3000).is_none());
    assert!(tracker.release(0x3000).is_none());

    let new = tracker.wrap(0x3000, None, &[]).unwrap();
    assert_ne!(new.id(), old.id());
    assert!(new.id() > old.id());
}

#[test]
fn unknown_input_pointer_is_identified_once() {
    let tracker = ObjectTracker::new();
    let a = tracker.identify(0x4000, Some("IUnknown"), &[]).unwrap();
    let b = tracker.identify(0x4000, Some("IUnknown"), &[]).unwrap();
    assert_eq!(a.id(), b.id());
    assert_eq!(tracker.refs(0x4000), Some(1));
}

#[test]
fn concurrent_wraps_agree_on_identity() {
    let tracker = Arc::new(ObjectTracker::new());
    let ids: Vec<_> = (0..8)
        .map(|_| {
            let tracker = Arc::clone(&tracker);
            thread::spawn(move || {
                (0..100usize)
                    .map(|i| tracker.wrap(0x10_000 + i * 16, None, &[]).unwrap().id())
                    .collect::<Vec<_>>()
            })
        })
        .map(|h| h.join().unwrap())
        .collect();
    for other in &ids[1..] {
        assert_eq!(other, &ids[0]);
    }
    assert_eq!(tracker.len(), 100);
    assert_eq!(tracker.refs(0x10_000), Some(8));
}
