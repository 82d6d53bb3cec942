use crate::{AudioGate, CancelToken, DuplexMode};

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

const SETTLE: Duration = Duration::from_millis(50);

/// WHAT: A capture request blocks until the active render lets go
/// WHY: Exclusive devices cannot record and play at once
#[test]
fn given_exclusive_gate_when_capture_requested_during_render_then_waits_for_release() {
    // Given: A render holding the exclusive gate
    let gate = Arc::new(AudioGate::new(DuplexMode::Exclusive));
    let render = gate.acquire_render(&CancelToken::new()).unwrap();
    let acquired = Arc::new(AtomicBool::new(false));

    // When: A capture asks for the device from another thread
    let handle = {
        let gate = Arc::clone(&gate);
        let acquired = Arc::clone(&acquired);
        thread::spawn(move || {
            let _capture = gate.acquire_capture();
            acquired.store(true, Ordering::SeqCst);
        })
    };
    thread::sleep(SETTLE);

    // Then: The render is told to yield and the capture waits for it
    assert!(gate.render_should_yield());
    assert!(!acquired.load(Ordering::SeqCst));
    drop(render);
    handle.join().unwrap();
    assert!(acquired.load(Ordering::SeqCst));
    assert!(!gate.render_should_yield());
}

/// WHAT: Renders wait while a capture holds the device
/// WHY: Playback resumes only after the recording is done
#[test]
fn given_capture_active_when_render_requested_then_cancel_releases_waiter() {
    // Given: An active capture
    let gate = Arc::new(AudioGate::new(DuplexMode::Exclusive));
    let _capture = gate.acquire_capture();
    let cancel = CancelToken::new();

    // When: A render waits and is then cancelled
    let handle = {
        let gate = Arc::clone(&gate);
        let cancel = cancel.clone();
        thread::spawn(move || gate.acquire_render(&cancel).is_some())
    };
    thread::sleep(SETTLE);
    cancel.cancel();

    // Then: The render never got the device
    assert!(!handle.join().unwrap());
}

/// WHAT: Full duplex never blocks either side
/// WHY: Hardware that can do both should not be serialized
#[test]
fn given_full_duplex_gate_when_both_acquired_then_neither_blocks() {
    // Given: A full-duplex gate
    let gate = AudioGate::new(DuplexMode::FullDuplex);

    // When: Render and capture are both taken
    let render = gate.acquire_render(&CancelToken::new());
    let _capture = gate.acquire_capture();

    // Then: Both are held and the render is never asked to yield
    assert!(render.is_some());
    assert!(!gate.render_should_yield());
    assert_eq!(gate.mode(), DuplexMode::FullDuplex);
}
