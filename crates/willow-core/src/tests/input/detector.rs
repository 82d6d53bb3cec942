use crate::{
    CoreResult, DebounceConfig, Edge, EdgeDetector, InputEventKind, InputPin, InteractionMode,
    Polarity, WillowError,
    input::detector::ReadHealth,
    tests::support::{InterruptPin, PolledPin},
};

use std::{
    panic::Location,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    thread,
    time::Duration,
};

use error_location::ErrorLocation;

const WINDOW: Duration = Duration::from_millis(50);
const WAIT: Duration = Duration::from_secs(2);
const QUIET: Duration = Duration::from_millis(300);

fn config() -> DebounceConfig {
    DebounceConfig::new(10, Polarity::ActiveHigh, WINDOW)
}

const FLAKY_FAILURES: u64 = 20;

/// Polled pin that reads released once, fails a run of reads, then reads pressed.
#[derive(Clone, Default)]
struct FlakyPin {
    reads: Arc<AtomicU64>,
}

impl InputPin for FlakyPin {
    #[track_caller]
    fn read_level(&mut self) -> CoreResult<bool> {
        match self.reads.fetch_add(1, Ordering::SeqCst) {
            0 => Ok(false),
            n if n <= FLAKY_FAILURES => Err(WillowError::PinError {
                reason: "bus glitch".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
            _ => Ok(true),
        }
    }
}

/// WHAT: A pin without change notification is polled
/// WHY: Edge registration fails on some kernels; input must keep working
#[test]
fn given_pin_without_interrupts_when_pressed_then_polling_delivers_trigger() {
    // Given: A detector on a polling-only pin
    let pin = PolledPin::default();
    let (mut detector, events) =
        EdgeDetector::spawn(Box::new(pin.clone()), config(), InteractionMode::Toggle).unwrap();
    assert!(detector.is_polling());

    // When: The button goes down
    pin.level.store(true, Ordering::SeqCst);

    // Then: A trigger on channel 10 arrives
    let event = events.recv_timeout(WAIT).unwrap();
    assert_eq!(event.kind, InputEventKind::Trigger);
    assert_eq!(event.edge, Edge::Rising);
    assert_eq!(event.channel, 10);

    detector.stop();
}

/// WHAT: Change notifications are used when the pin supports them
/// WHY: Interrupts avoid burning CPU on a tight polling loop
#[test]
fn given_interrupt_pin_when_bouncing_press_then_single_trigger() {
    // Given: A detector on an interrupt-capable pin
    let pin = InterruptPin::default();
    let (mut detector, events) =
        EdgeDetector::spawn(Box::new(pin.clone()), config(), InteractionMode::Toggle).unwrap();
    assert!(!detector.is_polling());

    // When: The hardware reports a burst of bounces ending high
    for level in [true, false, true, false, true] {
        pin.set(level);
    }

    // Then: Exactly one trigger is delivered
    let first = events.recv_timeout(WAIT).unwrap();
    assert_eq!(first.kind, InputEventKind::Trigger);
    assert!(events.recv_timeout(QUIET).is_none());

    detector.stop();
}

/// WHAT: A release swallowed by the lockout is recovered by re-reading the pin
/// WHY: Otherwise a quick tap would record until the max-duration cap
#[test]
fn given_quick_tap_when_release_inside_window_then_end_still_delivered() {
    // Given: A press/release detector on an interrupt pin
    let pin = InterruptPin::default();
    let (mut detector, events) = EdgeDetector::spawn(
        Box::new(pin.clone()),
        config(),
        InteractionMode::PressRelease,
    )
    .unwrap();

    // When: Press and release land within a few milliseconds
    pin.set(true);
    thread::sleep(Duration::from_millis(2));
    pin.set(false);

    // Then: Begin then End are both delivered
    let begin = events.recv_timeout(WAIT).unwrap();
    let end = events.recv_timeout(WAIT).unwrap();
    assert_eq!(begin.kind, InputEventKind::Begin);
    assert_eq!(end.kind, InputEventKind::End);
    assert!(end.at.duration_since(begin.at) >= WINDOW);

    detector.stop();
}

/// WHAT: A stale notification is ignored when the level has already settled
/// WHY: Interrupt payloads may lag behind the actual pin state
#[test]
fn given_spurious_notification_when_level_unchanged_then_no_event_survives() {
    // Given: A press/release detector idling released
    let pin = InterruptPin::default();
    let (mut detector, events) = EdgeDetector::spawn(
        Box::new(pin.clone()),
        config(),
        InteractionMode::PressRelease,
    )
    .unwrap();

    // When: The hardware reports a rising edge but the pin reads low
    pin.notify(true);

    // Then: The begin is followed by a reconciling end, never a stuck press
    let begin = events.recv_timeout(WAIT).unwrap();
    let end = events.recv_timeout(WAIT).unwrap();
    assert_eq!(begin.kind, InputEventKind::Begin);
    assert_eq!(end.kind, InputEventKind::End);
    assert!(events.recv_timeout(QUIET).is_none());

    detector.stop();
}

/// WHAT: Stopping the detector ends the event stream
/// WHY: The dispatcher exits by running out of events during shutdown
#[test]
fn given_running_detector_when_stopped_then_event_iterator_ends() {
    // Given: A running detector
    let pin = PolledPin::default();
    let (mut detector, mut events) =
        EdgeDetector::spawn(Box::new(pin), config(), InteractionMode::Toggle).unwrap();

    // When: It is stopped
    detector.stop();

    // Then: Iteration finishes instead of blocking
    assert!(events.next().is_none());
}

/// WHAT: A run of read failures is reported once, and its end once
/// WHY: A stuck pin polled every few milliseconds must not flood the log
#[test]
fn given_repeated_read_failures_when_tracked_then_only_transitions_reported() {
    // Given: Fresh read health
    let mut health = ReadHealth::default();

    // When: Three failures, then two good reads, then another failure
    let started = [health.failed(), health.failed(), health.failed()];
    let recovered = health.succeeded();
    let steady = health.succeeded();
    let restarted = health.failed();

    // Then: Only the first failure of each run and the recovery are flagged
    assert_eq!(started, [true, false, false]);
    assert_eq!(recovered, Some(3));
    assert_eq!(steady, None);
    assert!(restarted);
}

/// WHAT: Events still arrive once a failing pin recovers
/// WHY: Transient bus errors must not silence the button
#[test]
fn given_pin_failing_at_first_when_it_recovers_then_trigger_delivered() {
    // Given: A polled pin whose reads fail for a while and then read pressed
    let pin = FlakyPin::default();
    let (mut detector, events) =
        EdgeDetector::spawn(Box::new(pin.clone()), config(), InteractionMode::Toggle).unwrap();

    // When: The detector keeps polling through the failures
    let event = events.recv_timeout(WAIT);

    // Then: The press is delivered after recovery
    assert_eq!(event.unwrap().kind, InputEventKind::Trigger);
    assert!(pin.reads.load(Ordering::SeqCst) > FLAKY_FAILURES);

    detector.stop();
}
