//! End-to-end behavior of the clipboard signal over the in-memory backend.

use std::sync::{mpsc as std_mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use clipsignal::{
    ClipboardError, ClipboardSignal, EventSourceState, MemoryClipboard, Notification,
    PlatformOptions,
};
use cs_core::{ClipboardSession, ResourceLock, SessionFactory};
use tokio::sync::mpsc;
use tokio::time::timeout;

const DELIVERY: Duration = Duration::from_secs(2);
const SILENCE: Duration = Duration::from_millis(100);

fn start(clipboard: &MemoryClipboard) -> ClipboardSignal {
    ClipboardSignal::with_lock(
        clipboard.factory(),
        &PlatformOptions::default(),
        ResourceLock::new(),
    )
}

async fn next(rx: &mut mpsc::Receiver<Notification>) -> Notification {
    timeout(DELIVERY, rx.recv())
        .await
        .expect("no notification within timeout")
        .expect("sink closed")
}

async fn assert_silent(rx: &mut mpsc::Receiver<Notification>) {
    if let Ok(n) = timeout(SILENCE, rx.recv()).await {
        panic!("unexpected notification: {n:?}");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn end_to_end_subscribe_write_unsubscribe() {
    let clipboard = MemoryClipboard::new();
    let signal = start(&clipboard);
    signal.ready().await.unwrap();

    let (tx, mut rx) = mpsc::channel::<Notification>(1);
    signal.subscribe(&tx);

    signal.write_async("hello").await.unwrap();
    let n = next(&mut rx).await;
    assert_eq!(n.text, "hello");
    assert_eq!(n.error, None);

    signal.unsubscribe(&tx);
    signal.write_async("goodbye").await.unwrap();
    assert_silent(&mut rx).await;
}

#[test]
fn end_to_end_with_blocking_calls() {
    let clipboard = MemoryClipboard::new();
    let signal = start(&clipboard);
    assert_eq!(signal.await_ready(), Ok(()));

    let (tx, mut rx) = mpsc::channel::<Notification>(1);
    signal.subscribe(&tx);
    signal.write("hello").unwrap();
    let n = rx.blocking_recv().expect("sink closed");
    assert_eq!((n.text.as_str(), n.error), ("hello", None));

    signal.unsubscribe(&tx);
    signal.write("goodbye").unwrap();
    thread::sleep(SILENCE);
    assert!(rx.try_recv().is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn blocking_calls_work_inside_an_async_runtime() {
    let clipboard = MemoryClipboard::new();
    let signal = start(&clipboard);
    signal.ready().await.unwrap();

    let (tx, mut rx) = mpsc::channel::<Notification>(1);
    signal.subscribe(&tx);

    signal.write("from a runtime worker").unwrap();
    assert_eq!(signal.read(), Ok("from a runtime worker".to_string()));
    assert_eq!(next(&mut rx).await.text, "from a runtime worker");
}

#[tokio::test(flavor = "multi_thread")]
async fn changes_from_other_applications_are_delivered() {
    let clipboard = MemoryClipboard::new();
    let signal = start(&clipboard);
    signal.ready().await.unwrap();

    let (tx, mut rx) = mpsc::channel::<Notification>(1);
    signal.subscribe(&tx);

    for text in ["plain", "", "ünïcödé", "日本語テキスト", "surrogate \u{1F4CB} pair"] {
        clipboard.copy_from_other_app(text);
        let n = next(&mut rx).await;
        assert_eq!(n.text, text);
        assert!(n.error.is_none());
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn double_subscribe_delivers_once() {
    let clipboard = MemoryClipboard::new();
    let signal = start(&clipboard);
    signal.ready().await.unwrap();

    let (tx, mut rx) = mpsc::channel::<Notification>(4);
    signal.subscribe(&tx);
    signal.subscribe(tx.clone());

    clipboard.copy_from_other_app("once");
    assert_eq!(next(&mut rx).await.text, "once");
    assert_silent(&mut rx).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn unsubscribe_of_unknown_sink_is_a_noop() {
    let clipboard = MemoryClipboard::new();
    let signal = start(&clipboard);
    signal.ready().await.unwrap();

    let (registered, mut rx) = mpsc::channel::<Notification>(1);
    let (stranger, _stranger_rx) = mpsc::unbounded_channel::<Notification>();
    signal.subscribe(&registered);

    signal.unsubscribe(&stranger);
    signal.unsubscribe(&stranger);
    assert_eq!(signal.subscriber_count(), 1);

    clipboard.copy_from_other_app("still here");
    assert_eq!(next(&mut rx).await.text, "still here");
}

#[tokio::test(flavor = "multi_thread")]
async fn full_subscriber_does_not_block_others() {
    let clipboard = MemoryClipboard::new();
    let signal = start(&clipboard);
    signal.ready().await.unwrap();

    let (stuck, mut stuck_rx) = mpsc::channel::<Notification>(1);
    stuck
        .try_send(Notification::from_read(0, Ok("stale".to_string())))
        .unwrap();
    let (healthy, mut healthy_rx) = mpsc::channel::<Notification>(1);
    signal.subscribe(&stuck);
    signal.subscribe(&healthy);

    clipboard.copy_from_other_app("fresh");
    assert_eq!(next(&mut healthy_rx).await.text, "fresh");

    // The full sink kept its old value and missed the new one.
    assert_eq!(next(&mut stuck_rx).await.text, "stale");
    assert_silent(&mut stuck_rx).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn read_failure_is_delivered_with_empty_text() {
    let clipboard = MemoryClipboard::new();
    let signal = start(&clipboard);
    signal.ready().await.unwrap();

    let (tx, mut rx) = mpsc::channel::<Notification>(1);
    signal.subscribe(&tx);

    clipboard.clear();
    clipboard.touch();
    let n = next(&mut rx).await;
    assert_eq!(n.text, "");
    assert_eq!(n.error, Some(ClipboardError::NoText));
}

#[tokio::test(flavor = "multi_thread")]
async fn write_then_read_round_trips() {
    let clipboard = MemoryClipboard::new();
    let signal = start(&clipboard);
    signal.ready().await.unwrap();

    for text in ["", "ascii", "émoji \u{1F600}", "𝄞 clef", "line\r\nbreak"] {
        signal.write_async(text).await.unwrap();
        assert_eq!(signal.read_async().await, Ok(text.to_string()));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn write_failure_is_returned_and_source_keeps_running() {
    let clipboard = MemoryClipboard::new();
    let signal = start(&clipboard);
    signal.ready().await.unwrap();

    clipboard.fail_next_write(ClipboardError::Open("Access is denied.".into()));
    assert_eq!(
        signal.write_async("x").await,
        Err(ClipboardError::Open("Access is denied.".into()))
    );

    signal.write_async("y").await.unwrap();
    assert_eq!(signal.state(), EventSourceState::Ready);
}

/// Holds `attach` until the test releases it.
struct HeldFactory {
    inner: cs_platform::MemorySessionFactory,
    release: Mutex<std_mpsc::Receiver<()>>,
}

impl SessionFactory for HeldFactory {
    fn name(&self) -> &'static str {
        "held"
    }

    fn attach(&self, lock: &ResourceLock) -> Result<Box<dyn ClipboardSession>, ClipboardError> {
        let _ = self.release.lock().unwrap().recv();
        self.inner.attach(lock)
    }
}

#[test]
fn ready_gate_gives_every_waiter_the_same_outcome() {
    let clipboard = MemoryClipboard::new();
    let (release, held) = std_mpsc::channel();
    let factory = HeldFactory {
        inner: clipboard.factory(),
        release: Mutex::new(held),
    };
    let signal = Arc::new(ClipboardSignal::with_lock(
        factory,
        &PlatformOptions::default(),
        ResourceLock::new(),
    ));

    let early: Vec<_> = (0..8)
        .map(|_| {
            let signal = signal.clone();
            thread::spawn(move || signal.await_ready())
        })
        .collect();

    assert_eq!(signal.await_ready_timeout(Duration::from_millis(20)), None);
    assert!(!signal.state().is_resolved());
    release.send(()).unwrap();

    for waiter in early {
        assert_eq!(waiter.join().unwrap(), Ok(()));
    }
    for _ in 0..3 {
        assert_eq!(signal.await_ready(), Ok(()));
    }
    assert_eq!(signal.state(), EventSourceState::Ready);
}

#[test]
fn startup_failure_reaches_every_waiter() {
    let clipboard = MemoryClipboard::new();
    let err = ClipboardError::Registration("class not registered".into());
    clipboard.fail_attach(err.clone());
    let signal = Arc::new(start(&clipboard));

    let waiters: Vec<_> = (0..8)
        .map(|_| {
            let signal = signal.clone();
            thread::spawn(move || signal.await_ready())
        })
        .collect();
    for waiter in waiters {
        assert_eq!(waiter.join().unwrap(), Err(err.clone()));
    }

    assert_eq!(signal.await_ready(), Err(err));
    assert_eq!(signal.state(), EventSourceState::Failed);
    assert_eq!(signal.read(), Err(ClipboardError::EventSourceStopped));
}

#[tokio::test(flavor = "multi_thread")]
async fn calls_made_before_ready_complete_after_startup() {
    let clipboard = MemoryClipboard::with_text("early bird");
    let signal = start(&clipboard);

    // No await on the gate: the job waits in the queue until attach finishes.
    let text = timeout(DELIVERY, signal.read_async()).await.unwrap();
    assert_eq!(text, Ok("early bird".to_string()));
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_stops_delivery_and_access() {
    let clipboard = MemoryClipboard::new();
    let signal = start(&clipboard);
    signal.ready().await.unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();
    signal.subscribe(&tx);

    signal.shutdown();
    assert_eq!(signal.state(), EventSourceState::Terminated);
    assert!(!clipboard.is_attached());

    clipboard.copy_from_other_app("nobody listening");
    assert!(timeout(SILENCE, rx.recv()).await.is_err());
    assert_eq!(
        signal.write_async("late").await,
        Err(ClipboardError::EventSourceStopped)
    );
}
