//! Event source behavior against scripted sessions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cs_core::{
    ClipboardError, ClipboardSession, EventSourceState, Notification, ResourceLock,
    SessionFactory, SessionWaker, SourceMessage, SubscriberRegistry,
};
use cs_platform::{EventSource, MemoryClipboard};
use mockall::mock;
use tokio::sync::mpsc;
use tokio::time::timeout;

mock! {
    pub Factory {}

    impl SessionFactory for Factory {
        fn name(&self) -> &'static str;
        fn attach(&self, lock: &ResourceLock) -> Result<Box<dyn ClipboardSession>, ClipboardError>;
    }
}

mock! {
    pub Session {}

    impl ClipboardSession for Session {
        fn read_text(&mut self) -> Result<String, ClipboardError>;
        fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
        fn next_message(&mut self) -> Result<SourceMessage, ClipboardError>;
        fn waker(&self) -> Box<dyn SessionWaker>;
    }
}

mock! {
    pub Waker {}

    impl SessionWaker for Waker {
        fn wake(&self);
        fn shutdown(&self);
    }
}

fn quiet_waker() -> Box<dyn SessionWaker> {
    let mut waker = MockWaker::new();
    waker.expect_wake().returning(|| ());
    waker.expect_shutdown().returning(|| ());
    Box::new(waker)
}

fn wait_for(source: &EventSource, wanted: EventSourceState) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while source.state() != wanted {
        assert!(Instant::now() < deadline, "state stuck at {}", source.state());
        std::thread::sleep(Duration::from_millis(5));
    }
}

/// A session that reports `updates` clipboard changes and then fails.
fn scripted_session(updates: usize, reads: Arc<AtomicUsize>) -> MockSession {
    let mut session = MockSession::new();
    let calls = AtomicUsize::new(0);
    session.expect_next_message().returning(move || {
        if calls.fetch_add(1, Ordering::SeqCst) < updates {
            Ok(SourceMessage::ClipboardUpdate)
        } else {
            Err(ClipboardError::MessageRetrieval("scripted failure".into()))
        }
    });
    session.expect_read_text().returning(move || {
        let n = reads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("change {n}"))
    });
    session.expect_waker().returning(quiet_waker);
    session
}

#[test]
fn attach_runs_on_the_named_thread() {
    let attached_on = Arc::new(Mutex::new(None));
    let seen = attached_on.clone();

    let mut factory = MockFactory::new();
    factory.expect_name().return_const("mock");
    factory.expect_attach().times(1).return_once(move |_| {
        *seen.lock().unwrap() = std::thread::current().name().map(str::to_string);
        Ok(Box::new(scripted_session(0, Arc::default())))
    });

    let source = EventSource::spawn(
        factory,
        Arc::new(SubscriberRegistry::new()),
        ResourceLock::new(),
        "mock-event-source",
    );

    assert_eq!(source.await_ready(), Ok(()));
    wait_for(&source, EventSourceState::Terminated);
    assert_eq!(
        attached_on.lock().unwrap().as_deref(),
        Some("mock-event-source")
    );
}

#[test]
fn every_update_reads_once_and_reaches_the_subscriber() {
    let reads = Arc::new(AtomicUsize::new(0));
    let session = scripted_session(3, reads.clone());

    let mut factory = MockFactory::new();
    factory.expect_name().return_const("mock");
    factory
        .expect_attach()
        .return_once(move |_| Ok(Box::new(session)));

    let registry = Arc::new(SubscriberRegistry::new());
    let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();
    registry.subscribe(&tx);

    let source = EventSource::spawn(factory, registry, ResourceLock::new(), "mock-event-source");
    wait_for(&source, EventSourceState::Terminated);

    assert_eq!(reads.load(Ordering::SeqCst), 3);
    let texts: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
        .map(|n| n.text)
        .collect();
    assert_eq!(texts, vec!["change 1", "change 2", "change 3"]);
}

#[test]
fn registration_error_is_reported_and_never_retried() {
    let mut factory = MockFactory::new();
    factory.expect_name().return_const("mock");
    factory
        .expect_attach()
        .times(1)
        .returning(|_| Err(ClipboardError::Registration("AddClipboardFormatListener".into())));

    let source = EventSource::spawn(
        factory,
        Arc::new(SubscriberRegistry::new()),
        ResourceLock::new(),
        "mock-event-source",
    );

    let err = source.await_ready().unwrap_err();
    assert!(err.is_startup());
    assert_eq!(source.state(), EventSourceState::Failed);
    assert_eq!(source.write("x"), Err(ClipboardError::EventSourceStopped));
}

#[test]
fn shutdown_is_honoured_when_the_session_never_quits() {
    let mut session = MockSession::new();
    // Only ever reports wakeups, and the waker below drops quit requests.
    session.expect_next_message().returning(|| {
        std::thread::sleep(Duration::from_millis(1));
        Ok(SourceMessage::Wake)
    });
    session.expect_waker().returning(quiet_waker);

    let mut factory = MockFactory::new();
    factory.expect_name().return_const("mock");
    factory
        .expect_attach()
        .return_once(move |_| Ok(Box::new(session)));

    let source = Arc::new(EventSource::spawn(
        factory,
        Arc::new(SubscriberRegistry::new()),
        ResourceLock::new(),
        "mock-event-source",
    ));
    source.await_ready().unwrap();

    let (done_tx, done_rx) = std::sync::mpsc::channel();
    let stopping = source.clone();
    std::thread::spawn(move || {
        stopping.shutdown();
        let _ = done_tx.send(());
    });

    done_rx
        .recv_timeout(Duration::from_secs(2))
        .expect("event source ignored the shutdown request");
    assert_eq!(source.state(), EventSourceState::Terminated);
}

#[tokio::test(flavor = "multi_thread")]
async fn async_access_does_not_block_the_runtime() {
    let clipboard = MemoryClipboard::with_text("seed");
    let source = EventSource::spawn(
        clipboard.factory(),
        Arc::new(SubscriberRegistry::new()),
        ResourceLock::new(),
        "async-event-source",
    );

    timeout(Duration::from_secs(2), source.ready())
        .await
        .expect("gate never resolved")
        .unwrap();

    assert_eq!(source.read_async().await, Ok("seed".to_string()));
    source.write_async("from async").await.unwrap();
    assert_eq!(clipboard.text().as_deref(), Some("from async"));
}

#[tokio::test(flavor = "multi_thread")]
async fn external_changes_are_delivered_to_bounded_subscribers() {
    let clipboard = MemoryClipboard::new();
    let registry = Arc::new(SubscriberRegistry::new());
    let source = EventSource::spawn(
        clipboard.factory(),
        registry.clone(),
        ResourceLock::new(),
        "async-event-source",
    );
    source.ready().await.unwrap();

    let (tx, mut rx) = mpsc::channel::<Notification>(4);
    registry.subscribe(&tx);
    clipboard.copy_from_other_app("copied elsewhere");

    let n = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("no notification")
        .expect("sink closed");
    assert_eq!(n.text, "copied elsewhere");
    assert!(n.error.is_none());

    source.shutdown();
    assert_eq!(source.state(), EventSourceState::Terminated);
}
