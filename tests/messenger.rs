//! End-to-end behaviour of both messengers through the public API.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use courier::{
    AsyncMessenger, Context, DuplicatePolicy, HandlerError, Messenger, MessengerConfig,
    MessengerError, Recipient, Registration,
};
use tokio_util::sync::CancellationToken;

type Log = Arc<Mutex<Vec<String>>>;

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
    let mut v = log.lock().unwrap().clone();
    v.sort();
    v
}

#[test]
fn sync_topic_routing() {
    let m = Messenger::new(MessengerConfig::default());
    let seen = log();

    let s = Arc::clone(&seen);
    m.register("A", move |msg: &String| {
        s.lock().unwrap().push(format!("A:{msg}"));
        Ok(())
    })
    .unwrap();
    let s = Arc::clone(&seen);
    m.register_with_context("B", "topic1", move |msg: &String| {
        s.lock().unwrap().push(format!("B:{msg}"));
        Ok(())
    })
    .unwrap();

    assert_eq!(m.send(&String::from("hello")).delivered, 1);
    assert_eq!(m.send_with_context(&String::from("world"), "topic1").delivered, 1);
    assert!(m.send_with_context(&String::from("nobody"), "topic2").is_empty());

    assert_eq!(m.unregister("A"), 1);
    assert!(m.send(&String::from("ignored")).is_empty());

    assert_eq!(entries(&seen), vec!["A:hello", "B:world"]);
}

#[tokio::test]
async fn async_topic_routing() {
    let m = AsyncMessenger::new(MessengerConfig::default());
    let seen = log();

    let s = Arc::clone(&seen);
    m.register("A", move |msg: Arc<String>| {
        let s = Arc::clone(&s);
        async move {
            s.lock().unwrap().push(format!("A:{msg}"));
            Ok(())
        }
    })
    .unwrap();
    let s = Arc::clone(&seen);
    m.register_with_context("B", "topic1", move |msg: Arc<String>| {
        let s = Arc::clone(&s);
        async move {
            s.lock().unwrap().push(format!("B:{msg}"));
            Ok(())
        }
    })
    .unwrap();

    assert_eq!(m.send(String::from("hello")).await.delivered, 1);
    assert_eq!(
        m.send_with_context(String::from("world"), "topic1").await.delivered,
        1
    );
    assert!(m.send_with_context(String::from("x"), "topic2").await.is_empty());

    assert_eq!(m.unregister("A"), 1);
    assert!(m.send(String::from("ignored")).await.is_empty());

    assert_eq!(entries(&seen), vec!["A:hello", "B:world"]);
}

#[test]
fn sync_fan_out_reaches_every_recipient_once() {
    const N: usize = 16;
    let m = Messenger::new(MessengerConfig::default());
    let hits = Arc::new(AtomicUsize::new(0));

    let owners: Vec<Arc<()>> = (0..N).map(|_| Arc::new(())).collect();
    for owner in &owners {
        let h = Arc::clone(&hits);
        m.register(owner, move |_: &u64| {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();
    }

    let d = m.send(&1u64);
    assert_eq!((d.matched, d.delivered), (N, N));
    assert_eq!(hits.load(Ordering::SeqCst), N);

    // Other message types are not routed to u64 handlers.
    assert!(m.send(&1u32).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn async_fan_out_with_failures_still_delivers_the_rest() {
    let m = AsyncMessenger::new(MessengerConfig::default());
    let hits = Arc::new(AtomicUsize::new(0));

    for i in 0..10u32 {
        let h = Arc::clone(&hits);
        m.register(Recipient::value(i), move |_: Arc<&'static str>| {
            let h = Arc::clone(&h);
            async move {
                match i {
                    3 => Err(HandlerError::fail("bad input")),
                    7 => panic!("handler {i} exploded"),
                    _ => {
                        h.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                }
            }
        })
        .unwrap();
    }

    let d = m.send("ping").await;
    assert_eq!(d.matched, 10);
    assert_eq!(d.delivered, 8);
    assert_eq!(hits.load(Ordering::SeqCst), 8);

    assert!(matches!(
        d.failure_of(&Recipient::value(3u32)),
        Some(HandlerError::Failed { .. })
    ));
    assert!(d
        .failure_of(&Recipient::value(7u32))
        .is_some_and(HandlerError::is_panic));
}

#[test]
fn duplicate_policies() {
    let replace = Messenger::new(MessengerConfig::default());
    let count = Arc::new(AtomicUsize::new(0));

    assert_eq!(
        replace.register("r", |_: &i32| Ok(())).unwrap(),
        Registration::Inserted
    );
    let c = Arc::clone(&count);
    assert_eq!(
        replace
            .register("r", move |_: &i32| {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap(),
        Registration::Replaced
    );
    assert_eq!(replace.send(&5i32).matched, 1);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    let reject =
        Messenger::new(MessengerConfig::default().with_duplicates(DuplicatePolicy::Reject));
    reject.register("r", |_: &i32| Ok(())).unwrap();
    let err = reject.register("r", |_: &i32| Ok(())).unwrap_err();
    assert!(matches!(err, MessengerError::AlreadyRegistered { .. }));

    // A different context is a different key.
    assert!(reject.register_with_context("r", "other", |_: &i32| Ok(())).is_ok());
}

#[test]
fn empty_recipient_name_is_rejected() {
    let m = Messenger::new(MessengerConfig::default());
    let err = m.register("", |_: &i32| Ok(())).unwrap_err();
    assert_eq!(err.as_label(), "messenger_invalid_recipient");
    assert!(m.registry().is_empty());
}

#[test]
fn unregister_removes_all_contexts_and_is_idempotent() {
    let m = Messenger::new(MessengerConfig::default());
    let view = Arc::new(String::from("view"));

    m.register(&view, |_: &u8| Ok(())).unwrap();
    m.register_with_context(&view, "a", |_: &u8| Ok(())).unwrap();
    m.register_with_context(&view, 42u64, |_: &u8| Ok(())).unwrap();
    m.register("other", |_: &u8| Ok(())).unwrap();

    assert_eq!(m.unregister(&view), 3);
    assert_eq!(m.unregister(&view), 0);
    assert_eq!(m.registry().recipients(), vec![Recipient::named("other")]);

    assert!(m.send_with_context(&0u8, "a").is_empty());
    assert!(m.send_with_context(&0u8, 42u64).is_empty());
    assert_eq!(m.send(&0u8).matched, 1);
}

#[test]
fn unregister_exact_keeps_other_contexts() {
    let m = Messenger::new(MessengerConfig::default());
    m.register("r", |_: &u8| Ok(())).unwrap();
    m.register_with_context("r", "a", |_: &u8| Ok(())).unwrap();

    assert!(m.unregister_exact("r", Some(&Context::from("a"))));
    assert!(!m.unregister_exact("r", Some(&Context::from("a"))));
    assert_eq!(m.send(&0u8).matched, 1);
}

#[test]
fn handler_may_unregister_itself_during_send() {
    let m = Arc::new(Messenger::new(MessengerConfig::default()));
    let me = Recipient::unique();
    let hits = Arc::new(AtomicUsize::new(0));

    let (weak, who, h) = (Arc::downgrade(&m), me.clone(), Arc::clone(&hits));
    m.register(me, move |_: &&'static str| {
        h.fetch_add(1, Ordering::SeqCst);
        if let Some(m) = weak.upgrade() {
            m.unregister(&who);
        }
        Ok(())
    })
    .unwrap();

    m.send(&"once");
    m.send(&"twice");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn sync_and_async_registries_are_separate() {
    let sync = Messenger::new(MessengerConfig::default());
    let task = AsyncMessenger::new(MessengerConfig::default());

    sync.register("r", |_: &u8| Ok(())).unwrap();
    assert!(task.registry().is_empty());
    assert_eq!(sync.registry().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn async_cancellation_reports_unfinished_handlers() {
    let m = AsyncMessenger::new(MessengerConfig::default());
    m.register("fast", |_: Arc<u8>| async { Ok(()) }).unwrap();
    m.register("slow", |_: Arc<u8>| async {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    })
    .unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let d = m.send_cancellable(1u8, None, &cancel).await;
    assert_eq!(d.matched, 2);
    assert_eq!(d.delivered, 1);
    assert!(matches!(
        d.failure_of(&Recipient::named("slow")),
        Some(HandlerError::Cancelled)
    ));
}

#[tokio::test(start_paused = true)]
async fn async_send_waits_for_every_handler() {
    let m = AsyncMessenger::new(MessengerConfig::default().with_max_parallel(1));
    let done = Arc::new(AtomicUsize::new(0));

    for i in 0..3u64 {
        let d = Arc::clone(&done);
        m.register(Recipient::value(i), move |_: Arc<()>| {
            let d = Arc::clone(&d);
            async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                d.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .unwrap();
    }

    let started = tokio::time::Instant::now();
    let d = m.send(()).await;
    assert_eq!(d.delivered, 3);
    assert_eq!(done.load(Ordering::SeqCst), 3);
    // One permit: handlers ran one after another.
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[test]
fn dropped_reference_recipients_stay_distinct() {
    let m = Messenger::new(MessengerConfig::default().with_duplicates(DuplicatePolicy::Reject));

    for _ in 0..100 {
        let object = Arc::new([0u64; 4]);
        m.register(Recipient::of(&object), |_: &u8| Ok(())).unwrap();
        drop(object);
    }
    assert_eq!(m.registry().len(), 100);

    let fresh = Arc::new([0u64; 4]);
    assert!(!m.registry().contains(&Recipient::of(&fresh), None));
    assert_eq!(m.unregister(&fresh), 0);
    assert_eq!(m.send(&0u8).delivered, 100);
}

#[test]
fn concurrent_register_send_unregister_from_many_threads() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 500;

    let m = Messenger::new(MessengerConfig::default());
    let hits = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        for t in 0..THREADS {
            let (m, hits) = (&m, &hits);
            scope.spawn(move || {
                for round in 0..ROUNDS {
                    let me = Recipient::unique();
                    let topic = Context::new((t, round));
                    let own = Arc::new(AtomicUsize::new(0));

                    let o = Arc::clone(&own);
                    m.register_in(me.clone(), Some(&topic), move |_: &u32| {
                        o.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .unwrap();

                    let d = m.send_in(&7u32, Some(&topic));
                    assert_eq!((d.matched, d.delivered), (1, 1));
                    assert_eq!(own.load(Ordering::SeqCst), 1);
                    hits.fetch_add(d.delivered, Ordering::SeqCst);

                    // Context-free traffic never reaches the per-round registrations.
                    assert!(m.send(&7u32).is_empty());
                    assert_eq!(m.unregister(&me), 1);
                }
            });
        }
    });

    assert_eq!(hits.load(Ordering::SeqCst), THREADS * ROUNDS);
    assert!(m.registry().is_empty());
}

#[test]
#[should_panic]
fn async_send_outside_a_runtime_panics() {
    let m = AsyncMessenger::new(MessengerConfig::default());
    m.register("r", |_: Arc<u8>| async { Ok(()) }).unwrap();
    futures::executor::block_on(m.send(1u8));
}

#[test]
fn async_send_without_matches_needs_no_runtime() {
    let m = AsyncMessenger::new(MessengerConfig::default());
    assert!(futures::executor::block_on(m.send(1u8)).is_empty());
}

struct CaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn failures_are_logged_under_the_sending_messenger() {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let source = Arc::clone(&buffer);
    let subscriber = tracing_subscriber::fmt::SubscriberBuilder::default()
        .with_writer(move || CaptureWriter {
            buffer: Arc::clone(&source),
        })
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let task = AsyncMessenger::new(MessengerConfig::default());
    task.register("bad", |_: Arc<u8>| async { Err(HandlerError::fail("nope")) })
        .unwrap();
    assert_eq!(task.send(1u8).await.failed(), 1);

    let sync = Messenger::new(MessengerConfig::default());
    sync.register("bad", |_: &u8| Err(HandlerError::fail("nope")))
        .unwrap();
    assert_eq!(sync.send(&1u8).failed(), 1);

    let output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
    assert_eq!(output.matches("[AsyncMessenger] Handler failed").count(), 1, "{output}");
    assert_eq!(output.matches("[Messenger] Handler failed").count(), 1, "{output}");
}
