#[path = "../support/mod.rs"]
mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use gamebus::{
    BusConfig, Callback, Disposable, EventBus, Filter, GameEventBus, NamedEvent, QueueConfig,
    QueueState, QueuedEventBus, Subscription, WeakEventManager, WeakHandler,
};
use serde_json::json;
use support::{init_tracing, HealthChanged, LevelUp, Recorder};

#[test]
fn concurrent_publishers_deliver_every_event() {
    init_tracing();
    let bus = GameEventBus::new();
    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&delivered);
    let _sub = bus.subscribe(move |_: &HealthChanged| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let publishers: Vec<_> = (0..20)
        .map(|t| {
            let bus = bus.clone();
            thread::spawn(move || {
                for i in 0..1000 {
                    bus.publish(HealthChanged::new(t * 1000 + i, 100_000));
                }
            })
        })
        .collect();
    for publisher in publishers {
        publisher.join().unwrap();
    }

    assert_eq!(delivered.load(Ordering::SeqCst), 20_000);
    assert_eq!(bus.history::<HealthChanged>().len(), 100);
}

#[test]
fn subscribing_while_publishing_is_safe() {
    init_tracing();
    let bus = GameEventBus::new();
    let publisher = {
        let bus = bus.clone();
        thread::spawn(move || {
            for i in 0..2000 {
                bus.publish(LevelUp::new(i));
            }
        })
    };

    for _ in 0..200 {
        let sub = bus.subscribe(|_: &LevelUp| {});
        sub.dispose();
    }
    publisher.join().unwrap();
    assert_eq!(bus.subscriber_count::<LevelUp>(), 0);
}

#[test]
fn subscriber_added_during_dispatch_waits_for_next_event() {
    init_tracing();
    let bus = GameEventBus::new();
    let late = Recorder::new();
    let added: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

    let _first = {
        let bus = bus.clone();
        let late = late.clone();
        let added = Arc::clone(&added);
        bus.clone().subscribe(move |_: &LevelUp| {
            let mut slot = added.lock().unwrap();
            if slot.is_none() {
                let late = late.clone();
                *slot = Some(bus.subscribe(move |e: &LevelUp| late.push(e.level)));
            }
        })
    };

    bus.publish(LevelUp::new(1));
    assert!(late.values().is_empty());
    bus.publish(LevelUp::new(2));
    assert_eq!(late.values(), vec![2]);
}

#[test]
fn handlers_may_publish_other_events() {
    init_tracing();
    let bus = GameEventBus::new();
    let levels = Recorder::new();

    let _chain = {
        let bus_for_handler = bus.clone();
        bus.subscribe(move |e: &HealthChanged| {
            if e.current == e.max {
                bus_for_handler.publish(LevelUp::new(2));
            }
        })
    };
    let _levels = {
        let levels = levels.clone();
        bus.subscribe(move |e: &LevelUp| levels.push(e.level))
    };

    bus.publish(HealthChanged::new(50, 100));
    bus.publish(HealthChanged::new(100, 100));
    assert_eq!(levels.values(), vec![2]);
}

#[test]
fn failing_handlers_are_reported_not_raised() {
    init_tracing();
    let bus = GameEventBus::new();
    let good = Recorder::new();
    let _err = bus.subscribe_callback(Callback::fallible(|_: &HealthChanged| {
        Err("save slot unavailable".into())
    }));
    let _panic = bus.subscribe(|_: &HealthChanged| panic!("renderer crashed"));
    let _good = {
        let good = good.clone();
        bus.subscribe(move |e: &HealthChanged| good.push(e.current))
    };

    let report = bus.publish(HealthChanged::new(70, 100));
    assert_eq!(report.faults, 2);
    assert_eq!(report.delivered, 1);
    assert_eq!(good.values(), vec![70]);
}

#[test]
fn dispose_completes_each_stream_once() {
    init_tracing();
    let bus = GameEventBus::new();
    let completions = Arc::new(AtomicUsize::new(0));
    let mut subs = Vec::new();
    for _ in 0..3 {
        let done = Arc::clone(&completions);
        subs.push(
            bus.stream::<HealthChanged>()
                .on_completed(move || {
                    done.fetch_add(1, Ordering::SeqCst);
                })
                .subscribe(|_| {}),
        );
    }
    let done = Arc::clone(&completions);
    subs.push(
        bus.stream::<LevelUp>()
            .on_completed(move || {
                done.fetch_add(1, Ordering::SeqCst);
            })
            .subscribe(|_| {}),
    );

    bus.dispose();
    bus.dispose();
    drop(subs);
    assert_eq!(completions.load(Ordering::SeqCst), 4);
}

#[test]
fn named_bus_filters_and_history() {
    init_tracing();
    let bus = EventBus::with_config(BusConfig::default().with_history(5));
    let crits = Recorder::new();
    let _sub = {
        let crits = crits.clone();
        bus.subscribe(
            "Damage",
            Callback::new(move |e: &NamedEvent| crits.push(e.data["amount"].clone())),
            Some(Filter::new(|e: &NamedEvent| e.data["critical"] == json!(true))),
        )
    };

    for amount in 0..8 {
        bus.emit_event(
            "Damage",
            json!({ "amount": amount, "critical": amount % 3 == 0 }),
        );
    }

    assert_eq!(crits.values(), vec![json!(0), json!(3), json!(6)]);
    let history: Vec<_> = bus
        .get_event_history("Damage")
        .iter()
        .map(|e| e.data["amount"].clone())
        .collect();
    assert_eq!(history, (3..8).map(|n| json!(n)).collect::<Vec<_>>());
}

#[test]
fn named_bus_concurrent_emit() {
    init_tracing();
    let bus = EventBus::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let _sub = {
        let hits = Arc::clone(&hits);
        bus.on("Tick", move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    };

    let emitters: Vec<_> = (0..8)
        .map(|_| {
            let bus = bus.clone();
            thread::spawn(move || {
                for n in 0..250 {
                    bus.emit_event("Tick", json!(n));
                }
            })
        })
        .collect();
    for emitter in emitters {
        emitter.join().unwrap();
    }
    assert_eq!(hits.load(Ordering::SeqCst), 2000);
}

#[test]
fn queued_bus_orders_by_priority_across_threads() {
    init_tracing();
    let bus = QueuedEventBus::new();
    let order = Recorder::new();
    let _sub = {
        let order = order.clone();
        bus.on("Job", move |e| order.push(e.priority))
    };

    let producers: Vec<_> = (0..4)
        .map(|priority| {
            let bus = bus.clone();
            thread::spawn(move || {
                for n in 0..25 {
                    assert!(bus.emit_event("Job", json!(n), priority));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }
    assert_eq!(bus.state(), QueueState::Pending);

    let result = bus.drain();
    assert_eq!(result.dispatched, 100);
    assert_eq!(result.remaining, 0);

    let seen = order.values();
    assert_eq!(seen.len(), 100);
    assert!(seen.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[test]
fn queued_bus_fifo_within_priority() {
    init_tracing();
    let bus = QueuedEventBus::with_config(QueueConfig::default().with_batch_size(10));
    let order = Recorder::new();
    let _sub = {
        let order = order.clone();
        bus.on("Job", move |e| order.push(e.data.as_u64().unwrap_or_default()))
    };

    for n in 0..30 {
        bus.emit_event("Job", json!(n), 1);
    }
    let mut cycles = 0;
    while bus.state() == QueueState::Pending {
        bus.drain();
        cycles += 1;
    }

    assert_eq!(cycles, 3);
    assert_eq!(order.values(), (0..30).collect::<Vec<u64>>());
}

#[cfg(feature = "drain-thread")]
#[test]
fn drain_loop_delivers_queued_events() {
    use gamebus::DrainLoop;
    use std::time::Duration;

    init_tracing();
    let bus = QueuedEventBus::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let _sub = {
        let hits = Arc::clone(&hits);
        bus.on("Autosave", move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    };

    let driver = DrainLoop::spawn(bus.clone(), Duration::from_millis(2));
    for slot in 0..20 {
        bus.emit_event("Autosave", json!({ "slot": slot }), 0);
    }
    let stats = driver.stop();

    assert_eq!(stats.dispatched, 20);
    assert_eq!(hits.load(Ordering::SeqCst), 20);
    assert_eq!(bus.get_event_history("Autosave").len(), 20);
}

#[test]
fn weak_handlers_follow_their_owner() {
    init_tracing();
    let manager: WeakEventManager<String> = WeakEventManager::new();
    let log = Recorder::new();

    let owner: Arc<WeakHandler<String>> = {
        let log = log.clone();
        Arc::new(move |name: &String| log.push(name.clone()))
    };
    manager.add_handler("SceneLoaded", &owner);

    assert_eq!(manager.raise("SceneLoaded", &"Forest".to_string()), 1);
    drop(owner);
    assert_eq!(manager.raise("SceneLoaded", &"Cave".to_string()), 0);
    assert_eq!(manager.handler_count("SceneLoaded"), 0);
    assert_eq!(log.values(), vec!["Forest".to_string()]);
}
