#[path = "../support/mod.rs"]
mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use gamebus::{
    ChangeKind, CollectionChange, CompositeDisposable, Disposable, DisposableExt,
    ReactiveCollection, ReactiveCommand, ReactiveError, ReactiveProperty, Subscription, Validator,
};
use support::{init_tracing, Recorder};

#[test]
fn property_notifies_only_on_change() {
    init_tracing();
    let mana = ReactiveProperty::new(50);
    let seen = Recorder::new();
    let _sub = {
        let seen = seen.clone();
        mana.subscribe(move |v: &i32| seen.push(*v))
    };

    for value in [50, 40, 40, 45, 50, 50] {
        mana.set(value).unwrap();
    }
    assert_eq!(seen.values(), vec![40, 45, 50]);
}

#[test]
fn property_writers_from_many_threads() {
    init_tracing();
    let counter = ReactiveProperty::new(-1i64);
    let notified = Arc::new(AtomicUsize::new(0));
    let _sub = {
        let notified = Arc::clone(&notified);
        counter.subscribe(move |_| {
            notified.fetch_add(1, Ordering::SeqCst);
        })
    };

    let writers: Vec<_> = (0..8i64)
        .map(|t| {
            let counter = counter.clone();
            thread::spawn(move || {
                for i in 0..1000i64 {
                    counter.set(t * 1000 + i).unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    assert_eq!(notified.load(Ordering::SeqCst), 8000);
}

#[test]
fn rule_set_rejects_and_explains() {
    init_tracing();
    let name = ReactiveProperty::new("Hero".to_string());
    name.set_rules(
        Validator::new()
            .rule(|s: &String| !s.is_empty(), "name is required")
            .rule(|s: &String| s.len() <= 8, "name is too long"),
    );

    match name.set(String::new()) {
        Err(ReactiveError::Validation { reason }) => assert_eq!(reason, "name is required"),
        other => panic!("unexpected: {:?}", other),
    }
    assert!(name.set("Adventurer".to_string()).is_err());
    assert_eq!(name.value(), "Hero");

    name.set("Rogue".to_string()).unwrap();
    assert_eq!(name.value(), "Rogue");
}

#[test]
fn batch_delivers_final_value_once() {
    init_tracing();
    let gold = ReactiveProperty::new(0u32);
    let seen = Recorder::new();
    let _sub = {
        let seen = seen.clone();
        gold.subscribe(move |v: &u32| seen.push(*v))
    };

    {
        let _batch = gold.batch();
        for amount in 1..=10 {
            gold.set(amount).unwrap();
        }
    }
    assert_eq!(seen.values(), vec![10]);
}

#[test]
fn derived_property_follows_source() {
    init_tracing();
    let health = ReactiveProperty::new(100);
    let low = health.map(|v: &i32| *v < 25);
    assert!(!low.value());

    health.set(20).unwrap();
    assert!(low.value());

    health.dispose();
    assert!(low.value());
    assert!(health.set(90).is_err());
}

#[test]
fn collection_reports_every_mutation() {
    init_tracing();
    let mut inventory = ReactiveCollection::new();
    let changes = Recorder::new();
    let _sub = {
        let changes = changes.clone();
        inventory.subscribe(move |change: &CollectionChange<&'static str>| {
            changes.push(change.clone())
        })
    };

    inventory.add("sword");
    inventory.add("shield");
    inventory.insert(1, "potion").unwrap();
    inventory.set(0, "axe").unwrap();
    assert!(inventory.remove(&"potion"));
    assert!(!inventory.remove(&"bow"));
    inventory.clear();

    let kinds: Vec<(ChangeKind, &str)> = changes
        .values()
        .into_iter()
        .map(|change| (change.kind, change.item))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (ChangeKind::Add, "sword"),
            (ChangeKind::Add, "shield"),
            (ChangeKind::Add, "potion"),
            (ChangeKind::Remove, "sword"),
            (ChangeKind::Add, "axe"),
            (ChangeKind::Remove, "potion"),
            (ChangeKind::Remove, "axe"),
            (ChangeKind::Remove, "shield"),
        ]
    );
    assert!(inventory.is_empty());
}

#[test]
fn collection_index_errors() {
    let mut slots: ReactiveCollection<u8> = vec![1, 2].into();
    assert!(matches!(
        slots.insert(3, 9),
        Err(ReactiveError::OutOfBounds { index: 3, len: 2 })
    ));
    assert!(matches!(
        slots.remove_at(2),
        Err(ReactiveError::OutOfBounds { index: 2, len: 2 })
    ));
    assert_eq!(slots.remove_at(0).unwrap(), 1);
    assert_eq!(slots.to_vec(), vec![2]);
}

#[test]
fn command_respects_can_execute() {
    init_tracing();
    let attack: ReactiveCommand<u32> = ReactiveCommand::new();
    let hits = Recorder::new();
    let toggles = Recorder::new();
    let _on_attack = {
        let hits = hits.clone();
        attack.subscribe(move |damage: &u32| hits.push(*damage))
    };
    let _on_toggle = {
        let toggles = toggles.clone();
        attack.can_execute_changed(move |enabled: &bool| toggles.push(*enabled))
    };

    assert!(attack.execute(10));
    attack.set_can_execute(false);
    assert!(!attack.execute(20));
    attack.set_can_execute(true);
    assert!(attack.execute(30));

    assert_eq!(hits.values(), vec![10, 30]);
    assert_eq!(toggles.values(), vec![false, true]);

    attack.dispose();
    assert!(!attack.execute(40));
}

#[test]
fn composite_releases_everything_once() {
    init_tracing();
    let released = Arc::new(AtomicUsize::new(0));
    let owner = CompositeDisposable::new();
    for _ in 0..5 {
        let released = Arc::clone(&released);
        Subscription::new(move || {
            released.fetch_add(1, Ordering::SeqCst);
        })
        .add_to(&owner);
    }
    let stat = ReactiveProperty::new(1);
    stat.clone().add_to(&owner);

    owner.dispose();
    owner.dispose();
    assert_eq!(released.load(Ordering::SeqCst), 5);
    assert!(stat.is_disposed());

    let late = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&late);
    Subscription::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
    .add_to(&owner);
    assert_eq!(late.load(Ordering::SeqCst), 1);
    assert!(owner.is_empty());
}

#[test]
fn composite_refuses_to_own_itself() {
    let owner: Arc<CompositeDisposable> = Arc::new(CompositeDisposable::new());
    let as_resource: Arc<dyn Disposable> = owner.clone();
    assert!(matches!(
        owner.add(as_resource),
        Err(ReactiveError::InvalidArgument { .. })
    ));
    assert!(owner.is_empty());
}
