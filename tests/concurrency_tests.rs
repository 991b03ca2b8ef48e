// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concurrency tests for the cache and the monitor.

mod common;

use common::{name, MessageOptions, Recorder, Sequence};
use hexopts::adapters::ReloadTokenSource;
use hexopts::domain::OptionsName;
use hexopts::service::{OptionsBuilder, OptionsCache};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const THREADS: usize = 16;

#[test]
fn test_concurrent_get_or_add_builds_once() {
    let cache = Arc::new(OptionsCache::<MessageOptions>::new());
    let builds = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let cache = cache.clone();
            let builds = builds.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                cache
                    .get_or_add(&name("shared"), |_| {
                        builds.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(20));
                        Ok(MessageOptions {
                            message: "built".into(),
                        })
                    })
                    .unwrap()
            })
        })
        .collect();

    let values: Vec<Arc<MessageOptions>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
}

#[test]
fn test_concurrent_monitor_reads_share_one_instance() {
    let sequence = Sequence::default();
    let counter = sequence.clone();
    let services = Arc::new(
        OptionsBuilder::<MessageOptions>::new()
            .configure(move |o| {
                thread::sleep(Duration::from_millis(10));
                o.message = counter.next().to_string();
            })
            .build(),
    );
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let services = services.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                services.monitor().current_value().unwrap()
            })
        })
        .collect();

    let values: Vec<Arc<MessageOptions>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(sequence.count(), 1);
    assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
}

#[test]
fn test_concurrent_triggers_for_different_names() {
    let names: Vec<OptionsName> = (0..8).map(|i| name(&format!("n{}", i))).collect();
    let sources: Vec<ReloadTokenSource> = names
        .iter()
        .map(|n| ReloadTokenSource::new(n.clone()))
        .collect();

    let builder = sources.iter().fold(
        OptionsBuilder::<MessageOptions>::new().configure_named(OptionsName::default_name(), |o| {
            o.message = "ready".into()
        }),
        |builder, source| builder.with_change_source(source.clone()),
    );
    let services = builder.build();
    let monitor = services.monitor().clone();

    let notifications = Arc::new(AtomicUsize::new(0));
    let counter = notifications.clone();
    let _handle = monitor.on_change(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let barrier = Arc::new(Barrier::new(sources.len()));
    let handles: Vec<_> = sources
        .into_iter()
        .map(|source| {
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..5 {
                    source.trigger();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Each trigger is handled synchronously on its own thread, one thread per name.
    assert_eq!(notifications.load(Ordering::SeqCst), 8 * 5);
    for n in &names {
        assert_eq!(monitor.get(n).unwrap().message, "ready");
    }
}

#[test]
fn test_concurrent_triggers_for_one_name_are_not_lost() {
    let source = ReloadTokenSource::new(OptionsName::default_name());
    let sequence = Sequence::default();
    let counter = sequence.clone();
    let services = OptionsBuilder::<MessageOptions>::new()
        .configure(move |o| o.message = counter.next().to_string())
        .with_change_source(source.clone())
        .build();
    let monitor = services.monitor().clone();
    monitor.current_value().unwrap();

    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let source = source.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..10 {
                    source.trigger();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Coalesced triggers may share a rebuild, but the last one is always observed.
    let last_build = sequence.count();
    assert!(last_build >= 2);
    assert_eq!(
        monitor.current_value().unwrap().message,
        last_build.to_string()
    );
}

#[test]
fn test_processing_for_one_name_never_interleaves() {
    let source = ReloadTokenSource::new(OptionsName::default_name());
    let sequence = Sequence::default();
    let counter = sequence.clone();
    let services = OptionsBuilder::<MessageOptions>::new()
        .configure(move |o| o.message = counter.next().to_string())
        .with_change_source(source.clone())
        .build();
    let monitor = services.monitor().clone();
    monitor.current_value().unwrap();

    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));
    let seen = Recorder::new();
    let _handle = {
        let in_flight = in_flight.clone();
        let max_in_flight = max_in_flight.clone();
        let seen = seen.clone();
        monitor.on_change(move |o: &Arc<MessageOptions>, _| {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_in_flight.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(2));
            seen.push(o.message.parse::<usize>().unwrap());
            in_flight.fetch_sub(1, Ordering::SeqCst);
        })
    };

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let source = source.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..5 {
                    source.trigger();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
    let seen = seen.take();
    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
}
