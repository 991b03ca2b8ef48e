// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures for the integration tests.
//!
//! Included by the integration test files with `mod common;`.

#![allow(dead_code)]

use hexopts::domain::{ConfigSection, OptionsName};
use hexopts::ports::Bind;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Options type with a single string field, used by the ordering and monitor scenarios.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MessageOptions {
    pub message: String,
}

/// Options type bound from a configuration section.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DatabaseOptions {
    pub host: String,
    pub port: u16,
    pub pool_size: usize,
    pub read_only: bool,
    pub replicas: Vec<String>,
}

impl Bind for DatabaseOptions {
    fn bind(&mut self, section: &ConfigSection) {
        section.bind_value("host", &mut self.host);
        section.bind_value("port", &mut self.port);
        section.bind_value("pool_size", &mut self.pool_size);
        section.bind_flag("read_only", &mut self.read_only);
        section.bind_vec("replicas", &mut self.replicas);
    }
}

/// Shorthand for a valid, non-default name.
pub fn name(s: &str) -> OptionsName {
    OptionsName::new(s).expect("valid test name")
}

/// A counter that hands out 1, 2, 3, ...
#[derive(Clone, Default)]
pub struct Sequence(Arc<AtomicUsize>);

impl Sequence {
    pub fn next(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Collects whatever listeners push into it.
#[derive(Clone)]
pub struct Recorder<V>(Arc<Mutex<Vec<V>>>);

impl<V: Clone> Recorder<V> {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }

    pub fn push(&self, value: V) {
        self.0.lock().unwrap().push(value);
    }

    pub fn take(&self) -> Vec<V> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

/// Initializes a tracing subscriber for test output.
///
/// Safe to call from several tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
