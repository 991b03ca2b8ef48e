// SPDX-License-Identifier: MIT OR Apache-2.0

//! Basic usage example for the options crate.
//!
//! This example demonstrates:
//! - Registering ordered and named configurators
//! - Binding named options from a configuration section
//! - Validation and startup checks
//! - The three accessors: `Options`, `OptionsSnapshot` and `OptionsMonitor`
//!
//! To run this example:
//! ```bash
//! # Optionally override values through the environment
//! export APP_HTTP__PUBLIC__PORT=9000
//!
//! cargo run --example basic_usage
//! ```

use hexopts::prelude::*;

#[derive(Debug, Default)]
struct HttpOptions {
    bind: String,
    port: u16,
    workers: usize,
    allowed_origins: Vec<String>,
}

impl Bind for HttpOptions {
    fn bind(&mut self, section: &ConfigSection) {
        section.bind_value("bind", &mut self.bind);
        section.bind_value("port", &mut self.port);
        section.bind_value("workers", &mut self.workers);
        section.bind_vec("allowed_origins", &mut self.allowed_origins);
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt::init();

    println!("=== Options Crate: Basic Usage ===\n");

    let defaults = MemorySource::new()
        .with_name("defaults")
        .with_value("http.public.bind", "0.0.0.0")
        .with_value("http.public.port", "8080")
        .with_value("http.public.allowed_origins.0", "https://example.com")
        .with_value("http.admin.bind", "127.0.0.1")
        .with_value("http.admin.port", "9090");

    let builder = Configuration::builder().with_source(Box::new(defaults));
    #[cfg(feature = "env")]
    let builder = builder.with_env_prefix("APP_");
    let configuration = builder.build();

    let public = OptionsName::new("public")?;
    let admin = OptionsName::new("admin")?;

    let services = OptionsBuilder::<HttpOptions>::new()
        // Runs before binding, so configuration can override it.
        .configure_ordered(NameFilter::All, -100, |o| o.workers = 4)
        .bind(public.clone(), &configuration, "http.public")
        .bind(admin.clone(), &configuration, "http.admin")
        .configure_named(admin.clone(), |o| o.workers = 1)
        .validate(|o| o.port != 0, "port must be set")
        .validate_with(
            NameFilter::All,
            ValidationStatus::Warning,
            |o| !o.allowed_origins.is_empty(),
            "no allowed origins configured",
        )
        .build();

    // Example 1: Validate everything up front
    println!("--- Example 1: Startup validation ---");
    match services.validate_all() {
        Ok(()) => println!("✓ all names valid"),
        Err(e) => println!("✗ {}", e),
    }

    // Example 2: Named options through the monitor
    println!("\n--- Example 2: Named options ---");
    let monitor = services.monitor();
    for name in [&public, &admin] {
        let options = monitor.get(name)?;
        println!(
            "{:>7}: {}:{} workers={} origins={:?}",
            name.as_str(),
            options.bind,
            options.port,
            options.workers,
            options.allowed_origins
        );
    }

    // Example 3: A snapshot is stable for its scope
    println!("\n--- Example 3: Snapshots ---");
    let scope = services.snapshot();
    let first = scope.get(&public)?;
    let second = scope.get(&public)?;
    println!(
        "same instance within one snapshot: {}",
        std::sync::Arc::ptr_eq(&first, &second)
    );

    // Example 4: Failures name the options type and name
    println!("\n--- Example 4: Validation errors ---");
    match monitor.get(&OptionsName::new("missing")?) {
        Ok(options) => println!("unexpectedly valid: {:?}", options),
        Err(e) => println!("✗ {}", e),
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
