// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live reload example.
//!
//! This example demonstrates:
//! - Watching a YAML file for changes
//! - Rebuilding monitored options when the file changes
//! - Listening for new option values
//! - Rejected configurations leaving listeners untouched
//!
//! To run this example:
//! ```bash
//! cargo run --example live_reload --features yaml,reload
//! ```

#[cfg(all(feature = "reload", feature = "yaml"))]
use hexopts::prelude::*;
#[cfg(all(feature = "reload", feature = "yaml"))]
use std::sync::Arc;
#[cfg(all(feature = "reload", feature = "yaml"))]
use std::thread;
#[cfg(all(feature = "reload", feature = "yaml"))]
use std::time::Duration;

#[cfg(all(feature = "reload", feature = "yaml"))]
#[derive(Debug, Default)]
struct FeatureFlags {
    banner: String,
    max_items: u32,
    beta: bool,
}

#[cfg(all(feature = "reload", feature = "yaml"))]
impl Bind for FeatureFlags {
    fn bind(&mut self, section: &ConfigSection) {
        section.bind_value("banner", &mut self.banner);
        section.bind_value("max_items", &mut self.max_items);
        section.bind_flag("beta", &mut self.beta);
    }
}

#[cfg(all(feature = "reload", feature = "yaml"))]
fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    println!("=== Options Crate: Live Reload Example ===\n");

    let temp_file = tempfile::NamedTempFile::new()?;
    std::fs::write(
        temp_file.path(),
        "features:\n  banner: hello\n  max_items: 10\n  beta: false\n",
    )?;
    println!("Created config file at: {:?}", temp_file.path());

    let configuration = Configuration::builder()
        .with_yaml_file(temp_file.path())?
        .build();
    configuration.attach_watcher(Box::new(FileWatcher::new(
        temp_file.path(),
        Some(Duration::from_millis(200)),
    )?))?;

    let services = OptionsBuilder::<FeatureFlags>::new()
        .bind(OptionsName::default_name(), &configuration, "features")
        .validate(|f| f.max_items <= 100, "max_items must be at most 100")
        .build();
    let monitor = services.monitor();
    println!("Initial: {:?}", monitor.current_value()?);

    let _handle = monitor.on_change(|flags: &Arc<FeatureFlags>, _name| {
        println!("✓ Options changed: {:?}", flags);
    });

    let updates = [
        "features:\n  banner: updated\n  max_items: 20\n  beta: true\n",
        // Rejected by validation: the listener is not called.
        "features:\n  banner: too-many\n  max_items: 1000\n",
        "features:\n  banner: fixed\n  max_items: 30\n",
    ];
    for update in updates {
        thread::sleep(Duration::from_millis(500));
        println!("\nWriting new configuration...");
        std::fs::write(temp_file.path(), update)?;
        thread::sleep(Duration::from_millis(700));
        match monitor.current_value() {
            Ok(flags) => println!("Current: {:?}", flags),
            Err(e) => println!("✗ {}", e),
        }
    }

    configuration.stop_watchers()?;
    println!("\n=== Example Complete ===");
    Ok(())
}

#[cfg(not(all(feature = "reload", feature = "yaml")))]
fn main() {
    println!("This example requires the 'reload' and 'yaml' features.");
    println!("Run with: cargo run --example live_reload --features yaml,reload");
}
