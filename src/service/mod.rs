// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service layer: building, caching and serving options instances.
//!
//! [`OptionsBuilder`] collects registrations for one type and produces [`OptionsServices`],
//! which hands out the three accessors:
//!
//! - [`Options`]: built once, never changes.
//! - [`OptionsSnapshot`]: built once per scope.
//! - [`OptionsMonitor`]: rebuilt when a change source fires, with change listeners.

pub mod cache;
pub mod container;
pub mod factory;
pub mod monitor;
pub mod options;
pub mod registry;
pub mod services;
pub mod snapshot;

pub use cache::OptionsCache;
pub use container::OptionsContainer;
pub use factory::OptionsFactory;
pub use monitor::{ListenerHandle, OptionsMonitor};
pub use options::Options;
pub use registry::{OptionsBuilder, OptionsRegistrations};
pub use services::OptionsServices;
pub use snapshot::OptionsSnapshot;
