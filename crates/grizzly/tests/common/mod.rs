//! Shared test utilities for grizzly integration tests.
//!
//! This module provides:
//! - `MemoryHandler`, a handler whose "remote" is an in-memory map
//! - `RecordingNotifier`, which captures every event in order
//! - `TestHarness` for isolated test execution with temp directories

pub mod handler;
pub mod harness;
pub mod notifier;

#[allow(unused_imports)]
pub use handler::MemoryHandler;
#[allow(unused_imports)]
pub use harness::TestHarness;
#[allow(unused_imports)]
pub use notifier::{Event, RecordingNotifier};
