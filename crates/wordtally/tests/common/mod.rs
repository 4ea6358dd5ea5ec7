//! Shared test utilities for wordtally integration tests.
//!
//! - `TestHarness` owns a temporary text folder and a job manager
//! - `CollectingObserver` records every event a job emits

pub mod harness;

pub use harness::{CollectingObserver, TestHarness};
