//! Common test utilities and helpers
//!
//! This module provides shared functionality for all tests.

#![allow(dead_code)]

pub mod fake_api;
pub mod fixtures;

pub use db::TestDb;
pub use fake_api::FakeApi;
pub use memory_db::MemoryPersistence;
