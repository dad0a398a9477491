//! Deterministic, pure logic shared by the run-parts engine.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod filter;
pub mod types;
