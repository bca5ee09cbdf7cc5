//! Integration tests for the Terahash workspace.
//!
//! This crate has no library code; the tests live under `tests/`.
