#![warn(missing_docs)]
//! # facemark-benchmarks
//!
//! Test-only crate holding latency smoke checks for the deterministic
//! request-preparation path. All behavior lives in `tests/`.
