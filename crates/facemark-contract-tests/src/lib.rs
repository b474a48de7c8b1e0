#![warn(missing_docs)]
//! # facemark-contract-tests
//!
//! Test-only crate validating frozen server response contracts under the
//! root `contracts/` directory. All behavior lives in `tests/`.
