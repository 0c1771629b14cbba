//! Common test infrastructure for httpr integration tests
//!
//! # Usage
//!
//! In your test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Modules
//!
//! - `mock_server`: Wiremock setup helpers for retry scenarios
//! - `fixtures`: Policies, tracing setup, and unreachable addresses

// Not every test binary uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod fixtures;
pub mod mock_server;

pub use fixtures::*;
pub use mock_server::*;
