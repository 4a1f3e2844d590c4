//! # Twin Client Test Suite
//!
//! Unified test crate for flows that span several crates.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── bus_benchmarks.rs   # Dispatch throughput
//! └── src/
//!     └── integration/        # Cross-crate flows
//!         ├── live_commands.rs
//!         ├── protocol.rs
//!         └── concurrency.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p twin-tests
//!
//! # By flow
//! cargo test -p twin-tests integration::live_commands::
//!
//! # Benchmarks
//! cargo bench -p twin-tests
//! ```

pub mod fixtures;
pub mod integration;
