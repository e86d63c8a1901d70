//! # Gridwatch Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/   # End-to-end flows over a real listener
//! └── benches/           # Classification and relay throughput
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p gw-tests
//! cargo bench -p gw-tests
//! ```

pub mod integration;
