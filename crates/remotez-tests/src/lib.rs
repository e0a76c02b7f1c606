//! Integration tests for the RemoteZ protocol layer
//!
//! This crate contains end-to-end tests that exercise the full stack:
//! - Device operations and the transfer engine
//! - Frame codec and stream framing
//! - TCP transport against the simulator
//!
//! # Running Tests
//!
//! The simulator runs in-process on an ephemeral port, so no setup is needed:
//!
//! ```bash
//! cargo test -p remotez-tests
//! ```
//!
//! # Test Structure
//!
//! - `tcp_e2e_test.rs` - Every device operation over TCP against the simulator
//! - `config_e2e_test.rs` - Links built from TOML configuration

// This crate only contains tests, no library code
