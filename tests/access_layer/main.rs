//! Access Layer Test Suite
//!
//! End-to-end behavior of transactions, access strategies and save point
//! guards over the in-memory engine.
//!
//! ## Structure
//!
//! - `modes`: visibility rules of the four access strategies
//! - `save_points`: guarded operations, idempotence, single-operation
//!   transactions
//! - `scenarios`: end-to-end flows through the public API
//! - `conflicts`: tracked vs untracked writes, concurrent readers
//! - `intermediate_commits`: size-bounded transactions
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test access_layer
//! ```


mod conflicts;
mod intermediate_commits;
mod modes;
mod save_points;
mod scenarios;
