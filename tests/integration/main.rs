//! Integration tests for the ampliscreen library.
//!
//! These tests validate end-to-end workflows that span multiple modules,
//! driving the worker pool and sweep orchestrator against stub search tools
//! written into a temporary directory.

mod helpers;
mod test_dispatch;
mod test_sweep_flow;
