//! Test module organization.
//!
//! This module organizes all integration tests for the trace tool.


/// Stage identifier and error rendering tests.
mod common_tests;

/// Configuration file and trace target tests.
mod config_tests;




/// Snapshot store and cursor tests.
mod store_tests;

/// Pipeline view projection tests.
mod viz_tests;
