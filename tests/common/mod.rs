//! Shared test utilities for the integration suite.

pub mod fixtures;
