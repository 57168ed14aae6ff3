//! Integration tests for turntable
//!
//! These tests verify that the table engine, the call history, and the
//! ingestion adapters work together correctly.

#[path = "../common/mod.rs"]
pub mod common;

pub mod history_flow;
pub mod properties;
