//! Core business logic - framework-agnostic period handling, record validation,
//! aggregation and dashboard state.

/// Reduction of validated records into summary totals and lists
pub mod aggregate;
/// Dashboard state cell with stale-response protection
pub mod dashboard;
/// Fetch-and-aggregate engine driving the gateway
pub mod engine;
/// Inclusive reporting periods and month policies
pub mod period;
/// Row decoding into typed records
pub mod records;
/// Session identity abstraction
pub mod session;
