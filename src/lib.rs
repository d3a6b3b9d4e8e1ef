//! Plugs an external design evaluator into an optimization engine.
//!
//! The engine drives the search; every candidate design point crosses
//! the boundary to a [`host::DesignHost`] through the
//! [`engine::bridge::DirectBridge`], and the [`runner::Runner`]
//! reconciles the final engine state into a best design, a clean halt,
//! or a failure.

pub mod core;
pub mod engine;
pub mod host;
pub mod runner;
