//! Bravo sync library - profile-driven sync between X-Plane and the
//! Honeycomb Bravo throttle quadrant.
//!
//! This library exposes the core of the `bravo` CLI for use in tests and
//! other front ends.
//!
//! # Modules
//!
//! - `profile`: Aircraft profile schema, selection and storage
//! - `expr`: Condition expression compiler and evaluator
//! - `telemetry`: Simulator access (web API, resolver cache, mock)
//! - `engine`: Indicator conditions, gating and input dispatch
//! - `panel`: Bravo LED layout and HID output
//! - `runner`: The foreground sync loop
//! - `config`: User settings and profiles folder discovery
//! - `output`: Output mode abstraction (robot/human)
//! - `error`: Error types with user-recoverable hints
#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod expr;
pub mod logging;
pub mod output;
pub mod panel;
pub mod profile;
pub mod runner;
pub mod telemetry;
