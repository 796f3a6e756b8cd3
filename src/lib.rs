//! Simulation run harness.
//!
//! Assembles HDL sources into named libraries, encodes per-test generics into
//! the backend's `name:value, name:value` form, and hands each test to an
//! external simulation backend.
pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod generics;
pub mod library;
pub mod options;
pub mod orchestrator;
pub mod pattern;
pub mod source;
pub mod util;

pub use error::{HarnessError, Result};
