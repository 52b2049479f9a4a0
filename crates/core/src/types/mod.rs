//! Core types for the operations backend.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod status;
pub mod unit;

pub use id::*;
pub use status::*;
pub use unit::Unit;
