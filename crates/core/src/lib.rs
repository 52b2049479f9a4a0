//! Solid Ops Core - Shared types library.
//!
//! This crate provides common types used across the operations backend:
//! - `ops` - Inventory ledger, recipe costing and batch production services
//! - `cli` - Command-line tools for migrations and day-to-day operations
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access. The
//! `postgres` feature adds the `sqlx` encode/decode impls so the same types
//! can be bound and decoded directly by the persistence layer.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, units, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
