//! Solid Ops library.
//!
//! Operations backend for a small-batch solid cosmetics workshop:
//! - Append-only inventory ledger and derived stock balances
//! - Recipes (bills of materials) and their cost sheets
//! - Production batches that consume stock all-or-nothing and freeze a cost
//!   snapshot
//!
//! # Layers
//!
//! - [`services`] - Business rules, one session per call
//! - [`db`] - Unit-of-work traits with `PostgreSQL` and in-memory backends
//! - [`models`] - Domain records and inputs
//! - [`error`] - The closed set of failures callers must handle
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), solid_ops::error::OpsError> {
//! use solid_ops::db::MemoryStore;
//! use solid_ops::services::InventoryService;
//! use solid_ops_core::IngredientId;
//!
//! let store = MemoryStore::new();
//! let balance = InventoryService::new(&store)
//!     .get_balance(IngredientId::new(1))
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

/// Embedded migrations for the `ops` schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
