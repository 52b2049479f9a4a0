//! Business services.
//!
//! Each service is a stateless handle over a [`Store`](crate::db::Store).
//! Every public method opens one session and commits it only on success.
//! The free functions (`append_movement`, `ledger_balance`, ...) run inside
//! a caller's session so flows like batch production can compose them.

pub mod batch;
pub mod ingredient;
pub mod inventory;
pub mod recipe;

pub use batch::BatchService;
pub use ingredient::IngredientService;
pub use inventory::InventoryService;
pub use recipe::RecipeService;
