//! # Domain Module
//!
//! Core domain types for the chain client.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod transaction;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use transaction::*;
pub use value_objects::*;
