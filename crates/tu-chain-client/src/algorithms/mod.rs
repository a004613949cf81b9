//! # Algorithms Module
//!
//! Pure functions: address derivation, program layout, wire encoding and the
//! display projection.

pub mod address;
pub mod layout;
pub mod projection;
pub mod wire;

pub use address::{create_program_address, derive_address, is_on_curve, DerivedAddress};
pub use layout::{decode_shared_account, encode_shared_account};
pub use projection::project_entries;
pub use wire::{compile_message, encode_transaction, CompiledMessage};
