//! # Application Module
//!
//! Application services orchestrating the domain and outbound ports.

pub mod client;
pub mod gateway;
pub mod projection_store;
pub mod session;

pub use client::ChainClient;
pub use gateway::LedgerGateway;
pub use projection_store::ProjectionStore;
pub use session::SessionState;
