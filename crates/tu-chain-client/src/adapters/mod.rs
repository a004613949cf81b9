//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound ports against real collaborators: a JSON-RPC
//! cluster endpoint and a local keypair.

mod keypair_wallet;
mod rpc;

pub use keypair_wallet::KeypairWallet;
pub use rpc::HttpRpcNetwork;
