//! # TU Chain Client
//!
//! Chain-client sync layer for the Thumbs-Up link board: one shared
//! program-owned account holds every submitted link and its votes.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Derive the shared account's program-owned address from a fixed seed
//! - Build, sign and submit the board's instructions through a wallet
//! - Fetch and decode the shared account, then project it for display
//! - Keep the connected wallet in an explicit session
//!
//! ## Consistency
//!
//! | Concern | Behavior |
//! |---------|----------|
//! | Concurrent writers | Not serialized; the ledger orders them |
//! | Read-after-write | Eventually consistent; refresh to observe |
//! | Confirmation | Only `tip` waits, bounded by `confirm_timeout_ms` |
//! | Failures | Never touch the session or the projection |
//!
//! ## Module Structure
//!
//! ```text
//! tu-chain-client/
//! ├── domain/          # Pubkey, Entry, SharedAccount, Transaction, errors, invariants
//! ├── algorithms/      # Address derivation, account layout, wire encoding, projection
//! ├── ports/           # BoardApi (inbound) + WalletProvider, LedgerNetwork (outbound)
//! ├── adapters/        # HttpRpcNetwork, KeypairWallet
//! ├── application/     # ChainClient, LedgerGateway, ProjectionStore, SessionState
//! └── config.rs        # ClientConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{HttpRpcNetwork, KeypairWallet};
pub use algorithms::{
    create_program_address, decode_shared_account, derive_address, encode_shared_account,
    project_entries, DerivedAddress,
};
pub use application::{ChainClient, LedgerGateway, ProjectionStore, SessionState};
pub use config::{ClientConfig, ConfigError};
pub use domain::{
    AccountMeta, Blockhash, ChainClientError, Commitment, ConfirmationOutcome, Entry, EntryId,
    Instruction, Lamports, OperationState, Pubkey, SharedAccount, Signature, SignatureStatus,
    Transaction, TransactionReceipt, MEDIA_MARKER, SYSTEM_PROGRAM_ID,
};
pub use ports::{BoardApi, LedgerNetwork, MockLedger, MockWallet, WalletProvider};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
