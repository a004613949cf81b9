//! # Inbound Ports
//!
//! API trait defining what the chain client offers its host.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{ChainClientError, Entry, EntryId, Lamports, Pubkey, TransactionReceipt};

/// Board API - inbound port.
///
/// Every method takes `&self`: several operations may be in flight at once
/// and their effects are ordered by the ledger, not by call order.
#[async_trait]
pub trait BoardApi: Send + Sync {
    /// Ask the wallet for its address and record it in the session.
    async fn connect(&self) -> Result<Pubkey, ChainClientError>;

    /// One-time creation of the shared account.
    async fn initialize_account(&self) -> Result<TransactionReceipt, ChainClientError>;

    /// Fetch and decode the shared account's entries in ledger order.
    async fn list_entries(&self) -> Result<Vec<Entry>, ChainClientError>;

    /// Append a link authored by the connected wallet.
    async fn submit_entry(&self, link: &str) -> Result<TransactionReceipt, ChainClientError>;

    /// Increment an entry's vote count.
    async fn upvote(&self, id: &EntryId) -> Result<TransactionReceipt, ChainClientError>;

    /// Transfer lamports from the connected wallet and wait for confirmation.
    async fn tip(&self, to: Pubkey, amount: Lamports) -> Result<TransactionReceipt, ChainClientError>;

    /// Tip the submitter of a projected entry.
    async fn tip_entry(&self, id: &EntryId, amount: Lamports) -> Result<TransactionReceipt, ChainClientError>;

    /// `list_entries` followed by a projection refresh.
    async fn refresh(&self) -> Result<Arc<[Entry]>, ChainClientError>;

    /// Last applied projection.
    fn entries(&self) -> Arc<[Entry]>;

    /// Connected wallet, if any.
    fn wallet_address(&self) -> Option<Pubkey>;
}
