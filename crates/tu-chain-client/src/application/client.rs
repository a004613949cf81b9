//! # Chain Client
//!
//! Builds the board's instructions, asks the wallet to sign them, submits
//! through the gateway and keeps the session and projection current.
//!
//! ## Operation lifecycle
//!
//! ```text
//! Idle -> AwaitingSignature -> Submitted -> Confirmed
//!               |                  |-----> Rejected
//!               v                  '-----> TimedOut
//!           Rejected
//! ```
//!
//! Writes other than `tip` finish in `Submitted`: the ledger owns their fate
//! and a later `refresh` observes them.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::gateway::LedgerGateway;
use super::projection_store::ProjectionStore;
use super::session::SessionState;
use crate::algorithms::{derive_address, layout, DerivedAddress};
use crate::config::ClientConfig;
use crate::domain::{
    invariant_entry_id_present, invariant_link_present, invariant_positive_amount,
    invariant_transition, AccountMeta, ChainClientError, ConfirmationOutcome, Entry, EntryId,
    Instruction, Lamports, OperationState, Pubkey, SharedAccount, Signature, TransactionReceipt,
    SYSTEM_PROGRAM_ID,
};
use crate::ports::{BoardApi, LedgerNetwork, WalletProvider};

/// Tracks one mutating operation through its lifecycle.
struct Operation {
    name: &'static str,
    state: OperationState,
}

impl Operation {
    fn start(name: &'static str) -> Self {
        Self {
            name,
            state: OperationState::Idle,
        }
    }

    fn advance(&mut self, to: OperationState) -> Result<(), ChainClientError> {
        invariant_transition(self.state, to)?;
        debug!("[tu-client] {}: {} -> {}", self.name, self.state, to);
        self.state = to;
        Ok(())
    }

    /// Record the confirmation outcome of a submitted transaction.
    ///
    /// A failed status poll leaves the transaction's fate unknown, so it ends
    /// in `TimedOut` rather than `Rejected`.
    fn settle(
        &mut self,
        signature: Signature,
        outcome: Result<ConfirmationOutcome, ChainClientError>,
    ) -> Result<TransactionReceipt, ChainClientError> {
        match outcome {
            Ok(ConfirmationOutcome::Confirmed) => {
                self.advance(OperationState::Confirmed)?;
                info!("[tu-client] {} confirmed: {}", self.name, signature);
                Ok(TransactionReceipt {
                    signature,
                    state: self.state,
                })
            }
            Ok(ConfirmationOutcome::TimedOut) => {
                self.advance(OperationState::TimedOut)?;
                Err(ChainClientError::TimedOut { signature })
            }
            Err(e @ ChainClientError::TransportError(_)) => {
                self.advance(OperationState::TimedOut)?;
                warn!(
                    "[tu-client] {} outcome unknown, status poll failed for {}: {}",
                    self.name, signature, e
                );
                Err(e)
            }
            Err(e) => {
                self.advance(OperationState::Rejected)?;
                warn!("[tu-client] {} failed after submission: {}", self.name, e);
                Err(e)
            }
        }
    }
}

/// Chain client for the shared board account.
pub struct ChainClient<W: WalletProvider, N: LedgerNetwork> {
    /// Configuration.
    config: ClientConfig,
    /// Shared account address, derived once.
    shared: DerivedAddress,
    /// Wallet collaborator.
    wallet: Arc<W>,
    /// Transport to the ledger.
    gateway: LedgerGateway<N>,
    /// Connected wallet.
    session: SessionState,
    /// Display read model.
    projection: ProjectionStore,
}

impl<W: WalletProvider, N: LedgerNetwork> ChainClient<W, N> {
    /// Create a client. Derives the shared account address up front and
    /// refuses a config that fails `ClientConfig::validate`.
    pub fn new(config: ClientConfig, wallet: Arc<W>, network: Arc<N>) -> Result<Self, ChainClientError> {
        let shared = derive_address(&config.program_id, config.seed.as_bytes())?;
        config
            .validate()
            .map_err(|e| ChainClientError::InvalidConfig(e.to_string()))?;
        info!(
            "[tu-client] Shared account {} (bump {}) for program {} via {}",
            shared.address,
            shared.bump,
            config.program_id,
            network.endpoint()
        );

        Ok(Self {
            gateway: LedgerGateway::new(network, &config),
            config,
            shared,
            wallet,
            session: SessionState::new(),
            projection: ProjectionStore::new(),
        })
    }

    /// Address and bump of the shared account.
    pub fn shared_account_address(&self) -> DerivedAddress {
        self.shared
    }

    /// Active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Ledger gateway.
    pub fn gateway(&self) -> &LedgerGateway<N> {
        &self.gateway
    }

    /// Fetch and decode the whole shared account.
    pub async fn fetch_shared_account(&self) -> Result<SharedAccount, ChainClientError> {
        let bytes = self
            .gateway
            .fetch_account(&self.shared.address)
            .await?
            .ok_or(ChainClientError::AccountNotInitialized)?;
        self.gateway.decode(&bytes)
    }

    fn program_instruction(&self, payer: Pubkey, data: Vec<u8>) -> Instruction {
        Instruction {
            program_id: self.config.program_id,
            accounts: vec![
                AccountMeta::new(self.shared.address, false),
                AccountMeta::new(payer, true),
            ],
            data,
        }
    }

    /// Sign and submit, then optionally wait for confirmation.
    async fn execute(
        &self,
        mut op: Operation,
        payer: Pubkey,
        instructions: Vec<Instruction>,
        wait: bool,
    ) -> Result<TransactionReceipt, ChainClientError> {
        op.advance(OperationState::AwaitingSignature)?;
        let signature = match self
            .gateway
            .submit(instructions, payer, self.wallet.as_ref())
            .await
        {
            Ok(signature) => signature,
            Err(e) => {
                op.advance(OperationState::Rejected)?;
                warn!("[tu-client] {} rejected: {}", op.name, e);
                return Err(e);
            }
        };
        op.advance(OperationState::Submitted)?;
        info!("[tu-client] {} submitted: {}", op.name, signature);

        if !wait {
            return Ok(TransactionReceipt {
                signature,
                state: op.state,
            });
        }

        let outcome = self.gateway.confirm(&signature).await;
        op.settle(signature, outcome)
    }
}

#[async_trait]
impl<W, N> BoardApi for ChainClient<W, N>
where
    W: WalletProvider + 'static,
    N: LedgerNetwork + 'static,
{
    async fn connect(&self) -> Result<Pubkey, ChainClientError> {
        let address = self.wallet.connect().await?;
        self.session.set(address);
        info!("[tu-client] Connected wallet {}", address);
        Ok(address)
    }

    async fn initialize_account(&self) -> Result<TransactionReceipt, ChainClientError> {
        let payer = self.session.require_connected()?;
        let data = layout::initialize_data(self.shared.bump)?;

        let mut ix = self.program_instruction(payer, data);
        ix.accounts
            .push(AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false));

        self.execute(Operation::start("initialize"), payer, vec![ix], false)
            .await
    }

    async fn list_entries(&self) -> Result<Vec<Entry>, ChainClientError> {
        let account = self.fetch_shared_account().await?;
        debug!(
            "[tu-client] Fetched {} entries (total counter {})",
            account.len(),
            account.total_entries
        );
        Ok(account.entries)
    }

    async fn submit_entry(&self, link: &str) -> Result<TransactionReceipt, ChainClientError> {
        invariant_link_present(link)?;
        let payer = self.session.require_connected()?;
        let data = layout::add_entry_data(link)?;

        let ix = self.program_instruction(payer, data);
        self.execute(Operation::start("submit_entry"), payer, vec![ix], false)
            .await
    }

    async fn upvote(&self, id: &EntryId) -> Result<TransactionReceipt, ChainClientError> {
        invariant_entry_id_present(id)?;
        let payer = self.session.require_connected()?;
        let data = layout::upvote_data(id)?;

        let ix = self.program_instruction(payer, data);
        self.execute(Operation::start("upvote"), payer, vec![ix], false)
            .await
    }

    async fn tip(&self, to: Pubkey, amount: Lamports) -> Result<TransactionReceipt, ChainClientError> {
        invariant_positive_amount(amount)?;
        let payer = self.session.require_connected()?;

        let ix = Instruction {
            program_id: SYSTEM_PROGRAM_ID,
            accounts: vec![AccountMeta::new(payer, true), AccountMeta::new(to, false)],
            data: layout::transfer_data(amount),
        };
        info!("[tu-client] Tipping {} lamports to {}", amount, to);
        self.execute(Operation::start("tip"), payer, vec![ix], true)
            .await
    }

    async fn tip_entry(&self, id: &EntryId, amount: Lamports) -> Result<TransactionReceipt, ChainClientError> {
        invariant_entry_id_present(id)?;
        invariant_positive_amount(amount)?;

        let submitters = self.projection.submitters_of(id);
        if submitters.len() > 1 {
            return Err(ChainClientError::AmbiguousRecipient {
                id: id.to_string(),
                count: submitters.len(),
            });
        }
        let recipient = submitters
            .into_iter()
            .next()
            .ok_or_else(|| ChainClientError::EntryNotFound(id.to_string()))?;

        self.tip(recipient, amount).await
    }

    async fn refresh(&self) -> Result<Arc<[Entry]>, ChainClientError> {
        let entries = self.list_entries().await?;
        Ok(self.projection.refresh(entries))
    }

    fn entries(&self) -> Arc<[Entry]> {
        self.projection.current()
    }

    fn wallet_address(&self) -> Option<Pubkey> {
        self.session.current()
    }
}
