//! # Outbound Ports
//!
//! Traits for the external collaborators: the wallet that holds keys and the
//! ledger network that orders transactions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::algorithms::layout::{self, IX_ADD_ENTRY, IX_INITIALIZE, IX_UPVOTE};
use crate::domain::{
    Blockhash, ChainClientError, Commitment, Entry, Instruction, Lamports, Pubkey, SharedAccount,
    Signature, SignatureStatus, Transaction, SYSTEM_PROGRAM_ID,
};

/// Wallet collaborator - outbound port.
///
/// Holds the private key. May refuse either request on the user's behalf.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Connect and report the wallet's public key.
    async fn connect(&self) -> Result<Pubkey, ChainClientError>;

    /// Sign the transaction and hand it to the network.
    ///
    /// `UserRejected` is only possible before anything is sent.
    async fn sign_and_send(&self, tx: Transaction) -> Result<Signature, ChainClientError>;

    /// Wallet identifier (for logging/debugging).
    fn wallet_id(&self) -> &str;
}

/// Remote ledger network - outbound port.
#[async_trait]
pub trait LedgerNetwork: Send + Sync {
    /// Current account bytes, `None` when the account does not exist.
    async fn get_account(
        &self,
        address: &Pubkey,
        commitment: Commitment,
    ) -> Result<Option<Vec<u8>>, ChainClientError>;

    /// Recent blockhash a new transaction must reference.
    async fn get_recent_blockhash(&self, commitment: Commitment) -> Result<Blockhash, ChainClientError>;

    /// Submit a signed wire transaction.
    async fn send_transaction(
        &self,
        wire: Vec<u8>,
        preflight: Commitment,
    ) -> Result<Signature, ChainClientError>;

    /// Status of a submitted transaction, `None` while unknown to the node.
    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatus>, ChainClientError>;

    /// Endpoint identifier (for logging/debugging).
    fn endpoint(&self) -> &str;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Bytes allocated for the shared account by the in-memory ledger.
pub const MOCK_ACCOUNT_SPACE: usize = 9000;

/// Per-method call counters of a `MockLedger`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MockLedgerCalls {
    /// `get_account` calls.
    pub get_account: usize,
    /// `get_recent_blockhash` calls.
    pub get_recent_blockhash: usize,
    /// `send_transaction` calls.
    pub send_transaction: usize,
    /// `get_signature_status` calls.
    pub get_signature_status: usize,
    /// Transactions executed through `process`.
    pub processed: usize,
}

impl MockLedgerCalls {
    /// Sum of all network round trips.
    pub fn total(&self) -> usize {
        self.get_account + self.get_recent_blockhash + self.send_transaction + self.get_signature_status
    }
}

#[derive(Default)]
struct MockLedgerState {
    accounts: HashMap<Pubkey, Vec<u8>>,
    balances: HashMap<Pubkey, Lamports>,
    statuses: HashMap<Signature, SignatureStatus>,
    raw_transactions: Vec<Vec<u8>>,
    calls: MockLedgerCalls,
    tx_counter: u64,
    should_fail: bool,
    hold_confirmations: bool,
    stall_status: bool,
    fail_status: bool,
}

/// In-memory ledger that runs the board program's instructions and the
/// system transfer.
pub struct MockLedger {
    id: String,
    program_id: Pubkey,
    state: Mutex<MockLedgerState>,
}

fn mock_signature(counter: u64) -> Signature {
    let digest: [u8; 32] = Sha256::digest(counter.to_le_bytes()).into();
    let mut bytes = [0u8; 64];
    bytes[..32].copy_from_slice(&digest);
    bytes[32..].copy_from_slice(&digest);
    Signature::from_bytes(bytes)
}

fn program_failure(message: impl Into<String>, log: impl Into<String>) -> ChainClientError {
    ChainClientError::from_rejection(Some(-32002), message, vec![log.into()])
}

impl MockLedger {
    /// Empty ledger hosting the board program at `program_id`.
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            id: "mock-ledger".to_string(),
            program_id,
            state: Mutex::new(MockLedgerState::default()),
        }
    }

    /// Credit an account.
    pub fn set_balance(&self, key: Pubkey, lamports: Lamports) {
        self.state.lock().balances.insert(key, lamports);
    }

    /// Current balance of an account.
    pub fn balance(&self, key: &Pubkey) -> Lamports {
        self.state.lock().balances.get(key).copied().unwrap_or(0)
    }

    /// Make every network call fail with `TransportError`.
    pub fn set_should_fail(&self, fail: bool) {
        self.state.lock().should_fail = fail;
    }

    /// Accept transactions but never report them as confirmed.
    pub fn set_hold_confirmations(&self, hold: bool) {
        self.state.lock().hold_confirmations = hold;
    }

    /// Make `get_signature_status` never return.
    pub fn set_stall_status(&self, stall: bool) {
        self.state.lock().stall_status = stall;
    }

    /// Fail status polls with a transport error while sends still land.
    pub fn set_fail_status(&self, fail: bool) {
        self.state.lock().fail_status = fail;
    }

    /// Store raw account bytes directly.
    pub fn put_account(&self, key: Pubkey, data: Vec<u8>) {
        self.state.lock().accounts.insert(key, data);
    }

    /// Set the status reported for `signature`.
    pub fn put_status(&self, signature: Signature, status: SignatureStatus) {
        self.state.lock().statuses.insert(signature, status);
    }

    /// Snapshot of the call counters.
    pub fn calls(&self) -> MockLedgerCalls {
        self.state.lock().calls
    }

    /// Wire transactions received through `send_transaction`.
    pub fn raw_transactions(&self) -> Vec<Vec<u8>> {
        self.state.lock().raw_transactions.clone()
    }

    /// Execute a transaction atomically, as a wallet's send would.
    pub fn process(&self, tx: &Transaction) -> Result<Signature, ChainClientError> {
        let mut state = self.state.lock();
        if state.should_fail {
            return Err(ChainClientError::TransportError("Mock failure".to_string()));
        }

        let mut accounts = state.accounts.clone();
        let mut balances = state.balances.clone();
        for ix in &tx.instructions {
            if ix.program_id == SYSTEM_PROGRAM_ID {
                Self::apply_transfer(&mut balances, ix)?;
            } else if ix.program_id == self.program_id {
                Self::apply_program(&mut accounts, ix)?;
            } else {
                return Err(program_failure(
                    "Attempt to load a program that does not exist",
                    format!("Program {} not found", ix.program_id),
                ));
            }
        }

        state.accounts = accounts;
        state.balances = balances;
        state.tx_counter += 1;
        state.calls.processed += 1;
        let signature = mock_signature(state.tx_counter);
        if !state.hold_confirmations {
            state
                .statuses
                .insert(signature, SignatureStatus::at(Commitment::Finalized));
        }
        Ok(signature)
    }

    fn apply_transfer(
        balances: &mut HashMap<Pubkey, Lamports>,
        ix: &Instruction,
    ) -> Result<(), ChainClientError> {
        let (from, to) = match ix.accounts.as_slice() {
            [from, to, ..] => (from.pubkey, to.pubkey),
            _ => return Err(program_failure("invalid account data", "Transfer: missing accounts")),
        };
        let lamports = ix
            .data
            .get(4..12)
            .and_then(|b| b.try_into().ok())
            .map(u64::from_le_bytes)
            .ok_or_else(|| program_failure("invalid instruction data", "Transfer: bad data"))?;

        let available = balances.get(&from).copied().unwrap_or(0);
        if available < lamports {
            return Err(program_failure(
                "Transaction simulation failed: Error processing Instruction 0: custom program error: 0x1",
                format!("Transfer: insufficient lamports {available}, need {lamports}"),
            ));
        }
        balances.insert(from, available - lamports);
        *balances.entry(to).or_insert(0) += lamports;
        Ok(())
    }

    fn apply_program(
        accounts: &mut HashMap<Pubkey, Vec<u8>>,
        ix: &Instruction,
    ) -> Result<(), ChainClientError> {
        let shared = ix
            .accounts
            .first()
            .map(|m| m.pubkey)
            .ok_or_else(|| program_failure("missing accounts", "Program log: no shared account"))?;
        let user = ix.accounts.get(1).map(|m| m.pubkey).unwrap_or_default();

        match layout::instruction_name(&ix.data) {
            Some(IX_INITIALIZE) => {
                if accounts.contains_key(&shared) {
                    return Err(program_failure(
                        "Transaction simulation failed: Error processing Instruction 0: custom program error: 0x0",
                        format!("Allocate: account Address {{ address: {shared}, base: None }} already in use"),
                    ));
                }
                let bump = ix.data.get(8).copied().unwrap_or_default();
                let account = SharedAccount {
                    bump,
                    ..Default::default()
                };
                accounts.insert(shared, layout::encode_shared_account(&account, MOCK_ACCOUNT_SPACE)?);
            }
            Some(name @ (IX_ADD_ENTRY | IX_UPVOTE)) => {
                let data = accounts.get(&shared).ok_or_else(|| {
                    program_failure(
                        "custom program error: 0xbc4",
                        "Program log: AnchorError: AccountNotInitialized",
                    )
                })?;
                let mut account = layout::decode_shared_account(data)?;
                let argument = layout::string_argument(&ix.data)?;

                if name == IX_ADD_ENTRY {
                    account
                        .entries
                        .push(Entry::new(format!("0x{user}_{argument}"), argument, user, 0));
                    account.total_entries += 1;
                } else {
                    let entry = account
                        .entries
                        .iter_mut()
                        .find(|e| e.id.as_str() == argument)
                        .ok_or_else(|| {
                            program_failure(
                                "Program failed to complete",
                                "Program log: panicked at 'called `Option::unwrap()` on a `None` value'",
                            )
                        })?;
                    entry.votes += 1;
                }
                accounts.insert(shared, layout::encode_shared_account(&account, MOCK_ACCOUNT_SPACE)?);
            }
            _ => {
                return Err(program_failure(
                    "custom program error: 0x65",
                    "Program log: AnchorError: InstructionFallbackNotFound",
                ))
            }
        }
        Ok(())
    }

    fn check_available(&self, bump: impl FnOnce(&mut MockLedgerCalls)) -> Result<(), ChainClientError> {
        let mut state = self.state.lock();
        bump(&mut state.calls);
        if state.should_fail {
            return Err(ChainClientError::TransportError("Mock failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerNetwork for MockLedger {
    async fn get_account(
        &self,
        address: &Pubkey,
        _commitment: Commitment,
    ) -> Result<Option<Vec<u8>>, ChainClientError> {
        self.check_available(|c| c.get_account += 1)?;
        Ok(self.state.lock().accounts.get(address).cloned())
    }

    async fn get_recent_blockhash(&self, _commitment: Commitment) -> Result<Blockhash, ChainClientError> {
        self.check_available(|c| c.get_recent_blockhash += 1)?;
        let counter = self.state.lock().tx_counter;
        let digest: [u8; 32] = Sha256::digest(format!("blockhash-{counter}")).into();
        Ok(Blockhash::new_from_array(digest))
    }

    async fn send_transaction(
        &self,
        wire: Vec<u8>,
        _preflight: Commitment,
    ) -> Result<Signature, ChainClientError> {
        self.check_available(|c| c.send_transaction += 1)?;

        // First signature of the wire transaction is its handle.
        let signature = wire
            .get(1..65)
            .and_then(|b| <[u8; 64]>::try_from(b).ok())
            .map(Signature::from_bytes)
            .ok_or_else(|| ChainClientError::Rejected {
                code: Some(-32602),
                message: "failed to deserialize transaction".to_string(),
                logs: vec![],
            })?;

        let mut state = self.state.lock();
        state.raw_transactions.push(wire);
        if !state.hold_confirmations {
            state
                .statuses
                .insert(signature, SignatureStatus::at(Commitment::Finalized));
        }
        Ok(signature)
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatus>, ChainClientError> {
        self.check_available(|c| c.get_signature_status += 1)?;
        let (stall, fail) = {
            let state = self.state.lock();
            (state.stall_status, state.fail_status)
        };
        if fail {
            return Err(ChainClientError::TransportError("status unavailable".to_string()));
        }
        if stall {
            std::future::pending::<()>().await;
        }
        Ok(self.state.lock().statuses.get(signature).cloned())
    }

    fn endpoint(&self) -> &str {
        &self.id
    }
}

#[derive(Default)]
struct MockWalletState {
    unavailable: bool,
    reject_connect: bool,
    reject_sign: bool,
    send_error: Option<ChainClientError>,
    connect_calls: usize,
    sign_calls: usize,
    last_transaction: Option<Transaction>,
}

/// Mock wallet for testing. Forwards signed transactions to a `MockLedger`
/// when one is attached.
pub struct MockWallet {
    id: String,
    address: Pubkey,
    ledger: Option<Arc<MockLedger>>,
    state: Mutex<MockWalletState>,
}

impl MockWallet {
    /// Wallet owning `address`, not attached to any ledger.
    pub fn new(address: Pubkey) -> Self {
        Self {
            id: "mock-wallet".to_string(),
            address,
            ledger: None,
            state: Mutex::new(MockWalletState::default()),
        }
    }

    /// Send signed transactions into `ledger`.
    pub fn with_ledger(mut self, ledger: Arc<MockLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Behave as if no wallet is installed.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Decline connection requests.
    pub fn set_reject_connect(&self, reject: bool) {
        self.state.lock().reject_connect = reject;
    }

    /// Decline signature requests.
    pub fn set_reject_sign(&self, reject: bool) {
        self.state.lock().reject_sign = reject;
    }

    /// Fail the next sends with `error` after signing.
    pub fn set_send_error(&self, error: Option<ChainClientError>) {
        self.state.lock().send_error = error;
    }

    /// Number of `connect` calls so far.
    pub fn connect_calls(&self) -> usize {
        self.state.lock().connect_calls
    }

    /// Number of `sign_and_send` calls so far.
    pub fn sign_calls(&self) -> usize {
        self.state.lock().sign_calls
    }

    /// Most recent transaction presented for signing.
    pub fn last_transaction(&self) -> Option<Transaction> {
        self.state.lock().last_transaction.clone()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn connect(&self) -> Result<Pubkey, ChainClientError> {
        let mut state = self.state.lock();
        state.connect_calls += 1;
        if state.unavailable {
            return Err(ChainClientError::WalletUnavailable(
                "no wallet installed".to_string(),
            ));
        }
        if state.reject_connect {
            return Err(ChainClientError::UserRejected);
        }
        Ok(self.address)
    }

    async fn sign_and_send(&self, tx: Transaction) -> Result<Signature, ChainClientError> {
        {
            let mut state = self.state.lock();
            state.sign_calls += 1;
            state.last_transaction = Some(tx.clone());
            if state.unavailable {
                return Err(ChainClientError::WalletUnavailable(
                    "no wallet installed".to_string(),
                ));
            }
            if state.reject_sign {
                return Err(ChainClientError::UserRejected);
            }
            if let Some(err) = state.send_error.clone() {
                return Err(err);
            }
        }

        match &self.ledger {
            Some(ledger) => ledger.process(&tx),
            None => Ok(mock_signature(self.sign_calls() as u64)),
        }
    }

    fn wallet_id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AccountMeta;

    fn program() -> Pubkey {
        Pubkey::new_from_array([42u8; 32])
    }

    fn user() -> Pubkey {
        Pubkey::new_from_array([1u8; 32])
    }

    fn shared() -> Pubkey {
        Pubkey::new_from_array([2u8; 32])
    }

    fn program_ix(data: Vec<u8>) -> Instruction {
        Instruction {
            program_id: program(),
            accounts: vec![AccountMeta::new(shared(), false), AccountMeta::new(user(), true)],
            data,
        }
    }

    fn tx(ix: Instruction) -> Transaction {
        Transaction::new(user(), Blockhash::default(), vec![ix])
    }

    #[tokio::test]
    async fn test_mock_ledger_missing_account() {
        let ledger = MockLedger::new(program());
        let account = ledger.get_account(&shared(), Commitment::Processed).await.unwrap();
        assert!(account.is_none());
        assert_eq!(ledger.calls().get_account, 1);
    }

    #[tokio::test]
    async fn test_mock_ledger_failed() {
        let ledger = MockLedger::new(program());
        ledger.set_should_fail(true);
        let result = ledger.get_recent_blockhash(Commitment::Processed).await;
        assert!(matches!(result, Err(ChainClientError::TransportError(_))));
    }

    #[test]
    fn test_mock_ledger_runs_program() {
        let ledger = MockLedger::new(program());
        ledger
            .process(&tx(program_ix(layout::initialize_data(255).unwrap())))
            .unwrap();
        ledger
            .process(&tx(program_ix(layout::add_entry_data("https://x/media/1").unwrap())))
            .unwrap();

        let data = ledger.state.lock().accounts.get(&shared()).cloned().unwrap();
        let account = layout::decode_shared_account(&data).unwrap();
        assert_eq!(account.total_entries, 1);
        assert_eq!(account.entries[0].submitter, user());

        let id = account.entries[0].id.clone();
        ledger
            .process(&tx(program_ix(layout::upvote_data(&id).unwrap())))
            .unwrap();
        let data = ledger.state.lock().accounts.get(&shared()).cloned().unwrap();
        assert_eq!(layout::decode_shared_account(&data).unwrap().entries[0].votes, 1);
    }

    #[test]
    fn test_mock_ledger_double_initialize() {
        let ledger = MockLedger::new(program());
        let init = tx(program_ix(layout::initialize_data(255).unwrap()));
        ledger.process(&init).unwrap();
        assert!(matches!(
            ledger.process(&init),
            Err(ChainClientError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn test_mock_ledger_transfer_insufficient() {
        let ledger = MockLedger::new(program());
        ledger.set_balance(user(), 10);
        let transfer = Instruction {
            program_id: SYSTEM_PROGRAM_ID,
            accounts: vec![AccountMeta::new(user(), true), AccountMeta::new(shared(), false)],
            data: layout::transfer_data(100),
        };
        assert!(matches!(
            ledger.process(&tx(transfer)),
            Err(ChainClientError::InsufficientFunds(_))
        ));
        assert_eq!(ledger.balance(&user()), 10);
    }

    #[tokio::test]
    async fn test_mock_wallet_rejects() {
        let wallet = MockWallet::new(user());
        wallet.set_reject_sign(true);
        let result = wallet
            .sign_and_send(Transaction::new(user(), Blockhash::default(), vec![]))
            .await;
        assert_eq!(result, Err(ChainClientError::UserRejected));
        assert_eq!(wallet.sign_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_wallet_unavailable() {
        let wallet = MockWallet::new(user());
        wallet.set_unavailable(true);
        assert!(matches!(
            wallet.connect().await,
            Err(ChainClientError::WalletUnavailable(_))
        ));
    }
}
