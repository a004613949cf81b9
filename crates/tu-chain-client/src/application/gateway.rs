//! # Ledger Gateway
//!
//! Thin transport over the network port: submit, confirm, fetch, decode.
//! Nothing here retries.

use std::sync::Arc;
use std::time::Duration;

use crate::algorithms::decode_shared_account;
use crate::config::ClientConfig;
use crate::domain::{
    ChainClientError, Commitment, ConfirmationOutcome, Instruction, Pubkey, SharedAccount,
    Signature, Transaction,
};
use crate::ports::{LedgerNetwork, WalletProvider};

/// Gateway to the remote ledger.
pub struct LedgerGateway<N: LedgerNetwork> {
    network: Arc<N>,
    commitment: Commitment,
    confirm_timeout: Duration,
    poll_interval: Duration,
}

/// Floor for the status poll period; `tokio::time::interval` rejects zero.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

impl<N: LedgerNetwork> LedgerGateway<N> {
    /// Create a gateway using the commitment and wait bounds of `config`.
    pub fn new(network: Arc<N>, config: &ClientConfig) -> Self {
        Self {
            network,
            commitment: config.commitment,
            confirm_timeout: config.confirm_timeout(),
            poll_interval: config.poll_interval().max(MIN_POLL_INTERVAL),
        }
    }

    /// Underlying network handle.
    pub fn network(&self) -> &Arc<N> {
        &self.network
    }

    /// Commitment used for reads and confirmation.
    pub fn commitment(&self) -> Commitment {
        self.commitment
    }

    /// Assemble `instructions` against a fresh blockhash and hand them to the
    /// signer. The returned signature is the transaction handle.
    pub async fn submit<W>(
        &self,
        instructions: Vec<Instruction>,
        fee_payer: Pubkey,
        signer: &W,
    ) -> Result<Signature, ChainClientError>
    where
        W: WalletProvider + ?Sized,
    {
        let blockhash = self.network.get_recent_blockhash(self.commitment).await?;
        let tx = Transaction::new(fee_payer, blockhash, instructions);

        tracing::debug!(
            "[tu-client] Submitting {} instruction(s) via {} (blockhash {})",
            tx.instructions.len(),
            signer.wallet_id(),
            blockhash
        );
        signer.sign_and_send(tx).await
    }

    /// Poll the signature status until it reaches the configured commitment
    /// or the wait bound elapses.
    ///
    /// A transaction that landed with an execution error is `Rejected`.
    pub async fn confirm(&self, signature: &Signature) -> Result<ConfirmationOutcome, ChainClientError> {
        match tokio::time::timeout(self.confirm_timeout, self.poll_status(signature)).await {
            Ok(Ok(())) => Ok(ConfirmationOutcome::Confirmed),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                tracing::warn!(
                    "[tu-client] No {} confirmation for {} after {:?}",
                    self.commitment,
                    signature,
                    self.confirm_timeout
                );
                Ok(ConfirmationOutcome::TimedOut)
            }
        }
    }

    async fn poll_status(&self, signature: &Signature) -> Result<(), ChainClientError> {
        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            ticker.tick().await;
            let Some(status) = self.network.get_signature_status(signature).await? else {
                continue;
            };
            if let Some(err) = &status.err {
                return Err(ChainClientError::from_rejection(None, err.clone(), Vec::new()));
            }
            if status.satisfies(self.commitment) {
                return Ok(());
            }
        }
    }

    /// Raw account bytes; `None` when the account does not exist.
    pub async fn fetch_account(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, ChainClientError> {
        self.network.get_account(address, self.commitment).await
    }

    /// Decode shared account bytes.
    pub fn decode(&self, bytes: &[u8]) -> Result<SharedAccount, ChainClientError> {
        decode_shared_account(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SignatureStatus;
    use crate::ports::{MockLedger, MockWallet};

    fn program() -> Pubkey {
        Pubkey::new_from_array([42u8; 32])
    }

    fn payer() -> Pubkey {
        Pubkey::new_from_array([1u8; 32])
    }

    fn gateway(ledger: Arc<MockLedger>) -> LedgerGateway<MockLedger> {
        LedgerGateway::new(ledger, &ClientConfig::for_testing())
    }

    #[tokio::test]
    async fn test_submit_sets_fee_payer() {
        let ledger = Arc::new(MockLedger::new(program()));
        let wallet = MockWallet::new(payer());
        let gw = gateway(ledger.clone());

        gw.submit(Vec::new(), payer(), &wallet).await.unwrap();

        let tx = wallet.last_transaction().unwrap();
        assert_eq!(tx.fee_payer, payer());
        assert_eq!(ledger.calls().get_recent_blockhash, 1);
    }

    #[tokio::test]
    async fn test_submit_transport_failure_skips_wallet() {
        let ledger = Arc::new(MockLedger::new(program()));
        ledger.set_should_fail(true);
        let wallet = MockWallet::new(payer());

        let result = gateway(ledger).submit(Vec::new(), payer(), &wallet).await;
        assert!(matches!(result, Err(ChainClientError::TransportError(_))));
        assert_eq!(wallet.sign_calls(), 0);
    }

    #[tokio::test]
    async fn test_confirm_landed() {
        let ledger = Arc::new(MockLedger::new(program()));
        let signature = Signature::from_bytes([9u8; 64]);
        ledger.put_status(signature, SignatureStatus::at(Commitment::Confirmed));

        let outcome = gateway(ledger).confirm(&signature).await;
        assert_eq!(outcome, Ok(ConfirmationOutcome::Confirmed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_times_out() {
        let ledger = Arc::new(MockLedger::new(program()));
        let gw = gateway(ledger.clone());

        let outcome = gw.confirm(&Signature::from_bytes([7u8; 64])).await;
        assert_eq!(outcome, Ok(ConfirmationOutcome::TimedOut));
        assert!(ledger.calls().get_signature_status > 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_times_out_when_status_stalls() {
        let ledger = Arc::new(MockLedger::new(program()));
        ledger.set_stall_status(true);

        let outcome = gateway(ledger).confirm(&Signature::from_bytes([7u8; 64])).await;
        assert_eq!(outcome, Ok(ConfirmationOutcome::TimedOut));
    }

    #[tokio::test]
    async fn test_confirm_landed_with_error() {
        let ledger = Arc::new(MockLedger::new(program()));
        let signature = Signature::from_bytes([3u8; 64]);
        ledger.put_status(
            signature,
            SignatureStatus::failed(Commitment::Processed, "InstructionError(0, Custom(6000))"),
        );

        let result = gateway(ledger).confirm(&signature).await;
        assert!(matches!(result, Err(ChainClientError::Rejected { .. })));
    }

    #[tokio::test]
    async fn test_fetch_missing_account() {
        let ledger = Arc::new(MockLedger::new(program()));
        let result = gateway(ledger).fetch_account(&program()).await.unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let gw = gateway(Arc::new(MockLedger::new(program())));
        assert!(matches!(gw.decode(&[0u8; 4]), Err(ChainClientError::Decode(_))));
    }

    #[tokio::test]
    async fn test_zero_poll_interval_still_confirms() {
        let ledger = Arc::new(MockLedger::new(program()));
        let config = ClientConfig {
            poll_interval_ms: 0,
            ..ClientConfig::for_testing()
        };
        let signature = Signature::from_bytes([4u8; 64]);
        ledger.put_status(signature, SignatureStatus::at(Commitment::Finalized));

        let gw = LedgerGateway::new(ledger, &config);
        assert_eq!(gw.confirm(&signature).await, Ok(ConfirmationOutcome::Confirmed));
    }
}
