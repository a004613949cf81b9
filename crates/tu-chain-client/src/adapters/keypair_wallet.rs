//! Local keypair wallet adapter
//!
//! Implements `WalletProvider` with an ed25519 key held in process, for
//! command-line use. Keys are read from an operator-supplied file in the
//! common 64-byte JSON array format (secret then public half).

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use tracing::{debug, info};

use crate::algorithms::{compile_message, encode_transaction};
use crate::domain::{ChainClientError, Commitment, Pubkey, Signature, Transaction};
use crate::ports::{LedgerNetwork, WalletProvider};

/// Wallet backed by a local ed25519 keypair.
pub struct KeypairWallet<N: LedgerNetwork> {
    signing_key: SigningKey,
    address: Pubkey,
    network: Arc<N>,
    preflight: Commitment,
    id: String,
}

impl<N: LedgerNetwork> KeypairWallet<N> {
    /// Create from a 32-byte secret seed.
    pub fn from_seed(seed: [u8; 32], network: Arc<N>, preflight: Commitment) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(&seed), network, preflight)
    }

    /// Create from 64 keypair bytes; the public half must match the secret.
    pub fn from_keypair_bytes(
        bytes: &[u8],
        network: Arc<N>,
        preflight: Commitment,
    ) -> Result<Self, ChainClientError> {
        let bytes: &[u8; 64] = bytes.try_into().map_err(|_| {
            ChainClientError::WalletUnavailable(format!("keypair must be 64 bytes, got {}", bytes.len()))
        })?;
        let signing_key = SigningKey::from_keypair_bytes(bytes)
            .map_err(|e| ChainClientError::WalletUnavailable(format!("inconsistent keypair: {e}")))?;
        Ok(Self::from_signing_key(signing_key, network, preflight))
    }

    /// Load a JSON keypair file.
    pub fn load(
        path: impl AsRef<Path>,
        network: Arc<N>,
        preflight: Commitment,
    ) -> Result<Self, ChainClientError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ChainClientError::WalletUnavailable(format!("cannot read {}: {e}", path.display()))
        })?;
        let bytes: Vec<u8> = serde_json::from_str(&contents).map_err(|e| {
            ChainClientError::WalletUnavailable(format!("{} is not a keypair file: {e}", path.display()))
        })?;
        let wallet = Self::from_keypair_bytes(&bytes, network, preflight)?;
        info!("[tu-client] Loaded keypair {} from {}", wallet.address, path.display());
        Ok(wallet)
    }

    fn from_signing_key(signing_key: SigningKey, network: Arc<N>, preflight: Commitment) -> Self {
        let address = Pubkey::new_from_array(signing_key.verifying_key().to_bytes());
        Self {
            signing_key,
            address,
            network,
            preflight,
            id: format!("keypair:{address}"),
        }
    }

    /// Public key of this wallet.
    pub fn address(&self) -> Pubkey {
        self.address
    }

    /// Compile, sign and wire-encode a transaction without sending it.
    pub fn sign_transaction(&self, tx: &Transaction) -> Result<(Signature, Vec<u8>), ChainClientError> {
        let message = compile_message(tx)?;
        if let Some(other) = message.signer_keys().iter().find(|k| **k != self.address) {
            return Err(ChainClientError::Encode(format!(
                "transaction also needs a signature from {other}"
            )));
        }

        let bytes = message.serialize()?;
        let signature = Signature::from_bytes(self.signing_key.sign(&bytes).to_bytes());
        let wire = encode_transaction(&[signature], &bytes)?;
        Ok((signature, wire))
    }
}

#[async_trait]
impl<N: LedgerNetwork> WalletProvider for KeypairWallet<N> {
    async fn connect(&self) -> Result<Pubkey, ChainClientError> {
        Ok(self.address)
    }

    async fn sign_and_send(&self, tx: Transaction) -> Result<Signature, ChainClientError> {
        let (signature, wire) = self.sign_transaction(&tx)?;
        debug!(
            "[tu-client] Sending {} bytes signed {} to {}",
            wire.len(),
            signature,
            self.network.endpoint()
        );
        self.network.send_transaction(wire, self.preflight).await
    }

    fn wallet_id(&self) -> &str {
        &self.id
    }
}
