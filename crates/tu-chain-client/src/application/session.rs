//! # Session State
//!
//! The connected wallet, if any. `ChainClient::connect` is the only writer.

use parking_lot::RwLock;

use crate::domain::{ChainClientError, Pubkey};

/// Connection slot: a wallet address or nothing.
#[derive(Debug, Default)]
pub struct SessionState {
    wallet: RwLock<Option<Pubkey>>,
}

impl SessionState {
    /// Empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the connected wallet, replacing any previous one.
    pub fn set(&self, address: Pubkey) {
        *self.wallet.write() = Some(address);
    }

    /// Connected wallet.
    pub fn current(&self) -> Option<Pubkey> {
        *self.wallet.read()
    }

    /// Is a wallet connected?
    pub fn is_connected(&self) -> bool {
        self.wallet.read().is_some()
    }

    /// Connected wallet, or `WalletNotConnected`.
    pub fn require_connected(&self) -> Result<Pubkey, ChainClientError> {
        self.current().ok_or(ChainClientError::WalletNotConnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_disconnected() {
        let session = SessionState::new();
        assert!(!session.is_connected());
        assert_eq!(
            session.require_connected(),
            Err(ChainClientError::WalletNotConnected)
        );
    }

    #[test]
    fn test_reconnect_overwrites() {
        let session = SessionState::new();
        let first = Pubkey::new_from_array([1u8; 32]);
        let second = Pubkey::new_from_array([2u8; 32]);

        session.set(first);
        session.set(first);
        assert_eq!(session.current(), Some(first));

        session.set(second);
        assert_eq!(session.require_connected(), Ok(second));
    }
}
