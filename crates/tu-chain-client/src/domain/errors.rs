//! # Domain Errors
//!
//! Error taxonomy for the chain client.
//!
//! Local validation failures are raised before any network call. Remote
//! rejections are carried verbatim so the caller can tell causes apart.

use thiserror::Error;

use super::value_objects::Signature;

/// Chain client error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainClientError {
    /// No compatible wallet is present.
    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),

    /// The user declined in the wallet (connect or signature request).
    #[error("User rejected the request")]
    UserRejected,

    /// A mutating operation was attempted without a connected wallet.
    #[error("Wallet not connected")]
    WalletNotConnected,

    /// Input failed local validation.
    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    /// No bump in range yields an off-curve address for this seed.
    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    /// Client configuration failed validation.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// A string could not be parsed as a base58 public key or signature.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The shared account has not been created yet.
    #[error("Shared account not initialized")]
    AccountNotInitialized,

    /// The remote program refused to create an account that already exists.
    #[error("Shared account already initialized: {0}")]
    AlreadyInitialized(String),

    /// Network failure talking to the ledger.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// The network or program rejected the transaction.
    #[error("Rejected: {message}")]
    Rejected {
        /// JSON-RPC or runtime error code, when the network reported one.
        code: Option<i64>,
        /// Rejection message.
        message: String,
        /// Program logs attached to the rejection.
        logs: Vec<String>,
    },

    /// The fee payer or sender cannot cover the transaction.
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Confirmation did not arrive in time. The transaction may still land.
    #[error("Timed out waiting for confirmation of {signature}")]
    TimedOut {
        /// Handle of the transaction whose fate is unknown.
        signature: Signature,
    },

    /// Account bytes do not match the expected layout.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Instruction arguments or a transaction could not be encoded.
    #[error("Encode error: {0}")]
    Encode(String),

    /// No projected entry carries this id.
    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    /// Several projected entries share this id but name different submitters.
    #[error("Entry {id} resolves to {count} distinct recipients")]
    AmbiguousRecipient {
        /// Entry id that was looked up.
        id: String,
        /// Number of distinct submitter addresses found.
        count: usize,
    },

    /// Operation state machine was driven through an illegal edge.
    #[error("Invalid operation transition: {from} -> {to}")]
    InvalidTransition {
        /// State before.
        from: &'static str,
        /// Requested state.
        to: &'static str,
    },
}

impl ChainClientError {
    /// Classify a remote rejection into the taxonomy.
    ///
    /// The remote program and runtime report failures as free text plus
    /// program logs; the account-creation and balance failures are pulled out
    /// into their own variants, everything else stays `Rejected`.
    pub fn from_rejection(code: Option<i64>, message: impl Into<String>, logs: Vec<String>) -> Self {
        let message = message.into();
        let haystack = std::iter::once(message.as_str())
            .chain(logs.iter().map(String::as_str))
            .map(str::to_ascii_lowercase)
            .collect::<Vec<_>>();

        if haystack.iter().any(|line| line.contains("already in use")) {
            return ChainClientError::AlreadyInitialized(message);
        }

        let insufficient = haystack.iter().any(|line| {
            line.contains("insufficient lamports")
                || line.contains("insufficient funds")
                || line.contains("insufficientfundsforfee")
                || line.contains("accountnotfound")
                || line.contains("no record of a prior credit")
        });
        if insufficient {
            return ChainClientError::InsufficientFunds(message);
        }

        ChainClientError::Rejected {
            code,
            message,
            logs,
        }
    }

    /// True when the outcome of the transaction is unknown rather than failed.
    pub fn is_outcome_unknown(&self) -> bool {
        matches!(self, ChainClientError::TimedOut { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_already_in_use() {
        let err = ChainClientError::from_rejection(
            Some(-32002),
            "Transaction simulation failed: Error processing Instruction 0: custom program error: 0x0",
            vec![
                "Program 11111111111111111111111111111111 invoke [2]".to_string(),
                "Allocate: account Address { address: 4Nd1m, base: None } already in use".to_string(),
            ],
        );
        assert!(matches!(err, ChainClientError::AlreadyInitialized(_)));
    }

    #[test]
    fn test_classify_insufficient_lamports() {
        let err = ChainClientError::from_rejection(
            Some(-32002),
            "Transaction simulation failed",
            vec!["Transfer: insufficient lamports 10, need 100000".to_string()],
        );
        assert!(matches!(err, ChainClientError::InsufficientFunds(_)));
    }

    #[test]
    fn test_classify_fee_payer_without_credit() {
        let err = ChainClientError::from_rejection(
            Some(-32002),
            "Attempt to debit an account but found no record of a prior credit.",
            vec![],
        );
        assert!(matches!(err, ChainClientError::InsufficientFunds(_)));
    }

    #[test]
    fn test_classify_other_stays_rejected() {
        let err = ChainClientError::from_rejection(
            Some(-32002),
            "custom program error: 0x1771",
            vec!["Program log: AnchorError".to_string()],
        );
        match err {
            ChainClientError::Rejected { code, logs, .. } => {
                assert_eq!(code, Some(-32002));
                assert_eq!(logs.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_timed_out_is_unknown() {
        let err = ChainClientError::TimedOut {
            signature: Signature::from_bytes([7u8; 64]),
        };
        assert!(err.is_outcome_unknown());
        assert!(!ChainClientError::UserRejected.is_outcome_unknown());
    }

    #[test]
    fn test_ambiguous_recipient_message() {
        let err = ChainClientError::AmbiguousRecipient {
            id: "0xabc_link".to_string(),
            count: 2,
        };
        assert!(err.to_string().contains("2 distinct"));
    }
}
