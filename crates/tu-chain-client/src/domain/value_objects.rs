//! # Domain Value Objects
//!
//! Immutable ledger primitives: keys, signatures, blockhashes, commitment
//! levels and the per-operation state machine.

use std::fmt;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use super::errors::ChainClientError;

/// Smallest ledger currency unit.
pub type Lamports = u64;

fn decode_base58<const N: usize>(s: &str) -> Result<[u8; N], ChainClientError> {
    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|e| ChainClientError::InvalidAddress(format!("{s}: {e}")))?;
    bytes.try_into().map_err(|v: Vec<u8>| {
        ChainClientError::InvalidAddress(format!("{s}: expected {N} bytes, got {}", v.len()))
    })
}

/// 32-byte ed25519 public key or program-derived address.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, BorshSerialize, BorshDeserialize,
    Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Pubkey([u8; 32]);

impl Pubkey {
    /// Wrap raw key bytes.
    pub const fn new_from_array(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Owned copy of the key bytes.
    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }
}

/// The native system program (all-zero key).
pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::new_from_array([0u8; 32]);

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({self})")
    }
}

impl FromStr for Pubkey {
    type Err = ChainClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_base58::<32>(s).map(Self)
    }
}

impl TryFrom<String> for Pubkey {
    type Error = ChainClientError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Pubkey> for String {
    fn from(key: Pubkey) -> Self {
        key.to_string()
    }
}

/// 64-byte transaction signature. The first signature of a transaction is
/// also its handle on the network.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; 64]);

impl Signature {
    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; 64])
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

impl FromStr for Signature {
    type Err = ChainClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_base58::<64>(s).map(Self)
    }
}

/// Recent blockhash a transaction must reference to be accepted.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Blockhash([u8; 32]);

impl Blockhash {
    /// Wrap raw hash bytes.
    pub const fn new_from_array(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blockhash({self})")
    }
}

impl FromStr for Blockhash {
    type Err = ChainClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_base58::<32>(s).map(Self)
    }
}

/// How finalized a read or write must be before it is treated as
/// authoritative. Ordered from weakest to strongest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    /// Seen by the node, may be rolled back.
    #[default]
    Processed,
    /// Voted on by a supermajority.
    Confirmed,
    /// Rooted.
    Finalized,
}

impl Commitment {
    /// Wire name used by the JSON-RPC dialect.
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Commitment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processed" => Ok(Commitment::Processed),
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            other => Err(format!("unknown commitment level '{other}'")),
        }
    }
}

/// Status of a submitted transaction as reported by the network.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignatureStatus {
    /// Highest commitment level reached, if reported.
    pub confirmation: Option<Commitment>,
    /// Execution error, if the transaction landed but failed.
    pub err: Option<String>,
}

impl SignatureStatus {
    /// Landed successfully at `level`.
    pub fn at(level: Commitment) -> Self {
        Self {
            confirmation: Some(level),
            err: None,
        }
    }

    /// Landed at `level` with an execution error.
    pub fn failed(level: Commitment, err: impl Into<String>) -> Self {
        Self {
            confirmation: Some(level),
            err: Some(err.into()),
        }
    }

    /// Has the transaction reached `target`?
    pub fn satisfies(&self, target: Commitment) -> bool {
        self.confirmation.map(|c| c >= target).unwrap_or(false)
    }
}

/// Result of waiting for a transaction to reach the configured commitment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// Network attested finality at the configured level.
    Confirmed,
    /// Wait bound elapsed; the transaction may still land.
    TimedOut,
}

/// Lifecycle of a single mutating operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationState {
    /// Built, nothing sent yet.
    Idle,
    /// Waiting on the wallet; the only cancellable state.
    AwaitingSignature,
    /// Accepted by the network, fate owned by the ledger.
    Submitted,
    /// Reached the configured commitment.
    Confirmed,
    /// Refused by the user, the network, or the program.
    Rejected,
    /// Confirmation wait exceeded.
    TimedOut,
}

impl OperationState {
    /// Short name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            OperationState::Idle => "idle",
            OperationState::AwaitingSignature => "awaiting_signature",
            OperationState::Submitted => "submitted",
            OperationState::Confirmed => "confirmed",
            OperationState::Rejected => "rejected",
            OperationState::TimedOut => "timed_out",
        }
    }

    /// No further transitions leave this state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationState::Confirmed | OperationState::Rejected | OperationState::TimedOut
        )
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a mutating operation hands back to its caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransactionReceipt {
    /// Transaction handle.
    pub signature: Signature,
    /// State the operation finished in (`Submitted` or `Confirmed`).
    pub state: OperationState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_program_base58() {
        assert_eq!(
            SYSTEM_PROGRAM_ID.to_string(),
            "11111111111111111111111111111111"
        );
    }

    #[test]
    fn test_pubkey_parse_display() {
        let key: Pubkey = "EGWf3mBuwhvjmR134QfzKGMo8EgtsC4ieMP3D6mxWFXq".parse().unwrap();
        assert_eq!(key.to_string(), "EGWf3mBuwhvjmR134QfzKGMo8EgtsC4ieMP3D6mxWFXq");
    }

    #[test]
    fn test_pubkey_wrong_length() {
        let result: Result<Pubkey, _> = "abc".parse();
        assert!(matches!(result, Err(ChainClientError::InvalidAddress(_))));
    }

    #[test]
    fn test_pubkey_serde_as_string() {
        let key = Pubkey::new_from_array([3u8; 32]);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{key}\""));
        let back: Pubkey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_commitment_ordering() {
        assert!(Commitment::Processed < Commitment::Confirmed);
        assert!(Commitment::Confirmed < Commitment::Finalized);
        assert_eq!("Finalized".parse::<Commitment>().unwrap(), Commitment::Finalized);
        assert!("eventually".parse::<Commitment>().is_err());
    }

    #[test]
    fn test_signature_status_satisfies() {
        let status = SignatureStatus::at(Commitment::Confirmed);
        assert!(status.satisfies(Commitment::Processed));
        assert!(status.satisfies(Commitment::Confirmed));
        assert!(!status.satisfies(Commitment::Finalized));
        assert!(!SignatureStatus::default().satisfies(Commitment::Processed));
    }

    #[test]
    fn test_operation_state_terminal() {
        assert!(!OperationState::Submitted.is_terminal());
        assert!(OperationState::TimedOut.is_terminal());
        assert_eq!(OperationState::AwaitingSignature.name(), "awaiting_signature");
    }
}
