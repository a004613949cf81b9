//! # Domain Invariants
//!
//! Rules checked locally before anything reaches the network, plus the legal
//! edges of the per-operation state machine.

use super::entities::EntryId;
use super::errors::ChainClientError;
use super::value_objects::{Lamports, OperationState};

/// Maximum length of a single address-derivation seed.
pub const MAX_SEED_LEN: usize = 32;

/// Highest bump tried during address derivation.
pub const MAX_BUMP: u8 = u8::MAX;

/// Lowest bump tried during address derivation.
pub const MIN_BUMP: u8 = 1;

/// Invariant: a submitted link carries at least one visible character.
pub fn invariant_link_present(link: &str) -> Result<(), ChainClientError> {
    if link.trim().is_empty() {
        return Err(ChainClientError::EmptyInput("link"));
    }
    Ok(())
}

/// Invariant: an upvote or tip names an entry.
pub fn invariant_entry_id_present(id: &EntryId) -> Result<(), ChainClientError> {
    if id.is_empty() {
        return Err(ChainClientError::EmptyInput("entry id"));
    }
    Ok(())
}

/// Invariant: a tip moves a positive amount.
pub fn invariant_positive_amount(amount: Lamports) -> Result<(), ChainClientError> {
    if amount == 0 {
        return Err(ChainClientError::EmptyInput("amount"));
    }
    Ok(())
}

/// Invariant: operations only move forward along
/// `Idle -> AwaitingSignature -> Submitted -> {Confirmed | Rejected | TimedOut}`.
///
/// `AwaitingSignature -> Rejected` covers user rejection and synchronous
/// network refusal; nothing leaves a terminal state.
pub fn invariant_transition(
    from: OperationState,
    to: OperationState,
) -> Result<(), ChainClientError> {
    use OperationState::*;

    let legal = matches!(
        (from, to),
        (Idle, AwaitingSignature)
            | (AwaitingSignature, Submitted)
            | (AwaitingSignature, Rejected)
            | (Submitted, Confirmed)
            | (Submitted, Rejected)
            | (Submitted, TimedOut)
    );

    if !legal {
        return Err(ChainClientError::InvalidTransition {
            from: from.name(),
            to: to.name(),
        });
    }
    Ok(())
}
