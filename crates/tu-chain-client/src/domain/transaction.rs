//! # Instructions and Transactions
//!
//! Unsigned instruction and transaction shapes handed from the gateway to the
//! wallet. Wire encoding lives in `algorithms::wire`.

use super::value_objects::{Blockhash, Pubkey};

/// Account referenced by an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountMeta {
    /// Account key.
    pub pubkey: Pubkey,
    /// Must sign the transaction.
    pub is_signer: bool,
    /// Instruction may write to it.
    pub is_writable: bool,
}

impl AccountMeta {
    /// Writable account.
    pub fn new(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    /// Read-only account.
    pub fn new_readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// A single requested state change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// Program that executes it.
    pub program_id: Pubkey,
    /// Accounts it touches, in program order.
    pub accounts: Vec<AccountMeta>,
    /// Opaque instruction data.
    pub data: Vec<u8>,
}

/// Unsigned transaction: fee payer, recent blockhash, instructions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// Account paying fees; always the first signer.
    pub fee_payer: Pubkey,
    /// Recent transaction reference.
    pub recent_blockhash: Blockhash,
    /// Instructions executed atomically.
    pub instructions: Vec<Instruction>,
}

impl Transaction {
    /// Assemble a transaction.
    pub fn new(fee_payer: Pubkey, recent_blockhash: Blockhash, instructions: Vec<Instruction>) -> Self {
        Self {
            fee_payer,
            recent_blockhash,
            instructions,
        }
    }
}
