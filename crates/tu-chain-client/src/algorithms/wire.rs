//! # Transaction Wire Encoding
//!
//! Legacy message compilation and serialization: account keys are deduplicated
//! and ordered `[fee payer, writable signers, readonly signers, writable
//! non-signers, readonly non-signers]`; arrays are prefixed with a compact-u16
//! length.

use crate::domain::{Blockhash, ChainClientError, Pubkey, Signature, Transaction};

/// Message header counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MessageHeader {
    /// Signatures the transaction must carry.
    pub num_required_signatures: u8,
    /// Trailing signer keys that are read-only.
    pub num_readonly_signed_accounts: u8,
    /// Trailing non-signer keys that are read-only.
    pub num_readonly_unsigned_accounts: u8,
}

/// Instruction with accounts replaced by key indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledInstruction {
    /// Index of the program id in the key list.
    pub program_id_index: u8,
    /// Indices of the instruction's accounts.
    pub accounts: Vec<u8>,
    /// Opaque instruction data.
    pub data: Vec<u8>,
}

/// Message ready to be signed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledMessage {
    /// Header counts.
    pub header: MessageHeader,
    /// Ordered, deduplicated keys.
    pub account_keys: Vec<Pubkey>,
    /// Recent transaction reference.
    pub recent_blockhash: Blockhash,
    /// Compiled instructions.
    pub instructions: Vec<CompiledInstruction>,
}

#[derive(Clone, Copy)]
struct KeyFlags {
    key: Pubkey,
    signer: bool,
    writable: bool,
}

fn index_of(keys: &[Pubkey], key: &Pubkey) -> Result<u8, ChainClientError> {
    let index = keys
        .iter()
        .position(|k| k == key)
        .ok_or_else(|| ChainClientError::Encode(format!("account {key} missing from key list")))?;
    u8::try_from(index).map_err(|_| ChainClientError::Encode("more than 256 accounts".to_string()))
}

fn count_flags(flags: &[KeyFlags], pred: impl Fn(&KeyFlags) -> bool) -> u8 {
    flags.iter().filter(|f| pred(*f)).count() as u8
}

/// Compile a transaction into its signable message.
pub fn compile_message(tx: &Transaction) -> Result<CompiledMessage, ChainClientError> {
    let mut flags: Vec<KeyFlags> = vec![KeyFlags {
        key: tx.fee_payer,
        signer: true,
        writable: true,
    }];

    let mut note = |key: Pubkey, signer: bool, writable: bool| {
        match flags.iter_mut().find(|f| f.key == key) {
            Some(existing) => {
                existing.signer |= signer;
                existing.writable |= writable;
            }
            None => flags.push(KeyFlags {
                key,
                signer,
                writable,
            }),
        }
    };

    for ix in &tx.instructions {
        for meta in &ix.accounts {
            note(meta.pubkey, meta.is_signer, meta.is_writable);
        }
        note(ix.program_id, false, false);
    }

    let (payer, rest) = flags.split_at(1);
    let group = |signer: bool, writable: bool| {
        rest.iter()
            .filter(move |f| f.signer == signer && f.writable == writable)
            .map(|f| f.key)
    };

    let mut account_keys: Vec<Pubkey> = vec![payer[0].key];
    account_keys.extend(group(true, true));
    account_keys.extend(group(true, false));
    account_keys.extend(group(false, true));
    account_keys.extend(group(false, false));

    if account_keys.len() > 256 {
        return Err(ChainClientError::Encode("more than 256 accounts".to_string()));
    }

    let header = MessageHeader {
        num_required_signatures: count_flags(&flags, |f| f.signer),
        num_readonly_signed_accounts: count_flags(&flags, |f| f.signer && !f.writable),
        num_readonly_unsigned_accounts: count_flags(&flags, |f| !f.signer && !f.writable),
    };

    let instructions = tx
        .instructions
        .iter()
        .map(|ix| {
            Ok(CompiledInstruction {
                program_id_index: index_of(&account_keys, &ix.program_id)?,
                accounts: ix
                    .accounts
                    .iter()
                    .map(|meta| index_of(&account_keys, &meta.pubkey))
                    .collect::<Result<Vec<_>, _>>()?,
                data: ix.data.clone(),
            })
        })
        .collect::<Result<Vec<_>, ChainClientError>>()?;

    Ok(CompiledMessage {
        header,
        account_keys,
        recent_blockhash: tx.recent_blockhash,
        instructions,
    })
}

/// Append a compact-u16 length (7 bits per byte, high bit continues).
pub fn encode_compact_u16(mut value: u16, out: &mut Vec<u8>) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        byte |= 0x80;
        out.push(byte);
    }
}

fn encode_len(len: usize, out: &mut Vec<u8>) -> Result<(), ChainClientError> {
    let len = u16::try_from(len)
        .map_err(|_| ChainClientError::Encode(format!("array of {len} elements is too long")))?;
    encode_compact_u16(len, out);
    Ok(())
}

impl CompiledMessage {
    /// Keys that must sign, in signature order.
    pub fn signer_keys(&self) -> &[Pubkey] {
        &self.account_keys[..self.header.num_required_signatures as usize]
    }

    /// Bytes covered by the signatures.
    pub fn serialize(&self) -> Result<Vec<u8>, ChainClientError> {
        let mut out = vec![
            self.header.num_required_signatures,
            self.header.num_readonly_signed_accounts,
            self.header.num_readonly_unsigned_accounts,
        ];

        encode_len(self.account_keys.len(), &mut out)?;
        for key in &self.account_keys {
            out.extend_from_slice(key.as_bytes());
        }

        out.extend_from_slice(self.recent_blockhash.as_bytes());

        encode_len(self.instructions.len(), &mut out)?;
        for ix in &self.instructions {
            out.push(ix.program_id_index);
            encode_len(ix.accounts.len(), &mut out)?;
            out.extend_from_slice(&ix.accounts);
            encode_len(ix.data.len(), &mut out)?;
            out.extend_from_slice(&ix.data);
        }

        Ok(out)
    }
}

/// Full wire transaction: signatures followed by the message bytes.
pub fn encode_transaction(signatures: &[Signature], message: &[u8]) -> Result<Vec<u8>, ChainClientError> {
    let mut out = Vec::with_capacity(1 + signatures.len() * 64 + message.len());
    encode_len(signatures.len(), &mut out)?;
    for sig in signatures {
        out.extend_from_slice(sig.as_bytes());
    }
    out.extend_from_slice(message);
    Ok(out)
}
