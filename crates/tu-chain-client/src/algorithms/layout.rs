//! # Program Layout
//!
//! Byte layout of the shared account and the instruction data the deployed
//! program expects. Accounts and instructions are prefixed by an 8-byte
//! discriminator, `sha256("<namespace>:<name>")[..8]`, followed by Borsh.
//!
//! This layout is owned by the remote program; keep it in sync with the
//! deployed version.

use borsh::{BorshDeserialize, BorshSerialize};
use sha2::{Digest, Sha256};

use crate::domain::{ChainClientError, Entry, EntryId, Lamports, Pubkey, SharedAccount};

/// Account type name of the shared record.
pub const SHARED_ACCOUNT_NAME: &str = "BaseAccount";
/// Instruction creating the shared record.
pub const IX_INITIALIZE: &str = "initialize";
/// Instruction appending an entry.
pub const IX_ADD_ENTRY: &str = "add_gif";
/// Instruction incrementing an entry's vote count.
pub const IX_UPVOTE: &str = "upvote_gif";

/// System program instruction index for a lamport transfer.
const SYSTEM_TRANSFER_INDEX: u32 = 2;

/// Length of account and instruction discriminators.
pub const DISCRIMINATOR_LEN: usize = 8;

#[derive(BorshSerialize, BorshDeserialize)]
struct RawEntry {
    id: String,
    gif_link: String,
    user_address: Pubkey,
    votes: u64,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct RawSharedAccount {
    total_gifs: u64,
    gif_list: Vec<RawEntry>,
    bump: u8,
}

/// `sha256("<namespace>:<name>")[..8]`.
pub fn discriminator(namespace: &str, name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let digest = Sha256::digest(format!("{namespace}:{name}").as_bytes());
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
    out
}

/// Discriminator that opens the shared account's data.
pub fn account_discriminator() -> [u8; DISCRIMINATOR_LEN] {
    discriminator("account", SHARED_ACCOUNT_NAME)
}

/// Decode raw account bytes into a `SharedAccount`.
///
/// Accounts are allocated larger than their contents, so trailing bytes
/// after the encoded value are ignored.
pub fn decode_shared_account(data: &[u8]) -> Result<SharedAccount, ChainClientError> {
    if data.len() < DISCRIMINATOR_LEN {
        return Err(ChainClientError::Decode(format!(
            "account data is {} bytes, shorter than its discriminator",
            data.len()
        )));
    }

    let (tag, mut body) = data.split_at(DISCRIMINATOR_LEN);
    if tag != account_discriminator() {
        return Err(ChainClientError::Decode(
            "account discriminator mismatch".to_string(),
        ));
    }

    let raw = RawSharedAccount::deserialize(&mut body)
        .map_err(|e| ChainClientError::Decode(e.to_string()))?;

    Ok(SharedAccount {
        total_entries: raw.total_gifs,
        entries: raw
            .gif_list
            .into_iter()
            .map(|item| Entry {
                id: EntryId::new(item.id),
                link: item.gif_link,
                submitter: item.user_address,
                votes: item.votes,
            })
            .collect(),
        bump: raw.bump,
    })
}

/// Encode a `SharedAccount` the way the program stores it, zero-padded to
/// `space` bytes when that is larger. Used by in-memory ledgers.
pub fn encode_shared_account(account: &SharedAccount, space: usize) -> Result<Vec<u8>, ChainClientError> {
    let raw = RawSharedAccount {
        total_gifs: account.total_entries,
        gif_list: account
            .entries
            .iter()
            .map(|e| RawEntry {
                id: e.id.as_str().to_string(),
                gif_link: e.link.clone(),
                user_address: e.submitter,
                votes: e.votes,
            })
            .collect(),
        bump: account.bump,
    };

    let mut data = account_discriminator().to_vec();
    raw.serialize(&mut data)
        .map_err(|e| ChainClientError::Encode(e.to_string()))?;
    if data.len() < space {
        data.resize(space, 0);
    }
    Ok(data)
}

fn instruction_data<T: BorshSerialize>(name: &str, args: &T) -> Result<Vec<u8>, ChainClientError> {
    let mut data = discriminator("global", name).to_vec();
    args.serialize(&mut data)
        .map_err(|e| ChainClientError::Encode(format!("{name}: {e}")))?;
    Ok(data)
}

/// Data for `initialize(bump: u8)`.
pub fn initialize_data(bump: u8) -> Result<Vec<u8>, ChainClientError> {
    instruction_data(IX_INITIALIZE, &bump)
}

/// Data for `add_gif(link: String)`.
pub fn add_entry_data(link: &str) -> Result<Vec<u8>, ChainClientError> {
    instruction_data(IX_ADD_ENTRY, &link.to_string())
}

/// Data for `upvote_gif(id: String)`.
pub fn upvote_data(id: &EntryId) -> Result<Vec<u8>, ChainClientError> {
    instruction_data(IX_UPVOTE, &id.as_str().to_string())
}

/// Data for the system program's transfer: `u32 LE index || u64 LE lamports`.
pub fn transfer_data(lamports: Lamports) -> Vec<u8> {
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&SYSTEM_TRANSFER_INDEX.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());
    data
}

/// Which program instruction a data blob invokes, if it is one of ours.
pub fn instruction_name(data: &[u8]) -> Option<&'static str> {
    let tag = data.get(..DISCRIMINATOR_LEN)?;
    [IX_INITIALIZE, IX_ADD_ENTRY, IX_UPVOTE]
        .into_iter()
        .find(|name| discriminator("global", name) == tag)
}

/// Decode the single string argument of `add_gif` / `upvote_gif`.
pub fn string_argument(data: &[u8]) -> Result<String, ChainClientError> {
    let mut body = data
        .get(DISCRIMINATOR_LEN..)
        .ok_or_else(|| ChainClientError::Decode("instruction data too short".to_string()))?;
    String::deserialize(&mut body).map_err(|e| ChainClientError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SharedAccount {
        let author = Pubkey::new_from_array([4u8; 32]);
        SharedAccount {
            total_entries: 2,
            entries: vec![
                Entry::new("0xa_1", "https://media.giphy.com/media/1/giphy.gif", author, 3),
                Entry::new("0xa_2", "https://example.com/image.png", author, 0),
            ],
            bump: 254,
        }
    }

    #[test]
    fn test_discriminator_is_prefix_of_sha256() {
        let digest = Sha256::digest(b"global:initialize");
        assert_eq!(discriminator("global", "initialize"), digest[..8]);
    }

    #[test]
    fn test_decode_padded_account() {
        let account = sample();
        let bytes = encode_shared_account(&account, 9000).unwrap();
        assert_eq!(bytes.len(), 9000);
        assert_eq!(decode_shared_account(&bytes).unwrap(), account);
    }

    #[test]
    fn test_decode_empty_account() {
        let account = SharedAccount {
            bump: 255,
            ..Default::default()
        };
        let bytes = encode_shared_account(&account, 0).unwrap();
        let decoded = decode_shared_account(&bytes).unwrap();
        assert!(decoded.is_empty());
        assert_eq!(decoded.bump, 255);
    }

    #[test]
    fn test_decode_rejects_wrong_discriminator() {
        let mut bytes = encode_shared_account(&sample(), 0).unwrap();
        bytes[0] ^= 0xff;
        assert!(matches!(
            decode_shared_account(&bytes),
            Err(ChainClientError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_rejects_truncation() {
        let bytes = encode_shared_account(&sample(), 0).unwrap();
        assert!(decode_shared_account(&bytes[..4]).is_err());
        assert!(decode_shared_account(&bytes[..20]).is_err());
    }

    #[test]
    fn test_add_entry_data_layout() {
        let data = add_entry_data("ab").unwrap();
        assert_eq!(&data[..8], &discriminator("global", IX_ADD_ENTRY));
        assert_eq!(&data[8..12], &2u32.to_le_bytes());
        assert_eq!(&data[12..], b"ab");
        assert_eq!(instruction_name(&data), Some(IX_ADD_ENTRY));
        assert_eq!(string_argument(&data).unwrap(), "ab");
    }

    #[test]
    fn test_initialize_data_layout() {
        let data = initialize_data(253).unwrap();
        assert_eq!(data.len(), 9);
        assert_eq!(data[8], 253);
        assert_eq!(instruction_name(&data), Some(IX_INITIALIZE));
    }

    #[test]
    fn test_transfer_data_layout() {
        let data = transfer_data(100_000);
        assert_eq!(&data[..4], &[2, 0, 0, 0]);
        assert_eq!(u64::from_le_bytes(data[4..].try_into().unwrap()), 100_000);
        assert_eq!(instruction_name(&data), None);
    }
}
