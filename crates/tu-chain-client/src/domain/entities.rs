//! # Domain Entities
//!
//! The shared record and the entries it holds. Both are value copies of
//! remote state; the ledger owns the real thing.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::value_objects::Pubkey;

/// Substring that marks a link as a recognized media resource.
pub const MEDIA_MARKER: &str = "media";

/// Opaque entry identifier assigned by the remote program.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as str.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the identifier carries no characters.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One submitted link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Remote-assigned identifier.
    pub id: EntryId,
    /// Submitted link.
    pub link: String,
    /// Wallet that created the entry.
    pub submitter: Pubkey,
    /// Upvotes so far.
    pub votes: u64,
}

impl Entry {
    /// Create an entry value.
    pub fn new(id: impl Into<String>, link: impl Into<String>, submitter: Pubkey, votes: u64) -> Self {
        Self {
            id: EntryId::new(id),
            link: link.into(),
            submitter,
            votes,
        }
    }

    /// Does the link point at a media resource?
    pub fn is_media(&self) -> bool {
        self.link.contains(MEDIA_MARKER)
    }
}

/// Decoded copy of the single program-derived storage account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedAccount {
    /// Counter maintained by the program; not relied on for ordering.
    pub total_entries: u64,
    /// Entries in the order the ledger returned them.
    pub entries: Vec<Entry>,
    /// Bump stored at initialization.
    pub bump: u8,
}

impl SharedAccount {
    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when initialized but nothing was submitted yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_marker() {
        let author = Pubkey::new_from_array([1u8; 32]);
        let gif = Entry::new("a", "https://media.giphy.com/media/abc/giphy.gif", author, 0);
        let png = Entry::new("b", "https://example.com/image.png", author, 0);
        assert!(gif.is_media());
        assert!(!png.is_media());
    }

    #[test]
    fn test_entry_id_empty() {
        assert!(EntryId::new("  ").is_empty());
        assert!(!EntryId::from("0xabc_link").is_empty());
    }

    #[test]
    fn test_shared_account_empty() {
        let account = SharedAccount::default();
        assert!(account.is_empty());
        assert_eq!(account.len(), 0);
    }
}
