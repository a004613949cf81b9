//! # Display Projection
//!
//! Media entries only, most votes first. The sort is stable so equal-vote
//! entries keep the order the ledger returned them in.

use crate::domain::Entry;

/// Filter to media links and order by votes, descending and stable.
pub fn project_entries(entries: impl IntoIterator<Item = Entry>) -> Vec<Entry> {
    let mut projected: Vec<Entry> = entries.into_iter().filter(Entry::is_media).collect();
    projected.sort_by(|a, b| b.votes.cmp(&a.votes));
    projected
}
