//! # Program-Derived Address Derivation
//!
//! `sha256(seed || bump || program_id || "ProgramDerivedAddress")`, searching
//! bumps from 255 down to 1 for the first digest that is not a valid ed25519
//! point. Such an address has no private key, so only the program can sign
//! for it.

use ed25519_dalek::VerifyingKey;
use sha2::{Digest, Sha256};

use crate::domain::{ChainClientError, Pubkey, MAX_BUMP, MAX_SEED_LEN, MIN_BUMP};

/// Domain separator appended to every derivation hash.
pub const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Address plus the bump that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DerivedAddress {
    /// Program-owned address.
    pub address: Pubkey,
    /// Disambiguation byte appended to the seed.
    pub bump: u8,
}

/// Does `bytes` decompress to a point on the ed25519 curve?
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    VerifyingKey::from_bytes(bytes).is_ok()
}

/// Hash seeds and program id into a candidate address.
///
/// Returns `None` when the candidate lies on the curve.
pub fn create_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> Option<Pubkey> {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(program_id.as_bytes());
    hasher.update(PDA_MARKER);
    let digest: [u8; 32] = hasher.finalize().into();

    if is_on_curve(&digest) {
        return None;
    }
    Some(Pubkey::new_from_array(digest))
}

/// Derive the program-owned address for a single fixed seed.
pub fn derive_address(program_id: &Pubkey, seed: &[u8]) -> Result<DerivedAddress, ChainClientError> {
    derive_with_bumps(program_id, seed, (MIN_BUMP..=MAX_BUMP).rev())
}

fn derive_with_bumps(
    program_id: &Pubkey,
    seed: &[u8],
    bumps: impl Iterator<Item = u8>,
) -> Result<DerivedAddress, ChainClientError> {
    if seed.len() > MAX_SEED_LEN {
        return Err(ChainClientError::InvalidSeed(format!(
            "seed is {} bytes, max {}",
            seed.len(),
            MAX_SEED_LEN
        )));
    }

    for bump in bumps {
        if let Some(address) = create_program_address(&[seed, &[bump]], program_id) {
            return Ok(DerivedAddress { address, bump });
        }
    }

    Err(ChainClientError::InvalidSeed(format!(
        "no off-curve address for seed {:?}",
        String::from_utf8_lossy(seed)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;
    use proptest::prelude::*;

    fn program() -> Pubkey {
        "EGWf3mBuwhvjmR134QfzKGMo8EgtsC4ieMP3D6mxWFXq".parse().unwrap()
    }

    #[test]
    fn test_known_shared_account_vector() {
        let derived = derive_address(&program(), b"base_account22").unwrap();
        assert_eq!(
            derived.address.to_string(),
            "FfmJbuAqSxvsEd8bR3MgD4oDRcazmjJa8nDNqyqh4Xv8"
        );
        assert_eq!(derived.bump, 252);
    }

    #[test]
    fn test_known_bumps_for_other_seeds() {
        let cases: [(&[u8], u8); 3] = [(b"base_account3", 255), (b"", 255), (b"x", 254)];
        for (seed, bump) in cases {
            assert_eq!(derive_address(&program(), seed).unwrap().bump, bump);
        }
    }

    #[test]
    fn test_derive_is_deterministic() {
        let a = derive_address(&program(), b"base_account22").unwrap();
        let b = derive_address(&program(), b"base_account22").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_derived_address_is_off_curve() {
        let derived = derive_address(&program(), b"base_account22").unwrap();
        assert!(!is_on_curve(derived.address.as_bytes()));
    }

    #[test]
    fn test_derived_address_matches_bump() {
        let derived = derive_address(&program(), b"base_account22").unwrap();
        let recomputed =
            create_program_address(&[b"base_account22", &[derived.bump]], &program()).unwrap();
        assert_eq!(recomputed, derived.address);
    }

    #[test]
    fn test_real_public_key_is_on_curve() {
        let key = SigningKey::from_bytes(&[7u8; 32]).verifying_key().to_bytes();
        assert!(is_on_curve(&key));
    }

    #[test]
    fn test_seed_too_long() {
        let seed = [b'x'; MAX_SEED_LEN + 1];
        assert!(matches!(
            derive_address(&program(), &seed),
            Err(ChainClientError::InvalidSeed(_))
        ));
    }

    #[test]
    fn test_bump_exhaustion_is_an_error() {
        let result = derive_with_bumps(&program(), b"base_account22", std::iter::empty());
        assert!(matches!(result, Err(ChainClientError::InvalidSeed(_))));
    }

    #[test]
    fn test_program_id_changes_address() {
        let other = Pubkey::new_from_array([9u8; 32]);
        let a = derive_address(&program(), b"base_account22").unwrap();
        let b = derive_address(&other, b"base_account22").unwrap();
        assert_ne!(a.address, b.address);
    }

    proptest! {
        #[test]
        fn prop_distinct_seeds_distinct_addresses(
            s1 in proptest::collection::vec(any::<u8>(), 0..=32),
            s2 in proptest::collection::vec(any::<u8>(), 0..=32),
        ) {
            prop_assume!(s1 != s2);
            let a = derive_address(&program(), &s1).unwrap();
            let b = derive_address(&program(), &s2).unwrap();
            prop_assert_ne!(a.address, b.address);
        }
    }
}
