//! Random identifiers for tokens and checks.

use rand::Rng;
use rand::rngs::OsRng;

use uptime_core::key::is_valid_key;

/// Length of every generated token and check id.
pub const ID_LEN: usize = 20;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Draw a fresh id from the operating-system CSPRNG.
pub fn random_id() -> String {
    let mut rng = OsRng;
    (0..ID_LEN)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect()
}

/// Whether `id` has the shape of a generated id.
pub fn is_well_formed_id(id: &str) -> bool {
    id.len() == ID_LEN && is_valid_key(id)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn ids_have_fixed_length_and_alphabet() {
        for _ in 0..100 {
            let id = random_id();
            assert_eq!(id.len(), ID_LEN);
            assert!(id.bytes().all(|b| ALPHABET.contains(&b)));
            assert!(is_well_formed_id(&id));
        }
    }

    #[test]
    fn ids_do_not_repeat() {
        let ids: HashSet<String> = (0..1000).map(|_| random_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!(!is_well_formed_id("short"));
        assert!(!is_well_formed_id("abcdefghij0123456789x"));
        assert!(!is_well_formed_id("abcdefghij/123456789"));
    }
}
