//! Random resource names.
//!
//! Scenario resources share one control plane with other runs, so every
//! name carries a random suffix.

use rand::Rng;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Random lowercase alphanumeric string of `len` characters.
pub fn random_suffix(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// `prefix-xxxxxx`.
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{}", random_suffix(6))
}

/// Random password for test users.
pub fn random_password() -> String {
    format!("Pw-{}", random_suffix(16))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_name_shape() {
        let name = unique_name("acc");
        assert!(name.starts_with("acc-"));
        assert_eq!(name.len(), "acc-".len() + 6);
        assert!(name[4..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_names_differ() {
        assert_ne!(unique_name("vm"), unique_name("vm"));
    }
}
