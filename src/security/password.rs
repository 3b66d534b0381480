//! Salted, iterated SHA-256 password hashing.
//!
//! Stored hashes have the form `<rounds>$<hex digest>` so that changing the
//! configured round count does not invalidate existing accounts.

use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const SALT_LEN: usize = 16;

#[derive(Debug, Clone)]
pub struct PasswordHash {
    pub hash: String,
    pub salt: String,
}

pub fn hash_password(password: &str, rounds: u32) -> PasswordHash {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = hex::encode(salt);
    let rounds = rounds.max(1);

    PasswordHash {
        hash: format!("{rounds}${}", digest(password, &salt, rounds)),
        salt,
    }
}

pub fn verify_password(password: &str, salt: &str, stored: &str) -> bool {
    let Some((rounds, expected)) = stored.split_once('$') else {
        return false;
    };
    let Ok(rounds) = rounds.parse::<u32>() else {
        return false;
    };
    digest(password, salt, rounds)
        .as_bytes()
        .ct_eq(expected.as_bytes())
        .into()
}

fn digest(password: &str, salt: &str, rounds: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let mut output = hasher.finalize();

    for _ in 1..rounds.max(1) {
        let mut hasher = Sha256::new();
        hasher.update(output);
        hasher.update(salt.as_bytes());
        output = hasher.finalize();
    }

    hex::encode(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_verifies() {
        let hashed = hash_password("hunter2", 10);
        assert!(hashed.hash.starts_with("10$"));
        assert!(verify_password("hunter2", &hashed.salt, &hashed.hash));
        assert!(!verify_password("hunter3", &hashed.salt, &hashed.hash));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let first = hash_password("same", 1);
        let second = hash_password("same", 1);
        assert_ne!(first.salt, second.salt);
        assert_ne!(first.hash, second.hash);
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("pw", "salt", "no-separator"));
        assert!(!verify_password("pw", "salt", "many$abc"));
        assert!(!verify_password("pw", "salt", "1$short"));
    }

    #[test]
    fn digest_prefix_does_not_verify() {
        let hashed = hash_password("pw", 3);
        let (rounds, digest) = hashed.hash.split_once('$').unwrap();
        let truncated = format!("{rounds}${}", &digest[..digest.len() - 1]);
        assert!(!verify_password("pw", &hashed.salt, &truncated));
        let uppercased = format!("{rounds}${}", digest.to_uppercase());
        assert!(!verify_password("pw", &hashed.salt, &uppercased));
    }

    #[test]
    fn zero_rounds_is_treated_as_one() {
        let hashed = hash_password("pw", 0);
        assert!(hashed.hash.starts_with("1$"));
        assert!(verify_password("pw", &hashed.salt, &hashed.hash));
    }
}
