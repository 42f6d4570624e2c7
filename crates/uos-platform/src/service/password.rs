//! Password Service
//!
//! bcrypt hashing for temporary credentials. The digest embeds its own salt,
//! so hashing the same password twice yields different strings; `verify` is
//! shared with the login flow.

use crate::error::Result;

/// Fixed work factor for all persisted digests.
pub const DEFAULT_COST: u32 = 10;

pub struct PasswordService {
    cost: u32,
}

impl Default for PasswordService {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl PasswordService {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, password: &str) -> Result<String> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        Ok(bcrypt::verify(password, hash)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum bcrypt cost keeps the suite fast; the work factor does not
    // change verify semantics.
    fn service() -> PasswordService {
        PasswordService::new(4)
    }

    #[test]
    fn test_hash_verifies() {
        let service = service();
        let hash = service.hash("Jane42").unwrap();
        assert!(service.verify("Jane42", &hash).unwrap());
        assert!(!service.verify("Jane43", &hash).unwrap());
    }

    #[test]
    fn test_salt_embedded_in_digest() {
        let service = service();
        let first = service.hash("Jane42").unwrap();
        let second = service.hash("Jane42").unwrap();
        assert_ne!(first, second);
        assert!(service.verify("Jane42", &first).unwrap());
        assert!(service.verify("Jane42", &second).unwrap());
    }

    #[test]
    fn test_hash_is_not_plaintext() {
        let service = service();
        let hash = service.hash("Jane42").unwrap();
        assert!(!hash.contains("Jane42"));
        assert!(hash.starts_with("$2"));
    }
}
