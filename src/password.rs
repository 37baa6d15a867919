//! Password hashing with bcrypt.

/// Cost used by the server unless configured otherwise.
pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

/// bcrypt only looks at the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, thiserror::Error)]
#[error("Password hashing failed: {0}")]
pub struct PasswordError(#[from] bcrypt::BcryptError);

/// Hash a password using bcrypt.
pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Verify a password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    Ok(bcrypt::verify(password, hash)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter2", 4 /* bcrypt minimum cost; bcrypt::MIN_COST is private */).unwrap();

        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[test]
    fn test_same_password_hashes_differ() {
        let first = hash_password("pw", 4 /* bcrypt minimum cost; bcrypt::MIN_COST is private */).unwrap();
        let second = hash_password("pw", 4 /* bcrypt minimum cost; bcrypt::MIN_COST is private */).unwrap();

        assert_ne!(first, second, "bcrypt salts every hash");
    }

    #[test]
    fn test_verify_against_garbage_hash_errors() {
        assert!(verify_password("pw", "not-a-bcrypt-hash").is_err());
    }
}
