//! Password hashing and verification using bcrypt

use crate::core::error::{CuraError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// bcrypt only reads the first 72 bytes of its input
pub const MAX_PASSWORD_BYTES: usize = 72;

/// One-way password hasher with a fixed cost factor
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    cost: u32,
    checks: Arc<AtomicU64>,
}

impl CredentialHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            checks: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Password checks run so far, real and decoy
    pub fn checks_performed(&self) -> u64 {
        self.checks.load(Ordering::Relaxed)
    }

    /// Hash a password; the salt is generated per call
    pub fn hash(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| CuraError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// Verify a password against a stored digest.
    ///
    /// A digest that is not valid bcrypt is an error, not a mismatch.
    pub fn verify(&self, password: &str, digest: &str) -> Result<bool> {
        self.checks.fetch_add(1, Ordering::Relaxed);
        bcrypt::verify(password, digest)
            .map_err(|e| CuraError::Internal(format!("Failed to verify password: {}", e)))
    }

    /// Hash on the blocking pool so the cost factor never stalls the runtime
    pub async fn hash_blocking(&self, password: String) -> Result<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| CuraError::TaskError(format!("Hash task panicked: {}", e)))?
    }

    /// Verify on the blocking pool
    pub async fn verify_blocking(&self, password: String, digest: String) -> Result<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| CuraError::TaskError(format!("Verify task panicked: {}", e)))?
    }

    /// Check a password for an account that has no digest.
    ///
    /// Spends the same bcrypt work as [`verify`](Self::verify) and always
    /// reports a mismatch, so an unknown account costs as much as a wrong password.
    pub fn verify_absent(&self, password: &str) -> Result<bool> {
        self.checks.fetch_add(1, Ordering::Relaxed);
        bcrypt::hash(password, self.cost)
            .map(|_| false)
            .map_err(|e| CuraError::Internal(format!("Failed to verify password: {}", e)))
    }

    /// [`verify_absent`](Self::verify_absent) on the blocking pool
    pub async fn verify_absent_blocking(&self, password: String) -> Result<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify_absent(&password))
            .await
            .map_err(|e| CuraError::TaskError(format!("Verify task panicked: {}", e)))?
    }
}

/// Check a plaintext password is acceptable input for the hasher
pub fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(CuraError::ValidationError("Password cannot be empty".to_string()));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(CuraError::ValidationError(format!(
            "Password must be at most {} bytes",
            MAX_PASSWORD_BYTES
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hasher() -> CredentialHasher {
        CredentialHasher::new(4)
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = hasher();
        let digest = hasher.hash("pw1").unwrap();

        assert_ne!(digest, "pw1");
        assert!(hasher.verify("pw1", &digest).unwrap());
        assert!(!hasher.verify("pw2", &digest).unwrap());
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = hasher();
        let a = hasher.hash("same password").unwrap();
        let b = hasher.hash("same password").unwrap();

        assert_ne!(a, b);
        assert!(hasher.verify("same password", &a).unwrap());
        assert!(hasher.verify("same password", &b).unwrap());
    }

    #[test]
    fn test_malformed_digest_is_an_error() {
        assert!(hasher().verify("pw1", "not-a-bcrypt-hash").is_err());
    }

    #[test]
    fn test_validate_password_bounds() {
        assert!(validate_password("").is_err());
        assert!(validate_password(&"a".repeat(MAX_PASSWORD_BYTES)).is_ok());
        assert!(validate_password(&"a".repeat(MAX_PASSWORD_BYTES + 1)).is_err());
        // Multi-byte characters count by bytes
        assert!(validate_password(&"é".repeat(37)).is_err());
    }

    #[test]
    fn test_verify_absent_always_mismatches() {
        let hasher = hasher();
        assert!(!hasher.verify_absent("pw1").unwrap());
        assert!(!hasher.verify_absent("").unwrap());
    }

    #[test]
    fn test_checks_are_counted() {
        let hasher = hasher();
        let digest = hasher.hash("pw1").unwrap();
        assert_eq!(hasher.checks_performed(), 0);

        hasher.verify("pw1", &digest).unwrap();
        hasher.clone().verify_absent("pw1").unwrap();
        assert_eq!(hasher.checks_performed(), 2);
    }

    #[tokio::test]
    async fn test_blocking_variants() {
        let hasher = hasher();
        let digest = hasher.hash_blocking("pw1".to_string()).await.unwrap();
        assert!(hasher.verify_blocking("pw1".to_string(), digest).await.unwrap());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_verify_matches_only_hashed_password(
            p1 in "[ -~]{1,40}",
            p2 in "[ -~]{1,40}",
        ) {
            let hasher = hasher();
            let digest = hasher.hash(&p1).unwrap();
            prop_assert!(hasher.verify(&p1, &digest).unwrap());
            if p1 != p2 {
                prop_assert!(!hasher.verify(&p2, &digest).unwrap());
            }
        }
    }
}
