use tracing::error;

/// bcrypt reads 72 bytes including the NUL terminator it appends.
pub const MAX_PASSWORD_BYTES: usize = 71;

/// Hash a password with bcrypt at the given cost. Longer inputs than
/// `MAX_PASSWORD_BYTES` are refused instead of silently truncated.
pub fn hash_password(plain: &str, cost: u32) -> anyhow::Result<String> {
    bcrypt::non_truncating_hash(plain, cost).map_err(|e| {
        error!(error = %e, "bcrypt hash error");
        anyhow::anyhow!(e.to_string())
    })
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    // Nothing that long was ever hashed.
    if plain.len() > MAX_PASSWORD_BYTES {
        return Ok(false);
    }
    bcrypt::non_truncating_verify(plain, hash).map_err(|e| {
        error!(error = %e, "bcrypt verify error");
        anyhow::anyhow!(e.to_string())
    })
}

/// Runs the hash on the blocking pool.
pub async fn hash_password_blocking(plain: String, cost: u32) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain, cost)).await?
}

pub async fn verify_password_blocking(plain: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &hash)).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    const COST: u32 = crate::config::MIN_BCRYPT_COST;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password, COST).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password, COST).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
        assert!(!verify_password("", &hash).expect("verify should not error"));
    }

    #[test]
    fn hash_is_salted_and_never_plaintext() {
        let a = hash_password("same-password", COST).unwrap();
        let b = hash_password("same-password", COST).unwrap();
        assert_ne!(a, b);
        assert!(!a.contains("same-password"));
        assert!(a.starts_with("$2"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn overlong_password_is_refused_not_truncated() {
        let long = format!("{}-original-suffix", "a".repeat(MAX_PASSWORD_BYTES));
        assert!(hash_password(&long, COST).is_err());
    }

    #[test]
    fn shared_prefix_does_not_cross_verify() {
        let prefix = "a".repeat(MAX_PASSWORD_BYTES);
        let hash = hash_password(&prefix, COST).unwrap();
        assert!(verify_password(&prefix, &hash).unwrap());

        let longer = format!("{}-totally-different", prefix);
        assert!(!verify_password(&longer, &hash).unwrap());
        assert!(!verify_password(&prefix[..MAX_PASSWORD_BYTES - 1], &hash).unwrap());
    }

    #[tokio::test]
    async fn blocking_variants_agree() {
        let hash = hash_password_blocking("pw-12345678".into(), COST).await.unwrap();
        assert!(verify_password_blocking("pw-12345678".into(), hash.clone()).await.unwrap());
        assert!(!verify_password_blocking("nope".into(), hash).await.unwrap());
    }
}
