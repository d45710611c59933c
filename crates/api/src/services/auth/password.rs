//! Password policy and Argon2id hashing.

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::AuthError;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Symbols accepted in passwords besides ASCII letters and digits.
const ALLOWED_SYMBOLS: &str = "@$!%*?&";

/// Hash checked when the email is unknown, so login takes the same time
/// whether or not the account exists.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("Dummy-Password-1").ok());

/// Check a password against the policy.
///
/// At least 8 characters with a lower-case letter, an upper-case letter and a
/// digit; only ASCII letters, digits and `@$!%*?&` are accepted.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` describing the first unmet rule.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if let Some(c) = password
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || ALLOWED_SYMBOLS.contains(*c)))
    {
        return Err(AuthError::WeakPassword(format!(
            "password contains unsupported character {c:?}; use letters, digits or {ALLOWED_SYMBOLS}"
        )));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AuthError::WeakPassword(
            "password must contain a lowercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AuthError::WeakPassword(
            "password must contain an uppercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::WeakPassword(
            "password must contain a digit".to_string(),
        ));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch or an unparsable hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Burn the same work as a real verification, then fail.
pub fn reject_unknown_account(password: &str) -> AuthError {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    AuthError::InvalidCredentials
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_accepts_strong_passwords() {
        assert!(validate_password("Password1").is_ok());
        assert!(validate_password("S3cure!Pass").is_ok());
    }

    #[test]
    fn test_policy_rejects_weak_passwords() {
        for weak in ["Pa1", "password1", "PASSWORD1", "Password", "Pass word1", "Pässword1"] {
            assert!(
                matches!(validate_password(weak), Err(AuthError::WeakPassword(_))),
                "{weak} should be rejected"
            );
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Password1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Password1", &hash).is_ok());
        assert!(matches!(
            verify_password("Password2", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("Password1", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_unknown_account_is_invalid_credentials() {
        assert!(matches!(
            reject_unknown_account("whatever"),
            AuthError::InvalidCredentials
        ));
    }
}
