//! Password digests.
//!
//! New records are stored as Argon2id PHC strings with a per-account random
//! salt. Rows written by the earlier SQLite app hold a bare SHA-256 hex
//! digest; those still verify but are never produced.

use std::fmt;

use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::AccountError;

const LEGACY_DIGEST_LEN: usize = 64;

/// Produces and checks password digests.
///
/// An optional server-side secret is mixed into every Argon2 digest; a hash
/// produced with one secret does not verify under another.
#[derive(Clone, Default)]
pub struct PasswordHasher {
    secret: Option<Vec<u8>>,
    params: Params,
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("params", &self.params)
            .finish()
    }
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: Some(secret.into()),
            ..Self::default()
        }
    }

    /// Argon2 cost for new digests: memory in KiB, iterations, lanes.
    /// Existing digests keep verifying under the cost recorded in them.
    pub fn with_cost(
        mut self,
        m_cost: u32,
        t_cost: u32,
        p_cost: u32,
    ) -> Result<Self, AccountError> {
        self.params =
            Params::new(m_cost, t_cost, p_cost, None).map_err(AccountError::hashing)?;
        Ok(self)
    }

    fn argon2(&self) -> Result<Argon2<'_>, AccountError> {
        match &self.secret {
            Some(secret) => Argon2::new_with_secret(
                secret,
                Algorithm::Argon2id,
                Version::V0x13,
                self.params.clone(),
            )
            .map_err(AccountError::hashing),
            None => Ok(Argon2::new(
                Algorithm::Argon2id,
                Version::V0x13,
                self.params.clone(),
            )),
        }
    }

    /// Hash `password` under a freshly generated salt.
    pub fn hash(&self, password: &str) -> Result<String, AccountError> {
        let salt = SaltString::generate(&mut OsRng);
        self.digest_with(password, &salt)
    }

    /// Deterministic digest of `password` under the given base64 salt.
    ///
    /// The same password and salt always produce the same PHC string.
    pub fn digest(&self, password: &str, salt: &str) -> Result<String, AccountError> {
        let salt = SaltString::from_b64(salt).map_err(AccountError::hashing)?;
        self.digest_with(password, &salt)
    }

    fn digest_with(&self, password: &str, salt: &SaltString) -> Result<String, AccountError> {
        let hash = self
            .argon2()?
            .hash_password(password.as_bytes(), salt)
            .map_err(AccountError::hashing)?;
        Ok(hash.to_string())
    }

    /// Check `password` against a stored digest in constant time.
    ///
    /// Unparseable stored values never match.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        if is_legacy_digest(stored) {
            let expected = stored.to_ascii_lowercase();
            return constant_time_eq(legacy_digest(password).as_bytes(), expected.as_bytes());
        }

        let parsed = match PasswordHash::new(stored) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(%error, "stored password hash is malformed");
                return false;
            }
        };

        match self.argon2() {
            Ok(argon2) => argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(error) => {
                warn!(%error, "password verifier could not be built");
                false
            }
        }
    }
}

fn legacy_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn is_legacy_digest(stored: &str) -> bool {
    stored.len() == LEGACY_DIGEST_LEN && stored.bytes().all(|b| b.is_ascii_hexdigit())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}
