use std::fmt;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use tracing::{error, instrument, trace};

use crate::error::Result;

/// Argon2id hashing and verification of account passwords.
///
/// Hashing is CPU bound, so the async methods move the work onto tokio's
/// blocking pool.
#[derive(Clone)]
pub struct PasswordService {
    argon: Argon2<'static>,
}

impl PasswordService {
    pub fn new(argon: Argon2<'static>) -> Self {
        Self { argon }
    }

    /// Argon2id v19 with explicit cost parameters.
    pub fn with_params(params: Params) -> Self {
        Self::new(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Produces a PHC string with a fresh random salt.
    pub fn hash_blocking(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(Into::into)
    }

    /// Checks `password` against a stored PHC string.
    ///
    /// The cost parameters and version are read from the stored string.
    /// A string that does not parse is treated as a mismatch.
    pub fn verify_blocking(&self, password: &str, hashed: &str) -> bool {
        let hashed = match PasswordHash::new(hashed) {
            Ok(hashed) => hashed,
            Err(_) => return false,
        };

        self.argon
            .verify_password(password.as_bytes(), &hashed)
            .is_ok()
    }

    #[instrument(skip_all)]
    pub async fn hash(&self, password: &str) -> Result<String> {
        let hasher = self.clone();
        let password = password.to_owned();

        trace!("Hashing password on blocking pool");
        tokio::task::spawn_blocking(move || hasher.hash_blocking(&password)).await?
    }

    #[instrument(skip_all)]
    pub async fn verify(&self, password: &str, hashed: &str) -> bool {
        let verifier = self.clone();
        let password = password.to_owned();
        let hashed = hashed.to_owned();

        match tokio::task::spawn_blocking(move || verifier.verify_blocking(&password, &hashed)).await
        {
            Ok(matched) => matched,
            Err(e) => {
                error!("Password verification task failed: {}", e);
                false
            }
        }
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new(Argon2::default())
    }
}

impl fmt::Debug for PasswordService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordService").finish_non_exhaustive()
    }
}
