use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

#[derive(Debug, thiserror::Error)]
#[error("failed to hash password: {0}")]
pub struct CredentialError(argon2::password_hash::Error);

/// Hashes and verifies user passwords with argon2.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialManager;

impl CredentialManager {
	pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
		let salt = SaltString::generate(&mut OsRng);

		let hash = Argon2::default()
			.hash_password(password.as_bytes(), &salt)
			.map_err(CredentialError)?;

		Ok(hash.to_string())
	}

	/// A malformed digest never matches.
	pub fn verify(&self, digest: &str, password: &str) -> bool {
		let hash = match PasswordHash::new(digest) {
			Ok(hash) => hash,
			Err(err) => {
				tracing::warn!("failed to parse password hash: {}", err);
				return false;
			}
		};

		Argon2::default().verify_password(password.as_bytes(), &hash).is_ok()
	}
}
