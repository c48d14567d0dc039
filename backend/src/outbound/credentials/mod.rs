//! PBKDF2-HMAC-SHA256 credential hasher.
//!
//! Encoded hashes are self-describing: `pbkdf2-sha256$<iterations>$<salt>$<hash>`
//! with salt and hash hex encoded, so the iteration count can be raised
//! without invalidating stored credentials.
//!
//! Every call is CPU-bound; callers on an async executor should move it onto
//! the blocking pool.

use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::domain::ports::{CredentialHasher, CredentialHasherError};
use crate::domain::{Password, PasswordHash};

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
/// Iteration count for newly hashed secrets.
pub const DEFAULT_ITERATIONS: u32 = 260_000;

/// Hasher producing salted PBKDF2 digests.
#[derive(Debug, Clone, Copy)]
pub struct Pbkdf2CredentialHasher {
    iterations: u32,
}

impl Default for Pbkdf2CredentialHasher {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

impl Pbkdf2CredentialHasher {
    /// Build a hasher using `iterations` rounds for new hashes (minimum 1).
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }
}

fn derive(secret: &[u8], salt: &[u8], iterations: u32) -> Zeroizing<[u8; HASH_LEN]> {
    let mut output = Zeroizing::new([0_u8; HASH_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(secret, salt, iterations, output.as_mut_slice());
    output
}

struct Decoded {
    iterations: u32,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

fn decode(encoded: &str) -> Result<Decoded, CredentialHasherError> {
    let mut parts = encoded.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(CredentialHasherError::malformed_hash(
            "expected four `$`-separated fields",
        ));
    };
    if scheme != SCHEME {
        return Err(CredentialHasherError::malformed_hash(format!(
            "unsupported scheme `{scheme}`"
        )));
    }
    let iterations = iterations
        .parse::<u32>()
        .ok()
        .filter(|count| *count > 0)
        .ok_or_else(|| CredentialHasherError::malformed_hash("invalid iteration count"))?;
    let salt = hex::decode(salt)
        .map_err(|err| CredentialHasherError::malformed_hash(format!("salt: {err}")))?;
    let hash = hex::decode(hash)
        .map_err(|err| CredentialHasherError::malformed_hash(format!("hash: {err}")))?;
    Ok(Decoded {
        iterations,
        salt,
        hash,
    })
}

impl CredentialHasher for Pbkdf2CredentialHasher {
    fn hash(&self, password: &Password) -> Result<PasswordHash, CredentialHasherError> {
        let mut salt = [0_u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let digest = derive(password.expose().as_bytes(), &salt, self.iterations);
        Ok(PasswordHash::new(format!(
            "{SCHEME}${}${}${}",
            self.iterations,
            hex::encode(salt),
            hex::encode(digest.as_slice())
        )))
    }

    fn verify(&self, password: &str, hash: &PasswordHash) -> Result<bool, CredentialHasherError> {
        let decoded = decode(hash.as_ref())?;
        let digest = derive(password.as_bytes(), &decoded.salt, decoded.iterations);
        Ok(digest.as_slice().ct_eq(&decoded.hash).into())
    }

    fn decoy_hash(&self) -> PasswordHash {
        // All-zero digest: verifying against it costs a full derivation and
        // never matches in practice.
        PasswordHash::new(format!(
            "{SCHEME}${}${}${}",
            self.iterations,
            hex::encode([0_u8; SALT_LEN]),
            hex::encode([0_u8; HASH_LEN])
        ))
    }
}
