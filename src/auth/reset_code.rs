//! Password reset code generation and digests

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};

const CODE_LEN: usize = 32;

pub struct ResetCode;

impl ResetCode {
    /// Generate a new single-purpose reset code (32 alphanumeric chars)
    pub fn generate() -> String {
        thread_rng()
            .sample_iter(&Alphanumeric)
            .take(CODE_LEN)
            .map(char::from)
            .collect()
    }

    /// SHA-256 digest used for storage and lookup
    pub fn hash(code: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(code.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
