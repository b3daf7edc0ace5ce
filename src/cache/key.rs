//! Cache key derivation: (voice, exact text) → SHA-256 digest.

use std::fmt;

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 length.
pub const KEY_LEN: usize = 64;

/// Address of one cached clip.
///
/// The digest covers both the voice and the text, so the same phrase
/// under two voices never shares a key. The voice is carried alongside
/// so the store can place the entry in that voice's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    voice: String,
    digest: String,
}

impl CacheKey {
    pub fn voice(&self) -> &str {
        &self.voice
    }

    pub fn as_str(&self) -> &str {
        &self.digest
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.digest)
    }
}

pub fn derive_key(voice: &str, text: &str) -> CacheKey {
    let mut hasher = Sha256::new();
    // Length prefix keeps ("ab", "c") and ("a", "bc") apart.
    hasher.update((voice.len() as u64).to_le_bytes());
    hasher.update(voice.as_bytes());
    hasher.update(text.as_bytes());

    CacheKey {
        voice: voice.to_string(),
        digest: format!("{:x}", hasher.finalize()),
    }
}
