//! Durable cache store: one directory per voice, one file per key.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::key::CacheKey;
use crate::error::TtsError;

/// Container format of every cached clip.
pub const AUDIO_EXTENSION: &str = "mp3";

/// Hex digits of the raw-id digest appended to rewritten voice folders.
const VOICE_DIGEST_LEN: usize = 16;

#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding every entry of one voice.
    pub fn voice_dir(&self, voice: &str) -> PathBuf {
        self.root.join(sanitize_voice(voice))
    }

    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.voice_dir(key.voice())
            .join(format!("{}.{AUDIO_EXTENSION}", key.as_str()))
    }

    /// Anything at the entry path counts; a non-file there surfaces as a
    /// read error rather than a silent miss.
    pub fn exists(&self, key: &CacheKey) -> bool {
        self.entry_path(key).exists()
    }

    pub fn read(&self, key: &CacheKey) -> Result<Vec<u8>, TtsError> {
        let path = self.entry_path(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(TtsError::NotFound(key.to_string()))
            }
            Err(e) => Err(TtsError::io(path, e)),
        }
    }

    /// Create or overwrite an entry.
    ///
    /// Bytes land in a process-unique temp file first and are renamed into
    /// place, so readers in other processes see either nothing or the
    /// whole clip.
    pub fn write(&self, key: &CacheKey, bytes: &[u8]) -> Result<(), TtsError> {
        let dir = self.voice_dir(key.voice());
        fs::create_dir_all(&dir).map_err(|e| TtsError::io(&dir, e))?;

        let path = self.entry_path(key);
        let tmp = dir.join(format!(".{}.{}.tmp", key.as_str(), std::process::id()));

        if let Err(e) = fs::write(&tmp, bytes) {
            let _ = fs::remove_file(&tmp);
            return Err(TtsError::io(tmp, e));
        }
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(TtsError::io(path, e));
        }

        debug!("Cached {} bytes at {}", bytes.len(), path.display());
        Ok(())
    }

    /// Entry size in bytes, if present.
    pub fn size(&self, key: &CacheKey) -> Option<u64> {
        fs::metadata(self.entry_path(key)).ok().map(|m| m.len())
    }

    /// Key digests currently stored for a voice, sorted.
    pub fn entries(&self, voice: &str) -> Result<Vec<String>, TtsError> {
        let dir = self.voice_dir(voice);
        let read_dir = match fs::read_dir(&dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(TtsError::io(dir, e)),
        };

        let mut keys: Vec<String> = read_dir
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let path = e.path();
                if path.extension().and_then(|x| x.to_str()) != Some(AUDIO_EXTENSION) {
                    return None;
                }
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .filter(|s| !s.starts_with('.'))
                    .map(str::to_string)
            })
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Remove a voice's namespace. Returns the number of entries deleted.
    pub fn clear_voice(&self, voice: &str) -> Result<usize, TtsError> {
        let count = self.entries(voice)?.len();
        let dir = self.voice_dir(voice);
        match fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(TtsError::io(dir, e)),
        }
        info!("Cleared {count} cached clips for voice {voice}");
        Ok(count)
    }
}

/// Map a voice id to a single safe path component.
///
/// Ids made only of `[A-Za-z0-9_-]` are used as-is. Anything else is
/// cleaned and suffixed with `.` plus a digest of the raw id; `.` never
/// appears in a plain id, so two distinct voices never share a folder.
fn sanitize_voice(voice: &str) -> String {
    let is_safe = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
    if !voice.is_empty() && voice.chars().all(is_safe) {
        return voice.to_string();
    }

    let cleaned: String = voice
        .chars()
        .map(|c| if is_safe(c) { c } else { '_' })
        .collect();
    let digest = format!("{:x}", Sha256::digest(voice.as_bytes()));
    let prefix = if cleaned.is_empty() { "_" } else { cleaned.as_str() };
    format!("{prefix}.{}", &digest[..VOICE_DIGEST_LEN])
}
