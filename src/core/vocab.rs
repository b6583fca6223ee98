//! Rank table loading for the tiktoken BPE vocabulary format.
//!
//! Each line of a vocabulary file is `<base64 token><space><decimal rank>`:
//!
//! ```text
//! SGVsbG8= 0
//! V29ybGQ= 1
//! IQ== 2
//! ```
//!
//! The rank doubles as the token id: lower ranks merge first during BPE, and
//! the final symbols are emitted under their rank. A well-formed vocabulary
//! contains an entry for every single byte value, so any input byte sequence
//! is ultimately encodable.

use base64::{engine::general_purpose::STANDARD, Engine};
use rustc_hash::FxHashMap;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a vocabulary file.
#[derive(Error, Debug)]
pub enum VocabError {
    #[error("invalid base64 token: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid line format: {0}")]
    Format(String),
    #[error("failed to read vocabulary file: {0}")]
    Io(#[from] std::io::Error),
}

/// Immutable byte-sequence → rank mapping plus its inverse.
///
/// Built once at startup and shared read-only afterwards; no interior
/// mutability, so concurrent lookups need no synchronization.
pub struct RankTable {
    encoder: FxHashMap<Vec<u8>, u32>,
    decoder: FxHashMap<u32, Vec<u8>>,
}

impl RankTable {
    /// Load a rank table from raw vocabulary bytes.
    ///
    /// Blank lines are skipped. Any other line that does not parse as
    /// `<base64> <rank>` is a [`VocabError::Format`].
    pub fn from_bytes(data: &[u8]) -> Result<Self, VocabError> {
        let mut encoder = FxHashMap::default();

        for line in data.split(|&b| b == b'\n') {
            // Tolerate CRLF files.
            let line = match line.last() {
                Some(b'\r') => &line[..line.len() - 1],
                _ => line,
            };
            if line.iter().all(|b| b.is_ascii_whitespace()) {
                continue;
            }

            let mut fields = line.split(|&b| b == b' ');
            let (token_b64, rank_str) = match (fields.next(), fields.next(), fields.next()) {
                (Some(t), Some(r), None) => (t, r),
                _ => {
                    return Err(VocabError::Format(format!(
                        "expected `<base64> <rank>`, got {:?}",
                        String::from_utf8_lossy(line)
                    )))
                }
            };

            let token = STANDARD.decode(token_b64)?;
            let rank: u32 = std::str::from_utf8(rank_str)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| {
                    VocabError::Format(format!(
                        "invalid rank {:?}",
                        String::from_utf8_lossy(rank_str)
                    ))
                })?;

            // Last entry wins on duplicate byte sequences.
            encoder.insert(token, rank);
        }

        Ok(Self::from_encoder(encoder))
    }

    /// Load a rank table from a vocabulary file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, VocabError> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Build a rank table directly from `(bytes, rank)` entries.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Vec<u8>, u32)>,
    {
        Self::from_encoder(entries.into_iter().collect())
    }

    fn from_encoder(encoder: FxHashMap<Vec<u8>, u32>) -> Self {
        let decoder = encoder.iter().map(|(k, v)| (*v, k.clone())).collect();
        Self { encoder, decoder }
    }

    /// Rank (token id) of a byte sequence, if it is in the vocabulary.
    #[inline]
    pub fn rank_of(&self, bytes: &[u8]) -> Option<u32> {
        self.encoder.get(bytes).copied()
    }

    /// Byte sequence of a token id, if it is in the vocabulary.
    #[inline]
    pub fn bytes_of(&self, id: u32) -> Option<&[u8]> {
        self.decoder.get(&id).map(|v| v.as_slice())
    }

    /// Number of vocabulary entries.
    pub fn len(&self) -> usize {
        self.encoder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoder.is_empty()
    }

    /// Highest rank present, if any.
    pub fn max_rank(&self) -> Option<u32> {
        self.decoder.keys().max().copied()
    }
}
