//! Main tokenizer: pre-tokenization, special-token interception, caching,
//! BPE merging, decoding, and token-budget truncation.

use fancy_regex::Regex;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use thiserror::Error;

use super::bpe::byte_pair_encode;
use super::cache::{ChunkCache, DEFAULT_CACHE_SIZE};
use super::special::SpecialScanner;
use super::vocab::{RankTable, VocabError};

#[derive(Error, Debug)]
pub enum TokenizerError {
    #[error("regex compilation error: {0}")]
    Regex(#[from] fancy_regex::Error),
    #[error("vocabulary error: {0}")]
    Vocab(#[from] VocabError),
    #[error("special token matcher build error: {0}")]
    AhoCorasick(#[from] aho_corasick::BuildError),
    #[error("decoded bytes are not valid UTF-8")]
    Utf8,
    #[error("unknown token id: {0}")]
    UnknownTokenId(u32),
}

/// Pre-tokenizer pattern for p50k_base (GPT-3 codex family).
///
/// Identical to the reference tiktoken/GPT-2 pattern. Splits, in priority
/// order: English contraction suffixes, letter runs, digit runs, symbol runs
/// (each with an optional leading space), whitespace not followed by a
/// non-whitespace character, and any remaining whitespace. Chunk boundaries
/// feed straight into BPE, so the pattern must be reproduced exactly for
/// vocabulary compatibility. The `(?!\S)` lookahead is why the regex backend
/// is `fancy-regex` rather than `regex`.
pub const P50K_BASE_PATTERN: &str =
    r"'s|'t|'re|'ve|'m|'ll|'d| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+(?!\S)|\s+";

/// BPE tokenizer over a fixed rank table.
///
/// Encoding walks the text in three layers: allowed special tokens are
/// intercepted whole, the literal spans between them are split by the
/// pre-tokenizer regex, and each chunk is resolved to ids through the LRU
/// cache or the merge loop. All state except the cache is immutable after
/// construction, so a `Tokenizer` is safe to share across threads; the cache
/// serializes its own mutation.
pub struct Tokenizer {
    ranks: RankTable,
    special_tokens: FxHashMap<String, u32>,
    special_tokens_decoder: FxHashMap<u32, String>,
    scanner: SpecialScanner,
    regex: Regex,
    cache: ChunkCache,
}

impl Tokenizer {
    /// Create a tokenizer from a rank table, special-token map, and
    /// pre-tokenizer pattern, with the default cache capacity.
    pub fn new(
        ranks: RankTable,
        special_tokens: FxHashMap<String, u32>,
        pattern: &str,
    ) -> Result<Self, TokenizerError> {
        Self::with_cache_size(ranks, special_tokens, pattern, DEFAULT_CACHE_SIZE)
    }

    /// Create a tokenizer with an explicit chunk-cache capacity.
    pub fn with_cache_size(
        ranks: RankTable,
        special_tokens: FxHashMap<String, u32>,
        pattern: &str,
        cache_size: usize,
    ) -> Result<Self, TokenizerError> {
        let special_tokens_decoder = special_tokens
            .iter()
            .map(|(k, v)| (*v, k.clone()))
            .collect();
        let scanner = SpecialScanner::new(special_tokens.keys().cloned().collect())?;
        let regex = Regex::new(pattern)?;

        Ok(Self {
            ranks,
            special_tokens,
            special_tokens_decoder,
            scanner,
            regex,
            cache: ChunkCache::new(cache_size),
        })
    }

    /// Create a tokenizer from a tiktoken vocabulary file.
    pub fn from_file(
        vocab_path: &str,
        pattern: &str,
        special_tokens: FxHashMap<String, u32>,
    ) -> Result<Self, TokenizerError> {
        let ranks = RankTable::from_file(vocab_path)?;
        Self::new(ranks, special_tokens, pattern)
    }

    /// Create a tokenizer from raw vocabulary bytes.
    pub fn from_bytes(
        vocab_data: &[u8],
        pattern: &str,
        special_tokens: FxHashMap<String, u32>,
    ) -> Result<Self, TokenizerError> {
        let ranks = RankTable::from_bytes(vocab_data)?;
        Self::new(ranks, special_tokens, pattern)
    }

    /// Pre-tokenize a literal span into chunks.
    ///
    /// The pattern covers every character class, so the chunks concatenate
    /// back to the input span. A regex engine error (backtrack-limit
    /// exhaustion on pathological input) must not drop text: scanning stops
    /// and the unscanned tail becomes one final chunk, which BPE can always
    /// encode byte by byte.
    fn split_chunks<'t>(&self, span: &'t str) -> Vec<&'t str> {
        let mut chunks = Vec::new();
        let mut last_end = 0;
        for m in self.regex.find_iter(span) {
            match m {
                Ok(m) => {
                    chunks.push(m.as_str());
                    last_end = m.end();
                }
                Err(_) => break,
            }
        }
        if last_end < span.len() {
            chunks.push(&span[last_end..]);
        }
        chunks
    }

    /// Encode one chunk: cache hit, whole-chunk vocabulary hit, or BPE merge.
    ///
    /// Only merge results are cached; single-token chunks are already a plain
    /// map lookup.
    fn encode_chunk(&self, chunk: &str) -> Vec<u32> {
        let bytes = chunk.as_bytes();
        if let Some(ids) = self.cache.lookup(bytes) {
            return ids;
        }
        if let Some(rank) = self.ranks.rank_of(bytes) {
            return vec![rank];
        }
        let ids = byte_pair_encode(bytes, &self.ranks);
        self.cache.insert(bytes.to_vec(), ids.clone());
        ids
    }

    /// Encode a literal span (no special tokens inside) into `out`.
    fn encode_span(&self, span: &str, out: &mut Vec<u32>) {
        for chunk in self.split_chunks(span) {
            out.extend(self.encode_chunk(chunk));
        }
    }

    /// Encode text to token ids with an empty special-token allow-list.
    ///
    /// Special-token literals occurring in the text are tokenized as ordinary
    /// text, never as their reserved ids.
    pub fn encode(&self, text: &str) -> Vec<u32> {
        self.encode_with_special(text, &[])
    }

    /// Encode text, emitting reserved ids for allow-listed special tokens.
    ///
    /// Literal spans between allowed specials go through the pre-tokenizer
    /// and BPE; each allowed special contributes exactly one id.
    pub fn encode_with_special(&self, text: &str, allowed_special: &[&str]) -> Vec<u32> {
        let mut ids = Vec::new();
        let mut start = 0;
        loop {
            let (special, end) = self.scanner.find_next(text, allowed_special, start);
            if end > start {
                self.encode_span(&text[start..end], &mut ids);
            }
            let Some(m) = special else { break };
            let Some(&id) = self.special_tokens.get(m.literal) else {
                break;
            };
            ids.push(id);
            start = m.end;
            if start >= text.len() {
                break;
            }
        }
        ids
    }

    /// Encode at most `max_tokens` tokens from the front of `text`.
    ///
    /// Chunks are all-or-nothing: the first chunk (or special token) that
    /// would push the count past the budget is discarded whole and encoding
    /// stops. Returns the ids and the exact prefix of `text` they encode.
    pub fn encode_trim_suffix(
        &self,
        text: &str,
        allowed_special: &[&str],
        max_tokens: usize,
    ) -> (Vec<u32>, String) {
        let mut ids = Vec::new();
        let mut token_count = 0usize;
        let mut consumed = 0usize;
        let mut start = 0usize;
        'outer: loop {
            let (special, end) = self.scanner.find_next(text, allowed_special, start);
            if end > start {
                for chunk in self.split_chunks(&text[start..end]) {
                    let toks = self.encode_chunk(chunk);
                    if token_count + toks.len() > max_tokens {
                        break 'outer;
                    }
                    token_count += toks.len();
                    consumed += chunk.len();
                    ids.extend_from_slice(&toks);
                    if token_count >= max_tokens {
                        break 'outer;
                    }
                }
            }
            let Some(m) = special else { break };
            let Some(&id) = self.special_tokens.get(m.literal) else {
                break;
            };
            if token_count + 1 > max_tokens {
                break;
            }
            ids.push(id);
            token_count += 1;
            consumed += m.literal.len();
            start = m.end;
            if token_count >= max_tokens || start >= text.len() {
                break;
            }
        }
        (ids, text[..consumed].to_string())
    }

    /// Encode the longest suffix of `text` fitting in `max_tokens` tokens.
    ///
    /// The whole text is encoded while recording a ledger of cumulative token
    /// count → cumulative consumed byte length at every chunk boundary. If
    /// the total fits the budget, everything is returned unchanged; otherwise
    /// the cut point is the smallest recorded count covering the deficit, so
    /// the result never exceeds the budget and is cut on a chunk boundary.
    pub fn encode_trim_prefix(
        &self,
        text: &str,
        allowed_special: &[&str],
        max_tokens: usize,
    ) -> (Vec<u32>, String) {
        let mut ids = Vec::new();
        let mut token_count = 0usize;
        let mut consumed = 0usize;
        let mut ledger = BTreeMap::new();
        ledger.insert(0usize, 0usize);

        let mut start = 0usize;
        loop {
            let (special, end) = self.scanner.find_next(text, allowed_special, start);
            if end > start {
                for chunk in self.split_chunks(&text[start..end]) {
                    let toks = self.encode_chunk(chunk);
                    token_count += toks.len();
                    consumed += chunk.len();
                    ids.extend_from_slice(&toks);
                    ledger.insert(token_count, consumed);
                }
            }
            let Some(m) = special else { break };
            let Some(&id) = self.special_tokens.get(m.literal) else {
                break;
            };
            ids.push(id);
            token_count += 1;
            consumed += m.literal.len();
            ledger.insert(token_count, consumed);
            start = m.end;
            if start >= text.len() {
                break;
            }
        }

        if token_count <= max_tokens {
            return (ids, text.to_string());
        }

        let deficit = token_count - max_tokens;
        let (&skip_tokens, &cut) = ledger
            .range(deficit..)
            .next()
            .expect("ledger always contains the total token count");
        (ids[skip_tokens..].to_vec(), text[cut..].to_string())
    }

    /// Decode token ids to raw bytes.
    ///
    /// Ids resolve through the rank table first, then the special-token
    /// table. Unknown ids contribute no bytes.
    pub fn decode_bytes(&self, ids: &[u32]) -> Vec<u8> {
        let mut out = Vec::with_capacity(ids.len() * 2);
        for &id in ids {
            if let Some(bytes) = self.ranks.bytes_of(id) {
                out.extend_from_slice(bytes);
            } else if let Some(special) = self.special_tokens_decoder.get(&id) {
                out.extend_from_slice(special.as_bytes());
            }
        }
        out
    }

    /// Decode token ids to text.
    ///
    /// Unknown ids are silently skipped and invalid UTF-8 is replaced with
    /// U+FFFD, matching the reference implementation. Use [`decode_strict`]
    /// to surface either condition as an error instead.
    ///
    /// [`decode_strict`]: Self::decode_strict
    pub fn decode(&self, ids: &[u32]) -> String {
        String::from_utf8_lossy(&self.decode_bytes(ids)).into_owned()
    }

    /// Decode token ids to text, failing on unknown ids or invalid UTF-8.
    pub fn decode_strict(&self, ids: &[u32]) -> Result<String, TokenizerError> {
        let mut out = Vec::with_capacity(ids.len() * 2);
        for &id in ids {
            if let Some(bytes) = self.ranks.bytes_of(id) {
                out.extend_from_slice(bytes);
            } else if let Some(special) = self.special_tokens_decoder.get(&id) {
                out.extend_from_slice(special.as_bytes());
            } else {
                return Err(TokenizerError::UnknownTokenId(id));
            }
        }
        String::from_utf8(out).map_err(|_| TokenizerError::Utf8)
    }

    /// Encode multiple texts in parallel (empty allow-list).
    pub fn encode_batch(&self, texts: &[String]) -> Vec<Vec<u32>> {
        texts.par_iter().map(|text| self.encode(text)).collect()
    }

    /// Encode multiple texts in parallel with a shared allow-list.
    pub fn encode_batch_with_special(
        &self,
        texts: &[String],
        allowed_special: &[&str],
    ) -> Vec<Vec<u32>> {
        texts
            .par_iter()
            .map(|text| self.encode_with_special(text, allowed_special))
            .collect()
    }

    /// Decode multiple token lists in parallel.
    pub fn decode_batch(&self, token_lists: &[Vec<u32>]) -> Vec<String> {
        token_lists
            .par_iter()
            .map(|ids| self.decode(ids))
            .collect()
    }

    /// Rank (token id) of a byte sequence in the vocabulary.
    pub fn rank_of(&self, bytes: &[u8]) -> Option<u32> {
        self.ranks.rank_of(bytes)
    }

    /// Byte sequence of a vocabulary token id.
    pub fn bytes_of(&self, id: u32) -> Option<&[u8]> {
        self.ranks.bytes_of(id)
    }

    /// The special-token map.
    pub fn special_tokens(&self) -> &FxHashMap<String, u32> {
        &self.special_tokens
    }

    /// Total vocabulary size: highest id (rank or special) plus one.
    pub fn vocab_size(&self) -> usize {
        let max_rank = self.ranks.max_rank().unwrap_or(0);
        let max_special = self.special_tokens.values().max().copied().unwrap_or(0);
        (max_rank.max(max_special) + 1) as usize
    }

    /// Number of chunks currently cached.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drop all cached chunk results.
    pub fn clear_cache(&self) {
        self.cache.clear()
    }
}
