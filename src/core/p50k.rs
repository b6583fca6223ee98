//! p50k_base defaults: pattern, special tokens, and convenience constructors.
//!
//! `p50k_base` is the vocabulary used by the GPT-3 code models
//! (`text-davinci-002`, `code-davinci-002`, and friends). It has 50,281 BPE
//! ranks and a single reserved special token. The vocabulary file itself is
//! ~50k lines and is loaded from disk or caller-supplied bytes rather than
//! embedded.

use rustc_hash::FxHashMap;

use super::tokenizer::{Tokenizer, TokenizerError, P50K_BASE_PATTERN};

/// End-of-text marker literal.
pub const ENDOFTEXT: &str = "<|endoftext|>";

/// Reserved id for [`ENDOFTEXT`], outside the p50k rank range.
pub const ENDOFTEXT_ID: u32 = 50256;

/// The p50k_base special-token map: `{"<|endoftext|>": 50256}`.
pub fn special_tokens() -> FxHashMap<String, u32> {
    let mut map = FxHashMap::default();
    map.insert(ENDOFTEXT.to_string(), ENDOFTEXT_ID);
    map
}

/// Build a p50k_base tokenizer from a `p50k_base.tiktoken` file on disk.
pub fn from_file(vocab_path: &str) -> Result<Tokenizer, TokenizerError> {
    Tokenizer::from_file(vocab_path, P50K_BASE_PATTERN, special_tokens())
}

/// Build a p50k_base tokenizer from raw vocabulary bytes.
pub fn from_bytes(vocab_data: &[u8]) -> Result<Tokenizer, TokenizerError> {
    Tokenizer::from_bytes(vocab_data, P50K_BASE_PATTERN, special_tokens())
}
