//! pairtok - a p50k_base-compatible BPE tokenizer.
//!
//! Converts UTF-8 text to token ids and back against OpenAI's fixed
//! `p50k_base` vocabulary, with special-token interception and two
//! token-budget truncation modes (`encode_trim_suffix`, `encode_trim_prefix`).
//!
//! ```no_run
//! use pairtok::p50k;
//!
//! let tokenizer = p50k::from_file("p50k_base.tiktoken")?;
//! let ids = tokenizer.encode("Hello world");
//! assert_eq!(tokenizer.decode(&ids), "Hello world");
//! # Ok::<(), pairtok::TokenizerError>(())
//! ```

pub mod core;

pub use core::p50k;
pub use core::{
    ChunkCache, RankTable, SpecialScanner, Tokenizer, TokenizerError, VocabError,
    DEFAULT_CACHE_SIZE, P50K_BASE_PATTERN,
};
