//! Core tokenization engine.
//!
//! A BPE tokenizer compatible with OpenAI's p50k_base vocabulary, organized
//! as small single-purpose components:
//!
//! - [`RankTable`]: byte-sequence → rank mapping and its inverse, loaded from
//!   the tiktoken vocabulary format
//! - [`bpe`]: the rank-ordered pair-merge loop
//! - [`SpecialScanner`]: allow-list-aware interception of reserved literals
//! - [`ChunkCache`]: bounded LRU cache of chunk → ids results
//! - [`Tokenizer`]: the public encode/decode surface, including the
//!   token-budget truncation variants `encode_trim_suffix` and
//!   `encode_trim_prefix`
//!
//! The rank table and special-token maps are immutable after construction;
//! the chunk cache is the only shared mutable state and guards itself.
//!
//! [`RankTable`]: vocab::RankTable
//! [`SpecialScanner`]: special::SpecialScanner
//! [`ChunkCache`]: cache::ChunkCache
//! [`Tokenizer`]: tokenizer::Tokenizer

pub mod bpe;
pub mod cache;
pub mod p50k;
pub mod special;
pub mod tokenizer;
pub mod vocab;

pub use bpe::byte_pair_encode;
pub use cache::{ChunkCache, DEFAULT_CACHE_SIZE};
pub use special::{SpecialMatch, SpecialScanner};
pub use tokenizer::{Tokenizer, TokenizerError, P50K_BASE_PATTERN};
pub use vocab::{RankTable, VocabError};
