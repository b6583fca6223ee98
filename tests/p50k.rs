//! Integration tests for the p50k-style encode/decode surface.
//!
//! The real p50k_base vocabulary is ~50k lines, so these tests run against
//! small synthetic rank tables that keep the load-bearing properties: every
//! single byte value has a rank, and merged entries exist only where a test
//! wants a merge.

use base64::{engine::general_purpose::STANDARD, Engine};
use pairtok::{p50k, RankTable, Tokenizer, TokenizerError, P50K_BASE_PATTERN};
use rustc_hash::FxHashMap;

/// Rank table with every single byte (rank = byte value) plus extra merges.
fn byte_complete_table(extra: &[(&str, u32)]) -> RankTable {
    let mut entries: Vec<(Vec<u8>, u32)> = (0u8..=255).map(|b| (vec![b], b as u32)).collect();
    entries.extend(extra.iter().map(|&(s, r)| (s.as_bytes().to_vec(), r)));
    RankTable::from_entries(entries)
}

fn byte_complete_tokenizer(extra: &[(&str, u32)]) -> Tokenizer {
    Tokenizer::new(
        byte_complete_table(extra),
        p50k::special_tokens(),
        P50K_BASE_PATTERN,
    )
    .unwrap()
}

#[test]
fn roundtrip_ascii_and_multibyte() {
    let tokenizer = byte_complete_tokenizer(&[]);
    let cases = [
        "Hello, world!",
        "The quick brown fox jumps over the lazy dog.",
        "1234567890",
        "Special characters: !@#$%^&*()",
        "Multi-line\ntext\nwith\nnewlines",
        "tabs\tand  double  spaces",
        "こんにちは 世界 🦀",
        "mixed ASCII y café",
    ];
    for text in cases {
        let ids = tokenizer.encode(text);
        assert_eq!(tokenizer.decode(&ids), text, "roundtrip failed for {text:?}");
        assert_eq!(tokenizer.decode_strict(&ids).unwrap(), text);
    }
}

#[test]
fn empty_text_yields_no_tokens() {
    let tokenizer = byte_complete_tokenizer(&[]);
    assert!(tokenizer.encode("").is_empty());
    assert_eq!(tokenizer.decode(&[]), "");
}

#[test]
fn merged_entries_shorten_output() {
    let tokenizer = byte_complete_tokenizer(&[("th", 400), ("the", 401), (" the", 402)]);
    assert_eq!(tokenizer.encode("the"), vec![401]);
    assert_eq!(tokenizer.encode("the the"), vec![401, 402]);
    assert_eq!(tokenizer.decode(&[401, 402]), "the the");
}

#[test]
fn allowed_endoftext_is_a_single_id() {
    let tokenizer = byte_complete_tokenizer(&[]);
    assert_eq!(
        tokenizer.encode_with_special("<|endoftext|>", &["<|endoftext|>"]),
        vec![p50k::ENDOFTEXT_ID]
    );
}

#[test]
fn disallowed_endoftext_is_ordinary_text() {
    let tokenizer = byte_complete_tokenizer(&[]);
    let ids = tokenizer.encode("<|endoftext|>");
    assert!(!ids.contains(&p50k::ENDOFTEXT_ID));
    assert_eq!(tokenizer.decode(&ids), "<|endoftext|>");
}

#[test]
fn special_roundtrip_through_decode() {
    let tokenizer = byte_complete_tokenizer(&[]);
    let text = "before<|endoftext|>after";
    let ids = tokenizer.encode_with_special(text, &["<|endoftext|>"]);
    assert!(ids.contains(&p50k::ENDOFTEXT_ID));
    assert_eq!(tokenizer.decode(&ids), text);
}

#[test]
fn disallowed_overlap_does_not_mask_allowed_special() {
    let mut specials = FxHashMap::default();
    specials.insert("<|endoftext|>".to_string(), 50256);
    specials.insert("<|end|>".to_string(), 50300);
    let tokenizer =
        Tokenizer::new(byte_complete_table(&[]), specials, P50K_BASE_PATTERN).unwrap();

    let text = "<|end|><|endoftext|>";
    let ids = tokenizer.encode_with_special(text, &["<|endoftext|>"]);
    // "<|end|>" is not allowed: it must be tokenized as plain text, while the
    // later "<|endoftext|>" still resolves to its reserved id.
    assert!(!ids.contains(&50300));
    assert_eq!(ids.last(), Some(&50256));
    assert_eq!(tokenizer.decode(&ids), text);
}

#[test]
fn full_load_path_from_tiktoken_format() {
    // Build a tiktoken-format vocabulary in memory covering all bytes.
    let mut data = String::new();
    for b in 0u8..=255 {
        data.push_str(&STANDARD.encode([b]));
        data.push(' ');
        data.push_str(&b.to_string());
        data.push('\n');
    }
    data.push_str(&format!("{} 300\n", STANDARD.encode("ab")));

    let tokenizer = p50k::from_bytes(data.as_bytes()).unwrap();
    assert_eq!(tokenizer.rank_of(b"ab"), Some(300));
    assert_eq!(tokenizer.encode("ab"), vec![300]);
    assert_eq!(tokenizer.decode(&[300]), "ab");
    assert_eq!(tokenizer.vocab_size(), 50257);
}

#[test]
fn malformed_vocab_line_is_fatal() {
    let err = p50k::from_bytes(b"YQ== 0\nnot a valid line at all\n");
    assert!(matches!(err, Err(TokenizerError::Vocab(_))));
}

#[test]
fn encode_batch_is_consistent_with_encode() {
    let tokenizer = byte_complete_tokenizer(&[("he", 400), ("llo", 401), ("hello", 402)]);
    let texts: Vec<String> = (0..32)
        .map(|i| format!("hello number {i} hello again"))
        .collect();
    let batch = tokenizer.encode_batch(&texts);
    for (text, ids) in texts.iter().zip(&batch) {
        assert_eq!(ids, &tokenizer.encode(text));
        assert_eq!(&tokenizer.decode(ids), text);
    }
}

#[test]
fn concurrent_encoding_shares_one_cache() {
    use std::sync::Arc;
    use std::thread;

    let tokenizer = Arc::new(byte_complete_tokenizer(&[("ab", 400), ("abc", 401)]));
    let expected = Arc::new(tokenizer.encode("abc abc abc"));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let t = Arc::clone(&tokenizer);
            let expected = Arc::clone(&expected);
            thread::spawn(move || {
                for _ in 0..50 {
                    assert_eq!(t.encode("abc abc abc"), *expected);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
}
