//! Low-level byte-pair encoding merge loop.
//!
//! Works on a flat `(start, rank)` parts vector in the style of the reference
//! tiktoken implementation. Each part marks the start offset of a current
//! symbol within the piece; the rank cached on a part is the merge rank of the
//! pair beginning at that symbol. Merging removes the boundary between the
//! selected pair and refreshes the two affected ranks.
//!
//! Selection uses a strict `<` comparison while scanning left to right, so
//! ties on rank always resolve to the leftmost pair. The rank tables are
//! built assuming exactly this resolution order; changing it changes output
//! token ids on real vocabularies.

use super::vocab::RankTable;

/// Sentinel rank for an unmergeable pair.
const NO_RANK: u32 = u32::MAX;

/// Encode a single pre-tokenized piece into token ids.
///
/// Every byte value must be present in the rank table (the single-byte
/// completeness invariant of the tiktoken vocab format); a piece is therefore
/// always encodable.
pub fn byte_pair_encode(piece: &[u8], ranks: &RankTable) -> Vec<u32> {
    if piece.is_empty() {
        return Vec::new();
    }
    if piece.len() == 1 {
        return vec![ranks
            .rank_of(piece)
            .expect("rank table must contain every single byte")];
    }

    let parts = byte_pair_merge(piece, ranks);

    let mut out = Vec::with_capacity(parts.len() - 1);
    for window in parts.windows(2) {
        let symbol = &piece[window[0].0..window[1].0];
        out.push(
            ranks
                .rank_of(symbol)
                .expect("merged symbol must resolve to a rank"),
        );
    }
    out
}

/// Run the merge loop and return the surviving symbol boundaries.
///
/// The returned vector holds `(start, rank)` pairs plus a trailing sentinel at
/// `piece.len()`; consecutive starts delimit the final symbols.
fn byte_pair_merge(piece: &[u8], ranks: &RankTable) -> Vec<(usize, u32)> {
    // One part per byte plus an end sentinel. The rank stored at index i is
    // the rank of merging the symbol starting at i with its successor.
    let mut parts: Vec<(usize, u32)> = (0..=piece.len()).map(|i| (i, NO_RANK)).collect();

    // Rank of the pair formed by parts[i] and parts[i + skip + 1].
    let get_rank = |parts: &[(usize, u32)], i: usize, skip: usize| -> u32 {
        if i + skip + 2 < parts.len() {
            ranks
                .rank_of(&piece[parts[i].0..parts[i + skip + 2].0])
                .unwrap_or(NO_RANK)
        } else {
            NO_RANK
        }
    };

    for i in 0..parts.len().saturating_sub(2) {
        parts[i].1 = get_rank(&parts, i, 0);
    }

    loop {
        if parts.len() == 2 {
            break;
        }

        // Strict `<` keeps the leftmost pair on rank ties.
        let mut min_rank: (u32, usize) = (NO_RANK, 0);
        for (i, &(_, rank)) in parts[..parts.len() - 1].iter().enumerate() {
            if rank < min_rank.0 {
                min_rank = (rank, i);
            }
        }

        if min_rank.0 == NO_RANK {
            break;
        }

        let i = min_rank.1;
        // Refresh the ranks around the merge point before removing the
        // boundary; `skip = 1` looks across the part about to disappear.
        parts[i].1 = get_rank(&parts, i, 1);
        if i > 0 {
            parts[i - 1].1 = get_rank(&parts, i - 1, 1);
        }
        parts.remove(i + 1);
    }

    parts
}
