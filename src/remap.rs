use crate::fasta::ReferenceSet;
use crate::mgaps::MatchTriple;
use crate::offsets::OffsetTable;
use anyhow::Result;
use log::warn;

/// A match after translation into one reference sequence's local space.
/// `ref_start` is 1-based within that sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalMatch {
    pub ref_start: i64,
    pub query_start: i64,
    pub len: i64,
}

/// Classification of a raw match after coordinate translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remapped {
    /// Fully inside its sequence with a usable length; goes to the assembler
    Valid { ref_idx: usize, m: LocalMatch },
    /// Span crosses a sequence boundary; warned and dropped, scan continues
    Boundary { ref_idx: usize },
    /// Length <= 1; dropped silently, independent of boundary validity
    TooShort,
}

/// Translates global-space matches into per-sequence local coordinates.
pub struct Remapper {
    table: OffsetTable,
}

impl Remapper {
    pub fn new(refs: &ReferenceSet) -> Self {
        Remapper {
            table: OffsetTable::build(refs),
        }
    }

    /// Remap one raw triple. A global start beyond the concatenated span is
    /// fatal and propagates; boundary violations warn and classify as
    /// `Boundary`.
    pub fn remap(&mut self, refs: &ReferenceSet, raw: MatchTriple) -> Result<Remapped> {
        let (ref_idx, local) = self.table.locate(raw.ref_start)?;
        let seq_len = self.table.seq_len(ref_idx);

        // A start on or before the separator slot and an end past the
        // sequence are both boundary crossings; keep both checks
        if local <= 0 || local + raw.len - 1 > seq_len {
            warn!(
                "Match ({}, {}, {}) extends beyond the boundary of reference sequence '{}' \
                 (local start {}, sequence length {}); dropping it and continuing",
                raw.ref_start, raw.query_start, raw.len, refs.id(ref_idx), local, seq_len
            );
            return Ok(Remapped::Boundary { ref_idx });
        }

        if raw.len <= 1 {
            return Ok(Remapped::TooShort);
        }

        Ok(Remapped::Valid {
            ref_idx,
            m: LocalMatch {
                ref_start: local,
                query_start: raw.query_start,
                len: raw.len,
            },
        })
    }
}
