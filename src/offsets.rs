use crate::fasta::ReferenceSet;
use anyhow::{bail, Result};

/// Cumulative offset table over the concatenated reference space.
///
/// Sequence `i` starts at global coordinate `offset(i) = sum of (len(k)+1)
/// for k < i`; the `+1` accounts for the separator position between
/// concatenated sequences. Offsets are strictly increasing. Built once; the
/// reference collection never changes after load.
#[derive(Debug)]
pub struct OffsetTable {
    offsets: Vec<i64>,
    lens: Vec<i64>,
    /// Total concatenated span, i.e. offset(n-1) + len(n-1) + 1
    span: i64,
    /// Forward-advancing lookup cursor; amortized O(1) when global
    /// coordinates arrive in non-decreasing order
    cursor: usize,
}

impl OffsetTable {
    pub fn build(refs: &ReferenceSet) -> Self {
        let mut offsets = Vec::with_capacity(refs.len());
        let mut lens = Vec::with_capacity(refs.len());
        let mut total = 0i64;
        for i in 0..refs.len() {
            offsets.push(total);
            let len = refs.seq_len(i);
            lens.push(len);
            total += len + 1;
        }
        OffsetTable {
            offsets,
            lens,
            span: total,
            cursor: 0,
        }
    }

    pub fn offset(&self, idx: usize) -> i64 {
        self.offsets[idx]
    }

    pub fn span(&self) -> i64 {
        self.span
    }

    /// Map a global coordinate to (sequence index, local coordinate).
    ///
    /// Returns the greatest index `i` with `offset(i) <= g` and the local
    /// coordinate `g - offset(i)`. A coordinate at or beyond the concatenated
    /// span has no such index and is fatal: the upstream match stream is
    /// inconsistent with the loaded reference collection. Local coordinates
    /// that fall on a separator position (<= 0) are returned as-is; boundary
    /// classification happens in the remapper.
    pub fn locate(&mut self, global: i64) -> Result<(usize, i64)> {
        if global >= self.span {
            bail!(
                "Match start coordinate {} exceeds the concatenated reference span {}; \
                 the match stream does not correspond to the loaded reference",
                global,
                self.span
            );
        }

        if global < self.offsets[self.cursor] {
            // Coordinate fell behind the cursor; re-seek
            self.cursor = self.offsets.partition_point(|&o| o <= global).max(1) - 1;
        } else {
            while self.cursor + 1 < self.offsets.len() && global >= self.offsets[self.cursor + 1] {
                self.cursor += 1;
            }
        }

        Ok((self.cursor, global - self.offsets[self.cursor]))
    }

    pub fn seq_len(&self, idx: usize) -> i64 {
        self.lens[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fasta::{ReferenceSet, SequenceRecord};
    use proptest::prelude::*;

    fn refs_of_lens(lens: &[usize]) -> ReferenceSet {
        let records: Vec<SequenceRecord> = lens
            .iter()
            .enumerate()
            .map(|(i, &len)| SequenceRecord {
                id: format!("seq{}", i + 1),
                seq: vec![b'A'; len],
            })
            .collect();
        ReferenceSet::from_records(records)
    }

    #[test]
    fn test_offset_formula() {
        let refs = refs_of_lens(&[10, 5, 3]);
        let table = OffsetTable::build(&refs);
        assert_eq!(table.offset(0), 0);
        assert_eq!(table.offset(1), 11);
        assert_eq!(table.offset(2), 17);
        assert_eq!(table.span(), 21);
    }

    #[test]
    fn test_locate_second_sequence() {
        // Lengths [10, 5] -> offsets [0, 11]; global 12 lands at seq2 local 1
        let refs = refs_of_lens(&[10, 5]);
        let mut table = OffsetTable::build(&refs);
        assert_eq!(table.locate(12).unwrap(), (1, 1));
    }

    #[test]
    fn test_locate_separator_position() {
        // Global 11 is seq2's separator slot: index 1, local 0
        let refs = refs_of_lens(&[10, 5]);
        let mut table = OffsetTable::build(&refs);
        assert_eq!(table.locate(11).unwrap(), (1, 0));
    }

    #[test]
    fn test_locate_past_span_is_fatal() {
        let refs = refs_of_lens(&[10, 5]);
        let mut table = OffsetTable::build(&refs);
        assert_eq!(table.span(), 17);
        assert!(table.locate(17).is_err());
        assert!(table.locate(1000).is_err());
    }

    #[test]
    fn test_cursor_rewind() {
        // Matches need not arrive in global order; a coordinate behind the
        // cursor must re-seek, not mis-map
        let refs = refs_of_lens(&[10, 5, 3]);
        let mut table = OffsetTable::build(&refs);
        assert_eq!(table.locate(18).unwrap(), (2, 1));
        assert_eq!(table.locate(3).unwrap(), (0, 3));
        assert_eq!(table.locate(12).unwrap(), (1, 1));
    }

    proptest! {
        #[test]
        fn prop_round_trip(lens in prop::collection::vec(1usize..50, 1..8),
                           seq in 0usize..8, local in 1i64..50) {
            let seq = seq % lens.len();
            prop_assume!(local <= lens[seq] as i64);
            let refs = refs_of_lens(&lens);
            let mut table = OffsetTable::build(&refs);
            let global = table.offset(seq) + local;
            prop_assert_eq!(table.locate(global).unwrap(), (seq, local));
        }
    }
}
