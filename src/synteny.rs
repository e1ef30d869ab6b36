use crate::fasta::ReferenceSet;
use crate::mgaps::Strand;
use crate::remap::LocalMatch;
use anyhow::{bail, Result};

/// An ordered run of same-strand matches, one candidate alignment region.
///
/// The strand is fixed at creation from the enclosing query header. The
/// cluster binds to one reference identity when its first valid match
/// arrives and is immutable once terminated.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub strand: Strand,
    pub matches: Vec<LocalMatch>,
    /// Index of the bound synteny group in the current batch; unset until
    /// the first valid match
    bound: Option<usize>,
}

impl Cluster {
    pub fn new(strand: Strand) -> Self {
        Cluster {
            strand,
            matches: Vec::new(),
            bound: None,
        }
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// The clusters found against one reference sequence for the current query.
/// `ref_idx` indexes the immutable reference collection.
#[derive(Debug)]
pub struct SyntenyGroup {
    pub ref_idx: usize,
    pub clusters: Vec<Cluster>,
}

/// All synteny groups active for the current query sequence.
#[derive(Debug, Default)]
pub struct SyntenyBatch {
    pub groups: Vec<SyntenyGroup>,
}

impl SyntenyBatch {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn num_clusters(&self) -> usize {
        self.groups.iter().map(|g| g.clusters.len()).sum()
    }
}

/// Groups remapped matches into clusters and clusters into synteny groups.
///
/// Holds the batch under construction plus the most recently bound group,
/// which is where a cluster that never saw a valid match is filed.
#[derive(Debug, Default)]
pub struct Assembler {
    batch: SyntenyBatch,
    current_group: Option<usize>,
}

impl Assembler {
    pub fn new() -> Self {
        Assembler::default()
    }

    /// Record a valid match into the open cluster, binding the cluster to a
    /// synteny group on its first match.
    pub fn accept(
        &mut self,
        refs: &ReferenceSet,
        cluster: &mut Cluster,
        ref_idx: usize,
        m: LocalMatch,
    ) -> Result<()> {
        match cluster.bound {
            None => {
                let id = refs.id(ref_idx);
                // Most-recently-created first: repeated references to the
                // same sequence run together in practice
                let existing = self
                    .batch
                    .groups
                    .iter()
                    .enumerate()
                    .rev()
                    .find(|(_, g)| refs.id(g.ref_idx) == id);
                let group_idx = match existing {
                    Some((gi, group)) => {
                        if refs.seq_len(group.ref_idx) != refs.seq_len(ref_idx) {
                            bail!(
                                "The reference file may contain sequences with non-unique \
                                 header IDs ('{}' appears with lengths {} and {}); \
                                 please check your input files",
                                id,
                                refs.seq_len(group.ref_idx),
                                refs.seq_len(ref_idx)
                            );
                        }
                        gi
                    }
                    None => {
                        self.batch.groups.push(SyntenyGroup {
                            ref_idx,
                            clusters: Vec::new(),
                        });
                        self.batch.groups.len() - 1
                    }
                };
                cluster.bound = Some(group_idx);
                self.current_group = Some(group_idx);
            }
            Some(group_idx) => {
                let bound_idx = self.batch.groups[group_idx].ref_idx;
                if refs.id(bound_idx) != refs.id(ref_idx) {
                    bail!(
                        "A cluster was found straddling two reference sequences: \
                         '{}' and '{}'; the upstream pairing is inconsistent",
                        refs.id(bound_idx),
                        refs.id(ref_idx)
                    );
                }
            }
        }
        cluster.matches.push(m);
        Ok(())
    }

    /// File a terminated cluster under its bound group. A cluster that never
    /// bound goes to the most recently bound group; with no group at all it
    /// is dropped.
    pub fn finish_cluster(&mut self, cluster: Cluster) {
        if let Some(group_idx) = cluster.bound.or(self.current_group) {
            self.batch.groups[group_idx].clusters.push(cluster);
        }
    }

    pub fn batch(&self) -> &SyntenyBatch {
        &self.batch
    }

    /// Hand the accumulated batch out and reset for the next query.
    pub fn take_batch(&mut self) -> SyntenyBatch {
        self.current_group = None;
        std::mem::take(&mut self.batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fasta::{ReferenceSet, SequenceRecord};

    fn refs(entries: &[(&str, usize)]) -> ReferenceSet {
        ReferenceSet::from_records(
            entries
                .iter()
                .map(|(id, len)| SequenceRecord {
                    id: id.to_string(),
                    seq: vec![b'A'; *len],
                })
                .collect(),
        )
    }

    fn m(ref_start: i64, query_start: i64, len: i64) -> LocalMatch {
        LocalMatch {
            ref_start,
            query_start,
            len,
        }
    }

    #[test]
    fn test_binding_creates_and_reuses_groups() {
        let refs = refs(&[("seq1", 10), ("seq2", 5)]);
        let mut assembler = Assembler::new();

        let mut c1 = Cluster::new(Strand::Forward);
        assembler.accept(&refs, &mut c1, 0, m(1, 1, 3)).unwrap();
        assembler.accept(&refs, &mut c1, 0, m(5, 5, 2)).unwrap();
        assembler.finish_cluster(c1);

        let mut c2 = Cluster::new(Strand::Reverse);
        assembler.accept(&refs, &mut c2, 1, m(1, 2, 2)).unwrap();
        assembler.finish_cluster(c2);

        // Back to seq1: reuses the existing group instead of creating one
        let mut c3 = Cluster::new(Strand::Forward);
        assembler.accept(&refs, &mut c3, 0, m(7, 9, 2)).unwrap();
        assembler.finish_cluster(c3);

        let batch = assembler.take_batch();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.groups[0].ref_idx, 0);
        assert_eq!(batch.groups[0].clusters.len(), 2);
        assert_eq!(batch.groups[1].ref_idx, 1);
        assert_eq!(batch.groups[1].clusters.len(), 1);
        assert_eq!(batch.groups[0].clusters[0].matches.len(), 2);
    }

    #[test]
    fn test_duplicate_header_fatal() {
        // Two reference entries named "seqX" with different lengths; the
        // second resolution must abort
        let refs = refs(&[("seqX", 10), ("seqX", 7)]);
        let mut assembler = Assembler::new();

        let mut c1 = Cluster::new(Strand::Forward);
        assembler.accept(&refs, &mut c1, 0, m(1, 1, 2)).unwrap();
        assembler.finish_cluster(c1);

        let mut c2 = Cluster::new(Strand::Forward);
        let err = assembler.accept(&refs, &mut c2, 1, m(1, 1, 2));
        assert!(err.is_err());
        assert!(err.unwrap_err().to_string().contains("non-unique"));
    }

    #[test]
    fn test_straddling_cluster_fatal() {
        let refs = refs(&[("seq1", 10), ("seq2", 5)]);
        let mut assembler = Assembler::new();

        let mut cluster = Cluster::new(Strand::Forward);
        assembler.accept(&refs, &mut cluster, 0, m(1, 1, 2)).unwrap();
        let err = assembler.accept(&refs, &mut cluster, 1, m(1, 5, 2));
        assert!(err.is_err());
        assert!(err.unwrap_err().to_string().contains("straddling"));
    }

    #[test]
    fn test_empty_cluster_filed_under_current_group() {
        let refs = refs(&[("seq1", 10)]);
        let mut assembler = Assembler::new();

        let mut c1 = Cluster::new(Strand::Forward);
        assembler.accept(&refs, &mut c1, 0, m(1, 1, 2)).unwrap();
        assembler.finish_cluster(c1);

        // All of this cluster's matches were dropped as boundary noise
        assembler.finish_cluster(Cluster::new(Strand::Forward));

        let batch = assembler.take_batch();
        assert_eq!(batch.groups[0].clusters.len(), 2);
        assert!(batch.groups[0].clusters[1].is_empty());
    }

    #[test]
    fn test_empty_cluster_with_no_group_dropped() {
        let mut assembler = Assembler::new();
        assembler.finish_cluster(Cluster::new(Strand::Forward));
        assert!(assembler.take_batch().is_empty());
    }

    #[test]
    fn test_take_batch_resets_state() {
        let refs = refs(&[("seq1", 10)]);
        let mut assembler = Assembler::new();

        let mut c1 = Cluster::new(Strand::Forward);
        assembler.accept(&refs, &mut c1, 0, m(1, 1, 2)).unwrap();
        assembler.finish_cluster(c1);
        assert!(!assembler.take_batch().is_empty());

        // After a flush the slate is clean: an unbound cluster has nowhere
        // to go
        assembler.finish_cluster(Cluster::new(Strand::Forward));
        assert!(assembler.take_batch().is_empty());
    }
}
