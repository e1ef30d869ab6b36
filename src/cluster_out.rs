use crate::config::PostConfig;
use crate::fasta::{ReferenceSet, SequenceRecord};
use crate::mgaps::Strand;
use crate::synteny::SyntenyBatch;
use anyhow::Result;
use std::io::Write;

/// Downstream collaborator receiving each completed batch.
///
/// The call is synchronous; the batch and the query buffer are valid only
/// for its duration. Both are cleared/overwritten before the next query
/// starts accumulating, so implementations must copy out anything they keep.
pub trait SyntenyProcessor {
    fn process(
        &mut self,
        refs: &ReferenceSet,
        batch: &SyntenyBatch,
        query: &SequenceRecord,
    ) -> Result<()>;
}

/// Writes the cluster listing for each flushed batch: one `>` header per
/// synteny group, a strand line per cluster, then the local-coordinate match
/// triples with gap columns relative to the previous match.
pub struct ClusterWriter<W: Write> {
    out: W,
    #[allow(dead_code)]
    config: PostConfig,
}

impl<W: Write> ClusterWriter<W> {
    pub fn new(out: W, config: PostConfig) -> Self {
        ClusterWriter { out, config }
    }

    /// File header naming the two sequence inputs.
    pub fn write_preamble(&mut self, ref_name: &str, qry_name: &str) -> Result<()> {
        writeln!(self.out, "{} {}", ref_name, qry_name)?;
        writeln!(self.out, "NUCMER")?;
        Ok(())
    }
}

impl<W: Write> SyntenyProcessor for ClusterWriter<W> {
    fn process(
        &mut self,
        refs: &ReferenceSet,
        batch: &SyntenyBatch,
        query: &SequenceRecord,
    ) -> Result<()> {
        for group in &batch.groups {
            let reference = refs.get(group.ref_idx);
            writeln!(
                self.out,
                ">{} {} {} {}",
                reference.id,
                query.id,
                reference.len(),
                query.len()
            )?;
            for cluster in &group.clusters {
                writeln!(
                    self.out,
                    "{:>2} {:>2}",
                    Strand::Forward.as_char(),
                    cluster.strand.as_char()
                )?;
                for (i, m) in cluster.matches.iter().enumerate() {
                    write!(self.out, "{:8} {:8} {:6}", m.ref_start, m.query_start, m.len)?;
                    if i > 0 {
                        let prev = &cluster.matches[i - 1];
                        write!(
                            self.out,
                            " {:6} {:6}",
                            m.ref_start - prev.ref_start - prev.len,
                            m.query_start - prev.query_start - prev.len
                        )?;
                    } else {
                        write!(self.out, " {:>6} {:>6}", '-', '-')?;
                    }
                    writeln!(self.out)?;
                }
            }
        }
        self.out.flush()?;
        Ok(())
    }
}
