use crate::cluster_out::SyntenyProcessor;
use crate::fasta::{FastaReader, ReferenceSet, SequenceRecord};
use crate::mgaps::{Event, MgapsReader, Strand};
use crate::remap::{Remapped, Remapper};
use crate::synteny::{Assembler, Cluster};
use anyhow::{bail, Result};
use log::{debug, info};
use std::io::BufRead;

/// Single forward pass over the match stream: remap, assemble, flush.
///
/// Carries the active query buffer and the batch under construction. The
/// batch is handed to the processor exactly once per query-identity change
/// (and once at end of input) when non-empty, then cleared; the query buffer
/// is reloaded by scanning the query source forward, which requires query
/// identities to appear in the same order in both inputs.
pub struct SyntenyEngine<'a, P: SyntenyProcessor> {
    refs: &'a ReferenceSet,
    remapper: Remapper,
    assembler: Assembler,
    processor: P,
    /// Active query buffer, overwritten at each reload; holds at most one
    /// query's data at a time
    query: SequenceRecord,
    flushes: usize,
    matches_seen: usize,
    boundary_dropped: usize,
}

impl<'a, P: SyntenyProcessor> SyntenyEngine<'a, P> {
    pub fn new(refs: &'a ReferenceSet, processor: P) -> Self {
        SyntenyEngine {
            refs,
            remapper: Remapper::new(refs),
            assembler: Assembler::new(),
            processor,
            query: SequenceRecord::default(),
            flushes: 0,
            matches_seen: 0,
            boundary_dropped: 0,
        }
    }

    /// Drive the full pass: consume every event from the match stream,
    /// reloading queries from `queries` as headers arrive.
    pub fn run<R: BufRead, Q: BufRead>(
        &mut self,
        mut events: MgapsReader<R>,
        queries: &mut FastaReader<Q>,
    ) -> Result<()> {
        let mut strand = Strand::Forward;
        let mut open: Option<Cluster> = None;

        while let Some(event) = events.next_event()? {
            match event {
                Event::QueryHeader { id, strand: dir } => {
                    if let Some(cluster) = open.take() {
                        self.assembler.finish_cluster(cluster);
                    }
                    if id != self.query.id {
                        if !self.assembler.batch().is_empty() {
                            self.flush()?;
                        }
                        self.reload_query(queries, &id)?;
                    }
                    strand = dir;
                }
                Event::ClusterBreak => {
                    // A break right after a header still terminates an
                    // (empty) cluster
                    let cluster = open.take().unwrap_or_else(|| Cluster::new(strand));
                    self.assembler.finish_cluster(cluster);
                }
                Event::Match(raw) => {
                    self.matches_seen += 1;
                    let cluster = open.get_or_insert_with(|| Cluster::new(strand));
                    match self.remapper.remap(self.refs, raw)? {
                        Remapped::Valid { ref_idx, m } => {
                            self.assembler.accept(self.refs, cluster, ref_idx, m)?;
                        }
                        Remapped::Boundary { .. } => self.boundary_dropped += 1,
                        Remapped::TooShort => {}
                    }
                }
            }
        }

        if let Some(cluster) = open.take() {
            self.assembler.finish_cluster(cluster);
        }
        if !self.assembler.batch().is_empty() {
            self.flush()?;
        }

        info!(
            "Processed {} matches ({} boundary-dropped), {} flushes",
            self.matches_seen, self.boundary_dropped, self.flushes
        );
        Ok(())
    }

    /// Hand the completed batch to the processor, then clear it. The batch
    /// and query buffer are valid only for the duration of the call.
    fn flush(&mut self) -> Result<()> {
        let batch = self.assembler.take_batch();
        debug!(
            "Flushing {} synteny groups ({} clusters) for query '{}'",
            batch.len(),
            batch.num_clusters(),
            self.query.id
        );
        self.processor.process(self.refs, &batch, &self.query)?;
        self.flushes += 1;
        Ok(())
    }

    /// Scan the query source forward until the record named by the header is
    /// found, overwriting the active buffer. Exhausting the source first is
    /// fatal: headers must appear in the same order as the query records.
    fn reload_query<Q: BufRead>(&mut self, queries: &mut FastaReader<Q>, id: &str) -> Result<()> {
        while self.query.id != id {
            match queries.next_record()? {
                Some(record) => self.query = record,
                None => bail!(
                    "Query file did not contain '{}'; it is missing or not in the \
                     same order as the match stream",
                    id
                ),
            }
        }
        Ok(())
    }

    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    pub fn into_processor(self) -> P {
        self.processor
    }
}
