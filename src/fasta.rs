use anyhow::{bail, Context, Result};
use noodles::bgzf;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One FASTA record: ID token plus base buffer.
///
/// Match-stream coordinates are 1-based, so local coordinate `l` addresses
/// `seq[l - 1]`.
#[derive(Debug, Clone, Default)]
pub struct SequenceRecord {
    pub id: String,
    pub seq: Vec<u8>,
}

impl SequenceRecord {
    pub fn len(&self) -> i64 {
        self.seq.len() as i64
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

/// Open a FASTA file, auto-detecting bgzip compression by extension,
/// returning a boxed BufRead
pub fn open_fasta<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open FASTA: {}", path.display()))?;

    let is_compressed = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz" || ext == "bgz")
        .unwrap_or(false);

    if is_compressed {
        Ok(Box::new(BufReader::new(bgzf::io::reader::Reader::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Sequential FASTA reader yielding one record at a time.
///
/// The engine scans the query file forward record-by-record, so records are
/// never buffered beyond the one under construction.
pub struct FastaReader<R: BufRead> {
    reader: R,
    /// Header line carried over from the previous record's scan
    pending: Option<String>,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        FastaReader {
            reader,
            pending: None,
        }
    }

    /// Read the next record, or None at end of input.
    pub fn next_record(&mut self) -> Result<Option<SequenceRecord>> {
        let header = match self.pending.take() {
            Some(line) => line,
            None => loop {
                let mut line = String::new();
                if self.reader.read_line(&mut line)? == 0 {
                    return Ok(None);
                }
                let trimmed = line.trim_end();
                if trimmed.is_empty() {
                    continue;
                }
                if !trimmed.starts_with('>') {
                    bail!("Expected FASTA header line, got: {}", trimmed);
                }
                break trimmed.to_string();
            },
        };

        let id = header
            .trim_start_matches('>')
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_string();
        if id.is_empty() {
            bail!("FASTA header with empty identifier");
        }

        let mut seq = Vec::new();
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                break;
            }
            let trimmed = line.trim_end();
            if trimmed.starts_with('>') {
                self.pending = Some(trimmed.to_string());
                break;
            }
            seq.extend(trimmed.trim().bytes());
        }

        Ok(Some(SequenceRecord { id, seq }))
    }
}

/// The reference collection: ordered, loaded once, read-only thereafter.
#[derive(Debug, Default)]
pub struct ReferenceSet {
    records: Vec<SequenceRecord>,
}

impl ReferenceSet {
    /// Read every record from a FASTA source. An empty collection is fatal.
    pub fn read_all<R: BufRead>(reader: R) -> Result<Self> {
        let mut fasta = FastaReader::new(reader);
        let mut records = Vec::new();
        while let Some(record) = fasta.next_record()? {
            records.push(record);
        }
        if records.is_empty() {
            bail!("Reference file contains no sequences");
        }
        Ok(ReferenceSet { records })
    }

    /// Build from in-memory records. Callers are responsible for
    /// non-emptiness; `read_all` is the checked entry point.
    pub fn from_records(records: Vec<SequenceRecord>) -> Self {
        ReferenceSet { records }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        Self::read_all(open_fasta(path)?)
            .with_context(|| format!("Failed to load reference: {}", path.display()))
    }

    pub fn get(&self, idx: usize) -> &SequenceRecord {
        &self.records[idx]
    }

    pub fn id(&self, idx: usize) -> &str {
        &self.records[idx].id
    }

    pub fn seq_len(&self, idx: usize) -> i64 {
        self.records[idx].len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SequenceRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_records() {
        let fasta = ">seq1 some description\nACGT\nACG\n>seq2\nTTTTT\n";
        let mut reader = FastaReader::new(Cursor::new(fasta));

        let r1 = reader.next_record().unwrap().unwrap();
        assert_eq!(r1.id, "seq1");
        assert_eq!(r1.seq, b"ACGTACG");
        assert_eq!(r1.len(), 7);

        let r2 = reader.next_record().unwrap().unwrap();
        assert_eq!(r2.id, "seq2");
        assert_eq!(r2.len(), 5);

        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn test_forward_scan() {
        let fasta = ">a\nAC\n>b\nGG\n>c\nTT\n";
        let mut reader = FastaReader::new(Cursor::new(fasta));

        // Skip forward past "a" to "c", as the query reload does
        let mut found = None;
        while let Some(record) = reader.next_record().unwrap() {
            if record.id == "c" {
                found = Some(record);
                break;
            }
        }
        assert_eq!(found.unwrap().seq, b"TT");
        // "b" is behind us now; the scan is forward-only
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn test_empty_reference_fatal() {
        let result = ReferenceSet::read_all(Cursor::new(""));
        assert!(result.is_err());
    }

    #[test]
    fn test_garbage_before_header() {
        let mut reader = FastaReader::new(Cursor::new("ACGT\n>x\nAC\n"));
        assert!(reader.next_record().is_err());
    }
}
