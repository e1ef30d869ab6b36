use anyhow::{bail, Context, Result};
use noodles::bgzf;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Open a match-stream file, auto-detecting bgzip compression by extension,
/// returning a boxed BufRead
pub fn open_input<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open match stream: {}", path.display()))?;

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

/// Query strand orientation of a cluster run, taken from its header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn as_char(self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

/// A raw match as parsed: reference start in the concatenated global space,
/// query start, and match length. Coordinates are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchTriple {
    pub ref_start: i64,
    pub query_start: i64,
    pub len: i64,
}

/// One structured event from the match stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A `>` header line opening a cluster run for a query sequence
    QueryHeader { id: String, strand: Strand },
    /// A `#` line terminating the current cluster
    ClusterBreak,
    /// A three-integer match line
    Match(MatchTriple),
}

/// Marker substring on a header line indicating a reverse-strand cluster run.
const REVERSE_MARKER: &str = " Reverse";

/// Lazy scanner over the cluster-match stream.
///
/// Produces a finite, non-restartable sequence of events; end of input is
/// signalled by `Ok(None)`. Input must start with a query header (or be
/// empty) and every non-header, non-break line must parse as a match triple.
pub struct MgapsReader<R: BufRead> {
    reader: R,
    started: bool,
    line_no: usize,
}

impl<R: BufRead> MgapsReader<R> {
    pub fn new(reader: R) -> Self {
        MgapsReader {
            reader,
            started: false,
            line_no: 0,
        }
    }

    /// Read the next event, or None at end of input.
    pub fn next_event(&mut self) -> Result<Option<Event>> {
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let trimmed = line.trim_end();
            if trimmed.trim().is_empty() {
                continue;
            }

            let first = trimmed.chars().next().unwrap();
            if !self.started && first != '>' {
                bail!("Match stream must start with a '>' header line");
            }
            self.started = true;

            return match first {
                '>' => Ok(Some(self.parse_header(trimmed)?)),
                '#' => Ok(Some(Event::ClusterBreak)),
                _ => Ok(Some(self.parse_match(trimmed)?)),
            };
        }
    }

    fn parse_header(&self, line: &str) -> Result<Event> {
        let rest = line[1..].trim_start();
        let id_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let id = rest[..id_end].to_string();
        if id.is_empty() {
            bail!("Header line {} has no query identifier: {}", self.line_no, line);
        }
        // Annotation keeps its leading whitespace so the marker match stays exact
        let annotation = &rest[id_end..];
        let strand = if annotation.contains(REVERSE_MARKER) {
            Strand::Reverse
        } else {
            Strand::Forward
        };
        Ok(Event::QueryHeader { id, strand })
    }

    /// A match line holds three whitespace-separated integers; trailing
    /// fields are ignored
    fn parse_match(&self, line: &str) -> Result<Event> {
        let mut fields = line.split_whitespace();
        let mut next_int = |name: &str| -> Result<i64> {
            match fields.next() {
                Some(tok) => tok.parse::<i64>().map_err(|_| {
                    anyhow::anyhow!(
                        "Malformed match line {} ({} field '{}' is not an integer): {}",
                        self.line_no,
                        name,
                        tok,
                        line
                    )
                }),
                None => bail!("Malformed match line {} (missing {} field): {}", self.line_no, name, line),
            }
        };
        let ref_start = next_int("reference start")?;
        let query_start = next_int("query start")?;
        let len = next_int("length")?;
        Ok(Event::Match(MatchTriple {
            ref_start,
            query_start,
            len,
        }))
    }
}
