use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter};

use synpost::cluster_out::ClusterWriter;
use synpost::config::PostConfig;
use synpost::engine::SyntenyEngine;
use synpost::fasta::{open_fasta, FastaReader, ReferenceSet};
use synpost::mgaps::{open_input, MgapsReader};

/// synpost - reconstruct per-sequence match clusters from a concatenated
/// coordinate space
///
/// Reads the cluster stream emitted by the upstream seed finder (stdin or
/// -i), translates every reference coordinate back into its original
/// sequence, groups the clusters by reference sequence for each query, and
/// writes the listing to <PREFIX>.cluster
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Reference FASTA (the sequences the concatenated coordinates refer to)
    #[clap(value_name = "REFERENCE")]
    reference: String,

    /// Query FASTA; records must appear in the same order as the query
    /// headers in the match stream
    #[clap(value_name = "QUERY")]
    query: String,

    /// Output prefix; the cluster listing goes to <PREFIX>.cluster
    #[clap(value_name = "PREFIX")]
    prefix: String,

    /// Input match stream (stdin if not specified)
    #[clap(short = 'i', long = "input")]
    input: Option<String>,

    /// Alignment break (give-up) length for downstream extension
    #[clap(short = 'b', long = "break-length", default_value = "200")]
    break_length: u32,

    /// Diagonal banding for downstream extension (0 = none)
    #[clap(short = 'B', long = "banding", default_value = "0")]
    banding: u32,

    /// Do not extend alignments outward from clusters
    #[clap(short = 'e', long = "no-extend")]
    no_extend: bool,

    /// Keep shadowed alignments, useful when aligning a sequence to itself
    /// to identify repeats
    #[clap(short = 's', long = "shadows")]
    shadows: bool,

    /// Force alignment to sequence ends when within the break length
    #[clap(short = 't', long = "to-seqend")]
    to_seqend: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = PostConfig {
        break_len: args.break_length,
        banding: args.banding,
        extend: !args.no_extend,
        to_seq_end: args.to_seqend,
        keep_shadows: args.shadows,
    };

    let refs = ReferenceSet::load(&args.reference)?;
    let mut queries = FastaReader::new(open_fasta(&args.query)?);

    let input: Box<dyn BufRead> = match &args.input {
        Some(path) => open_input(path)?,
        None => Box::new(BufReader::new(io::stdin())),
    };

    let cluster_path = format!("{}.cluster", args.prefix);
    let out = BufWriter::new(
        File::create(&cluster_path)
            .with_context(|| format!("Failed to create output file: {}", cluster_path))?,
    );
    let mut writer = ClusterWriter::new(out, config);
    writer.write_preamble(&args.reference, &args.query)?;

    let mut engine = SyntenyEngine::new(&refs, writer);
    engine.run(MgapsReader::new(input), &mut queries)?;

    Ok(())
}
