//! Command-line interface definition.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::{
    count::CountFilter,
    filter::Threshold,
    kmer::Strandedness,
    reader::SequenceFormat,
};

/// Exact k-mer counting and k-mer-based read filtering for FASTA and FASTQ
/// files.
#[derive(Parser, Debug)]
#[command(name = "ktally")]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Suppress informational output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Count k-mers in sequence files and save a binary database
    Build {
        #[command(flatten)]
        counting: CountingArgs,

        /// Input format (auto-detected from the extension by default)
        #[arg(long, value_enum, default_value = "auto")]
        format: SequenceFormat,

        /// Path for the output database (.ktab, or .ktab.gz with the gzip
        /// feature)
        #[arg(short, long)]
        output: PathBuf,

        /// Sequence files to count
        #[arg(required = true)]
        seqs: Vec<PathBuf>,
    },

    /// Count k-mers in one input and print the table
    Count {
        #[command(flatten)]
        counting: CountingArgs,

        /// Input format (auto-detected from the extension by default)
        #[arg(long, value_enum, default_value = "auto")]
        format: SequenceFormat,

        /// Rendering of the printed table
        #[arg(long, value_enum, default_value = "tsv")]
        output_format: OutputFormat,

        /// Sequence file to count; `-` or nothing reads stdin
        path: Option<PathBuf>,
    },

    /// Print the contents of a k-mer database
    Dump {
        /// Rendering of the printed table
        #[arg(long, value_enum, default_value = "tsv")]
        output_format: OutputFormat,

        /// Write to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Database to dump
        db: PathBuf,
    },

    /// Print a count histogram of a k-mer database
    Histo {
        /// Also print summary statistics to stderr
        #[arg(long)]
        stats: bool,

        /// Database to summarize
        db: PathBuf,
    },

    /// Keep or drop reads by their k-mer overlap with a database
    Filter {
        /// Minimum distinct database k-mers a read must contain, as a
        /// count or a fraction of read length
        #[arg(long, value_parser = parse_threshold)]
        read_min_occs: Option<Threshold>,

        /// Maximum distinct database k-mers a read may contain, as a
        /// count or a fraction of read length
        #[arg(long, value_parser = parse_threshold)]
        read_max_occs: Option<Threshold>,

        /// Input format of the reads (auto-detected by default)
        #[arg(long, value_enum, default_value = "auto")]
        format: SequenceFormat,

        /// Path for retained reads (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write a JSON filtering report to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Reference k-mer database
        db: PathBuf,

        /// Reads to filter; `-` reads stdin
        reads: PathBuf,
    },
}

/// Options shared by the counting subcommands.
#[derive(clap::Args, Debug)]
pub struct CountingArgs {
    /// K-mer length
    #[arg(short, value_parser = parse_k)]
    pub k: usize,

    /// Count each strand separately instead of canonicalizing
    #[arg(long)]
    pub single_strand: bool,

    /// Exclude k-mers with capped counts below this threshold
    #[arg(long)]
    pub min_occs: Option<u64>,

    /// Exclude k-mers with capped counts above this threshold
    #[arg(long)]
    pub max_occs: Option<u64>,

    /// Saturate counts at this value before the bounds are applied
    #[arg(long)]
    pub counter_cap: Option<u64>,
}

impl CountingArgs {
    /// The strand policy these options select.
    #[must_use]
    pub const fn strandedness(&self) -> Strandedness {
        if self.single_strand {
            Strandedness::Single
        } else {
            Strandedness::Canonical
        }
    }

    /// The count filter these options select.
    #[must_use]
    pub const fn filter(&self) -> CountFilter {
        CountFilter {
            min_occs: self.min_occs,
            max_occs: self.max_occs,
            counter_cap: self.counter_cap,
        }
    }
}

/// Output format for k-mer count tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Tab-separated values (kmer\tcount)
    #[default]
    Tsv,
    /// FASTA-like format (>{count}\n{kmer})
    Fasta,
    /// JSON array format
    Json,
}

fn parse_k(s: &str) -> Result<usize, String> {
    let k: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if k == 0 {
        return Err("k-mer length must be at least 1".to_string());
    }
    Ok(k)
}

fn parse_threshold(s: &str) -> Result<Threshold, String> {
    s.parse().map_err(|e: crate::filter::ThresholdError| e.to_string())
}
