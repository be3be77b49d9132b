//! Subcommand execution.
//!
//! Count tables and filtered reads go to stdout (or `--output`);
//! informational summaries go to stderr so piped output stays clean.

use std::{
    fs::File,
    io::{stdout, BufWriter},
    path::{Path, PathBuf},
};

use colored::Colorize;

use crate::{
    cli::{Args, Command, CountingArgs, OutputFormat},
    count::{count_file, count_files, KmerCountTable},
    db::{load_db, save_db},
    error::KtallyError,
    filter::{filter_file, Threshold},
    histogram::{compute_histogram, histogram_stats, write_histogram},
    kmer::KmerLength,
    reader::{Input, SequenceFormat},
    table::render_table,
};

/// Executes the parsed command line.
///
/// # Errors
///
/// Returns the first error the selected subcommand hits.
pub fn run(args: &Args) -> Result<(), KtallyError> {
    match &args.command {
        Command::Build {
            counting,
            format,
            output,
            seqs,
        } => build(counting, *format, output, seqs, args.quiet),
        Command::Count {
            counting,
            format,
            output_format,
            path,
        } => count(counting, *format, *output_format, path.as_deref(), args.quiet),
        Command::Dump {
            output_format,
            output,
            db,
        } => dump(*output_format, output.as_deref(), db, args.quiet),
        Command::Histo { stats, db } => histo(*stats, db),
        Command::Filter {
            read_min_occs,
            read_max_occs,
            format,
            output,
            report,
            db,
            reads,
        } => filter(
            *read_min_occs,
            *read_max_occs,
            *format,
            output.as_deref(),
            report.as_deref(),
            db,
            reads,
            args.quiet,
        ),
    }
}

fn build(
    counting: &CountingArgs,
    format: SequenceFormat,
    output: &Path,
    seqs: &[PathBuf],
    quiet: bool,
) -> Result<(), KtallyError> {
    let k = KmerLength::new(counting.k)?;
    let inputs: Vec<Input> = seqs.iter().map(|p| Input::from_path(p)).collect();
    let table = count_files(&inputs, format, k, counting.strandedness(), counting.filter())?;
    save_db(&table, output)?;

    if !quiet {
        eprintln!(
            "{} {} distinct {}-mers ({}) from {} file(s) -> {}",
            "built".bold(),
            table.len().to_string().blue().bold(),
            k,
            table.strandedness(),
            inputs.len(),
            output.display().to_string().underline()
        );
    }
    Ok(())
}

fn count(
    counting: &CountingArgs,
    format: SequenceFormat,
    output_format: OutputFormat,
    path: Option<&Path>,
    quiet: bool,
) -> Result<(), KtallyError> {
    let k = KmerLength::new(counting.k)?;
    let input = Input::from_option(path);
    let table = count_file(&input, format, k, counting.strandedness(), counting.filter())?;

    if !quiet {
        print_table_summary(&table, &input.to_string());
    }
    render_table(&table, output_format, BufWriter::new(stdout().lock()))
}

fn dump(
    output_format: OutputFormat,
    output: Option<&Path>,
    db: &Path,
    quiet: bool,
) -> Result<(), KtallyError> {
    let table = load_db(db)?;
    if !quiet {
        print_table_summary(&table, &db.display().to_string());
    }
    match output {
        Some(path) => {
            let file = File::create(path)?;
            render_table(&table, output_format, BufWriter::new(file))
        }
        None => render_table(&table, output_format, BufWriter::new(stdout().lock())),
    }
}

fn histo(stats: bool, db: &Path) -> Result<(), KtallyError> {
    let table = load_db(db)?;
    let histogram = compute_histogram(&table);

    if stats {
        let stats = histogram_stats(&histogram);
        eprintln!(
            "{}: {} total, {} distinct, mode {} (x{}), mean {:.2}",
            "stats".bold(),
            stats.total_kmers,
            stats.distinct_kmers,
            stats.mode_count,
            stats.mode_frequency,
            stats.mean_count
        );
    }
    write_histogram(&histogram, BufWriter::new(stdout().lock()))
}

#[allow(clippy::too_many_arguments)]
fn filter(
    read_min_occs: Option<Threshold>,
    read_max_occs: Option<Threshold>,
    format: SequenceFormat,
    output: Option<&Path>,
    report: Option<&Path>,
    db: &Path,
    reads: &Path,
    quiet: bool,
) -> Result<(), KtallyError> {
    let reference = load_db(db)?;
    let summary = filter_file(
        &reference,
        &Input::from_path(reads),
        format,
        output,
        read_min_occs,
        read_max_occs,
    )?;

    if let Some(path) = report {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &summary)?;
    }

    if !quiet {
        eprintln!(
            "{} {} of {} reads ({} dropped) against {} reference {}-mers",
            "kept".bold(),
            summary.reads_kept.to_string().blue().bold(),
            summary.reads_in,
            summary.reads_dropped,
            summary.reference_kmers,
            summary.k
        );
    }
    Ok(())
}

fn print_table_summary(table: &KmerCountTable, source: &str) {
    eprintln!(
        "{} {} distinct {}-mers ({}) from {}",
        "counted".bold(),
        table.len().to_string().blue().bold(),
        table.k(),
        table.strandedness(),
        source.underline()
    );
}
