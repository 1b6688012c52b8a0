// simplecov: Per-base target coverage from minimap2 alignments.
//
// Copyright 2025 Tommi Mäklin [tommi@maklin.fi].
//
// Copyrights in this project are retained by contributors. No copyright assignment
// is required to contribute to this project.
//
// Except as otherwise noted (below and/or in individual files), this
// project is licensed under the Apache License, Version 2.0
// <LICENSE-APACHE> or <http://www.apache.org/licenses/LICENSE-2.0> or
// the MIT license, <LICENSE-MIT> or <http://opensource.org/licenses/MIT>,
// at your option.
//
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use clap::CommandFactory;
use clap::Parser;
use log::error;
use log::info;
use log::warn;

use simplecov::CoverageError;
use simplecov::ParseOptions;
use simplecov::Targets;
use simplecov::aligner::Minimap2;

mod cli;

type E = Box<dyn std::error::Error>;

/// Initializes the logger with verbosity given in `log_max_level`.
fn init_log(log_max_level: usize) {
    stderrlog::new()
    .module(module_path!())
    .quiet(false)
    .verbosity(log_max_level)
    .timestamp(stderrlog::Timestamp::Off)
    .init()
    .unwrap();
}

/// Fails with [CoverageError::MissingFile] naming the first missing file after logging all of them.
fn check_inputs_exist(
    paths: &[&Path],
) -> Result<(), CoverageError> {
    let missing: Vec<&Path> = paths.iter().filter(|path| !path.exists()).copied().collect();
    missing.iter().for_each(|path| error!("Input file {} does not exist!", path.display()));
    match missing.first() {
        Some(path) => Err(CoverageError::MissingFile(path.to_path_buf())),
        None => Ok(()),
    }
}

fn load_targets(
    reference: &cli::Reference,
) -> Result<Targets, CoverageError> {
    if reference.accession.is_some() {
        return Err(CoverageError::AccessionNotImplemented)
    }
    match &reference.targets {
        Some(path) => simplecov::fasta::read_targets(path),
        None => Err(CoverageError::AccessionNotImplemented),
    }
}

fn write_report(
    targets: &Targets,
    args: &cli::ReportArgs,
) -> Result<(), E> {
    let columns = if args.print_map { Some(args.columns as usize) } else { None };

    let mut conn_out: Box<dyn Write> = if let Some(path) = &args.out_file {
        if path.exists() {
            warn!("Output file {} already exists.. will overwrite.", path.display());
        }
        Box::new(BufWriter::new(File::create(path)?))
    } else {
        Box::new(BufWriter::new(std::io::stdout().lock()))
    };

    simplecov::report_to_write(targets, columns, &mut conn_out)?;
    conn_out.flush()?;
    Ok(())
}

fn report(
    alignment_file: &Path,
    args: &cli::ReportArgs,
) -> Result<(), E> {
    let mut inputs: Vec<&Path> = vec![alignment_file];
    if let Some(targets) = &args.reference.targets {
        inputs.push(targets);
    }
    check_inputs_exist(&inputs)?;

    let mut targets = load_targets(&args.reference)?;
    let opts = ParseOptions { max_mismatches: args.max_mismatches, ..Default::default() };
    simplecov::coverage_from_file(alignment_file, &mut targets, &opts)?;

    write_report(&targets, args)
}

fn map(
    query_file: &Path,
    alignment_file: &Option<PathBuf>,
    minimap2: &Path,
    args: &cli::ReportArgs,
) -> Result<(), E> {
    let mut inputs: Vec<&Path> = vec![query_file];
    if let Some(targets) = &args.reference.targets {
        inputs.push(targets);
    }
    check_inputs_exist(&inputs)?;

    let Some(targets_file) = &args.reference.targets else {
        return Err(Box::new(CoverageError::AccessionNotImplemented))
    };

    let out_path = alignment_file.clone().unwrap_or_else(|| PathBuf::from(query_file.to_string_lossy().to_string() + ".paf"));
    let n_queries = simplecov::fasta::count_records(query_file)?;
    info!("Aligning {} queries from {} to {}", n_queries, query_file.display(), targets_file.display());

    Minimap2::new(minimap2).run(targets_file, query_file, &out_path)?;

    report(&out_path, args)
}

fn main() {
    let cli = cli::Cli::parse();

    // Subcommands:
    let res = match &cli.command {
        // Map
        Some(cli::Commands::Map {
            query_file,
            alignment_file,
            minimap2,
            report: args,
        }) => {
            init_log(if args.verbose { 3 } else { 2 });
            map(query_file, alignment_file, minimap2, args)
        },

        // Report
        Some(cli::Commands::Report {
            alignment_file,
            report: args,
        }) => {
            init_log(if args.verbose { 3 } else { 2 });
            report(alignment_file, args)
        },
        None => {
            let _ = cli::Cli::command().print_help();
            Ok(())
        },
    };

    if let Err(e) = res {
        error!("{}", e);
        std::process::exit(1);
    }
}
