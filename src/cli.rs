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
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct Reference {
    // Target sequences
    #[arg(short = 't', long = "targets", help = "Target sequences in fasta format")]
    pub targets: Option<PathBuf>,

    // Accession of the target sequence
    #[arg(short = 'a', long = "accession", help = "Accession of the target sequence (not implemented)")]
    pub accession: Option<String>,
}

#[derive(Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub reference: Reference,

    // Allowed mismatches
    #[arg(short = 'm', long = "mismatches", default_value_t = 8, help = "Number of allowed mismatches between query and target")]
    pub max_mismatches: usize,

    // Print the pileup
    #[arg(long = "map", default_value_t = false, help = "Print the per-base coverage map")]
    pub print_map: bool,

    // Width of the pileup
    #[arg(long = "columns", default_value_t = 80, value_parser = clap::value_parser!(u32).range(1..), help = "Number of columns to print the coverage map in")]
    pub columns: u32,

    // Output file path
    #[arg(short = 'o', long = "output", required = false, help = "Write the report here instead of stdout")]
    pub out_file: Option<PathBuf>,

    // Verbosity
    #[arg(long = "verbose", default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    // Align queries to the targets with minimap2 and report coverage
    Map {
        // Query sequences
        #[arg(short = 'q', long = "query", required = true, help = "Query sequences in fasta format")]
        query_file: PathBuf,

        // Alignment output path
        #[arg(long = "alignments", required = false, help = "Path for the minimap2 output, defaults to <query>.paf")]
        alignment_file: Option<PathBuf>,

        // minimap2 executable
        #[arg(long = "minimap2", default_value = "minimap2")]
        minimap2: PathBuf,

        #[command(flatten)]
        report: ReportArgs,
    },

    // Report coverage from an existing minimap2 alignment file
    Report {
        // Input file
        #[arg(group = "input", required = true, help = "PAF file from minimap2 --cs")]
        alignment_file: PathBuf,

        #[command(flatten)]
        report: ReportArgs,
    },
}
