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

//! simplecov is a library and a command-line client for:
//!
//!   - Measuring how much of a set of target sequences is covered by a set of
//!     query sequences (primers, probes, reads, ...).
//!   - Printing a per-base pileup of the queries that cover each target.
//!
//! The alignments are read from [PAF](https://github.com/lh3/miniasm/blob/master/PAF.md)
//! files written by [minimap2](https://github.com/lh3/minimap2) with the
//! `--cs` option. The `cs` difference string is decoded into per-base
//! match/mismatch states, and only alignments that span their whole query
//! without insertions or deletions and with at most a configured number of
//! mismatches contribute to the coverage.
//!
//! ## Usage
//!
//! ### Command line
//!
//! The simplecov CLI supports the following subcommands:
//!   - `simplecov map` align queries to targets with minimap2 and report coverage.
//!   - `simplecov report` report coverage from an existing alignment file.
//!
//! ### Rust API
//!
//! The API provides functions that operate on a registry of
//! [targets](Targets) and on structs that implement [Read] and [Write]:
//!
//!   - [read_targets](fasta::read_targets): registers one [CoverageTarget] per record in a FASTA file.
//!   - [coverage_from_read]: reads alignments from a [Read] and adds them to the targets.
//!   - [report_to_write]: writes the coverage summary, and optionally the pileup, to a [Write].
//!
//! For use cases requiring access to a single record at a time, the
//! [Parser](parser::Parser) struct takes a [Read] containing PAF lines and
//! yields the accepted [AlignmentRecord]s.
//!
//! ```rust
//! use simplecov::{coverage_from_read, report_to_write, ParseOptions, Targets};
//! use simplecov::target::CoverageTarget;
//! use std::io::Cursor;
//!
//! let mut targets = Targets::new();
//! targets.insert("chrT".to_string(), CoverageTarget::new("chrT", "chrT", "ACGT".repeat(5).into_bytes()));
//!
//! let mut data: Vec<u8> = Vec::new();
//! data.append(&mut b"qA\t10\t0\t10\t+\tchrT\t20\t0\t10\t10\t10\t60\tcs:Z::10\n".to_vec());
//! data.append(&mut b"qB\t10\t0\t10\t+\tchrT\t20\t5\t15\t9\t10\t60\tcs:Z::2*ag:7\n".to_vec());
//! let mut input = Cursor::new(data);
//!
//! let stats = coverage_from_read(&mut input, "mock.paf", &mut targets, &ParseOptions::default()).unwrap();
//! assert_eq!(stats.accepted, 2);
//!
//! let mut output: Vec<u8> = Vec::new();
//! report_to_write(&targets, None, &mut output).unwrap();
//!
//! assert_eq!(output, b"Total coverage for chrT: 15/20 bp covered (75.00%), Avg: 1.00\n".to_vec());
//! ```
//!

use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use indexmap::IndexMap;

pub mod aligner;
pub mod decoder;
pub mod fasta;
pub mod filter;
pub mod parser;
pub mod printer;
pub mod target;

pub use parser::ParseOptions;
pub use parser::ParseStats;
pub use target::CoverageTarget;

/// Registered targets keyed by their id, in the order they were read.
pub type Targets = IndexMap<String, CoverageTarget>;

/// Symbol used for target positions outside an alignment in the pileup.
pub const GAP_SYMBOL: u8 = b'-';

/// Fatal errors.
///
/// Rows that are malformed or rejected by the
/// [acceptance policy](filter::RecordFilter) are not errors; they are counted
/// in [ParseStats] and parsing continues.
#[derive(Debug, thiserror::Error)]
pub enum CoverageError {
    #[error("{path}: {count} malformed rows exceed the limit of {limit}, is this a PAF file with cs tags?")]
    TooManyMalformedRows { path: String, count: usize, limit: usize },

    #[error("query {query} aligns to target {target} which is not in the target sequences")]
    UnknownTarget { query: String, target: String },

    #[error("query {query} aligns to {target}:{start}-{end} past the target length {length}")]
    TargetOutOfBounds { query: String, target: String, start: usize, end: usize, length: usize },

    #[error("file {0} does not exist")]
    MissingFile(PathBuf),

    #[error("{tool} failed: {detail}")]
    ExternalToolFailure { tool: String, detail: String },

    #[error("fetching target sequences by accession is not implemented")]
    AccessionNotImplemented,

    #[error("number of columns must be at least 1")]
    InvalidColumns,

    #[error("{path}: {source}")]
    Fasta { path: String, source: needletail::errors::ParseError },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Alignment state of one target position covered by an alignment.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BaseState {
    Match,
    Mismatch,
}

impl BaseState {
    /// Symbol used in the pileup.
    pub fn symbol(&self) -> u8 {
        match self {
            BaseState::Match => b'=',
            BaseState::Mismatch => b'X',
        }
    }
}

/// An accepted alignment of a query onto a target.
///
/// Constructed by the [Parser](parser::Parser) from one PAF line and owned by
/// the [CoverageTarget] it was added to. `states` has exactly one entry per
/// position in `target_start..target_end`.
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AlignmentRecord {
    /// Name of the query sequence.
    pub query_id: String,
    /// Name of the target sequence.
    pub target_id: String,
    /// Relative strand, `+` or `-`.
    pub strand: char,
    /// Start of the aligned interval on the target (0-based, inclusive).
    pub target_start: usize,
    /// End of the aligned interval on the target (exclusive).
    pub target_end: usize,
    /// Per-base states in target coordinate order.
    pub states: Vec<BaseState>,
}

impl AlignmentRecord {
    pub fn len(
        &self,
    ) -> usize {
        self.target_end - self.target_start
    }

    pub fn is_empty(
        &self,
    ) -> bool {
        self.target_end == self.target_start
    }

    pub fn mismatches(
        &self,
    ) -> usize {
        self.states.iter().filter(|x| **x == BaseState::Mismatch).count()
    }

    /// True if the alignment covers any position in `start..end`.
    pub fn overlaps(
        &self,
        start: usize,
        end: usize,
    ) -> bool {
        self.target_start < end && start < self.target_end
    }

    /// Pileup symbol at target position `pos`, [GAP_SYMBOL] outside the alignment.
    pub fn symbol_at(
        &self,
        pos: usize,
    ) -> u8 {
        if pos < self.target_start || pos >= self.target_end {
            GAP_SYMBOL
        } else {
            self.states[pos - self.target_start].symbol()
        }
    }

    /// Full-length track over a target of length `target_len`.
    ///
    /// Padded with `target_start` gaps on the left and
    /// `target_len - target_end` gaps on the right.
    pub fn padded_track(
        &self,
        target_len: usize,
    ) -> Vec<u8> {
        let mut track: Vec<u8> = Vec::with_capacity(target_len);
        track.resize(self.target_start, GAP_SYMBOL);
        track.extend(self.states.iter().map(|x| x.symbol()));
        track.resize(target_len.max(self.target_end), GAP_SYMBOL);
        track
    }
}

/// Read alignments from [Read] and add the accepted ones to `targets`.
///
/// `source` names the input in log messages and errors.
///
/// Returns the row counts of the run. See
/// [parse_into_targets](parser::parse_into_targets) for the failure modes.
///
pub fn coverage_from_read<R: Read>(
    conn: &mut R,
    source: &str,
    targets: &mut Targets,
    opts: &ParseOptions,
) -> Result<ParseStats, CoverageError> {
    parser::parse_into_targets(conn, source, targets, opts)
}

/// Read alignments from a PAF file, gzip-compressed or not.
///
/// The file is closed before returning, also when parsing fails.
///
pub fn coverage_from_file<P: AsRef<Path>>(
    path: P,
    targets: &mut Targets,
    opts: &ParseOptions,
) -> Result<ParseStats, CoverageError> {
    let source = path.as_ref().to_string_lossy().to_string();
    let mut conn_in = parser::open_alignment_file(path.as_ref())?;
    parser::parse_into_targets(&mut conn_in, &source, targets, opts)
}

/// Write the coverage summary of every target to [Write].
///
/// If `columns` is given, each summary line is followed by the pileup of the
/// target split into blocks of `columns` positions.
///
pub fn report_to_write<W: Write>(
    targets: &Targets,
    columns: Option<usize>,
    conn_out: &mut W,
) -> Result<(), CoverageError> {
    for target in targets.values() {
        printer::format_report(target, columns, conn_out)?;
    }
    conn_out.flush()?;
    Ok(())
}
