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

//! Printers for the coverage of a [CoverageTarget].
//!
//!   - [summary] formats the one line coverage summary.
//!   - [pileup] formats the per-base view of all alignments to a target.
//!
//! ## Usage
//!
//! ```rust
//! use simplecov::{AlignmentRecord, BaseState};
//! use simplecov::printer::format_report;
//! use simplecov::target::CoverageTarget;
//!
//! let mut target = CoverageTarget::new("t1", "t1", b"ACGTACGTAC".to_vec());
//! target.add_match(AlignmentRecord{ query_id: "q1".to_string(), target_id: "t1".to_string(), strand: '+', target_start: 2, target_end: 5, states: vec![BaseState::Match, BaseState::Mismatch, BaseState::Match] });
//!
//! let mut output: Vec<u8> = Vec::new();
//! format_report(&target, Some(80), &mut output).unwrap();
//!
//! // Expect this plain text output
//! //   Total coverage for t1: 3/10 bp covered (30.00%), Avg: 0.30
//! //   Coverage map for target t1:
//! //   --=X=-----
//! //   0011100000
//! //   ACGTACGTAC
//! //
//! let mut expected: Vec<u8> = Vec::new();
//! expected.append(&mut b"Total coverage for t1: 3/10 bp covered (30.00%), Avg: 0.30\n".to_vec());
//! expected.append(&mut b"Coverage map for target t1:\n".to_vec());
//! expected.append(&mut b"--=X=-----\n0011100000\nACGTACGTAC\n\n".to_vec());
//!
//! assert_eq!(output, expected);
//! ```
//!

pub mod pileup;
pub mod summary;

use crate::CoverageError;
use crate::target::CoverageTarget;

use pileup::format_pileup;
use summary::format_summary_line;

use std::io::Write;

/// Write the summary line of `target`, followed by its pileup if `columns` is given.
pub fn format_report<W: Write>(
    target: &CoverageTarget,
    columns: Option<usize>,
    conn: &mut W,
) -> Result<(), CoverageError> {
    format_summary_line(target, conn)?;
    if let Some(columns) = columns {
        format_pileup(target, columns, conn)?;
    }
    Ok(())
}
