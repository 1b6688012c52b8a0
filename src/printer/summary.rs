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
use std::io::Write;

use crate::target::CoverageTarget;

/// Coverage statistics of one target.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub id: String,
    /// Positions with depth > 0.
    pub covered: usize,
    pub length: usize,
    /// `covered / length`.
    pub coverage_fraction: f64,
    /// Mean depth over all positions.
    pub average_depth: f64,
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Total coverage for {}: {}/{} bp covered ({:.2}%), Avg: {:.2}",
               self.id, self.covered, self.length, self.coverage_fraction * 100.0, self.average_depth)
    }
}

/// Compute the [Summary] of `target`.
///
/// An empty target has zero coverage and zero average depth.
///
pub fn summarize(
    target: &CoverageTarget,
) -> Summary {
    let covered = target.depth().iter().filter(|x| **x > 0).count();
    let total: u64 = target.depth().iter().map(|x| *x as u64).sum();

    let (coverage_fraction, average_depth) = if target.is_empty() {
        (0.0, 0.0)
    } else {
        (covered as f64 / target.len() as f64, total as f64 / target.len() as f64)
    };

    Summary {
        id: target.id().to_string(),
        covered,
        length: target.len(),
        coverage_fraction,
        average_depth,
    }
}

/// Write the summary line of `target` to `conn`.
pub fn format_summary_line<W: Write>(
    target: &CoverageTarget,
    conn: &mut W,
) -> Result<(), std::io::Error> {
    writeln!(conn, "{}", summarize(target))
}
