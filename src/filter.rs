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

//! Acceptance policy for PAF alignment rows.
//!
//! A row is checked against the following rules, in this order, and the first
//! rule that fails decides the [RejectReason]:
//!
//!   1. [MalformedRow](RejectReason::MalformedRow): fewer than 12 columns,
//!      unparseable coordinates, or an empty or out of range target interval.
//!   2. [ContainsIndel](RejectReason::ContainsIndel): the `cs` string contains
//!      an insertion, deletion or intron.
//!   3. [PartialQueryMapping](RejectReason::PartialQueryMapping): the alignment
//!      does not span the whole query.
//!   4. [TooManyMismatches](RejectReason::TooManyMismatches): more substitutions
//!      than allowed.
//!
//! PAF columns:
//! ```text
//! 0    Query name
//! 1    Query length
//! 2    Query start (0-based)
//! 3    Query end
//! 4    Relative strand (+ or -)
//! 5    Target name
//! 6    Target length
//! 7    Target start
//! 8    Target end
//! 9    Number of matching bases
//! 10   Alignment block length
//! 11   Mapping quality
//! 12+  SAM-like tags, the last one is the cs tag
//! ```
//!

use crate::decoder::count_mismatches;

/// Minimum number of tab-separated columns on a PAF line.
pub const MIN_FIELDS: usize = 12;

/// Length of the `cs:Z:` prefix on the last column.
pub const CS_PREFIX_LEN: usize = 5;

const INDEL_MARKERS: [char; 3] = ['+', '-', '~'];

/// Why a row did not contribute to the coverage.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RejectReason {
    MalformedRow,
    ContainsIndel,
    PartialQueryMapping,
    TooManyMismatches,
}

impl RejectReason {
    /// Malformed rows count towards the malformed row limit, the rest are
    /// dropped by policy.
    pub fn is_malformed(&self) -> bool {
        *self == RejectReason::MalformedRow
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            RejectReason::MalformedRow => write!(f, "malformed row"),
            RejectReason::ContainsIndel => write!(f, "alignment contains insertions or deletions"),
            RejectReason::PartialQueryMapping => write!(f, "query is not aligned in its entirety"),
            RejectReason::TooManyMismatches => write!(f, "too many mismatches"),
        }
    }
}

/// Columns of a PAF line used for coverage.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PafLine<'a> {
    pub query_id: &'a str,
    pub query_len: usize,
    pub query_start: usize,
    pub query_end: usize,
    pub strand: char,
    pub target_id: &'a str,
    pub target_len: usize,
    pub target_start: usize,
    pub target_end: usize,
    /// The `cs` string without its `cs:Z:` prefix.
    pub cs: &'a str,
}

impl<'a> PafLine<'a> {
    /// Read the columns from a split line.
    ///
    /// Returns None if the line is malformed.
    pub fn from_fields(
        fields: &[&'a str],
    ) -> Option<Self> {
        if fields.len() < MIN_FIELDS {
            return None
        }

        let strand = match fields[4] {
            "+" => '+',
            "-" => '-',
            _ => return None,
        };

        let line = PafLine {
            query_id: fields[0],
            query_len: fields[1].parse().ok()?,
            query_start: fields[2].parse().ok()?,
            query_end: fields[3].parse().ok()?,
            strand,
            target_id: fields[5],
            target_len: fields[6].parse().ok()?,
            target_start: fields[7].parse().ok()?,
            target_end: fields[8].parse().ok()?,
            cs: fields[fields.len() - 1].get(CS_PREFIX_LEN..).unwrap_or(""),
        };

        if line.target_start >= line.target_end || line.target_end > line.target_len {
            return None
        }

        Some(line)
    }
}

/// Outcome of checking a row against the [RecordFilter].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Verdict<'a> {
    Accept(PafLine<'a>),
    Reject(RejectReason),
}

/// Acceptance policy for alignment rows.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RecordFilter {
    /// Largest number of substitutions an accepted alignment may contain.
    pub max_mismatches: usize,
}

impl RecordFilter {
    pub fn new(
        max_mismatches: usize,
    ) -> Self {
        RecordFilter { max_mismatches }
    }

    /// Check the tab-separated `fields` of one row.
    pub fn check<'a>(
        &self,
        fields: &[&'a str],
    ) -> Verdict<'a> {
        let Some(line) = PafLine::from_fields(fields) else {
            return Verdict::Reject(RejectReason::MalformedRow)
        };

        if line.cs.contains(INDEL_MARKERS) {
            return Verdict::Reject(RejectReason::ContainsIndel)
        }

        if line.query_start != 0 || line.query_end != line.query_len {
            return Verdict::Reject(RejectReason::PartialQueryMapping)
        }

        if count_mismatches(line.cs) > self.max_mismatches {
            return Verdict::Reject(RejectReason::TooManyMismatches)
        }

        Verdict::Accept(line)
    }
}
