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
use bstr::ByteSlice;

use crate::AlignmentRecord;
use crate::decoder::decode_cs;
use crate::decoder::decoded_len;
use crate::filter::RecordFilter;
use crate::filter::RejectReason;
use crate::filter::Verdict;

/// What became of one line of input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LineOutcome {
    /// Empty or whitespace-only line.
    Blank,
    /// Line that could not be read as a PAF record with a `cs` tag.
    Malformed,
    /// Well-formed line rejected by the [RecordFilter].
    Dropped { query: String, target: String, reason: RejectReason },
    Accepted(AlignmentRecord),
}

/// Parse a line from a [PAF](https://github.com/lh3/miniasm/blob/master/PAF.md) file.
///
/// `line` may include the line terminator. Lines that are not valid UTF-8,
/// fail the [RecordFilter] as malformed, or whose `cs` string does not span
/// exactly the aligned target interval are [Malformed](LineOutcome::Malformed).
///
pub fn read_paf(
    line: &[u8],
    filter: &RecordFilter,
) -> LineOutcome {
    let line = line.trim_end_with(|c| c == '\n' || c == '\r');
    if line.trim().is_empty() {
        return LineOutcome::Blank
    }

    let Ok(line) = line.to_str() else {
        return LineOutcome::Malformed
    };
    let fields: Vec<&str> = line.split('\t').collect();

    match filter.check(&fields) {
        Verdict::Reject(reason) if reason.is_malformed() => LineOutcome::Malformed,
        Verdict::Reject(reason) => LineOutcome::Dropped {
            query: fields[0].to_string(),
            target: fields[5].to_string(),
            reason,
        },
        Verdict::Accept(paf) => {
            if decoded_len(paf.cs) != Some(paf.target_end - paf.target_start) {
                return LineOutcome::Malformed
            }
            LineOutcome::Accepted(AlignmentRecord {
                query_id: paf.query_id.to_string(),
                target_id: paf.target_id.to_string(),
                strand: paf.strand,
                target_start: paf.target_start,
                target_end: paf.target_end,
                states: decode_cs(paf.cs),
            })
        },
    }
}
