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

use crate::CoverageError;
use crate::target::CoverageTarget;

/// Pileup of a target split into blocks of `columns` positions.
///
/// Yields the formatted bytes of one block at a time. The first block is
/// preceded by a `Coverage map for target <id>:` line.
///
/// A block consists of
///   - one track per alignment that covers at least one position in the
///     block, in the order the alignments were added to the target,
///   - the depth at each position,
///   - the target sequence,
///   - an empty line.
///
/// Tracks show `=` for matches, `X` for mismatches and `-` outside the
/// alignment. The last block is narrower if the target length is not a
/// multiple of `columns`.
///
pub struct Pileup<'a> {
    target: &'a CoverageTarget,
    columns: usize,
    block_start: usize,
    header_done: bool,
}

impl<'a> Pileup<'a> {
    pub fn new(
        target: &'a CoverageTarget,
        columns: usize,
    ) -> Result<Self, CoverageError> {
        if columns == 0 {
            return Err(CoverageError::InvalidColumns)
        }
        Ok(Pileup { target, columns, block_start: 0, header_done: false })
    }

    fn format_block(
        &self,
        start: usize,
        end: usize,
        out: &mut Vec<u8>,
    ) {
        self.target.matches().iter().filter(|aln| aln.overlaps(start, end)).for_each(|aln| {
            out.extend((start..end).map(|pos| aln.symbol_at(pos)));
            out.push(b'\n');
        });

        self.target.depth()[start..end].iter().for_each(|depth| {
            out.extend_from_slice(depth.to_string().as_bytes());
        });
        out.push(b'\n');

        out.extend_from_slice(&self.target.sequence()[start..end]);
        out.extend_from_slice(b"\n\n");
    }
}

impl Iterator for Pileup<'_> {
    type Item = Vec<u8>;

    fn next(
        &mut self,
    ) -> Option<Vec<u8>> {
        let mut out: Vec<u8> = Vec::new();
        if !self.header_done {
            out.extend_from_slice(format!("Coverage map for target {}:\n", self.target.id()).as_bytes());
            self.header_done = true;
            if self.target.is_empty() {
                return Some(out)
            }
        }

        if self.block_start >= self.target.len() {
            return None
        }

        let block_end = (self.block_start + self.columns).min(self.target.len());
        self.format_block(self.block_start, block_end, &mut out);
        self.block_start = block_end;

        Some(out)
    }
}

/// Write the pileup of `target` in blocks of `columns` to `conn`.
pub fn format_pileup<W: Write>(
    target: &CoverageTarget,
    columns: usize,
    conn: &mut W,
) -> Result<(), CoverageError> {
    for block in Pileup::new(target, columns)? {
        conn.write_all(&block)?;
    }
    Ok(())
}

// Tests
#[cfg(test)]
mod tests {
    use crate::{AlignmentRecord, BaseState};

    fn record(
        query_id: &str,
        start: usize,
        states: &[BaseState],
    ) -> AlignmentRecord {
        AlignmentRecord{ query_id: query_id.to_string(), target_id: "t1".to_string(), strand: '+', target_start: start, target_end: start + states.len(), states: states.to_vec() }
    }

    #[test]
    fn format_pileup_skips_alignments_outside_block() {
        use crate::target::CoverageTarget;
        use super::format_pileup;
        use crate::BaseState::{Match, Mismatch};

        let mut target = CoverageTarget::new("t1", "t1", b"AACCGGTTAC".to_vec());
        target.add_match(record("q1", 0, &[Match, Match, Mismatch]));
        target.add_match(record("q2", 6, &[Match, Match, Match, Match]));

        let mut got: Vec<u8> = Vec::new();
        format_pileup(&target, 4, &mut got).unwrap();

        let mut expected: Vec<u8> = Vec::new();
        expected.append(&mut b"Coverage map for target t1:\n".to_vec());
        expected.append(&mut b"==X-\n".to_vec());
        expected.append(&mut b"1110\n".to_vec());
        expected.append(&mut b"AACC\n\n".to_vec());
        expected.append(&mut b"--==\n".to_vec());
        expected.append(&mut b"0011\n".to_vec());
        expected.append(&mut b"GGTT\n\n".to_vec());
        expected.append(&mut b"==\n".to_vec());
        expected.append(&mut b"11\n".to_vec());
        expected.append(&mut b"AC\n\n".to_vec());

        assert_eq!(String::from_utf8(got).unwrap(), String::from_utf8(expected).unwrap());
    }

    #[test]
    fn format_pileup_track_order_is_insertion_order() {
        use crate::target::CoverageTarget;
        use super::format_pileup;
        use crate::BaseState::Match;

        let mut target = CoverageTarget::new("t1", "t1", b"ACGTAC".to_vec());
        target.add_match(record("q1", 3, &[Match; 3]));
        target.add_match(record("q2", 0, &[Match; 2]));

        let mut got: Vec<u8> = Vec::new();
        format_pileup(&target, 10, &mut got).unwrap();

        let expected: Vec<u8> = b"Coverage map for target t1:\n---===\n==----\n110111\nACGTAC\n\n".to_vec();

        assert_eq!(got, expected);
    }

    #[test]
    fn format_pileup_multi_digit_depth() {
        use crate::target::CoverageTarget;
        use super::Pileup;
        use crate::BaseState::Match;

        let mut target = CoverageTarget::new("t1", "t1", b"AC".to_vec());
        target.add_matches((0..12).map(|idx| record(&format!("q{}", idx), 0, &[Match])));

        let blocks: Vec<Vec<u8>> = Pileup::new(&target, 2).unwrap().collect();

        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].ends_with(b"=-\n120\nAC\n\n"));
    }

    #[test]
    fn pileup_empty_target_only_header() {
        use crate::target::CoverageTarget;
        use super::Pileup;

        let target = CoverageTarget::new("t1", "t1", Vec::new());
        let blocks: Vec<Vec<u8>> = Pileup::new(&target, 80).unwrap().collect();

        assert_eq!(blocks, vec![b"Coverage map for target t1:\n".to_vec()]);
    }

    #[test]
    fn pileup_zero_columns() {
        use crate::CoverageError;
        use crate::target::CoverageTarget;
        use super::Pileup;

        let target = CoverageTarget::new("t1", "t1", b"ACGT".to_vec());

        assert!(matches!(Pileup::new(&target, 0), Err(CoverageError::InvalidColumns)));
    }
}
