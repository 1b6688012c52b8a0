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
use crate::AlignmentRecord;

/// Coverage of one target sequence.
///
/// Holds the number of accepted alignments covering each position of the
/// target and the alignments themselves in the order they were added. The
/// depth array is sized when the target is created and only changes through
/// [add_match](CoverageTarget::add_match).
///
/// ## Usage
///
/// ```rust
/// use simplecov::{AlignmentRecord, BaseState};
/// use simplecov::target::CoverageTarget;
///
/// let mut target = CoverageTarget::new("t1", "t1 test sequence", b"ACGTACGTAC".to_vec());
///
/// let record = AlignmentRecord{ query_id: "q1".to_string(), target_id: "t1".to_string(), strand: '+', target_start: 2, target_end: 5, states: vec![BaseState::Match; 3] };
/// target.add_match(record);
///
/// assert_eq!(target.depth(), &[0, 0, 1, 1, 1, 0, 0, 0, 0, 0]);
/// assert_eq!(target.matches().len(), 1);
/// ```
///
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CoverageTarget {
    id: String,
    name: String,
    sequence: Vec<u8>,
    depth: Vec<u32>,
    matches: Vec<AlignmentRecord>,
}

impl CoverageTarget {
    pub fn new(
        id: &str,
        name: &str,
        sequence: Vec<u8>,
    ) -> Self {
        let depth: Vec<u32> = vec![0; sequence.len()];
        CoverageTarget {
            id: id.to_string(),
            name: name.to_string(),
            sequence,
            depth,
            matches: Vec::new(),
        }
    }

    pub fn id(
        &self,
    ) -> &str {
        &self.id
    }

    pub fn name(
        &self,
    ) -> &str {
        &self.name
    }

    pub fn sequence(
        &self,
    ) -> &[u8] {
        &self.sequence
    }

    pub fn len(
        &self,
    ) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(
        &self,
    ) -> bool {
        self.sequence.is_empty()
    }

    /// Number of accepted alignments covering each position.
    pub fn depth(
        &self,
    ) -> &[u32] {
        &self.depth
    }

    /// Accepted alignments in the order they were added.
    pub fn matches(
        &self,
    ) -> &[AlignmentRecord] {
        &self.matches
    }

    /// Add one alignment and increment the depth over its interval.
    ///
    /// The caller guarantees that `record.target_end` is within the target;
    /// the [Parser](crate::parser::Parser) checks this before routing.
    ///
    pub fn add_match(
        &mut self,
        record: AlignmentRecord,
    ) {
        debug_assert!(record.target_end <= self.depth.len());
        self.depth[record.target_start..record.target_end].iter_mut().for_each(|x| *x += 1);
        self.matches.push(record);
    }

    /// Add alignments one at a time with [add_match](CoverageTarget::add_match).
    pub fn add_matches<I: IntoIterator<Item = AlignmentRecord>>(
        &mut self,
        records: I,
    ) {
        records.into_iter().for_each(|record| self.add_match(record));
    }
}
