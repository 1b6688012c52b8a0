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

//! Decoder for the short form of the minimap2 `cs` difference string.
//!
//! Only identical runs (`:<N>`) and substitutions (`*<ref><query>`) are
//! understood. Strings containing insertions (`+`), deletions (`-`) or
//! introns (`~`) must be rejected before decoding, see
//! [RecordFilter](crate::filter::RecordFilter).
//!
//! ## Usage
//!
//! ```rust
//! use simplecov::BaseState;
//! use simplecov::decoder::decode_cs;
//!
//! let got = decode_cs(":2*ac:1");
//!
//! assert_eq!(got, vec![BaseState::Match, BaseState::Match, BaseState::Mismatch, BaseState::Match]);
//! ```
//!

use crate::BaseState;

fn tokens(
    cs: &str,
) -> impl Iterator<Item = &str> {
    cs.split(|c: char| c == ':' || c == '*').filter(|token| !token.is_empty())
}

/// Decode a `cs` string into one [BaseState] per target base.
///
/// Tokens that parse as an integer are runs of matches, anything else is a
/// single substitution.
///
pub fn decode_cs(
    cs: &str,
) -> Vec<BaseState> {
    let mut states: Vec<BaseState> = Vec::new();
    for token in tokens(cs) {
        match token.parse::<usize>() {
            Ok(run) => states.resize(states.len() + run, BaseState::Match),
            Err(_) => states.push(BaseState::Mismatch),
        }
    }
    states
}

/// Number of target bases spanned by `cs` without decoding it.
///
/// Returns None if the total overflows [usize].
pub fn decoded_len(
    cs: &str,
) -> Option<usize> {
    tokens(cs).try_fold(0_usize, |len, token| {
        len.checked_add(token.parse::<usize>().unwrap_or(1))
    })
}

/// Number of substitutions in `cs`.
pub fn count_mismatches(
    cs: &str,
) -> usize {
    cs.matches('*').count()
}
