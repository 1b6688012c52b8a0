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

//! Read target and query sequences with [needletail].
//!
//! The id of a record is the first whitespace-delimited word of its header,
//! matching the sequence names minimap2 writes to the PAF file.
//!

use std::io::Read;
use std::path::Path;

use bstr::ByteSlice;
use log::info;
use log::warn;
use needletail::FastxReader;

use crate::CoverageError;
use crate::Targets;
use crate::target::CoverageTarget;

fn collect_targets(
    mut reader: Box<dyn FastxReader + '_>,
    source: &str,
) -> Result<Targets, CoverageError> {
    let mut targets = Targets::new();
    while let Some(record) = reader.next() {
        let record = record.map_err(|e| CoverageError::Fasta { path: source.to_string(), source: e })?;

        let header = record.id();
        let id = header.fields().next().unwrap_or_default().to_str_lossy().to_string();
        let name = header.to_str_lossy().to_string();
        let sequence = record.seq().into_owned();

        if sequence.is_empty() {
            warn!("Target {} in {} has no sequence", id, source);
        }

        let target = CoverageTarget::new(&id, &name, sequence);
        if targets.insert(id.clone(), target).is_some() {
            warn!("Target {} appears more than once in {}, keeping the last one", id, source);
        }
    }
    info!("Read {} targets from {}", targets.len(), source);
    Ok(targets)
}

/// Register one [CoverageTarget] per record in a FASTA or FASTQ file.
///
/// If an id appears more than once the last record replaces the earlier ones,
/// keeping the position of the first.
///
pub fn read_targets<P: AsRef<Path>>(
    path: P,
) -> Result<Targets, CoverageError> {
    let source = path.as_ref().to_string_lossy().to_string();
    if !path.as_ref().exists() {
        return Err(CoverageError::MissingFile(path.as_ref().to_path_buf()))
    }
    let reader = needletail::parse_fastx_file(path.as_ref()).map_err(|e| CoverageError::Fasta { path: source.clone(), source: e })?;
    collect_targets(reader, &source)
}

/// Register one [CoverageTarget] per record read from `conn`.
///
/// ## Usage
///
/// ```rust
/// use simplecov::fasta::targets_from_reader;
/// use std::io::Cursor;
///
/// let input = Cursor::new(b">chr1 test chromosome\nACGT\nACGT\n>plasmid\nTTTT\n".to_vec());
/// let targets = targets_from_reader(input, "mock.fasta").unwrap();
///
/// assert_eq!(targets.len(), 2);
/// assert_eq!(targets.get("chr1").unwrap().sequence(), b"ACGTACGT");
/// assert_eq!(targets.get("chr1").unwrap().name(), "chr1 test chromosome");
/// ```
///
pub fn targets_from_reader<'a, R: Read + Send + 'a>(
    conn: R,
    source: &str,
) -> Result<Targets, CoverageError> {
    let reader = needletail::parse_fastx_reader(conn).map_err(|e| CoverageError::Fasta { path: source.to_string(), source: e })?;
    collect_targets(reader, source)
}

/// Count the records in a FASTA or FASTQ file.
pub fn count_records<P: AsRef<Path>>(
    path: P,
) -> Result<usize, CoverageError> {
    let source = path.as_ref().to_string_lossy().to_string();
    let mut reader = needletail::parse_fastx_file(path.as_ref()).map_err(|e| CoverageError::Fasta { path: source.clone(), source: e })?;
    let mut count = 0;
    while let Some(record) = reader.next() {
        record.map_err(|e| CoverageError::Fasta { path: source.clone(), source: e })?;
        count += 1;
    }
    Ok(count)
}
