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

//! Streaming parser for minimap2 PAF output.
//!
//! [Parser] reads one line at a time from a [Read], checks it against the
//! [RecordFilter] and yields the accepted lines as [AlignmentRecord]s. Rows
//! that are rejected are counted in [ParseStats] and skipped.
//!
//! Sporadic malformed rows are tolerated, but once more than
//! [malformed_limit](ParseOptions::malformed_limit) rows have been malformed
//! the parser yields [TooManyMalformedRows](CoverageError::TooManyMalformedRows)
//! and stops. This stops a wrong kind of file from being processed to the end.
//!
//! ## Usage
//!
//! ```rust
//! use simplecov::parser::{Parser, ParseOptions};
//! use std::io::Cursor;
//!
//! let mut data: Vec<u8> = Vec::new();
//! data.append(&mut b"q1\t4\t0\t4\t+\tt1\t100\t10\t14\t4\t4\t60\tcs:Z::4\n".to_vec());
//! data.append(&mut b"q2\t4\t1\t4\t+\tt1\t100\t20\t23\t3\t3\t60\tcs:Z::3\n".to_vec());
//! data.append(&mut b"not a paf line\n".to_vec());
//! let mut input = Cursor::new(data);
//!
//! let mut parser = Parser::new(&mut input, "mock.paf", &ParseOptions::default());
//! let records = parser.by_ref().collect::<Result<Vec<_>, _>>().unwrap();
//!
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].query_id, "q1");
//!
//! let stats = parser.stats();
//! assert_eq!((stats.rows, stats.accepted, stats.dropped, stats.malformed), (3, 1, 1, 1));
//! ```
//!

pub mod paf;

use crate::AlignmentRecord;
use crate::CoverageError;
use crate::Targets;
use crate::filter::RecordFilter;
use crate::filter::RejectReason;
use crate::parser::paf::read_paf;
use crate::parser::paf::LineOutcome;

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

use flate2::read::MultiGzDecoder;
use log::debug;
use log::info;
use log::warn;

/// Default number of substitutions allowed in an accepted alignment.
pub const DEFAULT_MAX_MISMATCHES: usize = 8;

/// Default number of malformed rows tolerated before giving up.
pub const MALFORMED_ROW_LIMIT: usize = 100;

/// Parser settings.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ParseOptions {
    /// Largest number of substitutions in an accepted alignment.
    pub max_mismatches: usize,
    /// Largest number of malformed rows that does not abort parsing.
    pub malformed_limit: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_mismatches: DEFAULT_MAX_MISMATCHES,
            malformed_limit: MALFORMED_ROW_LIMIT,
        }
    }
}

/// Row counts from one parsing run.
///
/// `rows` counts every non-blank line; each of them is either `accepted`,
/// `malformed` or `dropped`. `dropped` is further broken down by
/// [RejectReason].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ParseStats {
    pub rows: usize,
    pub accepted: usize,
    pub malformed: usize,
    pub dropped: usize,
    pub indel: usize,
    pub partial_query: usize,
    pub too_many_mismatches: usize,
}

impl ParseStats {
    fn count_dropped(
        &mut self,
        reason: RejectReason,
    ) {
        self.dropped += 1;
        match reason {
            RejectReason::ContainsIndel => self.indel += 1,
            RejectReason::PartialQueryMapping => self.partial_query += 1,
            RejectReason::TooManyMismatches => self.too_many_mismatches += 1,
            RejectReason::MalformedRow => unreachable!("malformed rows are not dropped"),
        }
    }

    /// Log the counts for `source`.
    pub fn log(
        &self,
        source: &str,
    ) {
        info!("Processed {} rows from {}: {} accepted, {} malformed, {} dropped", self.rows, source, self.accepted, self.malformed, self.dropped);
        info!("Dropped {} with indels, {} with partial query mapping, {} with too many mismatches", self.indel, self.partial_query, self.too_many_mismatches);
        if self.malformed > 0 {
            warn!("Skipped {} malformed rows in {}", self.malformed, source);
        }
    }
}

pub struct Parser<'a, R: Read> {
    reader: BufReader<&'a mut R>,
    buf: Vec<u8>,
    source: String,

    filter: RecordFilter,
    malformed_limit: usize,

    stats: ParseStats,
    done: bool,
}

impl<'a, R: Read> Parser<'a, R> {
    /// Parse PAF lines from `conn`, naming it `source` in logs and errors.
    pub fn new(
        conn: &'a mut R,
        source: &str,
        opts: &ParseOptions,
    ) -> Self {
        Parser {
            reader: BufReader::new(conn),
            buf: Vec::new(),
            source: source.to_string(),
            filter: RecordFilter::new(opts.max_mismatches),
            malformed_limit: opts.malformed_limit,
            stats: ParseStats::default(),
            done: false,
        }
    }
}

impl<R: Read> Parser<'_, R> {
    /// Counts for the lines consumed so far.
    pub fn stats(
        &self,
    ) -> &ParseStats {
        &self.stats
    }

    pub fn source(
        &self,
    ) -> &str {
        &self.source
    }
}

impl<R: Read> Iterator for Parser<'_, R> {
    type Item = Result<AlignmentRecord, CoverageError>;

    fn next(
        &mut self,
    ) -> Option<Result<AlignmentRecord, CoverageError>> {
        while !self.done {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {},
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()))
                },
            }
            if self.done {
                break;
            }

            match read_paf(&self.buf, &self.filter) {
                LineOutcome::Blank => {},
                LineOutcome::Malformed => {
                    self.stats.rows += 1;
                    self.stats.malformed += 1;
                    warn!("Malformed row {} in {}", self.stats.rows, self.source);
                    if self.stats.malformed > self.malformed_limit {
                        self.done = true;
                        return Some(Err(CoverageError::TooManyMalformedRows {
                            path: self.source.clone(),
                            count: self.stats.malformed,
                            limit: self.malformed_limit,
                        }))
                    }
                },
                LineOutcome::Dropped { query, target, reason } => {
                    self.stats.rows += 1;
                    self.stats.count_dropped(reason);
                    info!("Dropped alignment of {} to {}: {}", query, target, reason);
                },
                LineOutcome::Accepted(record) => {
                    self.stats.rows += 1;
                    self.stats.accepted += 1;
                    debug!("Accepted alignment of {} to {}:{}-{}", record.query_id, record.target_id, record.target_start, record.target_end);
                    return Some(Ok(record))
                },
            }
        }
        None
    }
}

/// Add an accepted record to the target it aligns to.
///
/// Fails with [UnknownTarget](CoverageError::UnknownTarget) if `targets`
/// has no target with the record's id, and with
/// [TargetOutOfBounds](CoverageError::TargetOutOfBounds) if the record
/// extends past the end of the target.
///
pub fn route_record(
    targets: &mut Targets,
    record: AlignmentRecord,
) -> Result<(), CoverageError> {
    let Some(target) = targets.get_mut(&record.target_id) else {
        return Err(CoverageError::UnknownTarget {
            query: record.query_id,
            target: record.target_id,
        })
    };

    if record.target_end > target.len() {
        return Err(CoverageError::TargetOutOfBounds {
            query: record.query_id,
            target: record.target_id,
            start: record.target_start,
            end: record.target_end,
            length: target.len(),
        })
    }

    target.add_match(record);
    Ok(())
}

/// Parse all lines in `conn` and add the accepted records to `targets`.
///
/// Row counts are logged when parsing ends, whether it succeeded or not.
///
/// ## Errors
///
/// Stops at the first of:
///   - [TooManyMalformedRows](CoverageError::TooManyMalformedRows)
///   - [UnknownTarget](CoverageError::UnknownTarget)
///   - [TargetOutOfBounds](CoverageError::TargetOutOfBounds)
///   - [Io](CoverageError::Io) from reading `conn`.
///
pub fn parse_into_targets<R: Read>(
    conn: &mut R,
    source: &str,
    targets: &mut Targets,
    opts: &ParseOptions,
) -> Result<ParseStats, CoverageError> {
    let mut parser = Parser::new(conn, source, opts);
    let res = parser.by_ref().try_for_each(|record| route_record(targets, record?));

    let stats = parser.stats().clone();
    stats.log(source);

    res.map(|_| stats)
}

/// Open an alignment file for reading, decompressing it if the name ends in `.gz`.
pub fn open_alignment_file(
    path: &Path,
) -> Result<Box<dyn Read>, CoverageError> {
    if !path.exists() {
        return Err(CoverageError::MissingFile(path.to_path_buf()))
    }

    let conn = File::open(path)?;
    let is_gz = path.extension().is_some_and(|ext| ext == "gz");

    if is_gz {
        Ok(Box::new(MultiGzDecoder::new(conn)))
    } else {
        Ok(Box::new(conn))
    }
}

// Tests
#[cfg(test)]
mod tests {
    use crate::Targets;
    use crate::target::CoverageTarget;

    fn mock_targets() -> Targets {
        let mut targets = Targets::new();
        targets.insert("t1".to_string(), CoverageTarget::new("t1", "t1", "ACGT".repeat(25).into_bytes()));
        targets.insert("t2".to_string(), CoverageTarget::new("t2", "t2", "TTGCA".repeat(4).into_bytes()));
        targets
    }

    fn malformed_rows(
        n: usize,
    ) -> Vec<u8> {
        let mut data: Vec<u8> = Vec::new();
        for idx in 0..n {
            data.append(&mut format!("read{}\t150\tnot a paf row\n", idx).into_bytes());
        }
        data
    }

    #[test]
    fn parser_yields_accepted_in_order() {
        use super::{Parser, ParseOptions};
        use std::io::Cursor;

        let mut data: Vec<u8> = Vec::new();
        data.append(&mut b"q1\t4\t0\t4\t+\tt1\t100\t10\t14\t4\t4\t60\tcs:Z::4\n".to_vec());
        data.append(&mut b"q2\t4\t0\t4\t-\tt2\t20\t0\t4\t4\t4\t60\tcs:Z::4\n".to_vec());
        data.append(&mut b"q3\t4\t0\t4\t+\tt1\t100\t0\t4\t4\t4\t60\tcs:Z::4\n".to_vec());
        let mut input = Cursor::new(data);

        let parser = Parser::new(&mut input, "mock.paf", &ParseOptions::default());
        let got: Vec<String> = parser.map(|x| x.unwrap().query_id).collect();

        assert_eq!(got, vec!["q1".to_string(), "q2".to_string(), "q3".to_string()]);
    }

    #[test]
    fn parser_counts_each_drop_reason() {
        use super::{Parser, ParseOptions, ParseStats};
        use std::io::Cursor;

        let mut data: Vec<u8> = Vec::new();
        data.append(&mut b"q1\t6\t0\t6\t+\tt1\t100\t10\t14\t4\t6\t60\tcs:Z::2+ac:2\n".to_vec());
        data.append(&mut b"q2\t5\t0\t4\t+\tt1\t100\t10\t14\t4\t4\t60\tcs:Z::4\n".to_vec());
        data.append(&mut b"q3\t4\t0\t4\t+\tt1\t100\t10\t14\t2\t4\t60\tcs:Z:*ac*ac:2\n".to_vec());
        data.append(&mut b"\n".to_vec());
        data.append(&mut b"q4\t4\t0\t4\t+\tt1\t100\t10\t14\t4\t4\t60\tcs:Z::4\n".to_vec());
        let mut input = Cursor::new(data);

        let opts = ParseOptions{ max_mismatches: 1, ..Default::default() };
        let mut parser = Parser::new(&mut input, "mock.paf", &opts);
        let accepted = parser.by_ref().count();

        let expected = ParseStats{ rows: 4, accepted: 1, malformed: 0, dropped: 3, indel: 1, partial_query: 1, too_many_mismatches: 1 };

        assert_eq!(accepted, 1);
        assert_eq!(parser.stats(), &expected);
    }

    #[test]
    fn parse_into_targets_routes_by_target_id() {
        use super::{parse_into_targets, ParseOptions};
        use std::io::Cursor;

        let mut data: Vec<u8> = Vec::new();
        data.append(&mut b"q1\t4\t0\t4\t+\tt2\t20\t2\t6\t4\t4\t60\tcs:Z::4\n".to_vec());
        data.append(&mut b"q2\t4\t0\t4\t+\tt1\t100\t96\t100\t4\t4\t60\tcs:Z::4\n".to_vec());
        let mut input = Cursor::new(data);

        let mut targets = mock_targets();
        let stats = parse_into_targets(&mut input, "mock.paf", &mut targets, &ParseOptions::default()).unwrap();

        assert_eq!(stats.accepted, 2);
        assert_eq!(targets.get("t1").unwrap().matches().len(), 1);
        assert_eq!(targets.get("t2").unwrap().matches()[0].query_id, "q1");
        assert_eq!(targets.get("t2").unwrap().depth()[0..7], [0, 0, 1, 1, 1, 1, 0]);
        assert_eq!(targets.get("t1").unwrap().depth()[95..100], [0, 1, 1, 1, 1]);
    }

    #[test]
    fn parse_into_targets_unknown_target() {
        use super::{parse_into_targets, ParseOptions};
        use crate::CoverageError;
        use std::io::Cursor;

        let data: Vec<u8> = b"q1\t4\t0\t4\t+\tplasmid\t20\t2\t6\t4\t4\t60\tcs:Z::4\n".to_vec();
        let mut input = Cursor::new(data);

        let mut targets = mock_targets();
        let got = parse_into_targets(&mut input, "mock.paf", &mut targets, &ParseOptions::default());

        assert!(matches!(got, Err(CoverageError::UnknownTarget{ ref query, ref target }) if query == "q1" && target == "plasmid"));
    }

    #[test]
    fn parse_into_targets_past_target_end() {
        use super::{parse_into_targets, ParseOptions};
        use crate::CoverageError;
        use std::io::Cursor;

        // The PAF row claims t2 is longer than the registered sequence.
        let data: Vec<u8> = b"q1\t4\t0\t4\t+\tt2\t40\t30\t34\t4\t4\t60\tcs:Z::4\n".to_vec();
        let mut input = Cursor::new(data);

        let mut targets = mock_targets();
        let got = parse_into_targets(&mut input, "mock.paf", &mut targets, &ParseOptions::default());

        assert!(matches!(got, Err(CoverageError::TargetOutOfBounds{ end: 34, length: 20, .. })));
        assert!(targets.get("t2").unwrap().matches().is_empty());
    }

    #[test]
    fn malformed_limit_not_exceeded() {
        use super::{parse_into_targets, ParseOptions};
        use std::io::Cursor;

        let mut data = malformed_rows(100);
        data.append(&mut b"q1\t4\t0\t4\t+\tt1\t100\t10\t14\t4\t4\t60\tcs:Z::4\n".to_vec());
        let mut input = Cursor::new(data);

        let mut targets = mock_targets();
        let stats = parse_into_targets(&mut input, "mock.paf", &mut targets, &ParseOptions::default()).unwrap();

        assert_eq!(stats.malformed, 100);
        assert_eq!(stats.rows, 101);
        assert_eq!(stats.accepted, 1);
    }

    #[test]
    fn malformed_limit_exceeded_aborts() {
        use super::{parse_into_targets, ParseOptions};
        use crate::CoverageError;
        use std::io::Cursor;

        let mut data = malformed_rows(101);
        data.append(&mut b"q1\t4\t0\t4\t+\tt1\t100\t10\t14\t4\t4\t60\tcs:Z::4\n".to_vec());
        let mut input = Cursor::new(data);

        let mut targets = mock_targets();
        let got = parse_into_targets(&mut input, "wrong_format.sam", &mut targets, &ParseOptions::default());

        assert!(matches!(got, Err(CoverageError::TooManyMalformedRows{ ref path, count: 101, limit: 100 }) if path == "wrong_format.sam"));
        assert!(targets.get("t1").unwrap().matches().is_empty());
    }

    #[test]
    fn parser_stops_after_abort() {
        use super::{Parser, ParseOptions};
        use std::io::Cursor;

        let mut data = malformed_rows(3);
        data.append(&mut b"q1\t4\t0\t4\t+\tt1\t100\t10\t14\t4\t4\t60\tcs:Z::4\n".to_vec());
        let mut input = Cursor::new(data);

        let opts = ParseOptions{ malformed_limit: 2, ..Default::default() };
        let mut parser = Parser::new(&mut input, "mock.paf", &opts);

        assert!(parser.next().unwrap().is_err());
        assert!(parser.next().is_none());
        assert_eq!(parser.stats().malformed, 3);
    }

    #[test]
    fn open_alignment_file_missing() {
        use super::open_alignment_file;
        use crate::CoverageError;
        use std::path::Path;

        let got = open_alignment_file(Path::new("/nonexistent/simplecov/alignments.paf"));

        assert!(matches!(got, Err(CoverageError::MissingFile(_))));
    }

    #[test]
    fn open_alignment_file_gz() {
        use super::{open_alignment_file, parse_into_targets, ParseOptions};
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let path = std::env::temp_dir().join(format!("simplecov-open-{}.paf.gz", std::process::id()));
        let mut encoder = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"q1\t4\t0\t4\t+\tt1\t100\t10\t14\t4\t4\t60\tcs:Z::4\n").unwrap();
        encoder.finish().unwrap();

        let mut conn_in = open_alignment_file(&path).unwrap();
        let mut targets = mock_targets();
        let stats = parse_into_targets(&mut conn_in, "mock.paf.gz", &mut targets, &ParseOptions::default()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(stats.accepted, 1);
        assert_eq!(targets.get("t1").unwrap().depth()[10..14], [1, 1, 1, 1]);
    }
}
