// seula: Consolidate read alignments into per-read classification reports.
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

//! seula is a library and a command-line client for:
//!
//!   - Consolidating per-read alignments from minimap2 into a single
//!     classification per read.
//!   - Annotating each classification with attributes and coordinate regions
//!     of the mapped reference sequence.
//!   - Summarising mapping rates over a sequencing run.
//!
//! The input is [PAF](https://github.com/lh3/miniasm/blob/master/PAF.md)
//! formatted alignments produced with the minimap2 `--cs` flag, sorted so
//! that alignments of the same read are on consecutive lines. The output is
//! a CSV report with one row per read.
//!
//! A read that aligned to more than one place is reported with the target
//! name `?`, and a read that aligned nowhere with the target name `*`.
//! Alignments whose identity over the aligned bases falls below a
//! configurable threshold are demoted to unmapped.
//!
//! ## Usage
//!
//! ### Command line
//!
//! The seula CLI supports the following subcommand:
//!   - `seula report` consolidate a PAF file into a per-read CSV report.
//!
//! Note that `report` needs access to the .fastq file the reads were aligned
//! from, because the read header comments carry the sequencing start time and
//! the demultiplexed barcode that are copied into the report.
//!
//! ### Rust API
//!
//! [report_from_read_to_write] processes an entire PAF stream from a [Read]
//! into CSV rows on a [Write]. For use cases requiring access to a single
//! record at a time, [read_alignment](parser::read_alignment) parses one PAF
//! line and [Reconciler](reconcile::Reconciler) consolidates the parsed
//! records one by one.
//!

use std::io::BufRead;
use std::io::Read;
use std::io::Write;

use crate::annotation::ReadMetadata;
use crate::annotation::ReferenceAnnotations;
use crate::options::ReferenceOptions;
use crate::reconcile::Reconciler;
use crate::reconcile::RunCounters;

pub mod annotation;
pub mod identity;
pub mod options;
pub mod parser;
pub mod printer;
pub mod reconcile;

type E = Box<dyn std::error::Error>;

/// A single alignment parsed from a PAF line.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AlignmentRecord {
    /// Name of the aligned read.
    pub read_name: String,
    /// Full length of the read.
    pub read_len: u64,
    /// First aligned position in the read.
    pub query_start: u64,
    /// One past the last aligned position in the read.
    pub query_end: u64,
    /// Name of the target sequence, '*' if the read did not map.
    pub reference: String,
    /// Full length of the target sequence.
    pub ref_len: u64,
    /// First aligned position in the target.
    pub coord_start: u64,
    /// One past the last aligned position in the target.
    pub coord_end: u64,
    /// Number of exactly matching bases.
    pub matches: u64,
    /// Total length of the alignment including gaps.
    pub aln_block_len: u64,
    /// Raw contents of the last column, normally the `cs:Z:` edit script.
    pub edit_script: String,
}

/// The consolidated classification of one read.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReadReport {
    pub read_name: String,
    pub read_len: u64,
    /// Sequencing start time from the read metadata, '?' when unknown.
    pub start_time: String,
    /// Demultiplexed barcode from the read metadata, "none" when absent.
    pub barcode: String,
    /// Accepted target name, or the '*' / '?' sentinel.
    pub reference: String,
    pub ref_len: u64,
    pub coord_start: u64,
    pub coord_end: u64,
    pub matches: u64,
    /// Matches plus mismatches over the aligned bases.
    pub mapping_len: u64,
    /// Values for the extra report columns, in configured order.
    pub columns: Vec<String>,
}

/// Settings for [report_from_read_to_write].
#[derive(Clone, Debug)]
pub struct ReportConfig {
    /// Extra report columns and the rules that resolve them.
    pub reference_options: Option<ReferenceOptions>,
    /// Identity threshold below which a mapped read is demoted to unmapped.
    pub min_identity: Option<f64>,
    /// Shortest read length included in the report.
    pub min_read_length: u64,
    /// Longest read length included in the report.
    pub max_read_length: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig{
            reference_options: None,
            min_identity: None,
            min_read_length: 0,
            max_read_length: u64::MAX,
        }
    }
}

/// Consolidate PAF data from [Read] into CSV rows on [Write].
///
/// Alignments of the same read must be on consecutive lines of the input.
/// Empty lines are skipped. Reads whose length falls outside the configured
/// window are counted but their rows are not written.
///
/// Returns the run totals after logging a summary of them.
///
/// ## Usage
///
/// ```rust
/// use seula::{report_from_read_to_write, ReportConfig};
/// use seula::annotation::{ReadMetadata, ReferenceAnnotations};
/// use std::io::Cursor;
///
/// // Mock PAF data: read1 mapped, read2 did not.
/// let mut input_bytes: Vec<u8> = Vec::new();
/// input_bytes.append(&mut b"read1\t500\t10\t490\t+\tMN908947\t29903\t100\t580\t479\t481\t60\tcs:Z::450*ac:29\n".to_vec());
/// input_bytes.append(&mut b"read2\t300\t0\t0\t*\t*\t0\t0\t0\t0\t0\t255\n".to_vec());
/// let mut input: Cursor<Vec<u8>> = Cursor::new(input_bytes);
///
/// // Mock read headers from the .fastq input.
/// let metadata = ReadMetadata::from_descriptions([
///     ("read1", "start_time=2019-01-01T00:00:00Z barcode=BC01"),
///     ("read2", "start_time=2019-01-01T00:10:00Z"),
/// ]);
/// let annotations = ReferenceAnnotations::from_descriptions(std::iter::empty());
///
/// let mut output: Vec<u8> = Vec::new();
/// let counters = report_from_read_to_write(&mut input, &mut output, &ReportConfig::default(), &annotations, &metadata).unwrap();
///
/// let mut expected: Vec<u8> = Vec::new();
/// expected.append(&mut b"read_name,read_len,start_time,barcode,best_reference,ref_len,start_coords,end_coords,num_matches,mapping_len\n".to_vec());
/// expected.append(&mut b"read1,500,2019-01-01T00:00:00Z,BC01,MN908947,29903,100,580,479,480\n".to_vec());
/// expected.append(&mut b"read2,300,2019-01-01T00:10:00Z,none,*,0,0,0,0,0\n".to_vec());
///
/// assert_eq!(output, expected);
/// assert_eq!(counters.total, 1);
/// assert_eq!(counters.unmapped, 1);
/// ```
pub fn report_from_read_to_write<R: Read, W: Write>(
    conn_in: &mut R,
    conn_out: &mut W,
    config: &ReportConfig,
    annotations: &ReferenceAnnotations,
    metadata: &ReadMetadata,
) -> Result<RunCounters, E> {
    let column_names: Vec<String> = config
        .reference_options
        .as_ref()
        .map(|options| options.keys().cloned().collect())
        .unwrap_or_default();
    printer::format_report_header(&column_names, conn_out)?;

    let mut reconciler = Reconciler::new(
        config.reference_options.as_ref(),
        annotations,
        metadata,
        config.min_identity,
    );

    let reader = std::io::BufReader::new(conn_in);
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let record = parser::read_alignment(&mut line.as_bytes())?;
        if let Some(report) = reconciler.consume(record)? {
            if report.read_len >= config.min_read_length && report.read_len <= config.max_read_length {
                printer::format_report_line(&report, conn_out)?;
            }
        }
    }
    if let Some(report) = reconciler.finish()? {
        if report.read_len >= config.min_read_length && report.read_len <= config.max_read_length {
            printer::format_report_line(&report, conn_out)?;
        }
    }
    conn_out.flush()?;

    let counters = reconciler.counters().clone();
    reconcile::log_summary(&counters);
    Ok(counters)
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn report_consolidates_consecutive_alignments() {
        use std::io::Cursor;
        use crate::ReportConfig;
        use crate::annotation::ReadMetadata;
        use crate::annotation::ReferenceAnnotations;
        use crate::options::parse_reference_options;
        use super::report_from_read_to_write;

        let mut input_bytes: Vec<u8> = Vec::new();
        input_bytes.append(&mut b"read1\t500\t10\t490\t+\tMN908947\t29903\t100\t580\t479\t481\t60\tcs:Z::450*ac:29\n".to_vec());
        input_bytes.append(&mut b"read1\t500\t10\t490\t+\tKJ660346\t18959\t50\t530\t480\t480\t60\tcs:Z::480\n".to_vec());
        input_bytes.append(&mut b"read2\t400\t0\t380\t+\tMN908947\t29903\t21600\t21980\t380\t380\t60\tcs:Z::380\n".to_vec());
        let mut input: Cursor<Vec<u8>> = Cursor::new(input_bytes);

        let metadata = ReadMetadata::from_descriptions([
            ("read1", "start_time=2019-01-01T00:00:00Z barcode=BC01"),
            ("read2", "start_time=2019-01-01T00:10:00Z barcode=BC02"),
        ]);
        let annotations = ReferenceAnnotations::from_descriptions([
            ("MN908947", "species=sars-cov-2"),
        ]);
        let config = ReportConfig{
            reference_options: Some(parse_reference_options("species[species];gene[orf1a:266:13468,spike:21563:25384]").unwrap()),
            ..ReportConfig::default()
        };

        let mut output: Vec<u8> = Vec::new();
        let counters = report_from_read_to_write(&mut input, &mut output, &config, &annotations, &metadata).unwrap();

        let mut expected: Vec<u8> = Vec::new();
        expected.append(&mut b"read_name,read_len,start_time,barcode,best_reference,ref_len,start_coords,end_coords,num_matches,mapping_len,species,gene\n".to_vec());
        expected.append(&mut b"read1,500,2019-01-01T00:00:00Z,BC01,?,29903,0,0,479,480,?,?\n".to_vec());
        expected.append(&mut b"read2,400,2019-01-01T00:10:00Z,BC02,MN908947,29903,21600,21980,380,380,sars-cov-2,spike\n".to_vec());

        assert_eq!(output, expected);
        assert_eq!(counters.ambiguous, 1);
        assert_eq!(counters.total, 1);
    }

    #[test]
    fn read_length_window_filters_rows_not_counters() {
        use std::io::Cursor;
        use crate::ReportConfig;
        use crate::annotation::ReadMetadata;
        use crate::annotation::ReferenceAnnotations;
        use super::report_from_read_to_write;

        let mut input_bytes: Vec<u8> = Vec::new();
        input_bytes.append(&mut b"read1\t500\t10\t490\t+\tMN908947\t29903\t100\t580\t479\t481\t60\tcs:Z::450*ac:29\n".to_vec());
        input_bytes.append(&mut b"read2\t90\t0\t0\t*\t*\t0\t0\t0\t0\t0\t255\n".to_vec());
        let mut input: Cursor<Vec<u8>> = Cursor::new(input_bytes);

        let metadata = ReadMetadata::from_descriptions(std::iter::empty());
        let annotations = ReferenceAnnotations::from_descriptions(std::iter::empty());
        let config = ReportConfig{ min_read_length: 100, ..ReportConfig::default() };

        let mut output: Vec<u8> = Vec::new();
        let counters = report_from_read_to_write(&mut input, &mut output, &config, &annotations, &metadata).unwrap();

        let mut expected: Vec<u8> = Vec::new();
        expected.append(&mut b"read_name,read_len,start_time,barcode,best_reference,ref_len,start_coords,end_coords,num_matches,mapping_len\n".to_vec());
        expected.append(&mut b"read1,500,?,none,MN908947,29903,100,580,479,480\n".to_vec());

        assert_eq!(output, expected);
        assert_eq!(counters.unmapped, 1);
        assert_eq!(counters.total, 1);
    }

    #[test]
    fn empty_input_writes_only_the_header() {
        use std::io::Cursor;
        use crate::ReportConfig;
        use crate::annotation::ReadMetadata;
        use crate::annotation::ReferenceAnnotations;
        use super::report_from_read_to_write;

        let mut input: Cursor<Vec<u8>> = Cursor::new(Vec::new());
        let metadata = ReadMetadata::from_descriptions(std::iter::empty());
        let annotations = ReferenceAnnotations::from_descriptions(std::iter::empty());

        let mut output: Vec<u8> = Vec::new();
        let counters = report_from_read_to_write(&mut input, &mut output, &ReportConfig::default(), &annotations, &metadata).unwrap();

        let expected = b"read_name,read_len,start_time,barcode,best_reference,ref_len,start_coords,end_coords,num_matches,mapping_len\n".to_vec();

        assert_eq!(output, expected);
        assert!(counters.proportion_unmapped().is_none());
    }
}
