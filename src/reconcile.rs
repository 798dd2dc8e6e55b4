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

//! Consolidate consecutive alignments of the same read into one report.

use crate::AlignmentRecord;
use crate::ReadReport;
use crate::annotation::ReadMetadata;
use crate::annotation::ReferenceAnnotations;
use crate::identity::parse_edit_script;
use crate::options::OptionRule;
use crate::options::ReferenceOptions;

type E = Box<dyn std::error::Error>;

/// Target name on records that did not map anywhere.
pub const UNMAPPED: &str = "*";

/// Target name replacing reads that mapped to more than one place.
pub const AMBIGUOUS: &str = "?";

// A record held back until the next read name confirms it was the only
// alignment of its read.
#[derive(Debug, Clone)]
struct Pending {
    record: AlignmentRecord,
    barcode: String,
    start_time: String,
    mismatches: u64,
    identity: f64,
}

/// Running totals over all consumed records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub unmapped: u64,
    pub ambiguous: u64,
    pub total: u64,
}

impl RunCounters {
    /// Fraction of reads that produced no accepted alignment.
    ///
    /// Returns None when nothing has been counted yet.
    pub fn proportion_unmapped(
        &self,
    ) -> Option<f64> {
        let all = self.unmapped + self.total;
        if all == 0 {
            return None;
        }
        Some(self.unmapped as f64 / all as f64)
    }
}

/// Log the run totals, warning when most reads went unmapped.
pub fn log_summary(
    counters: &RunCounters,
) {
    match counters.proportion_unmapped() {
        Some(prop) => {
            log::info!("Proportion unmapped is {}", prop);
            if prop > 0.95 {
                log::warn!("Very few reads mapped to a reference.");
            }
        },
        None => log::info!("No records were processed."),
    }
}

/// Streaming one-record-lookback reconciler.
///
/// Records for the same read arrive on consecutive lines. Each incoming
/// record displaces the held one; a repeated read name marks the held record
/// ambiguous instead. Call [finish][Reconciler::finish] after the last record
/// to flush the final report.
pub struct Reconciler<'a> {
    options: Option<&'a ReferenceOptions>,
    annotations: &'a ReferenceAnnotations,
    metadata: &'a ReadMetadata,
    min_identity: Option<f64>,
    pending: Option<Pending>,
    counters: RunCounters,
}

impl<'a> Reconciler<'a> {
    /// Initialize a reconciler with empty counters.
    ///
    /// An identity threshold of 1.0 or more is read as a percentage and
    /// divided by 100.
    pub fn new(
        options: Option<&'a ReferenceOptions>,
        annotations: &'a ReferenceAnnotations,
        metadata: &'a ReadMetadata,
        min_identity: Option<f64>,
    ) -> Self {
        let min_identity = min_identity.map(|x| if x >= 1.0 { x / 100.0 } else { x });
        Reconciler{ options, annotations, metadata, min_identity, pending: None, counters: RunCounters::default() }
    }

    pub fn counters(
        &self,
    ) -> &RunCounters {
        &self.counters
    }

    /// Take in the next record, possibly releasing a finished report.
    ///
    /// Returns Ok(None) while the record's fate is still undecided.
    pub fn consume(
        &mut self,
        record: AlignmentRecord,
    ) -> Result<Option<ReadReport>, E> {
        if let Some(held) = self.pending.as_mut() {
            if held.record.read_name == record.read_name {
                // Second alignment of the same read; idempotent on the third.
                held.record.reference = AMBIGUOUS.to_string();
                return Ok(None);
            }
        }

        let incoming = self.admit(record)?;
        match self.pending.replace(incoming) {
            Some(held) => Ok(Some(self.finalize(held)?)),
            None => Ok(None),
        }
    }

    /// Flush the last held record after the input is exhausted.
    pub fn finish(
        &mut self,
    ) -> Result<Option<ReadReport>, E> {
        match self.pending.take() {
            Some(held) => Ok(Some(self.finalize(held)?)),
            None => Ok(None),
        }
    }

    // Attach read metadata and precompute identity before holding a record.
    fn admit(
        &self,
        record: AlignmentRecord,
    ) -> Result<Pending, E> {
        let (barcode, start_time) = self.metadata.barcode_time(&record.read_name);

        let (mismatches, identity) = if record.reference == UNMAPPED {
            (0, 0.0)
        } else {
            let counts = parse_edit_script(&record.edit_script)?;
            let identity = counts.identity()?;
            (counts.mismatches, identity)
        };

        Ok(Pending{ record, barcode, start_time, mismatches, identity })
    }

    fn finalize(
        &mut self,
        held: Pending,
    ) -> Result<ReadReport, E> {
        let Pending{ record, barcode, start_time, mismatches, identity } = held;

        if record.reference == UNMAPPED || record.reference == AMBIGUOUS {
            let mapping_len = if record.reference == UNMAPPED {
                self.counters.unmapped += 1;
                record.aln_block_len
            } else {
                self.counters.ambiguous += 1;
                record.matches + mismatches
            };
            let columns = self.sentinel_columns(&record.reference);
            return Ok(ReadReport{
                read_name: record.read_name,
                read_len: record.read_len,
                start_time,
                barcode,
                reference: record.reference,
                ref_len: record.ref_len,
                coord_start: 0,
                coord_end: 0,
                matches: record.matches,
                mapping_len,
                columns,
            });
        }

        let columns = self.resolve_columns(&record)?;

        if self.min_identity.map(|min| identity < min).unwrap_or(false) {
            self.counters.unmapped += 1;
            let columns = self.sentinel_columns(UNMAPPED);
            return Ok(ReadReport{
                read_name: record.read_name,
                read_len: record.read_len,
                start_time,
                barcode,
                reference: UNMAPPED.to_string(),
                ref_len: 0,
                coord_start: 0,
                coord_end: 0,
                matches: 0,
                mapping_len: 0,
                columns,
            });
        }

        self.counters.total += 1;
        Ok(ReadReport{
            read_name: record.read_name,
            read_len: record.read_len,
            start_time,
            barcode,
            reference: record.reference,
            ref_len: record.ref_len,
            coord_start: record.coord_start,
            coord_end: record.coord_end,
            matches: record.matches,
            mapping_len: record.matches + mismatches,
            columns,
        })
    }

    // Resolve each requested extra column against the mapped target.
    fn resolve_columns(
        &self,
        record: &AlignmentRecord,
    ) -> Result<Vec<String>, E> {
        let Some(options) = self.options else {
            return Ok(Vec::new());
        };

        let mut columns: Vec<String> = Vec::with_capacity(options.len());
        for rules in options.values() {
            let value = match rules.as_slice() {
                [OptionRule::Direct(key)] => self.annotations.attribute(&record.reference, key)?.to_string(),
                rules => {
                    let mut overlaps: Vec<(&str, u64)> = Vec::new();
                    for rule in rules {
                        if let OptionRule::Range{ key, start, end } = rule {
                            let overlap = interval_overlap((record.coord_start, record.coord_end), (*start, *end));
                            if overlap > 0 {
                                overlaps.push((key.as_str(), overlap));
                            }
                        }
                    }
                    // Stable sort keeps the first-listed rule on ties.
                    overlaps.sort_by_key(|x| std::cmp::Reverse(x.1));
                    overlaps.first().map(|x| x.0.to_string()).unwrap_or("NA".to_string())
                },
            };
            columns.push(value);
        }
        Ok(columns)
    }

    fn sentinel_columns(
        &self,
        sentinel: &str,
    ) -> Vec<String> {
        match self.options {
            Some(options) => vec![sentinel.to_string(); options.len()],
            None => Vec::new(),
        }
    }
}

// Overlap of two half-open intervals, zero when disjoint.
fn interval_overlap(
    a: (u64, u64),
    b: (u64, u64),
) -> u64 {
    (a.1.min(b.1)).saturating_sub(a.0.max(b.0))
}
