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
use std::io::Write;

use crate::ReadReport;

type E = Box<dyn std::error::Error>;

/// Print the CSV header row
///
/// Writes the fixed ten column names followed by the requested extra
/// column names in their configured order.
///
pub fn format_report_header<W: Write>(
    columns: &[String],
    conn: &mut W,
) -> Result<(), E> {
    let mut line = String::from("read_name,read_len,start_time,barcode,best_reference,ref_len,start_coords,end_coords,num_matches,mapping_len");
    for column in columns {
        line.push(',');
        line.push_str(column);
    }
    line.push('\n');
    conn.write_all(line.as_bytes())?;
    Ok(())
}

/// Print a finished report as a CSV row
///
pub fn format_report_line<W: Write>(
    report: &ReadReport,
    conn: &mut W,
) -> Result<(), E> {
    let mut line = format!(
        "{},{},{},{},{},{},{},{},{},{}",
        report.read_name,
        report.read_len,
        report.start_time,
        report.barcode,
        report.reference,
        report.ref_len,
        report.coord_start,
        report.coord_end,
        report.matches,
        report.mapping_len,
    );
    for column in &report.columns {
        line.push(',');
        line.push_str(column);
    }
    line.push('\n');
    conn.write_all(line.as_bytes())?;
    Ok(())
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn format_report_header() {
        use super::format_report_header;

        let columns = vec!["species".to_string(), "gene".to_string()];
        let expected = b"read_name,read_len,start_time,barcode,best_reference,ref_len,start_coords,end_coords,num_matches,mapping_len,species,gene\n".to_vec();

        let mut got: Vec<u8> = Vec::new();
        format_report_header(&columns, &mut got).unwrap();

        assert_eq!(got, expected);
    }

    #[test]
    fn format_report_header_without_extras() {
        use super::format_report_header;

        let expected = b"read_name,read_len,start_time,barcode,best_reference,ref_len,start_coords,end_coords,num_matches,mapping_len\n".to_vec();

        let mut got: Vec<u8> = Vec::new();
        format_report_header(&[], &mut got).unwrap();

        assert_eq!(got, expected);
    }

    #[test]
    fn format_report_line() {
        use crate::ReadReport;
        use super::format_report_line;

        let report = ReadReport{
            read_name: "read1".to_string(),
            read_len: 500,
            start_time: "2019-01-01T00:00:00Z".to_string(),
            barcode: "BC01".to_string(),
            reference: "MN908947".to_string(),
            ref_len: 29903,
            coord_start: 100,
            coord_end: 580,
            matches: 479,
            mapping_len: 480,
            columns: vec!["sars-cov-2".to_string()],
        };
        let expected = b"read1,500,2019-01-01T00:00:00Z,BC01,MN908947,29903,100,580,479,480,sars-cov-2\n".to_vec();

        let mut got: Vec<u8> = Vec::new();
        format_report_line(&report, &mut got).unwrap();

        assert_eq!(got, expected);
    }
}
