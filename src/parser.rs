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
use std::io::Read;

use crate::AlignmentRecord;

type E = Box<dyn std::error::Error>;

#[derive(Debug, Clone)]
pub struct MalformedAlignment {
    pub reason: String,
}

impl std::fmt::Display for MalformedAlignment {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "malformed alignment record: {}", self.reason)
    }
}

impl std::error::Error for MalformedAlignment {}

/// Parse a line from a PAF file
///
/// Reads a single tab-separated alignment record in the *PAF* format
/// produced by minimap2 with the `--cs` flag.
///
/// The first twelve columns are mandatory; the last column on the line is
/// stored as the raw edit script without checking its tag. Unmapped records
/// keep their '*' target name and zeroed coordinates as-is.
///
/// Returns a [MalformedAlignment] error if the line has fewer than twelve
/// columns or a numeric column does not parse.
///
pub fn read_alignment<R: Read>(
    conn: &mut R,
) -> Result<AlignmentRecord, E> {
    let separator: char = '\t';
    let mut contents: String = String::new();
    conn.read_to_string(&mut contents)?;

    let fields: Vec<&str> = contents.trim_end_matches('\n').split(separator).collect();
    if fields.len() < 12 {
        return Err(Box::new(MalformedAlignment{ reason: format!("expected at least 12 columns, got {}", fields.len()) }));
    }

    let res = AlignmentRecord{
        read_name: fields[0].to_string(),
        read_len: parse_column(fields[1], "query length")?,
        query_start: parse_column(fields[2], "query start")?,
        query_end: parse_column(fields[3], "query end")?,
        reference: fields[5].to_string(),
        ref_len: parse_column(fields[6], "target length")?,
        coord_start: parse_column(fields[7], "target start")?,
        coord_end: parse_column(fields[8], "target end")?,
        matches: parse_column(fields[9], "residue matches")?,
        aln_block_len: parse_column(fields[10], "alignment block length")?,
        edit_script: fields[fields.len() - 1].to_string(),
    };
    Ok(res)
}

fn parse_column(
    field: &str,
    name: &str,
) -> Result<u64, E> {
    field
        .parse::<u64>()
        .map_err(|_| MalformedAlignment{ reason: format!("{} is not an integer: '{}'", name, field) }.into())
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn read_alignment() {
        use std::io::Cursor;
        use crate::AlignmentRecord;
        use super::read_alignment;

        let data: Vec<u8> = b"read1\t500\t10\t490\t+\tMN908947\t29903\t100\t580\t479\t481\t60\tcs:Z::450*ac:29\n".to_vec();
        let expected = AlignmentRecord{
            read_name: "read1".to_string(),
            read_len: 500,
            query_start: 10,
            query_end: 490,
            reference: "MN908947".to_string(),
            ref_len: 29903,
            coord_start: 100,
            coord_end: 580,
            matches: 479,
            aln_block_len: 481,
            edit_script: "cs:Z::450*ac:29".to_string(),
        };

        let mut input: Cursor<Vec<u8>> = Cursor::new(data);
        let got = read_alignment(&mut input).unwrap();

        assert_eq!(got, expected);
    }

    #[test]
    fn read_unmapped_alignment() {
        use std::io::Cursor;
        use super::read_alignment;

        let data: Vec<u8> = b"read2\t300\t0\t0\t*\t*\t0\t0\t0\t0\t0\t255\n".to_vec();

        let mut input: Cursor<Vec<u8>> = Cursor::new(data);
        let got = read_alignment(&mut input).unwrap();

        assert_eq!(got.reference, "*");
        assert_eq!(got.matches, 0);
        assert_eq!(got.aln_block_len, 0);
    }

    #[test]
    fn too_few_columns_is_malformed() {
        use std::io::Cursor;
        use super::read_alignment;

        let data: Vec<u8> = b"read1\t500\t10\t490\t+\tMN908947\n".to_vec();

        let mut input: Cursor<Vec<u8>> = Cursor::new(data);
        assert!(read_alignment(&mut input).is_err());
    }

    #[test]
    fn non_integer_column_is_malformed() {
        use std::io::Cursor;
        use super::read_alignment;

        let data: Vec<u8> = b"read1\tlong\t10\t490\t+\tMN908947\t29903\t100\t580\t479\t481\t60\tcs:Z::450\n".to_vec();

        let mut input: Cursor<Vec<u8>> = Cursor::new(data);
        assert!(read_alignment(&mut input).is_err());
    }
}
