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

//! Alignment identity from the compact `cs:Z:` edit script.

use crate::parser::MalformedAlignment;

type E = Box<dyn std::error::Error>;

#[derive(Debug, Clone)]
pub struct DivisionUndefined;

impl std::fmt::Display for DivisionUndefined {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "identity is undefined when the edit script contains no matches or mismatches")
    }
}

impl std::error::Error for DivisionUndefined {}

/// Run totals parsed from a `cs:Z:` edit script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditCounts {
    pub matches: u64,
    pub mismatches: u64,
    pub insertions: u64,
    pub deletions: u64,
}

impl EditCounts {
    /// Fraction of aligned bases that are exact matches.
    ///
    /// Insertions and deletions are excluded from the denominator. Returns a
    /// [DivisionUndefined] error when matches + mismatches is zero; callers
    /// must guard the degenerate case explicitly.
    pub fn identity(
        &self,
    ) -> Result<f64, E> {
        let aligned = self.matches + self.mismatches;
        if aligned == 0 {
            return Err(Box::new(DivisionUndefined));
        }
        Ok(self.matches as f64 / aligned as f64)
    }
}

/// Parse a `cs:Z:`-tagged edit script into per-operator run totals.
///
/// The script is scanned left to right after stripping the tag prefix: one of
/// `:`, `*`, `+` or `-` starts a new operator context and the characters up
/// to the next operator accumulate as its argument.
///
///   - `:` adds its decimal run-length argument to the match total.
///   - `*` adds exactly one mismatch regardless of the argument length.
///   - `+` and `-` add the argument length to the insertion/deletion totals.
///
/// Returns a [MalformedAlignment] error if the prefix is missing, the script
/// does not start with an operator, or a match run length is not an integer.
///
/// ## Usage
///
/// ```rust
/// use seula::identity::parse_edit_script;
///
/// let counts = parse_edit_script("cs:Z::10*ag:5").unwrap();
///
/// assert_eq!(counts.matches, 15);
/// assert_eq!(counts.mismatches, 1);
/// assert_eq!(counts.identity().unwrap(), 15.0 / 16.0);
/// ```
pub fn parse_edit_script(
    script: &str,
) -> Result<EditCounts, E> {
    let ops = script
        .strip_prefix("cs:Z:")
        .ok_or_else(|| MalformedAlignment{ reason: format!("edit script missing the cs:Z: tag: '{}'", script) })?;

    let mut counts = EditCounts::default();
    let mut op: Option<char> = None;
    let mut arg = String::new();

    for symbol in ops.chars() {
        if matches!(symbol, ':' | '*' | '+' | '-') {
            if let Some(prev) = op {
                apply_op(prev, &arg, &mut counts)?;
            }
            op = Some(symbol);
            arg.clear();
        } else if op.is_none() {
            return Err(Box::new(MalformedAlignment{ reason: format!("edit script does not start with an operator: '{}'", script) }));
        } else {
            arg.push(symbol);
        }
    }
    if let Some(prev) = op {
        apply_op(prev, &arg, &mut counts)?;
    }

    Ok(counts)
}

fn apply_op(
    op: char,
    arg: &str,
    counts: &mut EditCounts,
) -> Result<(), E> {
    match op {
        ':' => {
            let run = arg
                .parse::<u64>()
                .map_err(|_| MalformedAlignment{ reason: format!("match run length is not an integer: '{}'", arg) })?;
            counts.matches += run;
        },
        '*' => counts.mismatches += 1,
        '+' => counts.insertions += arg.len() as u64,
        '-' => counts.deletions += arg.len() as u64,
        _ => unreachable!(),
    }
    Ok(())
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn parse_match_and_substitution_runs() {
        use super::parse_edit_script;

        let got = parse_edit_script("cs:Z::10*ag:5").unwrap();

        assert_eq!(got.matches, 15);
        assert_eq!(got.mismatches, 1);
        assert_eq!(got.identity().unwrap(), 15.0 / 16.0);
    }

    #[test]
    fn parse_insertions_and_deletions() {
        use super::parse_edit_script;
        use super::EditCounts;

        let got = parse_edit_script("cs:Z::6-ata:10+gtc:4").unwrap();
        let expected = EditCounts{ matches: 20, mismatches: 0, insertions: 3, deletions: 3 };

        assert_eq!(got, expected);
        assert_eq!(got.identity().unwrap(), 1.0);
    }

    #[test]
    fn substitution_counts_one_per_operator() {
        use super::parse_edit_script;

        let got = parse_edit_script("cs:Z:*ag*ct*ta").unwrap();

        assert_eq!(got.mismatches, 3);
        assert_eq!(got.matches, 0);
    }

    #[test]
    fn empty_script_identity_is_undefined() {
        use super::parse_edit_script;

        let got = parse_edit_script("cs:Z:").unwrap();

        assert_eq!(got.matches + got.mismatches, 0);
        assert!(got.identity().is_err());
    }

    #[test]
    fn missing_prefix_is_malformed() {
        use super::parse_edit_script;

        assert!(parse_edit_script(":10*ag:5").is_err());
        assert!(parse_edit_script("NM:i:5").is_err());
    }

    #[test]
    fn non_integer_run_length_is_malformed() {
        use super::parse_edit_script;

        assert!(parse_edit_script("cs:Z::ten").is_err());
    }
}
