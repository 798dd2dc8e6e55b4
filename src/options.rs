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
use indexmap::IndexMap;

type E = Box<dyn std::error::Error>;

#[derive(Debug, Clone)]
pub struct MalformedSpec {
    pub spec: String,
}

impl std::fmt::Display for MalformedSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "malformed reference option spec '{}'", self.spec)
    }
}

impl std::error::Error for MalformedSpec {}

/// A single resolution rule within a report column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionRule {
    /// Resolve by direct attribute lookup on the hit reference.
    Direct(String),
    /// Lookup valid only within a half-open coordinate range on the reference.
    Range { key: String, start: u64, end: u64 },
}

/// Ordered mapping from report column name to its resolution rules.
///
/// Column order follows the specification string and determines the order the
/// extra columns appear in the report header.
pub type ReferenceOptions = IndexMap<String, Vec<OptionRule>>;

/// Parse a reference option specification string.
///
/// The specification is `;`-separated column specs shaped `name[rule,...]`,
/// where each rule is either `key` or `key:start:end`.
///
/// Returns a [MalformedSpec] error if a column spec lacks the brackets, a
/// rule has neither 1 nor 3 colon-separated parts, or the coordinates are
/// not integers.
///
/// ## Usage
///
/// ```rust
/// use seula::options::{parse_reference_options, OptionRule};
///
/// let options = parse_reference_options("genogroup[genogroup];loc_genotype[POL_genogroup:0:5000,VP_genogroup:5000:7000]").unwrap();
///
/// assert_eq!(options.len(), 2);
/// assert_eq!(options["genogroup"], vec![OptionRule::Direct("genogroup".to_string())]);
/// assert_eq!(options["loc_genotype"][0], OptionRule::Range{ key: "POL_genogroup".to_string(), start: 0, end: 5000 });
/// ```
pub fn parse_reference_options(
    spec: &str,
) -> Result<ReferenceOptions, E> {
    let mut options: ReferenceOptions = IndexMap::new();

    for column in spec.split(';') {
        let (name, rules_text) = column
            .trim_end_matches(']')
            .split_once('[')
            .ok_or_else(|| MalformedSpec{ spec: column.to_string() })?;

        let mut rules: Vec<OptionRule> = Vec::new();
        for rule in rules_text.split(',') {
            let parts: Vec<&str> = rule.split(':').collect();
            match parts.as_slice() {
                [key] => {
                    rules.push(OptionRule::Direct(key.to_string()));
                },
                [key, start, end] => {
                    let start = start.parse::<u64>().map_err(|_| MalformedSpec{ spec: rule.to_string() })?;
                    let end = end.parse::<u64>().map_err(|_| MalformedSpec{ spec: rule.to_string() })?;
                    rules.push(OptionRule::Range{ key: key.to_string(), start, end });
                },
                _ => return Err(Box::new(MalformedSpec{ spec: rule.to_string() })),
            }
        }
        options.insert(name.to_string(), rules);
    }

    Ok(options)
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn parse_direct_rule() {
        use super::parse_reference_options;
        use super::OptionRule;

        let got = parse_reference_options("genogroup[genogroup]").unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got["genogroup"], vec![OptionRule::Direct("genogroup".to_string())]);
    }

    #[test]
    fn parse_coordinate_rules() {
        use super::parse_reference_options;
        use super::OptionRule;

        let got = parse_reference_options("loc_genotype[POL_genogroup:0:5000,VP_genogroup:5000:7000]").unwrap();

        let expected = vec![
            OptionRule::Range{ key: "POL_genogroup".to_string(), start: 0, end: 5000 },
            OptionRule::Range{ key: "VP_genogroup".to_string(), start: 5000, end: 7000 },
        ];

        assert_eq!(got["loc_genotype"], expected);
    }

    #[test]
    fn column_order_follows_spec() {
        use super::parse_reference_options;

        let got = parse_reference_options("zeta[a];alpha[b];mu[c]").unwrap();
        let names: Vec<&String> = got.keys().collect();

        assert_eq!(names, vec!["zeta", "alpha", "mu"]);
    }

    #[test]
    fn two_part_rule_is_malformed() {
        use super::parse_reference_options;

        let got = parse_reference_options("genogroup[genogroup:100]");

        assert!(got.is_err());
    }

    #[test]
    fn non_integer_coordinate_is_malformed() {
        use super::parse_reference_options;

        let got = parse_reference_options("genogroup[genogroup:zero:100]");

        assert!(got.is_err());
    }

    #[test]
    fn missing_brackets_is_malformed() {
        use super::parse_reference_options;

        let got = parse_reference_options("genogroup");

        assert!(got.is_err());
    }
}
