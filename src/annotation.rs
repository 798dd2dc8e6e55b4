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

//! Indexes built from the free-text descriptions of sequence records.
//!
//! Both the reference panel and the read file carry their metadata as
//! ` key=value` tokens on the description line. [ReferenceAnnotations]
//! indexes the reference panel, [ReadMetadata] indexes the reads.
//!
//! Construction takes (id, description) pairs so that the actual FASTA/FASTQ
//! iteration stays with the caller.

use std::collections::HashMap;

type E = Box<dyn std::error::Error>;

#[derive(Debug, Clone)]
pub struct UnknownReference {
    pub reference: String,
    pub attribute: String,
}

impl std::fmt::Display for UnknownReference {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "reference '{}' has no annotation for '{}'", self.reference, self.attribute)
    }
}

impl std::error::Error for UnknownReference {}

/// Extract `key=value` tokens from a sequence description line.
///
/// Whitespace-delimited tokens containing exactly one `=` are recorded;
/// everything else is skipped.
pub fn tokenize_description(
    description: &str,
) -> HashMap<String, String> {
    let mut info: HashMap<String, String> = HashMap::new();
    for token in description.split_whitespace() {
        let mut parts = token.split('=');
        if let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) {
            info.insert(key.to_string(), value.to_string());
        }
    }
    info
}

/// Attribute annotations for each reference in the panel.
///
/// Two-level mapping keyed first by reference id, then by attribute key.
/// Built once from the reference descriptions and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceAnnotations {
    info: HashMap<String, HashMap<String, String>>,
}

impl ReferenceAnnotations {
    /// Build the index from (reference id, description) pairs.
    ///
    /// A reference id appearing twice merges its attributes, last write wins.
    pub fn from_descriptions<'a, I: IntoIterator<Item = (&'a str, &'a str)>>(
        records: I,
    ) -> Self {
        let mut info: HashMap<String, HashMap<String, String>> = HashMap::new();
        for (id, description) in records {
            let tokens = tokenize_description(description);
            if !tokens.is_empty() {
                info.entry(id.to_string()).or_default().extend(tokens);
            }
        }
        ReferenceAnnotations{ info }
    }

    /// Look up the value of `attribute` for `reference`.
    ///
    /// Returns an [UnknownReference] error if the reference is not in the
    /// index or carries no such attribute; both signal a mismatch between the
    /// reference panel and the annotation source.
    pub fn attribute(
        &self,
        reference: &str,
        attribute: &str,
    ) -> Result<&str, E> {
        self.info
            .get(reference)
            .and_then(|attrs| attrs.get(attribute))
            .map(|value| value.as_str())
            .ok_or_else(|| Box::new(UnknownReference{ reference: reference.to_string(), attribute: attribute.to_string() }) as E)
    }
}

/// Barcode label and acquisition time for each read.
///
/// An entry requires a `start_time` token; `barcode` defaults to the
/// sentinel `"none"`. Reads missing both are left out of the index and get
/// the lookup defaults instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadMetadata {
    info: HashMap<String, (String, String)>,
}

impl ReadMetadata {
    /// Build the index from (read id, description) pairs.
    pub fn from_descriptions<'a, I: IntoIterator<Item = (&'a str, &'a str)>>(
        records: I,
    ) -> Self {
        let mut info: HashMap<String, (String, String)> = HashMap::new();
        for (id, description) in records {
            let tokens = tokenize_description(description);
            if let Some(start_time) = tokens.get("start_time") {
                let barcode = tokens.get("barcode").map(|x| x.as_str()).unwrap_or("none");
                info.insert(id.to_string(), (barcode.to_string(), start_time.clone()));
            }
        }
        ReadMetadata{ info }
    }

    /// Barcode and start time for `read`.
    ///
    /// Reads absent from the index resolve to `("none", "?")`; missing
    /// metadata is routine, not an error.
    pub fn barcode_time(
        &self,
        read: &str,
    ) -> (String, String) {
        self.info
            .get(read)
            .cloned()
            .unwrap_or(("none".to_string(), "?".to_string()))
    }
}
