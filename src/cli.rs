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
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    // Consolidate a PAF file into a per-read CSV report
    Report {
        // Alignments from minimap2 run with --cs
        #[arg(long = "paf-file", required = true, help = "Input PAF file")]
        paf_file: PathBuf,

        // FastX file the reads were aligned from
        #[arg(long = "annotated-reads", required = true, help = "FastX file with read metadata in the header comments")]
        reads_file: PathBuf,

        // Output file path, writes to stdout when not given
        #[arg(short = 'o', long = "report", required = false)]
        out_file: Option<PathBuf>,

        // FastX file containing the reference sequences
        #[arg(long = "reference-file", required = false, help = "FastX file with reference annotations in the header comments")]
        reference_file: Option<PathBuf>,

        // Extra report columns, eg. "species[species];gene[orf1a:266:13468,spike:21563:25384]"
        #[arg(long = "reference-options", required = false, help = "Extra report columns and the rules that resolve them")]
        reference_options: Option<String>,

        // Identity threshold, values >= 1 are read as percentages
        #[arg(long = "min-identity", required = false)]
        min_identity: Option<f64>,

        // Read length window
        #[arg(long = "min-read-length", default_value_t = 0)]
        min_read_length: u64,
        #[arg(long = "max-read-length", default_value_t = u64::MAX)]
        max_read_length: u64,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },
}
