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
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use clap::Parser;

use seula::ReportConfig;
use seula::annotation::ReadMetadata;
use seula::annotation::ReferenceAnnotations;

mod cli;

/// Initializes the logger with verbosity given in `log_max_level`.
fn init_log(log_max_level: usize) {
    stderrlog::new()
    .module(module_path!())
    .quiet(false)
    .verbosity(log_max_level)
    .timestamp(stderrlog::Timestamp::Off)
    .init()
    .unwrap();
}

/// Reads (name, header comment) pairs from a fasta or fastq file.
fn read_headers(file: &Path) -> Vec<(String, String)> {
    let mut reader = needletail::parse_fastx_file(file).expect("Valid fastX file");
    let mut headers: Vec<(String, String)> = Vec::new();
    while let Some(record) = reader.next() {
        let record = record.expect("Valid fastX record");
        let id = String::from_utf8_lossy(record.id()).to_string();
        let (name, description) = id
            .split_once(char::is_whitespace)
            .unwrap_or((id.as_str(), ""));
        headers.push((name.to_string(), description.to_string()));
    }
    headers
}

fn main() {
    let cli = cli::Cli::parse();

    // Subcommands:
    match &cli.command {
        // Report
        Some(cli::Commands::Report {
            paf_file,
            reads_file,
            out_file,
            reference_file,
            reference_options,
            min_identity,
            min_read_length,
            max_read_length,
            verbose,
        }) => {
            init_log(if *verbose { 2 } else { 1 });

            let read_headers_list = read_headers(reads_file);
            let metadata = ReadMetadata::from_descriptions(
                read_headers_list.iter().map(|(name, desc)| (name.as_str(), desc.as_str())),
            );

            let annotations = if let Some(file) = reference_file {
                let reference_headers = read_headers(file);
                ReferenceAnnotations::from_descriptions(
                    reference_headers.iter().map(|(name, desc)| (name.as_str(), desc.as_str())),
                )
            } else {
                ReferenceAnnotations::from_descriptions(std::iter::empty())
            };

            let options = reference_options.as_ref().map(|spec| {
                seula::options::parse_reference_options(spec).expect("Valid --reference-options")
            });

            let config = ReportConfig{
                reference_options: options,
                min_identity: *min_identity,
                min_read_length: *min_read_length,
                max_read_length: *max_read_length,
            };

            let mut conn_in = File::open(paf_file).unwrap();
            let mut conn_out: Box<dyn Write> = if let Some(file) = out_file {
                Box::new(BufWriter::new(File::create(file).unwrap()))
            } else {
                Box::new(BufWriter::new(std::io::stdout()))
            };

            seula::report_from_read_to_write(&mut conn_in, &mut conn_out, &config, &annotations, &metadata).unwrap();
        },
        None => {
            use clap::CommandFactory;
            cli::Cli::command().print_help().unwrap();
        },
    }
}
