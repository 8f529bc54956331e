// SPDX-License-Identifier: MIT

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::Serialize;

use crate::errors::SeqPrepError;
use crate::seq::fasta::format_fasta;
use crate::seq::SeqRecord;

/// Subdirectory (relative to the output root) holding the per-record files.
pub const TRAINING_SUBDIR: &str = "training_data";
/// Aggregate FASTA written at the output root in cluster format, MSA input.
pub const CLUSTER_FILE: &str = "msa.fasta";
/// Default sequence line width in FASTA output.
pub const DEFAULT_WRAP_WIDTH: usize = 60;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One FASTA file per record.
    #[clap(name = "fasta")]
    #[clap(alias = "f")]
    Fasta,
    /// Per-record FASTA files plus one aggregate FASTA for MSA.
    #[clap(name = "cluster")]
    #[clap(alias = "c")]
    Cluster,
    /// One YAML file per record, no MSA clustering step.
    #[clap(name = "yaml")]
    #[clap(alias = "y")]
    Yaml,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutputFormat::Fasta => "fasta",
            OutputFormat::Cluster => "cluster",
            OutputFormat::Yaml => "yaml",
        };
        write!(f, "{}", s)
    }
}

/// One output record: what the downstream pipeline sees for one input row.
/// `msa_reference` is "empty" when no MSA file was supplied.
#[derive(Debug, Clone)]
pub struct Record {
    pub identifier: String,
    pub sequence: String,
    pub msa_reference: String,
}

/// File content plus its path relative to the output root. Construction is
/// pure; writing to disk is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFile {
    pub path: PathBuf,
    pub content: String,
}

#[derive(Serialize)]
struct YamlRecord<'a> {
    name: &'a str,
    sequence: &'a str,
    msa: &'a str,
}

/// Identifiers become file names, so anything outside `[A-Za-z0-9._-]` is
/// flattened to '_'. Post-sanitization collisions are caught by the batch.
pub fn sanitize_identifier(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Serialize one record into the chosen per-record representation. In
/// cluster format the per-record file is plain FASTA; the aggregate is
/// assembled separately by [`cluster_file`].
pub fn emit_record(
    record: &Record,
    format: OutputFormat,
    wrap_width: usize,
) -> Result<EmittedFile, SeqPrepError> {
    let stem = sanitize_identifier(&record.identifier);
    match format {
        OutputFormat::Fasta | OutputFormat::Cluster => {
            let seq_record = SeqRecord {
                header: record.identifier.clone(),
                sequence: record.sequence.clone(),
            };
            Ok(EmittedFile {
                path: PathBuf::from(TRAINING_SUBDIR).join(format!("{}.fasta", stem)),
                content: format_fasta(&seq_record, wrap_width),
            })
        }
        OutputFormat::Yaml => {
            let content = serde_yaml::to_string(&YamlRecord {
                name: &record.identifier,
                sequence: &record.sequence,
                msa: &record.msa_reference,
            })?;
            Ok(EmittedFile {
                path: PathBuf::from(TRAINING_SUBDIR).join(format!("{}.yaml", stem)),
                content,
            })
        }
    }
}

/// The aggregate cluster FASTA: every record in batch order, one header each.
pub fn cluster_file(records: &[Record], wrap_width: usize) -> EmittedFile {
    let mut content = String::new();
    for record in records {
        let seq_record = SeqRecord {
            header: record.identifier.clone(),
            sequence: record.sequence.clone(),
        };
        content.push_str(&format_fasta(&seq_record, wrap_width));
    }
    EmittedFile {
        path: PathBuf::from(CLUSTER_FILE),
        content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, seq: &str) -> Record {
        Record {
            identifier: id.to_string(),
            sequence: seq.to_string(),
            msa_reference: "empty".to_string(),
        }
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("A4T;K8R"), "A4T_K8R");
        assert_eq!(sanitize_identifier("variant 12/b"), "variant_12_b");
        assert_eq!(sanitize_identifier("plain-name_0.1"), "plain-name_0.1");
    }

    #[test]
    fn test_emit_fasta() {
        let file = emit_record(&record("v1", "MKTAYIAK"), OutputFormat::Fasta, 0).unwrap();
        assert_eq!(file.path, PathBuf::from("training_data/v1.fasta"));
        assert_eq!(file.content, ">v1\nMKTAYIAK\n");
    }

    #[test]
    fn test_emit_fasta_header_keeps_raw_identifier() {
        // The file name is sanitized, the FASTA header is not.
        let file = emit_record(&record("A4T;K8R", "MKTTYIAR"), OutputFormat::Fasta, 0).unwrap();
        assert_eq!(file.path, PathBuf::from("training_data/A4T_K8R.fasta"));
        assert!(file.content.starts_with(">A4T;K8R\n"));
    }

    #[test]
    fn test_emit_yaml() {
        let file = emit_record(&record("v1", "MKTAYIAK"), OutputFormat::Yaml, 0).unwrap();
        assert_eq!(file.path, PathBuf::from("training_data/v1.yaml"));
        assert_eq!(file.content, "name: v1\nsequence: MKTAYIAK\nmsa: empty\n");
    }

    #[test]
    fn test_cluster_file_keeps_batch_order() {
        let records = vec![record("b", "AAAA"), record("a", "CCCC")];
        let file = cluster_file(&records, 0);
        assert_eq!(file.path, PathBuf::from("msa.fasta"));
        assert_eq!(file.content, ">b\nAAAA\n>a\nCCCC\n");
    }
}
