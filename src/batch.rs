// SPDX-License-Identifier: MIT

use itertools::Itertools;
use log::debug;

use crate::emit::{
    cluster_file, emit_record, sanitize_identifier, EmittedFile, OutputFormat, Record,
    DEFAULT_WRAP_WIDTH,
};
use crate::errors::SeqPrepError;
use crate::mutation::{apply_mutations, parse_mutations, DEFAULT_DELIMITER};
use crate::reference::Reference;

/// One row of a mutations-mode table: whatever the caller chose as the
/// record identifier, plus the raw (still unparsed) mutation field.
#[derive(Debug, Clone)]
pub struct MutationRow {
    pub identifier: String,
    pub mutations: String,
}

/// One row of a sequences-mode table: the sequence is taken verbatim.
#[derive(Debug, Clone)]
pub struct SequenceRow {
    pub identifier: String,
    pub sequence: String,
}

/// Mode-specific, already-resolved input. Mode selection (schema sniffing)
/// is the caller's job; the core never guesses.
#[derive(Debug)]
pub enum BatchInput {
    Mutations {
        rows: Vec<MutationRow>,
        reference: Reference,
    },
    Sequences {
        rows: Vec<SequenceRow>,
    },
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub format: OutputFormat,
    pub msa_reference: String,
    pub wrap_width: usize,
    pub mutation_delimiter: char,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            format: OutputFormat::Fasta,
            msa_reference: "empty".to_string(),
            wrap_width: DEFAULT_WRAP_WIDTH,
            mutation_delimiter: DEFAULT_DELIMITER,
        }
    }
}

/// Generated files in input-row order (needed for reproducible downstream
/// diffing). Only returned on full success: any row failure aborts the batch
/// before a manifest exists, so there is never a half-written batch to trust.
#[derive(Debug)]
pub struct OutputManifest {
    pub files: Vec<EmittedFile>,
}

/// Run one batch: rows in, manifest of (relative path, content) out.
/// Rows are processed strictly in input order; the first failing row aborts
/// the whole run with its identifier attached to the error.
pub fn run_batch(input: &BatchInput, opts: &BatchOptions) -> Result<OutputManifest, SeqPrepError> {
    let records = match input {
        BatchInput::Mutations { rows, reference } => rows
            .iter()
            .map(|row| {
                debug!("row '{}': mutations '{}'", row.identifier, row.mutations);
                let ops = parse_mutations(&row.mutations, opts.mutation_delimiter)
                    .map_err(|e| e.for_row(&row.identifier))?;
                let sequence = apply_mutations(reference, &ops)
                    .map_err(|e| e.for_row(&row.identifier))?;
                Ok(Record {
                    identifier: row.identifier.clone(),
                    sequence,
                    msa_reference: opts.msa_reference.clone(),
                })
            })
            .collect::<Result<Vec<_>, SeqPrepError>>()?,
        BatchInput::Sequences { rows } => rows
            .iter()
            .map(|row| Record {
                identifier: row.identifier.clone(),
                sequence: row.sequence.clone(),
                msa_reference: opts.msa_reference.clone(),
            })
            .collect(),
    };

    // File names derive from identifiers, so a duplicate would silently
    // overwrite a sibling record. Checked in every format, not just cluster.
    if let Some(dup) = records
        .iter()
        .map(|r| sanitize_identifier(&r.identifier))
        .duplicates()
        .next()
    {
        return Err(SeqPrepError::DuplicateIdentifier(dup));
    }

    let mut files = records
        .iter()
        .map(|r| emit_record(r, opts.format, opts.wrap_width))
        .collect::<Result<Vec<_>, SeqPrepError>>()?;

    // In sequences mode there is nothing to cluster against a shared
    // reference, so cluster degenerates to per-record FASTA files.
    if opts.format == OutputFormat::Cluster && matches!(input, BatchInput::Mutations { .. }) {
        files.push(cluster_file(&records, opts.wrap_width));
    }

    Ok(OutputManifest { files })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::NumberingMap;
    use std::path::PathBuf;

    fn test_reference() -> Reference {
        Reference {
            sequence: "MKTAYIAK".to_string(),
            numbering: NumberingMap::identity(8),
        }
    }

    fn mutation_rows(specs: &[(&str, &str)]) -> Vec<MutationRow> {
        specs
            .iter()
            .map(|(id, muts)| MutationRow {
                identifier: id.to_string(),
                mutations: muts.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_mutations_batch_fasta() {
        let input = BatchInput::Mutations {
            rows: mutation_rows(&[("v1", "A4T;K8R"), ("wt", "")]),
            reference: test_reference(),
        };
        let opts = BatchOptions {
            wrap_width: 0,
            ..BatchOptions::default()
        };
        let manifest = run_batch(&input, &opts).unwrap();
        assert_eq!(manifest.files.len(), 2);
        assert_eq!(
            manifest.files[0].path,
            PathBuf::from("training_data/v1.fasta")
        );
        assert_eq!(manifest.files[0].content, ">v1\nMKTTYIAR\n");
        // An empty mutation field means "the reference itself".
        assert_eq!(manifest.files[1].content, ">wt\nMKTAYIAK\n");
    }

    #[test]
    fn test_manifest_order_matches_input_order() {
        let input = BatchInput::Sequences {
            rows: vec![
                SequenceRow {
                    identifier: "zzz".to_string(),
                    sequence: "AAAA".to_string(),
                },
                SequenceRow {
                    identifier: "aaa".to_string(),
                    sequence: "CCCC".to_string(),
                },
            ],
        };
        let manifest = run_batch(&input, &BatchOptions::default()).unwrap();
        assert_eq!(
            manifest.files[0].path,
            PathBuf::from("training_data/zzz.fasta")
        );
        assert_eq!(
            manifest.files[1].path,
            PathBuf::from("training_data/aaa.fasta")
        );
    }

    #[test]
    fn test_mutations_cluster_adds_aggregate() {
        let input = BatchInput::Mutations {
            rows: mutation_rows(&[("v1", "A4T"), ("v2", "K8R")]),
            reference: test_reference(),
        };
        let opts = BatchOptions {
            format: OutputFormat::Cluster,
            wrap_width: 0,
            ..BatchOptions::default()
        };
        let manifest = run_batch(&input, &opts).unwrap();
        assert_eq!(manifest.files.len(), 3);
        let aggregate = manifest.files.last().unwrap();
        assert_eq!(aggregate.path, PathBuf::from("msa.fasta"));
        assert_eq!(aggregate.content, ">v1\nMKTTYIAK\n>v2\nMKTAYIAR\n");
    }

    #[test]
    fn test_sequences_cluster_degenerates_to_fasta() {
        let input = BatchInput::Sequences {
            rows: vec![SequenceRow {
                identifier: "s1".to_string(),
                sequence: "MKTA".to_string(),
            }],
        };
        let opts = BatchOptions {
            format: OutputFormat::Cluster,
            ..BatchOptions::default()
        };
        let manifest = run_batch(&input, &opts).unwrap();
        assert_eq!(manifest.files.len(), 1);
        assert_eq!(
            manifest.files[0].path,
            PathBuf::from("training_data/s1.fasta")
        );
    }

    #[test]
    fn test_duplicate_identifiers_rejected() {
        let input = BatchInput::Sequences {
            rows: vec![
                SequenceRow {
                    identifier: "same".to_string(),
                    sequence: "AAAA".to_string(),
                },
                SequenceRow {
                    identifier: "same".to_string(),
                    sequence: "CCCC".to_string(),
                },
            ],
        };
        let opts = BatchOptions {
            format: OutputFormat::Cluster,
            ..BatchOptions::default()
        };
        match run_batch(&input, &opts).unwrap_err() {
            SeqPrepError::DuplicateIdentifier(id) => assert_eq!(id, "same"),
            other => panic!("expected DuplicateIdentifier, got {:?}", other),
        }
    }

    #[test]
    fn test_identifiers_colliding_after_sanitization_rejected() {
        // "v 1" and "v/1" both sanitize to "v_1".
        let input = BatchInput::Sequences {
            rows: vec![
                SequenceRow {
                    identifier: "v 1".to_string(),
                    sequence: "AAAA".to_string(),
                },
                SequenceRow {
                    identifier: "v/1".to_string(),
                    sequence: "CCCC".to_string(),
                },
            ],
        };
        assert!(matches!(
            run_batch(&input, &BatchOptions::default()).unwrap_err(),
            SeqPrepError::DuplicateIdentifier(_)
        ));
    }

    #[test]
    fn test_row_error_carries_identifier() {
        let input = BatchInput::Mutations {
            rows: mutation_rows(&[("good", "A4T"), ("bad", "A2T")]),
            reference: test_reference(),
        };
        match run_batch(&input, &BatchOptions::default()).unwrap_err() {
            SeqPrepError::ReferenceMismatch { row, position, .. } => {
                assert_eq!(row, "bad");
                assert_eq!(position, 2);
            }
            other => panic!("expected ReferenceMismatch, got {:?}", other),
        }
    }
}
