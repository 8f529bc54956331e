// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::errors::SeqPrepError;
use crate::seq::{SeqFile, SeqRecord};

pub fn read_fasta_file<P: AsRef<Path>>(path: P) -> Result<SeqFile, SeqPrepError> {
    let file = File::open(&path)?;
    let mut result: SeqFile = Vec::new();
    let mut current_record: Option<SeqRecord> = None;

    for line in BufReader::new(file).lines() {
        let l: String = line?;
        if let Some(hdr) = l.strip_prefix('>') {
            // push existing record
            if let Some(record) = current_record.take() {
                result.push(record);
            }
            current_record = Some(SeqRecord {
                header: hdr.to_string(),
                sequence: String::new(),
            });
        } else if !l.trim().is_empty() {
            match current_record.as_mut() {
                // append line to current record's sequence
                Some(record) => record.sequence.push_str(l.trim()),
                None => {
                    return Err(SeqPrepError::Load(format!(
                        "{}: sequence data before first '>' header",
                        path.as_ref().display()
                    )))
                }
            }
        }
    }
    if let Some(record) = current_record.take() {
        result.push(record);
    }
    Ok(result)
}

/// FASTA text for one record, sequence wrapped at `width` columns.
/// A width of 0 means a single unwrapped line. Always ends in a newline, so
/// records can be concatenated into an aggregate file byte-stably.
pub fn format_fasta(record: &SeqRecord, width: usize) -> String {
    let mut out = format!(">{}\n", record.header);
    if width == 0 {
        out.push_str(&record.sequence);
        out.push('\n');
    } else {
        let chars: Vec<char> = record.sequence.chars().collect();
        for chunk in chars.chunks(width) {
            out.extend(chunk.iter());
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_fasta_file_single() {
        let path = "data/test1.fasta";
        let fasta: SeqFile = read_fasta_file(path).expect("Test file not found");
        assert_eq!(fasta[0].header, "seq1");
        assert_eq!(fasta[0].sequence, "MKTAYIAK");
    }

    #[test]
    fn test_read_fasta_file_multi() {
        let path = "data/test2.fasta";
        let fasta: SeqFile = read_fasta_file(path).expect("Test file not found");
        assert_eq!(fasta.len(), 3);
        assert_eq!(fasta[0].header, "seq1");
        assert_eq!(fasta[0].sequence, "TTGCCG-CGA");
        assert_eq!(fasta[1].header, "seq2");
        assert_eq!(fasta[1].sequence, "TTCCCGGCGA");
        assert_eq!(fasta[2].header, "seq3");
        assert_eq!(fasta[2].sequence, "TTACCG-CAA");
    }

    #[test]
    fn test_read_fasta_file_wrapped_lines() {
        // Multi-line records concatenate into one sequence string.
        let path = "data/test3.fasta";
        let fasta: SeqFile = read_fasta_file(path).expect("Test file not found");
        assert_eq!(fasta[0].header, "P00547 wrapped at 20");
        assert_eq!(
            fasta[0].sequence,
            "MVKVYAPASSANMSVGFDVLGAAVTPVDGALLGDVVTVEAAETFSLNNLGRFADKLPSEP"
        );
    }

    #[test]
    fn test_read_fasta_leading_garbage_is_an_error() {
        let err = read_fasta_file("data/ref.yaml").unwrap_err();
        assert!(matches!(err, SeqPrepError::Load(_)));
    }

    #[test]
    fn test_format_fasta_unwrapped() {
        let rec = SeqRecord {
            header: "x".to_string(),
            sequence: "MKTAYIAK".to_string(),
        };
        assert_eq!(format_fasta(&rec, 0), ">x\nMKTAYIAK\n");
    }

    #[test]
    fn test_format_fasta_wrapped() {
        let rec = SeqRecord {
            header: "x".to_string(),
            sequence: "MKTAYIAK".to_string(),
        };
        assert_eq!(format_fasta(&rec, 3), ">x\nMKT\nAYI\nAK\n");
        // Sequence length a multiple of the width: no trailing empty line.
        assert_eq!(format_fasta(&rec, 4), ">x\nMKTA\nYIAK\n");
    }
}
