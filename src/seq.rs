// SPDX-License-Identifier: MIT

pub mod fasta;

// A record for sequences: some description plus a raw residue string. Works
// for anything FASTA-like; annotations (if any) stay in the header.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqRecord {
    pub header: String,
    pub sequence: String,
}

// For our purposes, a sequence file is just a Vec of sequence records.
//
pub type SeqFile = Vec<SeqRecord>;
