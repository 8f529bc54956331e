// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::errors::SeqPrepError;
use crate::seq::fasta::read_fasta_file;

/// Map from database residue number to zero-based index into the reference
/// sequence. Kept as an explicit finite mapping (not an offset) so that
/// non-contiguous numbering schemes -- insertions, gaps in structural
/// numbering -- are representable without special-casing.
#[derive(Debug, Clone)]
pub struct NumberingMap {
    map: BTreeMap<u32, usize>,
}

impl NumberingMap {
    /// Identity over 1-based positions: database number N maps to index N-1.
    pub fn identity(len: usize) -> Self {
        Self::with_offset(1, len)
    }

    /// Database number `offset + i` maps to index `i`.
    pub fn with_offset(offset: u32, len: usize) -> Self {
        let map = (0..len).map(|i| (offset + i as u32, i)).collect();
        NumberingMap { map }
    }

    pub fn from_map(map: BTreeMap<u32, usize>) -> Self {
        NumberingMap { map }
    }

    pub fn resolve(&self, position: u32) -> Option<usize> {
        self.map.get(&position).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn max_index(&self) -> Option<usize> {
        self.map.values().copied().max()
    }
}

/// Reference sequence plus its numbering, loaded once per batch and shared
/// read-only across all rows.
#[derive(Debug, Clone)]
pub struct Reference {
    pub sequence: String,
    pub numbering: NumberingMap,
}

#[derive(Debug, Deserialize)]
struct RefConfig {
    sequence: String,
    numbering: BTreeMap<u32, usize>,
}

/// Load a reference from either a FASTA file (identity numbering, unless the
/// header carries an `offset=<n>` token) or a YAML config with an embedded
/// number-to-index map. Dispatches on the `.yaml`/`.yml` extension.
pub fn load_reference<P: AsRef<Path>>(path: P) -> Result<Reference, SeqPrepError> {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    match ext {
        "yaml" | "yml" => load_yaml_reference(path),
        _ => load_fasta_reference(path),
    }
}

fn load_fasta_reference<P: AsRef<Path>>(path: P) -> Result<Reference, SeqPrepError> {
    // Unreadable reference files are Load errors, with the path attached.
    let records = read_fasta_file(&path).map_err(|e| match e {
        SeqPrepError::Io(io) => {
            SeqPrepError::Load(format!("{}: {}", path.as_ref().display(), io))
        }
        other => other,
    })?;
    let first = records.into_iter().next().ok_or_else(|| {
        SeqPrepError::Load(format!("{}: no FASTA records", path.as_ref().display()))
    })?;
    if first.sequence.is_empty() {
        return Err(SeqPrepError::Load(format!(
            "{}: reference sequence is empty",
            path.as_ref().display()
        )));
    }
    let len = first.sequence.chars().count();
    let numbering = match header_offset(&first.header) {
        Some(offset) => {
            debug!("reference header declares numbering offset {}", offset);
            NumberingMap::with_offset(offset, len)
        }
        None => NumberingMap::identity(len),
    };
    Ok(Reference {
        sequence: first.sequence,
        numbering,
    })
}

fn load_yaml_reference<P: AsRef<Path>>(path: P) -> Result<Reference, SeqPrepError> {
    let file = File::open(&path)
        .map_err(|e| SeqPrepError::Load(format!("{}: {}", path.as_ref().display(), e)))?;
    let config: RefConfig = serde_yaml::from_reader(file)?;
    if config.sequence.is_empty() {
        return Err(SeqPrepError::Load(format!(
            "{}: reference sequence is empty",
            path.as_ref().display()
        )));
    }
    let numbering = NumberingMap::from_map(config.numbering);
    if numbering.is_empty() {
        return Err(SeqPrepError::Load(format!(
            "{}: numbering map is empty",
            path.as_ref().display()
        )));
    }
    // Every mapped index must land inside the sequence; catching a stale map
    // here beats an unmapped-position error halfway through a batch.
    let len = config.sequence.chars().count();
    if let Some(max) = numbering.max_index() {
        if max >= len {
            return Err(SeqPrepError::Load(format!(
                "{}: numbering maps to index {} but the sequence has {} residues",
                path.as_ref().display(),
                max,
                len
            )));
        }
    }
    Ok(Reference {
        sequence: config.sequence,
        numbering,
    })
}

/// An explicit numbering offset in a FASTA header, e.g. `>lysozyme offset=18`.
/// Absent a declared offset, identity numbering is the defined default.
fn header_offset(header: &str) -> Option<u32> {
    header
        .split_whitespace()
        .find_map(|tok| tok.strip_prefix("offset="))
        .and_then(|v| v.parse().ok())
}
