// SPDX-License-Identifier: MIT

use std::{
    fmt,
    fs,
    path::{Path, PathBuf},
};

use chrono::Local;
use clap::{Parser, ValueEnum};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};

use crate::batch::{run_batch, BatchInput, BatchOptions, MutationRow, OutputManifest, SequenceRow};
use crate::emit::{OutputFormat, DEFAULT_WRAP_WIDTH};
use crate::errors::SeqPrepError;
use crate::mutation::DEFAULT_DELIMITER;
use crate::reference::load_reference;

const MUTATIONS_COLUMN: &str = "aaMutations";
const NAME_COLUMN: &str = "name";
const SEQUENCE_COLUMN: &str = "sequence";

#[derive(Debug, Parser)]
#[command(version, about = "Generate pipeline input files from a mutations or sequences table", long_about = None)]
struct Cli {
    /// CSV/TSV file; 'aaMutations' column (mutations mode) or 'name' and
    /// 'sequence' columns (sequences mode)
    #[arg(long)]
    data: String,

    /// Reference sequence (.fasta, or .yaml with an explicit numbering map);
    /// required in mutations mode
    #[arg(long)]
    original: Option<String>,

    /// MSA file path stored in the generated files
    #[arg(long)]
    msa: Option<String>,

    /// Output format
    #[arg(long = "file-type", default_value_t = OutputFormat::Fasta,
        help = "Output format [fasta|cluster|yaml] (or just f|c|y); default: fasta",
        hide_default_value = true,
        hide_possible_values = true,
    )]
    file_type: OutputFormat,

    /// Input mode; auto-detected from the header row if not specified
    #[arg(long)]
    mode: Option<InputMode>,

    /// Column separator (default: ',' for .csv, else tab)
    #[arg(long)]
    sep: Option<char>,

    /// Separator between mutation tokens within one field
    #[arg(long = "mutation-sep", default_value_t = DEFAULT_DELIMITER)]
    mutation_sep: char,

    /// Output directory (default: data/<timestamp>)
    #[arg(long = "output-dir")]
    output_dir: Option<String>,

    /// FASTA line width; 0 disables wrapping
    #[arg(long, default_value_t = DEFAULT_WRAP_WIDTH)]
    wrap: usize,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum InputMode {
    #[clap(name = "mutations")]
    #[clap(alias = "m")]
    Mutations,
    #[clap(name = "sequences")]
    #[clap(alias = "s")]
    Sequences,
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InputMode::Mutations => "mutations",
            InputMode::Sequences => "sequences",
        };
        write!(f, "{}", s)
    }
}

/// Infer the column separator from the file extension: ',' for .csv, else tab.
fn infer_sep(path: &str) -> char {
    if path.to_lowercase().ends_with(".csv") {
        ','
    } else {
        '\t'
    }
}

struct Table {
    headers: Vec<String>,
    rows: Vec<StringRecord>,
}

impl Table {
    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn cell<'a>(&self, row: &'a StringRecord, column: usize) -> &'a str {
        row.get(column).unwrap_or("").trim()
    }
}

fn load_table(path: &str, sep: char) -> Result<Table, SeqPrepError> {
    let mut sep_buf = [0u8; 4];
    let sep_bytes = sep.encode_utf8(&mut sep_buf).as_bytes();
    if sep_bytes.len() != 1 {
        return Err(SeqPrepError::Table(format!(
            "separator '{}' is not a single-byte character",
            sep
        )));
    }
    let mut reader = ReaderBuilder::new()
        .delimiter(sep_bytes[0])
        .from_path(path)?;
    let headers = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
    Ok(Table { headers, rows })
}

fn detect_mode(table: &Table) -> Result<InputMode, SeqPrepError> {
    let has_mutations = table.column(MUTATIONS_COLUMN).is_some();
    let has_sequences =
        table.column(NAME_COLUMN).is_some() && table.column(SEQUENCE_COLUMN).is_some();
    if has_sequences && !has_mutations {
        info!("auto-detected sequences mode ('name' and 'sequence' columns)");
        Ok(InputMode::Sequences)
    } else if has_mutations {
        info!("auto-detected mutations mode ('aaMutations' column)");
        Ok(InputMode::Mutations)
    } else {
        Err(SeqPrepError::Table(format!(
            "could not detect input mode: the table needs either an '{}' column \
             (mutations mode, also requires --original) or '{}' and '{}' columns \
             (sequences mode)",
            MUTATIONS_COLUMN, NAME_COLUMN, SEQUENCE_COLUMN
        )))
    }
}

/// Row identifiers in mutations mode: the 'name' column when present,
/// otherwise the mutation string itself ('wildtype' when it is blank).
/// Collisions surface later as DuplicateIdentifier.
fn mutation_rows(table: &Table) -> Result<Vec<MutationRow>, SeqPrepError> {
    let muts_col = table.column(MUTATIONS_COLUMN).ok_or_else(|| {
        SeqPrepError::Table(format!("mutations mode needs an '{}' column", MUTATIONS_COLUMN))
    })?;
    let name_col = table.column(NAME_COLUMN);
    let rows = table
        .rows
        .iter()
        .map(|row| {
            let mutations = table.cell(row, muts_col).to_string();
            let identifier = match name_col {
                Some(col) => table.cell(row, col).to_string(),
                None if mutations.is_empty() => "wildtype".to_string(),
                None => mutations.clone(),
            };
            MutationRow {
                identifier,
                mutations,
            }
        })
        .collect();
    Ok(rows)
}

fn sequence_rows(table: &Table) -> Result<Vec<SequenceRow>, SeqPrepError> {
    let name_col = table.column(NAME_COLUMN).ok_or_else(|| {
        SeqPrepError::Table(format!("sequences mode needs a '{}' column", NAME_COLUMN))
    })?;
    let seq_col = table.column(SEQUENCE_COLUMN).ok_or_else(|| {
        SeqPrepError::Table(format!("sequences mode needs a '{}' column", SEQUENCE_COLUMN))
    })?;
    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let identifier = table.cell(row, name_col).to_string();
            let sequence = table.cell(row, seq_col).to_string();
            if identifier.is_empty() || sequence.is_empty() {
                return Err(SeqPrepError::Table(format!(
                    "row {}: empty '{}' or '{}' value",
                    i + 1,
                    NAME_COLUMN,
                    SEQUENCE_COLUMN
                )));
            }
            Ok(SequenceRow {
                identifier,
                sequence,
            })
        })
        .collect()
}

fn write_manifest(manifest: &OutputManifest, output_dir: &Path) -> Result<(), SeqPrepError> {
    for file in &manifest.files {
        let target = output_dir.join(&file.path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!("writing {}", target.display());
        fs::write(&target, &file.content)?;
    }
    Ok(())
}

pub fn run() -> Result<(), SeqPrepError> {
    env_logger::init();
    let cli = Cli::parse();

    let sep = cli.sep.unwrap_or_else(|| infer_sep(&cli.data));
    let table = load_table(&cli.data, sep)?;
    info!("loaded {} rows from {}", table.rows.len(), cli.data);

    let mode = match cli.mode {
        Some(mode) => mode,
        None => detect_mode(&table)?,
    };

    let input = match mode {
        InputMode::Mutations => {
            let original = cli.original.as_deref().ok_or_else(|| {
                SeqPrepError::Load(String::from(
                    "mutations mode requires --original (reference sequence)",
                ))
            })?;
            let reference = load_reference(original)?;
            info!(
                "reference: {} residues, {} numbered positions",
                reference.sequence.chars().count(),
                reference.numbering.len()
            );
            BatchInput::Mutations {
                rows: mutation_rows(&table)?,
                reference,
            }
        }
        InputMode::Sequences => BatchInput::Sequences {
            rows: sequence_rows(&table)?,
        },
    };

    let opts = BatchOptions {
        format: cli.file_type,
        msa_reference: cli.msa.unwrap_or_else(|| String::from("empty")),
        wrap_width: cli.wrap,
        mutation_delimiter: cli.mutation_sep,
    };

    // Build the whole manifest before touching the disk, so a failing row
    // never leaves a half-written batch behind.
    let manifest = run_batch(&input, &opts)?;

    let output_dir = match cli.output_dir {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from("data").join(Local::now().format("%Y%m%d_%H%M%S").to_string()),
    };
    write_manifest(&manifest, &output_dir)?;

    info!(
        "{} mode, {} format: {} files",
        mode,
        opts.format,
        manifest.files.len()
    );
    println!();
    println!("All files have been generated correctly.");
    println!("Output directory: {}", output_dir.display());
    Ok(())
}
