use std::ffi::OsStr;
use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use bio::io::fasta;
use flate2::read::MultiGzDecoder;

use crate::errors::{SequenceError, SequenceResult};
use crate::models::Sequence;

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    let reader = BufReader::new(file);

    Ok(reader)
}

/// Complement of a single nucleotide. Anything outside ACGT maps to `N`.
#[inline]
pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        b'a' => b't',
        b'c' => b'g',
        b'g' => b'c',
        b't' => b'a',
        _ => b'N',
    }
}

pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

///
/// Read every record of a (possibly gzipped) FASTA file into [Sequence]s.
///
/// The description after the id is kept on the sequence so that gene
/// metadata can be parsed from it later.
///
pub fn read_fasta_sequences(path: &Path) -> SequenceResult<Vec<Sequence>> {
    let reader = get_dynamic_reader(path)
        .map_err(|e| SequenceError::FastaReadError(format!("{}: {}", path.display(), e)))?;
    let records = fasta::Reader::new(reader).records();

    let mut sequences = Vec::new();
    for record in records {
        let record = record.map_err(|e| {
            SequenceError::FastaReadError(format!("{}: {}", path.display(), e))
        })?;
        let mut sequence = Sequence::new(record.id(), record.seq())?;
        sequence.description = record.desc().map(|d| d.to_string());
        sequences.push(sequence);
    }

    Ok(sequences)
}

///
/// Read a FASTA file that must contain exactly one sequence.
///
/// More than one record is not supported by guide design and is reported
/// as [SequenceError::MultipleSequences].
///
pub fn read_single_sequence(path: &Path) -> SequenceResult<Sequence> {
    let mut sequences = read_fasta_sequences(path)?;
    match sequences.len() {
        0 => Err(SequenceError::EmptyFasta(path.display().to_string())),
        1 => Ok(sequences.remove(0)),
        _ => Err(SequenceError::MultipleSequences(path.display().to_string())),
    }
}

/// Strip every extension from a file name, e.g. `reads.fasta.gz` -> `reads`.
pub fn remove_all_extensions(path: &Path) -> String {
    let mut stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    while let Some(inner) = Path::new(&stem).file_stem() {
        if Path::new(&stem).extension().is_none() {
            break;
        }
        stem = inner.to_string_lossy().to_string();
    }

    stem
}
