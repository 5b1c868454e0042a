use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{GeneError, GeneResult};
use crate::utils::get_dynamic_reader;

static AMINO_ACID_SUBSTITUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z-](\d+)[A-Z-]$").expect("valid regex"));
static NUCLEOTIDE_INSERTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^nt(\d+)\+(\d+)").expect("valid regex"));
static STOP_OR_FRAMESHIFT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z-](\d+)(STOP|fs)").expect("valid regex"));
static INSERTED_NUCLEOTIDES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+nt(\d+):([A-Z-]+)$").expect("valid regex"));

///
/// A labelled stretch of nucleotides implicated in a known resistance
/// mutation, in unpadded gene coordinates.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone, Serialize, Deserialize)]
pub struct MutationRange {
    pub label: String,
    pub range: Range<usize>,
}

impl MutationRange {
    /// Shift the range by the length of the sequence prepended to the gene.
    pub fn shifted(&self, offset: usize) -> MutationRange {
        MutationRange {
            label: self.label.clone(),
            range: self.range.start + offset..self.range.end + offset,
        }
    }

    /// An empty range overlaps nothing.
    pub fn overlaps(&self, other: &Range<usize>) -> bool {
        !self.range.is_empty()
            && self.range.start < other.end && other.start < self.range.end
    }
}

fn capture_usize(caps: &regex::Captures, group: usize) -> Option<usize> {
    caps.get(group)?.as_str().parse().ok()
}

///
/// Translate a mutation label into the nucleotide range it touches.
///
/// Supported forms:
/// - `E502Q`: amino acid substitution, the whole codon
/// - `nt420+2:GG`: `2` nucleotides starting at `420`
/// - `Y99STOP` / `Y99fs`: stop or frameshift, first two bases of the codon
/// - `+nt349:CACTG`: insertion after nucleotide `349`
///
/// Returns `None` for anything else, including positions too large to
/// represent.
pub fn parse_mutation(label: &str) -> Option<Range<usize>> {
    if let Some(caps) = AMINO_ACID_SUBSTITUTION.captures(label) {
        return codon_range(capture_usize(&caps, 1)?, 3);
    }
    if let Some(caps) = NUCLEOTIDE_INSERTION.captures(label) {
        let start = capture_usize(&caps, 1)?;
        let len = capture_usize(&caps, 2)?;
        return Some(start..start.checked_add(len)?);
    }
    if let Some(caps) = STOP_OR_FRAMESHIFT.captures(label) {
        return codon_range(capture_usize(&caps, 1)?, 2);
    }
    if let Some(caps) = INSERTED_NUCLEOTIDES.captures(label) {
        let start = capture_usize(&caps, 1)?;
        return Some(start..start.checked_add(2)?);
    }
    None
}

/// The first `len` nucleotides of codon `codon`.
fn codon_range(codon: usize, len: usize) -> Option<Range<usize>> {
    let start = codon.checked_mul(3)?;
    Some(start..start.checked_add(len)?)
}

///
/// Parse a list of labels, dropping (and logging) the ones that can't be
/// interpreted.
///
pub fn parse_mutation_labels<'a, I>(labels: I) -> Vec<MutationRange>
where
    I: IntoIterator<Item = &'a str>,
{
    labels
        .into_iter()
        .filter_map(|label| match parse_mutation(label) {
            Some(range) => Some(MutationRange {
                label: label.to_string(),
                range,
            }),
            None => {
                warn!("Mutation not parsed: {}", label);
                None
            }
        })
        .collect()
}

const ACCESSION_COLUMN: &str = "Accession";
const MUTATIONS_COLUMN: &str = "Mutations";

#[derive(Debug, Deserialize)]
struct SnpRow {
    #[serde(rename = "Accession", default)]
    accession: String,
    #[serde(rename = "Mutations", default)]
    mutations: String,
}

///
/// Mutation labels per accession, loaded from a tab-separated SNP table with
/// `Accession` and `Mutations` columns.
///
#[derive(Debug, Clone, Default)]
pub struct MutationIndex {
    mutations: HashMap<String, Vec<String>>,
}

impl MutationIndex {
    pub fn from_file(path: &Path) -> GeneResult<Self> {
        let reader =
            get_dynamic_reader(path).map_err(|e| GeneError::FileReadError(e.to_string()))?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Ok(MutationIndex::default());
        }
        for column in [ACCESSION_COLUMN, MUTATIONS_COLUMN] {
            if !headers.iter().any(|h| h == column) {
                return Err(GeneError::MissingColumn(column.to_string()));
            }
        }

        let mut mutations: HashMap<String, Vec<String>> = HashMap::new();
        for row in reader.deserialize() {
            let row: SnpRow = row?;
            if row.accession.is_empty() || row.mutations.is_empty() {
                continue;
            }
            mutations
                .entry(row.accession)
                .or_default()
                .extend(row.mutations.split(',').map(|s| s.trim().to_string()));
        }

        Ok(MutationIndex { mutations })
    }

    pub fn mutation_ranges(&self, accession: &str) -> Vec<MutationRange> {
        match self.mutations.get(accession) {
            Some(labels) => parse_mutation_labels(labels.iter().map(String::as_str)),
            None => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io::Write;

    #[rstest]
    #[case("E502Q", Some(1506..1509))]
    #[case("nt420+2:GG", Some(420..422))]
    #[case("Y99STOP", Some(297..299))]
    #[case("Q12fs", Some(36..38))]
    #[case("+nt349:CACTG", Some(349..351))]
    #[case("garbage", None)]
    #[case("nt420+0:", Some(420..420))]
    #[case("A6148914691236517206B", None)]
    #[case("nt18446744073709551615+1:A", None)]
    #[case("Y6148914691236517205STOP", None)]
    fn test_parse_mutation(#[case] label: &str, #[case] expected: Option<Range<usize>>) {
        assert_eq!(parse_mutation(label), expected);
    }

    #[rstest]
    fn test_shifted_and_overlaps() {
        let m = MutationRange {
            label: "E2Q".to_string(),
            range: 6..9,
        };
        let padded = m.shifted(10);
        assert_eq!(padded.range, 16..19);
        assert!(padded.overlaps(&(18..30)));
        assert!(!padded.overlaps(&(19..30)));
        assert!(!padded.overlaps(&(0..16)));

        let empty = MutationRange {
            label: "nt420+0:".to_string(),
            range: parse_mutation("nt420+0:").unwrap(),
        };
        assert!(!empty.overlaps(&(400..430)));
        assert!(!empty.shifted(10).overlaps(&(400..440)));
    }

    #[rstest]
    fn test_mutation_index_accumulates_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Name\tAccession\tMutations").unwrap();
        writeln!(file, "gyrA\t3000001\tS83L, D87N").unwrap();
        writeln!(file, "gyrA\t3000001\tnotamutation").unwrap();
        writeln!(file, "parC\t\tS80I").unwrap();

        let index = MutationIndex::from_file(file.path()).unwrap();
        assert_eq!(index.len(), 1);

        let ranges = index.mutation_ranges("3000001");
        let labels: Vec<&str> = ranges.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["S83L", "D87N"]);
        assert!(index.mutation_ranges("missing").is_empty());
    }

    #[rstest]
    fn test_mutation_index_quoted_labels() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Name\tAccession\tMutations").unwrap();
        writeln!(file, "gyrA\t3000001\t\"S83L,D87N\"").unwrap();

        let index = MutationIndex::from_file(file.path()).unwrap();
        let ranges = index.mutation_ranges("3000001");
        assert_eq!(
            ranges,
            vec![
                MutationRange {
                    label: "S83L".to_string(),
                    range: 249..252,
                },
                MutationRange {
                    label: "D87N".to_string(),
                    range: 261..264,
                },
            ]
        );
    }

    #[rstest]
    fn test_mutation_index_missing_column() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Name\tAccession").unwrap();
        writeln!(file, "gyrA\t3000001").unwrap();

        assert!(matches!(
            MutationIndex::from_file(file.path()),
            Err(GeneError::MissingColumn(c)) if c == "Mutations"
        ));
    }

    #[rstest]
    fn test_mutation_index_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(MutationIndex::from_file(file.path()).unwrap().is_empty());
    }
}
