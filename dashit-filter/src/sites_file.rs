//! Sites-to-reads files, as written by `crispr_sites -r`.
//!
//! ```text
//! Total reads: 1250
//! ACGTACGTACGTACGTACGT 12 57 57 803
//! TTGACCAGTCAGTCCGATAA 3
//! ```
//!
//! The first line carries the number of reads the file was built from; each
//! following line is a candidate site followed by the (1-based) indices of
//! the reads it occurs in.

use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::LazyLock;

use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use tracing::info;

use dashit_core::consts::GUIDE_LEN;
use dashit_core::utils::get_dynamic_reader;

use crate::errors::{FilterError, FilterResult};
use crate::reasons::FilterReasons;

static TOTAL_READS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Total.*:\s*(\d+)").expect("valid regex"));

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SitesHeader {
    pub line: String,
    pub total_reads: usize,
}

///
/// A candidate site and the distinct reads it occurs in, in first-seen
/// order.
///
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SiteRecord {
    pub site: String,
    pub reads: Vec<usize>,
}

pub fn parse_total_reads(line: &str) -> Option<usize> {
    TOTAL_READS.captures(line)?.get(1)?.as_str().parse().ok()
}

///
/// Parse a `<site> <read> <read> ...` line. A read listed more than once is
/// kept once; fields that are not read indices are skipped.
///
pub fn parse_site_record(line: &str) -> Option<SiteRecord> {
    let mut fields = line.split_whitespace();
    let site = fields.next()?.to_string();
    let mut reads: Vec<usize> = Vec::new();
    for read in fields.filter_map(|f| f.parse::<usize>().ok()) {
        if !reads.contains(&read) {
            reads.push(read);
        }
    }
    Some(SiteRecord { site, reads })
}

/// The guide a sites-file line describes: its first 20 characters.
fn line_guide(line: &str) -> &str {
    line.get(..GUIDE_LEN).unwrap_or(line)
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg} ({pos} sites)")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb
}

fn header_of(path: &Path, line: Option<std::io::Result<String>>) -> FilterResult<SitesHeader> {
    let line = line.ok_or_else(|| FilterError::EmptySitesFile(path.display().to_string()))??;
    let total_reads = parse_total_reads(&line)
        .ok_or_else(|| FilterError::MissingReadCount(path.display().to_string()))?;
    Ok(SitesHeader { line, total_reads })
}

fn open(path: &Path) -> FilterResult<std::io::BufReader<Box<dyn std::io::Read>>> {
    get_dynamic_reader(path)
        .map_err(|e| FilterError::FileReadError(format!("{}: {}", path.display(), e)))
}

///
/// Read the header and the candidate guide of every site line.
///
/// A missing or malformed header is an input error.
///
pub fn read_candidate_guides(path: &Path) -> FilterResult<(SitesHeader, Vec<String>)> {
    let mut lines = open(path)?.lines();
    let header = header_of(path, lines.next())?;
    info!(
        "Reading in candidate guides from {} ({} reads)",
        path.display(),
        header.total_reads
    );

    let pb = spinner(format!("Reading {}", path.display()));
    let mut guides = Vec::new();
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        guides.push(line_guide(&line).to_string());
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok((header, guides))
}

///
/// Copy the sites file to `out`, dropping every line whose guide has a
/// reason to be excluded. The header line is always written. Returns the
/// number of site lines kept.
///
pub fn write_filtered<W: Write>(
    path: &Path,
    reasons: &FilterReasons,
    mut out: W,
) -> FilterResult<usize> {
    let mut lines = open(path)?.lines();
    let header = header_of(path, lines.next())?;
    writeln!(out, "{}", header.line)?;

    let mut kept = 0;
    for line in lines {
        let line = line?;
        if line.trim().is_empty() || reasons.contains(line_guide(&line)) {
            continue;
        }
        writeln!(out, "{}", line)?;
        kept += 1;
    }
    out.flush()?;
    Ok(kept)
}

///
/// Read every site record, skipping a leading `Total ...` header if there
/// is one.
///
pub fn read_site_records(path: &Path) -> FilterResult<(Option<SitesHeader>, Vec<SiteRecord>)> {
    let pb = spinner(format!("Reading {}", path.display()));
    let mut header = None;
    let mut records = Vec::new();

    for (i, line) in open(path)?.lines().enumerate() {
        let line = line?;
        if i == 0 {
            if let Some(total_reads) = parse_total_reads(&line) {
                header = Some(SitesHeader { line, total_reads });
                continue;
            }
        }
        if let Some(record) = parse_site_record(&line) {
            records.push(record);
            pb.inc(1);
        }
    }
    pb.finish_and_clear();

    Ok((header, records))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use tempfile::NamedTempFile;

    const G1: &str = "GACTTCGAATGGCATCCTGA";
    const G2: &str = "GTCCAGTTACAGGTCAAGTA";
    const G3: &str = "AAAAAAAAAAAAAAAAAAAA";

    #[fixture]
    fn sites_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Total reads: 120").unwrap();
        writeln!(file, "{} 1 5 5 9", G1).unwrap();
        writeln!(file, "{} 2", G2).unwrap();
        writeln!(file, "{} 3 4", G3).unwrap();
        file
    }

    #[rstest]
    #[case("Total reads: 120", Some(120))]
    #[case("Total number of reads processed:42", Some(42))]
    #[case("reads: 120", None)]
    #[case("", None)]
    fn test_parse_total_reads(#[case] line: &str, #[case] expected: Option<usize>) {
        assert_eq!(parse_total_reads(line), expected);
    }

    #[rstest]
    fn test_parse_site_record_deduplicates_reads() {
        let record = parse_site_record(&format!("{} 1 5 5 9 1", G1)).unwrap();
        assert_eq!(record.site, G1);
        assert_eq!(record.reads, vec![1, 5, 9]);
        assert_eq!(parse_site_record("   "), None);
    }

    #[rstest]
    fn test_read_candidate_guides(sites_file: NamedTempFile) {
        let (header, guides) = read_candidate_guides(sites_file.path()).unwrap();
        assert_eq!(header.total_reads, 120);
        assert_eq!(guides, vec![G1, G2, G3]);
    }

    #[rstest]
    fn test_missing_header_is_fatal() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{} 1 2", G1).unwrap();
        assert!(matches!(
            read_candidate_guides(file.path()),
            Err(FilterError::MissingReadCount(_))
        ));

        let empty = NamedTempFile::new().unwrap();
        assert!(matches!(
            read_candidate_guides(empty.path()),
            Err(FilterError::EmptySitesFile(_))
        ));
    }

    #[rstest]
    fn test_write_filtered(sites_file: NamedTempFile) {
        let reasons: FilterReasons = [(G2, "hairpin".to_string())].into_iter().collect();
        let mut out = Vec::new();
        let kept = write_filtered(sites_file.path(), &reasons, &mut out).unwrap();

        assert_eq!(kept, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("Total reads: 120\n{} 1 5 5 9\n{} 3 4\n", G1, G3)
        );
    }

    #[rstest]
    fn test_read_site_records(sites_file: NamedTempFile) {
        let (header, records) = read_site_records(sites_file.path()).unwrap();
        assert_eq!(header.map(|h| h.total_reads), Some(120));
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].reads, vec![1, 5, 9]);
    }
}
