//! Greedy choice of sites that cover the most reads.
//!
//! Given which reads every candidate site occurs in, repeatedly take the
//! unused site hitting the most reads that are still below the coverage
//! target.

use std::io::Write;
use std::path::Path;

use bio::io::fasta;
use fxhash::{FxHashMap, FxHashSet};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, info};

use dashit_filter::sites_file::SiteRecord;

use crate::errors::{OptimizeError, OptimizeResult};

pub const REPORT_HEADER: [&str; 4] = [
    "Site",
    "Site index",
    "Number of reads covered by site",
    "cumulative number of reads covered",
];
pub const READ_COLUMN: &str = "random read hit by this guide";

///
/// One greedily chosen site.
///
#[derive(PartialEq, Debug, Clone)]
pub struct ReadCoverPick {
    pub site: String,
    /// index of the site in the input
    pub index: usize,
    /// reads this site hits that no earlier pick hit
    pub new_reads: usize,
    pub cumulative_reads: usize,
    /// a read hit by this site, when reads were supplied
    pub representative_read: Option<String>,
}

fn count_uncovered(reads: &[usize], coverage: &[usize], target: usize) -> usize {
    reads.iter().filter(|r| coverage[**r] < target).count()
}

///
/// Choose up to `num_sites` sites, each time the unused one with the most
/// reads covered fewer than `coverage_target` times (lowest index on ties).
///
/// Returns the indices of the chosen sites in the order they were picked.
///
pub fn cover_reads_greedy(
    records: &[SiteRecord],
    num_sites: usize,
    coverage_target: usize,
) -> Vec<usize> {
    let max_read = records
        .iter()
        .flat_map(|r| r.reads.iter().copied())
        .max()
        .unwrap_or(0);
    let mut coverage = vec![0usize; max_read + 1];

    // None marks a site that has been used
    let mut counts: Vec<Option<usize>> = records
        .iter()
        .map(|r| Some(count_uncovered(&r.reads, &coverage, coverage_target)))
        .collect();

    let largest = counts.iter().flatten().max().copied().unwrap_or(0);
    info!("Largest # of reads hit by a single site is {}", largest);

    let mut picks = Vec::with_capacity(num_sites.min(records.len()));
    while picks.len() < num_sites {
        let mut best: Option<(usize, usize)> = None;
        for (idx, count) in counts.iter().enumerate() {
            if let Some(count) = count {
                if best.is_none_or(|(_, c)| *count > c) {
                    best = Some((idx, *count));
                }
            }
        }
        let Some((idx, _)) = best else {
            break;
        };

        picks.push(idx);
        counts[idx] = None;
        for read in records[idx].reads.iter() {
            coverage[*read] += 1;
        }
        for (i, count) in counts.iter_mut().enumerate() {
            if count.is_some() {
                *count = Some(count_uncovered(&records[i].reads, &coverage, coverage_target));
            }
        }

        if picks.len() % 20 == 1 {
            debug!("Found {} sites...", picks.len());
        }
    }

    picks
}

///
/// Turn picked indices into report rows, counting for every pick only the
/// reads no earlier pick hit.
///
pub fn summarize_picks(records: &[SiteRecord], picks: &[usize]) -> Vec<ReadCoverPick> {
    let mut seen: FxHashSet<usize> = FxHashSet::default();
    let mut cumulative_reads = 0;

    picks
        .iter()
        .map(|&index| {
            let record = &records[index];
            let new_reads = record.reads.iter().filter(|r| seen.insert(**r)).count();
            cumulative_reads += new_reads;
            ReadCoverPick {
                site: record.site.clone(),
                index,
                new_reads,
                cumulative_reads,
                representative_read: None,
            }
        })
        .collect()
}

///
/// Attach one randomly chosen read hit by each pick, looked up in a FASTA
/// file of reads. Reads are numbered from 1 in file order.
///
pub fn attach_representative_reads<R: Rng + ?Sized>(
    picks: &mut [ReadCoverPick],
    records: &[SiteRecord],
    reads_fasta: &Path,
    rng: &mut R,
) -> OptimizeResult<()> {
    let chosen: Vec<Option<usize>> = picks
        .iter()
        .map(|p| records[p.index].reads.choose(rng).copied())
        .collect();
    let mut wanted: FxHashSet<usize> = chosen.iter().flatten().copied().collect();

    let reader = fasta::Reader::from_file(reads_fasta)
        .map_err(|e| OptimizeError::FastaReadError(format!("{}: {}", reads_fasta.display(), e)))?;

    let mut sequences: FxHashMap<usize, String> = FxHashMap::default();
    for (i, record) in reader.records().enumerate() {
        if wanted.is_empty() {
            break;
        }
        let read_idx = i + 1;
        if wanted.remove(&read_idx) {
            let record = record
                .map_err(|e| OptimizeError::FastaReadError(format!("{}: {}", reads_fasta.display(), e)))?;
            sequences.insert(read_idx, String::from_utf8_lossy(record.seq()).into_owned());
        }
    }

    for (pick, read) in picks.iter_mut().zip(chosen) {
        pick.representative_read = read.and_then(|r| sequences.get(&r).cloned());
    }
    Ok(())
}

///
/// Write the picks as CSV, with the representative read column when any
/// pick carries one.
///
pub fn write_report<W: Write>(picks: &[ReadCoverPick], out: W) -> std::io::Result<()> {
    let with_reads = picks.iter().any(|p| p.representative_read.is_some());
    let mut writer = csv::Writer::from_writer(out);

    let mut header = REPORT_HEADER.to_vec();
    if with_reads {
        header.push(READ_COLUMN);
    }
    writer.write_record(&header)?;

    for pick in picks {
        let mut row = vec![
            pick.site.clone(),
            pick.index.to_string(),
            pick.new_reads.to_string(),
            pick.cumulative_reads.to_string(),
        ];
        if with_reads {
            row.push(pick.representative_read.clone().unwrap_or_default());
        }
        writer.write_record(&row)?;
    }
    writer.flush()
}
