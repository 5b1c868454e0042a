//! Score a designed guide library against a FASTA of reads: how many reads
//! contain at least one guide.

use std::fmt::{self, Display};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use bio::io::fasta;
use regex::bytes::{Regex, RegexBuilder};
use tracing::info;

use dashit_core::consts::GUIDE_LEN;
use dashit_core::utils::{get_dynamic_reader, remove_all_extensions};

use crate::errors::{OptimizeError, OptimizeResult};

/// Metadata lines at the top of a guide CSV.
pub const GUIDE_CSV_SKIP_LINES: usize = 2;

// libraries run to thousands of guides
const PATTERN_SIZE_LIMIT: usize = 1 << 28;

///
/// Read the guides of a guide CSV: two metadata lines, then one guide per
/// line as the first comma-separated field.
///
pub fn read_guides_csv(path: &Path) -> OptimizeResult<Vec<String>> {
    let reader = get_dynamic_reader(path)
        .map_err(|e| OptimizeError::FileReadError(format!("{}: {}", path.display(), e)))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut guides = Vec::new();
    for record in reader.records().skip(GUIDE_CSV_SKIP_LINES) {
        let record = record?;
        let guide = record.get(0).unwrap_or_default().to_string();
        if guide.len() != GUIDE_LEN {
            return Err(OptimizeError::InvalidGuide {
                file: path.display().to_string(),
                guide,
            });
        }
        guides.push(guide);
    }

    if guides.is_empty() {
        return Err(OptimizeError::NoGuides(path.display().to_string()));
    }
    Ok(guides)
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct ReadHits {
    pub hits: usize,
    pub misses: usize,
}

impl ReadHits {
    pub fn total(&self) -> usize {
        self.hits + self.misses
    }

    /// Percentage of reads hit, 0 when there are no reads.
    pub fn percent(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        100.0 * self.hits as f64 / self.total() as f64
    }
}

///
/// Where hit and missed reads go when splitting a reads file.
///
pub struct SplitWriters {
    pub dashed_path: PathBuf,
    pub undashed_path: PathBuf,
    dashed: fasta::Writer<File>,
    undashed: fasta::Writer<File>,
}

impl SplitWriters {
    ///
    /// Create `<stem>_dashed.fasta` and `<stem>_undashed.fasta` in `out_dir`,
    /// where `<stem>` is the reads file name without extensions.
    ///
    pub fn create(reads: &Path, out_dir: &Path) -> OptimizeResult<Self> {
        let stem = remove_all_extensions(reads);
        let dashed_path = out_dir.join(format!("{}_dashed.fasta", stem));
        let undashed_path = out_dir.join(format!("{}_undashed.fasta", stem));

        let dashed = fasta::Writer::new(File::create(&dashed_path)?);
        let undashed = fasta::Writer::new(File::create(&undashed_path)?);

        Ok(SplitWriters {
            dashed_path,
            undashed_path,
            dashed,
            undashed,
        })
    }

    fn write(&mut self, record: &fasta::Record, hit: bool) -> OptimizeResult<()> {
        let writer = if hit {
            &mut self.dashed
        } else {
            &mut self.undashed
        };
        writer.write_record(record)?;
        Ok(())
    }

    fn flush(&mut self) -> OptimizeResult<()> {
        self.dashed.flush()?;
        self.undashed.flush()?;
        Ok(())
    }
}

///
/// Matches reads against every guide at once.
///
#[derive(Debug, Clone)]
pub struct GuideScorer {
    num_guides: usize,
    pattern: Regex,
}

impl GuideScorer {
    pub fn new<S: AsRef<str>>(guides: &[S]) -> OptimizeResult<Self> {
        if guides.is_empty() {
            return Err(OptimizeError::NoGuides("guide list".to_string()));
        }
        let alternation = guides
            .iter()
            .map(|g| regex::escape(g.as_ref()))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = RegexBuilder::new(&alternation)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()?;

        Ok(GuideScorer {
            num_guides: guides.len(),
            pattern,
        })
    }

    pub fn num_guides(&self) -> usize {
        self.num_guides
    }

    /// Does the read contain any guide?
    pub fn hits(&self, read: &[u8]) -> bool {
        self.pattern.is_match(read)
    }

    ///
    /// Count hit and missed reads in a FASTA stream, splitting them into
    /// `split` when given.
    ///
    pub fn score_reader<R: Read>(
        &self,
        reads: fasta::Reader<BufReader<R>>,
        mut split: Option<&mut SplitWriters>,
    ) -> OptimizeResult<ReadHits> {
        let mut read_hits = ReadHits::default();
        for record in reads.records() {
            let record = record.map_err(|e| OptimizeError::FastaReadError(e.to_string()))?;
            let hit = self.hits(record.seq());
            if hit {
                read_hits.hits += 1;
            } else {
                read_hits.misses += 1;
            }
            if let Some(writers) = split.as_deref_mut() {
                writers.write(&record, hit)?;
            }
        }
        if let Some(writers) = split {
            writers.flush()?;
        }
        Ok(read_hits)
    }

    pub fn score_file(
        &self,
        reads: &Path,
        split: Option<&mut SplitWriters>,
    ) -> OptimizeResult<ReadHits> {
        let file = get_dynamic_reader(reads)
            .map_err(|e| OptimizeError::FastaReadError(format!("{}: {}", reads.display(), e)))?;
        info!("Scoring {} guides against {}", self.num_guides, reads.display());
        self.score_reader(fasta::Reader::new(file), split)
    }
}

///
/// The one-line scoring summary.
///
#[derive(Debug, Clone)]
pub struct ScoreReport {
    pub num_guides: usize,
    pub guides_file: String,
    pub reads_file: String,
    pub hits: ReadHits,
}

impl Display for ScoreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} guides in {} vs. {} hit {}/{} = {:.2}%",
            self.num_guides,
            self.guides_file,
            self.reads_file,
            self.hits.hits,
            self.hits.total(),
            self.hits.percent()
        )
    }
}
