use std::collections::HashSet;
use std::ops::Range;

use serde::Serialize;
use tracing::warn;

use crate::consts::{
    FRAGMENT_READ_CAP, IDEAL_CUTOFF, LONG_CUTOFF, OKAY_CUTOFF, SOURCE_CARD, SOURCE_RESFINDER,
};
use crate::errors::{GeneError, GeneResult};
use crate::models::mutation::{MutationRange, parse_mutation_labels};
use crate::models::{Fragment, Sequence, Site};

///
/// Lengths of the flanking sequence added before and after the biological
/// gene sequence.
///
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize)]
pub struct Padding {
    pub prefix: usize,
    pub suffix: usize,
}

///
/// Summary of how a library cuts a gene.
///
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct GeneStats {
    pub gene_length: usize,
    pub cuts: usize,
    pub ideal_fragments: usize,
    pub okay_fragments: usize,
    pub ideal_and_okay_fragments: usize,
    pub coverage: usize,
    pub possible_fragments: usize,
}

///
/// A sequence to be cut, its known mutations, and what a guide library does
/// to it.
///
/// `targets` holds every candidate site of the sequence; `cuts` and
/// `fragments` describe the last library applied with
/// [Gene::cut_with_library] and are overwritten on every call.
///
#[derive(Debug, Clone)]
pub struct Gene {
    pub name: String,
    pub sequence: Sequence,
    pub aro: Option<u64>,
    pub resistance: Vec<String>,
    pub padding: Option<Padding>,
    pub mutation_ranges: Option<Vec<MutationRange>>,
    pub source: String,

    pub targets: Option<Vec<Site>>,
    pub cuts: Option<Vec<Site>>,
    pub fragments: Option<Vec<Fragment>>,
}

impl Gene {
    pub fn new(name: &str, sequence: Sequence) -> Self {
        Gene {
            name: name.to_string(),
            sequence,
            aro: None,
            resistance: Vec::new(),
            padding: None,
            mutation_ranges: None,
            source: SOURCE_RESFINDER.to_string(),
            targets: None,
            cuts: None,
            fragments: None,
        }
    }

    ///
    /// Build a gene from a FASTA record whose header carries `|`-separated
    /// metadata, e.g.
    ///
    /// `gb|KF730651|+|0-657|ARO:3002796|QnrS7 [Escherichia coli]|flash_resistance:a,b|flash_key:QnrS7|flash_padding:0_200`
    ///
    /// The gene is named after the record id. Unknown fields are ignored.
    ///
    pub fn from_sequence(sequence: Sequence) -> GeneResult<Self> {
        let header = match &sequence.description {
            Some(desc) => format!("{} {}", sequence.id, desc),
            None => sequence.id.clone(),
        };
        let mut gene = Gene::new(&sequence.id.clone(), sequence);

        for part in header.split('|') {
            let invalid = || GeneError::InvalidDescription {
                gene: gene.name.clone(),
                field: part.to_string(),
            };

            if let Some(aro) = part.strip_prefix("ARO:") {
                gene.aro = Some(aro.trim().parse().map_err(|_| invalid())?);
            } else if let Some(padding) = part.strip_prefix("flash_padding:") {
                let (prefix, suffix) = padding.split_once('_').ok_or_else(invalid)?;
                gene.padding = Some(Padding {
                    prefix: prefix.trim().parse().map_err(|_| invalid())?,
                    suffix: suffix.trim().parse().map_err(|_| invalid())?,
                });
            } else if let Some(resistance) = part.strip_prefix("flash_resistance:") {
                gene.resistance = resistance.split(',').map(|s| s.trim().to_string()).collect();
            } else if let Some(ranges) = part.strip_prefix("flash_mutation_ranges:") {
                gene.mutation_ranges = Some(parse_mutation_labels(ranges.split(',')));
            }
        }

        if gene.aro.is_some() {
            gene.source = SOURCE_CARD.to_string();
        }

        Ok(gene)
    }

    pub fn with_padding(mut self, prefix: usize, suffix: usize) -> Self {
        self.padding = Some(Padding { prefix, suffix });
        self
    }

    pub fn with_mutation_ranges(mut self, ranges: Vec<MutationRange>) -> Self {
        self.mutation_ranges = Some(ranges);
        self
    }

    pub fn length(&self) -> usize {
        self.sequence.len()
    }

    pub fn grants_resistance_to(&self, antibiotic: &str) -> bool {
        self.resistance.iter().any(|r| r.contains(antibiotic))
    }

    pub fn has_snps(&self) -> bool {
        self.mutation_ranges
            .as_ref()
            .is_some_and(|ranges| !ranges.is_empty())
    }

    ///
    /// Populate `targets` with every candidate site of the sequence.
    ///
    pub fn find_targets(&mut self) -> &[Site] {
        self.targets.insert(self.sequence.sites().collect())
    }

    ///
    /// Mutation ranges moved into padded sequence coordinates.
    ///
    pub fn padded_mutation_ranges(&self) -> Vec<MutationRange> {
        let offset = self.padding.map_or(0, |p| p.prefix);
        self.mutation_ranges
            .iter()
            .flatten()
            .map(|m| m.shifted(offset))
            .collect()
    }

    pub fn range_overlaps_mutation(&self, range: &Range<usize>) -> bool {
        self.padded_mutation_ranges()
            .iter()
            .any(|m| m.overlaps(range))
    }

    ///
    /// Does the guide + PAM footprint of the site touch a known mutation?
    ///
    pub fn target_overlaps_mutation(&self, site: &Site) -> bool {
        self.range_overlaps_mutation(&site.footprint())
    }

    ///
    /// Cut the sequence with a guide library.
    ///
    /// Records every site whose guide is in the library, sorted by cut
    /// position, and derives the fragments between consecutive cuts. Any
    /// previous cuts are replaced.
    ///
    pub fn cut_with_library(&mut self, library: &HashSet<String>) {
        let mut cuts: Vec<Site> = self
            .sequence
            .sites()
            .filter(|site| library.contains(&site.guide))
            .collect();

        for site in cuts.iter() {
            if self.target_overlaps_mutation(site) {
                warn!("guide {} overlaps with a mutation in {}", site.guide, self.name);
            }
        }

        cuts.sort_by_key(|site| site.cut);

        self.fragments = Some(
            cuts.windows(2)
                .map(|pair| Fragment {
                    start: pair[0].cut,
                    end: pair[1].cut,
                })
                .collect(),
        );
        self.cuts = Some(cuts);
    }

    pub fn cuts(&self) -> GeneResult<&[Site]> {
        self.cuts
            .as_deref()
            .ok_or_else(|| GeneError::NotCut(self.name.clone()))
    }

    pub fn fragments(&self) -> GeneResult<&[Fragment]> {
        self.fragments
            .as_deref()
            .ok_or_else(|| GeneError::NotCut(self.name.clone()))
    }

    ///
    /// Bases that would be sequenced from fragments whose length lies in
    /// `[min_len, max_len]`, each fragment contributing at most
    /// [FRAGMENT_READ_CAP] bases.
    ///
    pub fn coverage(&self, min_len: usize, max_len: usize) -> GeneResult<usize> {
        Ok(self
            .fragments()?
            .iter()
            .map(Fragment::len)
            .filter(|len| *len >= min_len && *len <= max_len)
            .map(|len| len.min(FRAGMENT_READ_CAP))
            .sum())
    }

    /// Fraction of the sequence that the fragments' reads would cover.
    pub fn coverage_fraction(&self) -> GeneResult<f64> {
        let covered: usize = self
            .fragments()?
            .iter()
            .map(|f| f.len().min(FRAGMENT_READ_CAP))
            .sum();
        if self.sequence.is_empty() {
            return Ok(0.0);
        }
        Ok(covered as f64 / self.sequence.len() as f64)
    }

    fn target_span(&self) -> GeneResult<usize> {
        let targets = self
            .targets
            .as_deref()
            .ok_or_else(|| GeneError::NoTargets(self.name.clone()))?;
        let min = targets.iter().map(|t| t.cut).min();
        let max = targets.iter().map(|t| t.cut).max();
        match (min, max) {
            (Some(min), Some(max)) => Ok(max - min),
            _ => Err(GeneError::NoTargets(self.name.clone())),
        }
    }

    pub fn longest_possible_fragment(&self) -> GeneResult<usize> {
        self.target_span()
    }

    pub fn possible_fragments(&self) -> GeneResult<usize> {
        Ok(self.target_span()? / IDEAL_CUTOFF)
    }

    pub fn stats(&self) -> GeneResult<GeneStats> {
        let mut ideal_fragments = 0;
        let mut okay_fragments = 0;

        for fragment in self.fragments()? {
            let len = fragment.len();
            if (IDEAL_CUTOFF..OKAY_CUTOFF).contains(&len) {
                ideal_fragments += 1;
            } else if (OKAY_CUTOFF..LONG_CUTOFF).contains(&len) {
                okay_fragments += 1;
            }
        }

        Ok(GeneStats {
            gene_length: self.length(),
            cuts: self.cuts()?.len(),
            ideal_fragments,
            okay_fragments,
            ideal_and_okay_fragments: ideal_fragments + okay_fragments,
            coverage: self.coverage(IDEAL_CUTOFF, LONG_CUTOFF)?,
            possible_fragments: self.possible_fragments().unwrap_or(0),
        })
    }
}
