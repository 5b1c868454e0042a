use std::fmt::{self, Display};
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::consts::{FORWARD_CUT_OFFSET, REVERSE_CUT_OFFSET, SITE_LEN};

#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
        }
    }
}

///
/// A CRISPR target site: a 20-mer guide and the position at which Cas9 cuts
/// the owning sequence.
///
/// The guide is always written 5'->3' on the strand it binds, so for
/// reverse-strand sites it is the reverse complement of the sequence text.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub guide: String,
    pub cut: usize,
    pub strand: Strand,
}

impl Site {
    pub fn new(guide: String, cut: usize, strand: Strand) -> Self {
        Site { guide, cut, strand }
    }

    ///
    /// Offset of the 23 nt window (guide + PAM) that produced this site.
    ///
    pub fn window_start(&self) -> usize {
        match self.strand {
            Strand::Forward => self.cut - FORWARD_CUT_OFFSET,
            Strand::Reverse => self.cut - REVERSE_CUT_OFFSET,
        }
    }

    ///
    /// Positions of the owning sequence covered by guide and PAM.
    ///
    pub fn footprint(&self) -> Range<usize> {
        let start = self.window_start();
        start..start + SITE_LEN
    }
}

impl Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.guide, self.cut, self.strand)
    }
}
