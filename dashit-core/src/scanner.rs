//! Enumeration of Cas9 target sites (20-mer + NGG PAM) on both strands.

use crate::consts::{FORWARD_CUT_OFFSET, GUIDE_LEN, REVERSE_CUT_OFFSET, SITE_LEN};
use crate::models::{Sequence, Site, Strand};
use crate::utils::reverse_complement;

fn is_acgt(seq: &[u8]) -> bool {
    seq.iter().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T'))
}

///
/// Lazy iterator over every target site of a sequence.
///
/// A 23 nt window is slid over the sequence. At each offset `i` the forward
/// strand yields a site when the window ends in `GG` (guide = first 20 nt,
/// cut at `i + 17`) and the reverse strand yields a site when the window
/// starts with `CC` (guide = reverse complement of the last 20 nt, cut at
/// `i + 6`). Windows whose guide contains anything but `ACGT` are skipped.
///
/// The iterator is cheap to clone, so a scan can be restarted at any time.
#[derive(Debug, Clone)]
pub struct SiteScanner<'a> {
    seq: &'a [u8],
    pos: usize,
    pending: Option<Site>,
}

impl<'a> SiteScanner<'a> {
    pub fn new(seq: &'a [u8]) -> Self {
        SiteScanner {
            seq,
            pos: 0,
            pending: None,
        }
    }

    fn forward_site(&self, window: &[u8], pos: usize) -> Option<Site> {
        if window[21] != b'G' || window[22] != b'G' {
            return None;
        }
        let guide = &window[..GUIDE_LEN];
        if !is_acgt(guide) {
            return None;
        }
        Some(Site::new(
            String::from_utf8_lossy(guide).into_owned(),
            pos + FORWARD_CUT_OFFSET,
            Strand::Forward,
        ))
    }

    fn reverse_site(&self, window: &[u8], pos: usize) -> Option<Site> {
        if window[0] != b'C' || window[1] != b'C' {
            return None;
        }
        let protospacer = &window[SITE_LEN - GUIDE_LEN..];
        if !is_acgt(protospacer) {
            return None;
        }
        Some(Site::new(
            String::from_utf8_lossy(&reverse_complement(protospacer)).into_owned(),
            pos + REVERSE_CUT_OFFSET,
            Strand::Reverse,
        ))
    }
}

impl Iterator for SiteScanner<'_> {
    type Item = Site;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(site) = self.pending.take() {
            return Some(site);
        }

        while self.pos + SITE_LEN <= self.seq.len() {
            let pos = self.pos;
            let window = &self.seq[pos..pos + SITE_LEN];
            self.pos += 1;

            let forward = self.forward_site(window, pos);
            let reverse = self.reverse_site(window, pos);
            match (forward, reverse) {
                (Some(f), r) => {
                    self.pending = r;
                    return Some(f);
                }
                (None, Some(r)) => return Some(r),
                (None, None) => continue,
            }
        }

        None
    }
}

pub fn scan_sites(seq: &[u8]) -> SiteScanner<'_> {
    SiteScanner::new(seq)
}

impl Sequence {
    /// Iterate over every target site of this sequence.
    pub fn sites(&self) -> SiteScanner<'_> {
        SiteScanner::new(self.as_bytes())
    }
}

///
/// Re-extract the guide of a site from the sequence it was found on.
///
/// Returns `None` when the site does not fit the sequence.
pub fn guide_at(seq: &[u8], cut: usize, strand: Strand) -> Option<String> {
    let start = match strand {
        Strand::Forward => cut.checked_sub(FORWARD_CUT_OFFSET)?,
        Strand::Reverse => cut.checked_sub(REVERSE_CUT_OFFSET)?,
    };
    let window = seq.get(start..start + SITE_LEN)?;
    let guide = match strand {
        Strand::Forward => window[..GUIDE_LEN].to_vec(),
        Strand::Reverse => reverse_complement(&window[SITE_LEN - GUIDE_LEN..]),
    };
    Some(String::from_utf8_lossy(&guide).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn seq() -> Vec<u8> {
        b"CCTAGCATCGATCGATTACGATCGAGGTTACGATCGGATCCAGCTAGCTAGCATGCAGG".to_vec()
    }

    #[rstest]
    #[case(b"")]
    #[case(b"ACGT")]
    #[case(b"CAAAAAAAAAAAAAAAAAAAGG")]
    fn test_short_sequences_yield_nothing(#[case] seq: &[u8]) {
        assert!(seq.len() < SITE_LEN);
        assert_eq!(scan_sites(seq).count(), 0);
    }

    #[rstest]
    fn test_exact_window_on_both_strands() {
        let seq = b"CCAAAAAAAAAAAAAAAAAAAGG";
        let sites: Vec<Site> = scan_sites(seq).collect();
        assert_eq!(sites.len(), 2);

        assert_eq!(sites[0].strand, Strand::Forward);
        assert_eq!(sites[0].guide, "CCAAAAAAAAAAAAAAAAAA");
        assert_eq!(sites[0].cut, 17);

        assert_eq!(sites[1].strand, Strand::Reverse);
        assert_eq!(sites[1].guide, "CCTTTTTTTTTTTTTTTTTT");
        assert_eq!(sites[1].cut, 6);
    }

    #[rstest]
    fn test_sites_round_trip(seq: Vec<u8>) {
        let sites: Vec<Site> = scan_sites(&seq).collect();
        assert!(!sites.is_empty());
        for site in sites {
            assert_eq!(guide_at(&seq, site.cut, site.strand), Some(site.guide.clone()));
            assert_eq!(site.footprint().len(), SITE_LEN);
        }
    }

    #[rstest]
    fn test_scanner_is_restartable(seq: Vec<u8>) {
        let scanner = scan_sites(&seq);
        let first: Vec<Site> = scanner.clone().collect();
        let second: Vec<Site> = scanner.collect();
        assert_eq!(first, second);
    }

    #[rstest]
    fn test_skips_ambiguous_bases() {
        let seq = b"ANAAAAAAAAAAAAAAAAAAAGG";
        assert_eq!(scan_sites(seq).count(), 0);
    }

    #[rstest]
    fn test_last_window_is_scanned() {
        // the only PAM sits at the very end of the sequence
        let seq = b"TTACGATCGATCGATCGATCGTAGG";
        let sites: Vec<Site> = scan_sites(seq).collect();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].cut, 2 + FORWARD_CUT_OFFSET);
        assert_eq!(sites[0].guide, "ACGATCGATCGATCGATCGT");
    }
}
