//! Off-target filtering against an external `offtarget` server.
//!
//! The server decides whether a guide lies within a [Radius] of any
//! off-target site; this module only batches the questions and reduces the
//! answers to a set of excluded guides.

pub mod client;
pub mod server;

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::errors::OfftargetResult;
use crate::radius::Radius;
use crate::reasons::FilterReasons;

pub use client::OfftargetClient;
pub use server::OfftargetServer;

const VERDICT_HIT: &str = "true";

///
/// One line of an off-target server response.
///
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MatchRecord {
    pub guide: String,
    pub hit: bool,
}

///
/// Parse a response body: each line starts with the queried 20-mer and ends
/// with the verdict `true` or `false`. Lines too short to carry a guide are
/// ignored.
///
pub fn parse_match_records(body: &str) -> Vec<MatchRecord> {
    body.lines()
        .map(str::trim_end)
        .filter_map(|line| {
            let guide = line.get(..dashit_core::consts::GUIDE_LEN)?;
            Some(MatchRecord {
                guide: guide.to_string(),
                hit: line.ends_with(VERDICT_HIT),
            })
        })
        .collect()
}

///
/// Anything that can answer "is this guide an off-target under `radius`?".
///
pub trait OfftargetMatcher {
    fn query(&self, guides: &[&str], radius: Radius) -> OfftargetResult<Vec<MatchRecord>>;
}

///
/// Query every distinct guide once per radius and collect the hits.
///
/// Each hit is recorded with the reason `offtarget against <source>`.
/// Exclusion is by guide string, so a guide that occurs in several sequences
/// is excluded from all of them. Any service error aborts the whole run.
///
pub fn offtarget_reasons<'a, M, I>(
    matcher: &M,
    guides: I,
    radii: &[Radius],
    source: &str,
) -> OfftargetResult<FilterReasons>
where
    M: OfftargetMatcher + ?Sized,
    I: IntoIterator<Item = &'a str>,
{
    let distinct: Vec<&str> = guides.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
    let radii: BTreeSet<Radius> = radii.iter().copied().collect();
    let mut reasons = FilterReasons::new();

    if distinct.is_empty() {
        return Ok(reasons);
    }

    for radius in radii {
        info!(
            "querying {} distinct guides for off-targets with radius {}",
            distinct.len(),
            radius
        );
        let records = matcher.query(&distinct, radius)?;
        let hits = records.iter().filter(|r| r.hit).count();
        debug!("radius {}: {} of {} records are hits", radius, hits, records.len());

        for record in records.into_iter().filter(|r| r.hit) {
            reasons.insert(&record.guide, format!("offtarget against {}", source));
        }
    }

    info!("{} guides matched against off-targets in {}", reasons.len(), source);
    Ok(reasons)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    ///
    /// In-process stand-in for the off-target server.
    ///
    #[derive(Default)]
    pub(crate) struct MockMatcher {
        pub hits: HashMap<Radius, HashSet<String>>,
        pub queries: RefCell<Vec<(Radius, usize)>>,
    }

    impl MockMatcher {
        pub fn with_hits(radius: Radius, guides: &[&str]) -> Self {
            let mut hits = HashMap::new();
            hits.insert(radius, guides.iter().map(|g| g.to_string()).collect());
            MockMatcher {
                hits,
                ..Default::default()
            }
        }
    }

    impl OfftargetMatcher for MockMatcher {
        fn query(&self, guides: &[&str], radius: Radius) -> OfftargetResult<Vec<MatchRecord>> {
            self.queries.borrow_mut().push((radius, guides.len()));
            let hits = self.hits.get(&radius);
            Ok(guides
                .iter()
                .map(|g| MatchRecord {
                    guide: g.to_string(),
                    hit: hits.is_some_and(|h| h.contains(*g)),
                })
                .collect())
        }
    }

    const G1: &str = "GACTTCGAATGGCATCCTGA";
    const G2: &str = "GTCCAGTTACAGGTCAAGTA";
    const G3: &str = "AAAAAGCCAGTCAGTCCGAT";

    #[rstest]
    fn test_parse_match_records() {
        let body = format!("{} 5_9_18 true\n{} 5_9_18 false\n\nshort\n", G1, G2);
        let records = parse_match_records(&body);
        assert_eq!(
            records,
            vec![
                MatchRecord {
                    guide: G1.to_string(),
                    hit: true
                },
                MatchRecord {
                    guide: G2.to_string(),
                    hit: false
                },
            ]
        );
    }

    #[rstest]
    fn test_guides_are_deduplicated_before_querying() {
        let matcher = MockMatcher::with_hits(Radius::FAR, &[G1]);
        // G1 occurs in two sequences, G2 in one
        let guides = [G1, G2, G1];
        let reasons = offtarget_reasons(&matcher, guides, &[Radius::FAR], "hg38.txt").unwrap();

        assert_eq!(matcher.queries.borrow().as_slice(), &[(Radius::FAR, 2)]);
        assert_eq!(reasons.guides().collect::<Vec<_>>(), vec![G1]);
        assert_eq!(
            reasons.reason(G1),
            Some("offtarget against hg38.txt".to_string())
        );
    }

    #[rstest]
    fn test_one_query_per_distinct_radius() {
        let mut matcher = MockMatcher::with_hits(Radius::FAR, &[G1]);
        matcher
            .hits
            .insert(Radius::NEAR, [G1, G3].iter().map(|g| g.to_string()).collect());

        let reasons = offtarget_reasons(
            &matcher,
            [G1, G2, G3],
            &[Radius::FAR, Radius::NEAR, Radius::FAR],
            "sites.txt",
        )
        .unwrap();

        assert_eq!(matcher.queries.borrow().len(), 2);
        assert_eq!(reasons.len(), 2);
        // repeated hits across radii keep a single reason
        assert_eq!(
            reasons.reason(G1),
            Some("offtarget against sites.txt".to_string())
        );
        assert!(reasons.contains(G3));
    }

    #[rstest]
    fn test_no_guides_no_queries() {
        let matcher = MockMatcher::default();
        let reasons = offtarget_reasons(&matcher, Vec::<&str>::new(), &[Radius::FAR], "x").unwrap();
        assert!(reasons.is_empty());
        assert!(matcher.queries.borrow().is_empty());
    }
}
