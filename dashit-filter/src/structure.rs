//! Structural quality rules for candidate guides.
//!
//! Every rule looks at the 20-mer alone, so the outcome for a guide never
//! depends on where it occurs or on which other guides are being checked.

use std::collections::BTreeSet;
use std::fmt::{self, Display};

use rayon::prelude::*;
use tracing::info;

use dashit_core::utils::reverse_complement;

use crate::config::StructureParams;
use crate::reasons::{FilterReasons, REASON_SEPARATOR};

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum StructuralViolation {
    GcContent { count: usize, min: usize, max: usize },
    Homopolymer { base: char, run: usize },
    DinucleotideRepeat { pair: String, repeats: usize },
    Hairpin { stem: String, loop_len: usize },
}

impl Display for StructuralViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralViolation::GcContent { count, min, max } => {
                write!(f, "GC count {} outside [{}, {}]", count, min, max)
            }
            StructuralViolation::Homopolymer { base, run } => {
                write!(f, "homopolymer of {} {}s", run, base)
            }
            StructuralViolation::DinucleotideRepeat { pair, repeats } => {
                write!(f, "dinucleotide {} repeated {} times", pair, repeats)
            }
            StructuralViolation::Hairpin { stem, loop_len } => {
                write!(f, "hairpin with stem {} and loop of {}", stem, loop_len)
            }
        }
    }
}

fn gc_content(guide: &[u8], params: &StructureParams) -> Option<StructuralViolation> {
    let count = guide.iter().filter(|b| matches!(b, b'G' | b'C')).count();
    if count < params.gc_min || count > params.gc_max {
        return Some(StructuralViolation::GcContent {
            count,
            min: params.gc_min,
            max: params.gc_max,
        });
    }
    None
}

fn homopolymer(guide: &[u8], params: &StructureParams) -> Option<StructuralViolation> {
    let longest = guide
        .chunk_by(|a, b| a == b)
        .max_by_key(|run| run.len())?;
    if longest.len() > params.homopolymer_max {
        return Some(StructuralViolation::Homopolymer {
            base: longest[0] as char,
            run: longest.len(),
        });
    }
    None
}

fn dinucleotide_repeat(guide: &[u8], params: &StructureParams) -> Option<StructuralViolation> {
    let mut worst: Option<(&[u8], usize)> = None;

    for i in 0..guide.len().saturating_sub(1) {
        let pair = &guide[i..i + 2];
        if pair[0] == pair[1] {
            continue;
        }
        let repeats = guide[i..]
            .chunks_exact(2)
            .take_while(|chunk| *chunk == pair)
            .count();
        if worst.is_none_or(|(_, r)| repeats > r) {
            worst = Some((pair, repeats));
        }
    }

    match worst {
        Some((pair, repeats)) if repeats > params.dinucleotide_repeat_max => {
            Some(StructuralViolation::DinucleotideRepeat {
                pair: String::from_utf8_lossy(pair).into_owned(),
                repeats,
            })
        }
        _ => None,
    }
}

///
/// Look for a stem of `hairpin_min_outer` bases whose reverse complement
/// occurs downstream after a loop of at least `hairpin_min_inner` bases.
/// Any longer stem contains such a pairing, so only the minimum width is
/// checked.
///
fn hairpin(guide: &[u8], params: &StructureParams) -> Option<StructuralViolation> {
    let outer = params.hairpin_min_outer;
    let inner = params.hairpin_min_inner;
    if outer == 0 || guide.len() < 2 * outer + inner {
        return None;
    }

    for i in 0..=guide.len() - 2 * outer - inner {
        let stem = reverse_complement(&guide[i..i + outer]);
        for j in i + outer + inner..=guide.len() - outer {
            if guide[j..j + outer] == stem[..] {
                return Some(StructuralViolation::Hairpin {
                    stem: String::from_utf8_lossy(&guide[i..i + outer]).into_owned(),
                    loop_len: j - i - outer,
                });
            }
        }
    }
    None
}

///
/// Check a guide against every structural rule.
///
/// Returns the violated rules in a fixed order (GC content, homopolymer,
/// dinucleotide repeat, hairpin); an empty list means the guide is
/// acceptable.
///
pub fn poor_structure(guide: &str, params: &StructureParams) -> Vec<StructuralViolation> {
    let guide = guide.as_bytes();
    [
        gc_content(guide, params),
        homopolymer(guide, params),
        dinucleotide_repeat(guide, params),
        hairpin(guide, params),
    ]
    .into_iter()
    .flatten()
    .collect()
}

///
/// Run the structural filter over a collection of guides.
///
/// Duplicates are checked once. Each failing guide is recorded with its
/// violations joined by `"; "`.
///
pub fn structural_reasons<'a, I>(guides: I, params: &StructureParams) -> FilterReasons
where
    I: IntoIterator<Item = &'a str>,
{
    let distinct: Vec<&str> = guides.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
    info!(
        "filtering {} distinct guides for poor structure with {:?}",
        distinct.len(),
        params
    );

    let failed: Vec<(&str, String)> = distinct
        .par_iter()
        .filter_map(|guide| {
            let violations = poor_structure(guide, params);
            if violations.is_empty() {
                return None;
            }
            let reason = violations
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(REASON_SEPARATOR);
            Some((*guide, reason))
        })
        .collect();

    info!("removed {} guides due to poor structure", failed.len());
    failed.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn params() -> StructureParams {
        StructureParams::default()
    }

    fn kinds(violations: &[StructuralViolation]) -> Vec<&'static str> {
        violations
            .iter()
            .map(|v| match v {
                StructuralViolation::GcContent { .. } => "gc",
                StructuralViolation::Homopolymer { .. } => "homopolymer",
                StructuralViolation::DinucleotideRepeat { .. } => "dinucleotide",
                StructuralViolation::Hairpin { .. } => "hairpin",
            })
            .collect()
    }

    #[rstest]
    #[case("GACTTCGAATGGCATCCTGA", vec![])]
    #[case("ATATATGCCAGTCAGTCCGA", vec![])]
    #[case("AAAAAGCCAGTCAGTCCGAT", vec![])]
    #[case("AAAAAAGCCAGTCAGTCCGT", vec!["homopolymer"])]
    #[case("ATATATATGCCAGTCAGTCC", vec!["dinucleotide"])]
    #[case("GACCTAGTTACAGGTCAAGT", vec!["hairpin"])]
    #[case("GGGGCAGTCAGTCCGGCCGG", vec!["gc"])]
    #[case("TTTATTGACTTAATTATAAT", vec!["gc"])]
    #[case("AAAAAAAAAAAAAAAAAAAA", vec!["gc", "homopolymer"])]
    #[case("GCGCGCGCGCGCGCGCGCGC", vec!["gc", "dinucleotide", "hairpin"])]
    fn test_poor_structure(
        params: StructureParams,
        #[case] guide: &str,
        #[case] expected: Vec<&str>,
    ) {
        assert_eq!(kinds(&poor_structure(guide, &params)), expected);
    }

    #[rstest]
    fn test_homopolymer_prefix_is_flagged(params: StructureParams) {
        let guide = format!("AAAAAA{}", &"CGCGCGCGCGCGCG"[..14]);
        let violations = poor_structure(&guide, &params);
        assert!(violations.contains(&StructuralViolation::Homopolymer { base: 'A', run: 6 }));
    }

    #[rstest]
    fn test_thresholds_are_configurable() {
        let strict = StructureParams {
            homopolymer_max: 4,
            dinucleotide_repeat_max: 2,
            ..StructureParams::default()
        };
        assert_eq!(
            kinds(&poor_structure("AAAAAGCCAGTCAGTCCGAT", &strict)),
            vec!["homopolymer"]
        );
        assert_eq!(
            kinds(&poor_structure("ATATATGCCAGTCAGTCCGA", &strict)),
            vec!["dinucleotide"]
        );
    }

    #[rstest]
    fn test_hairpin_loop_length(params: StructureParams) {
        let violations = poor_structure("GACCTAGTTACAGGTCAAGT", &params);
        assert_eq!(
            violations,
            vec![StructuralViolation::Hairpin {
                stem: "GACCT".to_string(),
                loop_len: 6
            }]
        );
    }

    #[rstest]
    fn test_structural_reasons_is_order_independent(params: StructureParams) {
        let guides = [
            "AAAAAAAAAAAAAAAAAAAA",
            "GACTTCGAATGGCATCCTGA",
            "GACCTAGTTACAGGTCAAGT",
            "AAAAAAAAAAAAAAAAAAAA",
        ];
        let forward = structural_reasons(guides.iter().copied(), &params);
        let backward = structural_reasons(guides.iter().rev().copied(), &params);

        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 2);
        assert_eq!(
            forward.reason("AAAAAAAAAAAAAAAAAAAA"),
            Some("GC count 0 outside [5, 15]; homopolymer of 20 As".to_string())
        );
        assert!(!forward.contains("GACTTCGAATGGCATCCTGA"));
    }
}
