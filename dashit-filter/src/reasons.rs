use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const REASON_SEPARATOR: &str = "; ";
pub const EXPLANATION_HEADER: [&str; 2] = ["candidate guide", "why it was filtered out"];

///
/// Why each excluded guide was excluded.
///
/// Keyed by guide string: a guide listed here is excluded everywhere it
/// occurs. Iteration is in guide order.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterReasons {
    reasons: BTreeMap<String, Vec<String>>,
}

impl FilterReasons {
    pub fn new() -> Self {
        Self::default()
    }

    ///
    /// Record a reason for excluding `guide`. Repeated reasons are kept once.
    ///
    pub fn insert(&mut self, guide: &str, reason: String) {
        match self.reasons.entry(guide.to_string()) {
            Entry::Occupied(mut e) => {
                if !e.get().contains(&reason) {
                    e.get_mut().push(reason);
                }
            }
            Entry::Vacant(e) => {
                e.insert(vec![reason]);
            }
        }
    }

    pub fn contains(&self, guide: &str) -> bool {
        self.reasons.contains_key(guide)
    }

    /// All reasons for a guide, joined with `"; "`.
    pub fn reason(&self, guide: &str) -> Option<String> {
        self.reasons.get(guide).map(|r| r.join(REASON_SEPARATOR))
    }

    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    pub fn guides(&self) -> impl Iterator<Item = &str> {
        self.reasons.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, String)> {
        self.reasons
            .iter()
            .map(|(guide, reasons)| (guide.as_str(), reasons.join(REASON_SEPARATOR)))
    }

    ///
    /// Merge two independently computed reason sets. A guide excluded by both
    /// keeps the reasons of `self` followed by those of `other`.
    ///
    pub fn union(mut self, other: FilterReasons) -> FilterReasons {
        for (guide, reasons) in other.reasons {
            for reason in reasons {
                self.insert(&guide, reason);
            }
        }
        self
    }

    ///
    /// Write the `candidate guide,why it was filtered out` CSV. Reasons
    /// containing commas are quoted.
    ///
    pub fn write_explanation<W: Write>(&self, writer: W) -> std::io::Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(EXPLANATION_HEADER)?;
        for (guide, reason) in self.iter() {
            writer.write_record([guide, reason.as_str()])?;
        }
        writer.flush()
    }

    pub fn write_explanation_file(&self, path: &Path) -> std::io::Result<()> {
        let file = File::create(path)?;
        self.write_explanation(file)
    }
}

impl<S: Into<String>> FromIterator<(S, String)> for FilterReasons {
    fn from_iter<T: IntoIterator<Item = (S, String)>>(iter: T) -> Self {
        let mut reasons = FilterReasons::new();
        for (guide, reason) in iter {
            let guide: String = guide.into();
            reasons.insert(&guide, reason);
        }
        reasons
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const G1: &str = "AAAAAAAAAAAAAAAAAAAA";
    const G2: &str = "ACGTACGTACGTACGTACGT";

    #[rstest]
    fn test_insert_deduplicates_reasons() {
        let mut reasons = FilterReasons::new();
        reasons.insert(G1, "offtarget against sites.txt".to_string());
        reasons.insert(G1, "offtarget against sites.txt".to_string());
        assert_eq!(reasons.len(), 1);
        assert_eq!(
            reasons.reason(G1),
            Some("offtarget against sites.txt".to_string())
        );
    }

    #[rstest]
    fn test_union_joins_reasons() {
        let structural: FilterReasons = [(G1, "homopolymer".to_string())].into_iter().collect();
        let offtarget: FilterReasons = [
            (G1, "offtarget against x".to_string()),
            (G2, "offtarget against x".to_string()),
        ]
        .into_iter()
        .collect();

        let all = structural.union(offtarget);
        assert_eq!(all.len(), 2);
        assert_eq!(
            all.reason(G1),
            Some("homopolymer; offtarget against x".to_string())
        );
        assert!(all.contains(G2));
        assert!(!all.contains("CCCCCCCCCCCCCCCCCCCC"));
    }

    #[rstest]
    fn test_write_explanation() {
        let reasons: FilterReasons = [
            (G2, "hairpin".to_string()),
            (G1, "homopolymer".to_string()),
        ]
        .into_iter()
        .collect();

        let mut out = Vec::new();
        reasons.write_explanation(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(
            out,
            format!(
                "candidate guide,why it was filtered out\n{},homopolymer\n{},hairpin\n",
                G1, G2
            )
        );
    }

    #[rstest]
    fn test_explanation_with_commas_reads_back() {
        let structural: FilterReasons = [(G1, "GC count 0 outside [5, 15]".to_string())]
            .into_iter()
            .collect();
        let offtarget: FilterReasons = [(G1, "offtarget against a, b".to_string())]
            .into_iter()
            .collect();
        let reasons = structural.union(offtarget);

        let mut out = Vec::new();
        reasons.write_explanation(&mut out).unwrap();

        let mut reader = csv::Reader::from_reader(out.as_slice());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), EXPLANATION_HEADER.to_vec());

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(&rows[0][0], G1);
        assert_eq!(
            &rows[0][1],
            "GC count 0 outside [5, 15]; offtarget against a, b"
        );
    }
}
