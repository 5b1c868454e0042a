use std::fmt::{self, Display};

use crate::errors::{SequenceError, SequenceResult};

///
/// A named nucleotide sequence, upper-cased on construction.
///
/// Only `A`, `C`, `G`, `T` and the ambiguity code `N` are accepted. Sites
/// spanning an `N` are never reported by the scanner.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
pub struct Sequence {
    pub id: String,
    pub description: Option<String>,
    seq: Vec<u8>,
}

impl Sequence {
    pub fn new(id: &str, seq: &[u8]) -> SequenceResult<Self> {
        let seq: Vec<u8> = seq.to_ascii_uppercase();
        if let Some(position) = seq
            .iter()
            .position(|b| !matches!(b, b'A' | b'C' | b'G' | b'T' | b'N'))
        {
            return Err(SequenceError::InvalidBase {
                id: id.to_string(),
                base: seq[position] as char,
                position,
            });
        }

        Ok(Sequence {
            id: id.to_string(),
            description: None,
            seq,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.seq
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

impl TryFrom<&str> for Sequence {
    type Error = SequenceError;

    /// Build an anonymous sequence from a literal string.
    fn try_from(value: &str) -> SequenceResult<Self> {
        Sequence::new("sequence", value.as_bytes())
    }
}

impl Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.seq))
    }
}
