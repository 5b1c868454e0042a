use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

///
/// Off-target matching radius `L_M_N`.
///
/// A candidate guide hits an off-target when at least `L`, `M` and `N` of the
/// nucleotides in its 5, 10 and 20 PAM-proximal positions match, e.g.
/// `5_10_20` only accepts perfect matches and `5_9_18` allows one mismatch
/// in positions 6-10 and two in the last 10 positions. The matching itself
/// is performed by the off-target server; this type only carries and
/// validates the thresholds.
///
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Radius {
    pub seed: u8,
    pub middle: u8,
    pub full: u8,
}

impl Radius {
    /// Preset used when designing guides against distant off-targets.
    pub const FAR: Radius = Radius::new_unchecked(5, 9, 18);

    /// Preset used when designing guides against near off-targets.
    pub const NEAR: Radius = Radius::new_unchecked(5, 9, 19);

    /// Default radius for filtering sites-to-reads files.
    pub const READS: Radius = Radius::new_unchecked(5, 10, 19);

    const fn new_unchecked(seed: u8, middle: u8, full: u8) -> Self {
        Radius { seed, middle, full }
    }

    pub fn new(seed: u8, middle: u8, full: u8) -> Result<Self, ConfigError> {
        let radius = Radius::new_unchecked(seed, middle, full);
        if seed > 5 || middle > 10 || full > 20 || seed > middle || middle > full {
            return Err(ConfigError::InvalidRadius(radius.to_string()));
        }
        Ok(radius)
    }

    /// Thresholds in the order the off-target server expects them.
    pub fn limits(&self) -> [u8; 3] {
        [self.seed, self.middle, self.full]
    }
}

impl Default for Radius {
    fn default() -> Self {
        Radius::FAR
    }
}

impl Display for Radius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.seed, self.middle, self.full)
    }
}

impl FromStr for Radius {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidRadius(s.to_string());
        let parts: Vec<u8> = s
            .trim()
            .split('_')
            .map(|p| p.parse::<u8>().map_err(|_| invalid()))
            .collect::<Result<_, _>>()?;
        match parts.as_slice() {
            [seed, middle, full] => Radius::new(*seed, *middle, *full).map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Radius {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Radius> for String {
    fn from(value: Radius) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("5_9_18", Radius::FAR)]
    #[case("5_9_19", Radius::NEAR)]
    #[case("5_10_19", Radius::READS)]
    #[case(" 5_10_20 ", Radius { seed: 5, middle: 10, full: 20 })]
    fn test_parse_radius(#[case] input: &str, #[case] expected: Radius) {
        assert_eq!(input.parse::<Radius>().unwrap(), expected);
    }

    #[rstest]
    #[case("5_9")]
    #[case("5_9_18_1")]
    #[case("6_9_18")]
    #[case("5_11_18")]
    #[case("5_9_21")]
    #[case("5_4_18")]
    #[case("a_b_c")]
    fn test_parse_invalid_radius(#[case] input: &str) {
        assert!(matches!(
            input.parse::<Radius>(),
            Err(ConfigError::InvalidRadius(_))
        ));
    }

    #[rstest]
    fn test_display_and_limits() {
        assert_eq!(Radius::NEAR.to_string(), "5_9_19");
        assert_eq!(Radius::FAR.limits(), [5, 9, 18]);
    }
}
