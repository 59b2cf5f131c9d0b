//! Phase tokens for conductors, windings, and per-phase components.

use serde::{Deserialize, Serialize};

/// A phase designator.
///
/// `A`, `B`, `C` are the primary phases, `N` the neutral, and `S1`/`S2` the
/// two secondary legs of a center-tap service transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    A,
    B,
    C,
    N,
    #[serde(rename = "s1")]
    S1,
    #[serde(rename = "s2")]
    S2,
}

impl Phase {
    /// Parse a phase token. Accepts upper or lower case.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "A" | "a" => Some(Phase::A),
            "B" | "b" => Some(Phase::B),
            "C" | "c" => Some(Phase::C),
            "N" | "n" => Some(Phase::N),
            "s1" | "S1" => Some(Phase::S1),
            "s2" | "S2" => Some(Phase::S2),
            _ => None,
        }
    }

    /// The canonical token for this phase.
    pub fn token(self) -> &'static str {
        match self {
            Phase::A => "A",
            Phase::B => "B",
            Phase::C => "C",
            Phase::N => "N",
            Phase::S1 => "s1",
            Phase::S2 => "s2",
        }
    }

    /// True for the neutral conductor.
    pub fn is_neutral(self) -> bool {
        matches!(self, Phase::N)
    }

    /// True for a center-tap secondary leg.
    pub fn is_secondary(self) -> bool {
        matches!(self, Phase::S1 | Phase::S2)
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::from_token(s).ok_or_else(|| format!("invalid phase token '{s}'"))
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        assert_eq!(Phase::from_token("A"), Some(Phase::A));
        assert_eq!(Phase::from_token("c"), Some(Phase::C));
        assert_eq!(Phase::from_token("s1"), Some(Phase::S1));
        assert_eq!(Phase::from_token("X"), None);
    }

    #[test]
    fn test_ordering() {
        let mut phases = vec![Phase::C, Phase::A, Phase::N, Phase::B];
        phases.sort();
        assert_eq!(phases, vec![Phase::A, Phase::B, Phase::C, Phase::N]);
    }

    #[test]
    fn test_classification() {
        assert!(Phase::N.is_neutral());
        assert!(!Phase::A.is_neutral());
        assert!(Phase::S1.is_secondary());
        assert!(!Phase::B.is_secondary());
    }
}
