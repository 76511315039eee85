//! Tweet identifier type

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Numeric key of a single post
///
/// Serialized as its decimal string, which is how the lookup API returns ids
/// and how output files are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TweetId(u64);

impl TweetId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Parse a CSV cell, returning `Ok(None)` for an empty cell
    pub fn from_cell(cell: &str) -> Result<Option<Self>, Error> {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed.parse().map(Some)
    }
}

impl fmt::Display for TweetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TweetId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(TweetId)
            .map_err(|e| Error::InvalidInput(format!("Invalid tweet id '{}': {}", s, e)))
    }
}

impl From<u64> for TweetId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<TweetId> for String {
    fn from(id: TweetId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for TweetId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Join identifiers the way the lookup API expects them (`1,2,3`)
pub fn join_ids(ids: &[TweetId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        let id: TweetId = " 1460323737035677698 ".parse().unwrap();
        assert_eq!(id.get(), 1_460_323_737_035_677_698);
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!("abc".parse::<TweetId>().is_err());
        assert!("12.5".parse::<TweetId>().is_err());
        assert!("-4".parse::<TweetId>().is_err());
    }

    #[test]
    fn test_from_cell_empty_is_none() {
        assert!(TweetId::from_cell("").unwrap().is_none());
        assert!(TweetId::from_cell("   ").unwrap().is_none());
        assert_eq!(TweetId::from_cell("7").unwrap(), Some(TweetId::new(7)));
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&TweetId::new(42)).unwrap();
        assert_eq!(json, "\"42\"");

        let back: TweetId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(back, TweetId::new(42));
    }

    #[test]
    fn test_join_ids() {
        let ids = vec![TweetId::new(3), TweetId::new(1), TweetId::new(2)];
        assert_eq!(join_ids(&ids), "3,1,2");
        assert_eq!(join_ids(&[]), "");
    }
}
