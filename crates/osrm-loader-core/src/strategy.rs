//! Strategy identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LoaderError;

/// One of three mutually exclusive ways to load a dataset and launch the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Server reads the `.osrm` files into process memory.
    Direct,
    /// Server memory-maps the `.osrm` files.
    Mmap,
    /// `osrm-datastore` publishes into shared memory; the server attaches.
    Datastore,
}

impl StrategyKind {
    /// All strategies, in façade table order.
    pub const ALL: [Self; 3] = [Self::Direct, Self::Mmap, Self::Datastore];

    /// Canonical name as accepted by `set_strategy`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Mmap => "mmap",
            Self::Datastore => "datastore",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = LoaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            // `directly` is the name older cucumber profiles use
            "direct" | "directly" => Ok(Self::Direct),
            "mmap" => Ok(Self::Mmap),
            "datastore" => Ok(Self::Datastore),
            other => Err(LoaderError::UnknownStrategy(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        assert_eq!("direct".parse::<StrategyKind>().unwrap(), StrategyKind::Direct);
        assert_eq!("directly".parse::<StrategyKind>().unwrap(), StrategyKind::Direct);
        assert_eq!("mmap".parse::<StrategyKind>().unwrap(), StrategyKind::Mmap);
        assert_eq!(
            "datastore".parse::<StrategyKind>().unwrap(),
            StrategyKind::Datastore
        );
    }

    #[test]
    fn test_parse_unknown_name() {
        let err = "shared".parse::<StrategyKind>().unwrap_err();
        assert!(matches!(err, LoaderError::UnknownStrategy(ref name) if name == "shared"));
    }

    #[test]
    fn test_display_round_trips_canonical_name() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.to_string().parse::<StrategyKind>().unwrap(), kind);
        }
    }
}
