//! Dataset reference passed into a `load` call.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Prepared input data plus free-form extra launch arguments.
///
/// Immutable once handed to a strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    /// Path to the prepared `.osrm` input.
    pub input_file: PathBuf,
    /// Extra arguments appended to the launch (or prepare) command.
    pub loader_args: Vec<String>,
}

impl Dataset {
    /// Create a dataset reference without extra arguments.
    pub fn new(input_file: impl Into<PathBuf>) -> Self {
        Self {
            input_file: input_file.into(),
            loader_args: Vec::new(),
        }
    }

    /// Set the extra loader arguments.
    #[must_use]
    pub fn with_loader_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.loader_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Path to the prepared input.
    pub fn input_file(&self) -> &Path {
        &self.input_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_loader_args() {
        let dataset = Dataset::new("valid.osrm").with_loader_args(["--max-table-size", "100"]);
        assert_eq!(dataset.input_file(), Path::new("valid.osrm"));
        assert_eq!(dataset.loader_args, vec!["--max-table-size", "100"]);
    }
}
