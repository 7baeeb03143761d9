//! Engine configuration.
//!
//! The core is a library; a harness hands it a [`CoreConfig`] either built
//! in code or loaded from a file with environment overrides.

use std::path::Path;

use anyhow::Context;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::record::EdgeFormat;

/// Sentinel meaning "coverage pruning disabled".
pub const DISABLE_COVERAGE: i32 = -1;

/// Configuration shared by the graph engine and the record pipeline.
///
/// Every field corresponds to one harness-visible key; defaults match the
/// documented behavior of the engine when a harness supplies nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Permit parallel edges between the same ordered pair of vertices.
    pub allow_edge_multiples: bool,
    /// Refuse a chain merge when the multiplicity of `u -> w` differs from
    /// the multiplicity of `w -> next`. When off, the merged multiplicity
    /// is the minimum of the two.
    pub compress_multiples_must_match: bool,
    /// Emit `edges_from` in serialized vertex records.
    pub include_from_edges: bool,
    /// Split builder output into branch and chain streams.
    pub partition_branches_chains: bool,
    /// Expected coverage for error pruning; [`DISABLE_COVERAGE`] disables it.
    pub coverage: i32,
    /// Consecutive silent rounds required to stop chain compression.
    pub termination_count: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            allow_edge_multiples: false,
            compress_multiples_must_match: true,
            include_from_edges: false,
            partition_branches_chains: true,
            coverage: DISABLE_COVERAGE,
            termination_count: 1,
        }
    }
}

impl CoreConfig {
    /// Load configuration from a TOML/JSON/YAML file, with `EULER_FORGE_*`
    /// environment variables taking precedence over file values.
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("EULER_FORGE"))
            .build()
            .context("failed to read engine configuration")?;
        let config: Self = settings
            .try_deserialize()
            .context("failed to deserialize engine configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Check field-level consistency.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.coverage != DISABLE_COVERAGE && self.coverage <= 0 {
            return Err(GraphError::Precondition(format!(
                "coverage must be positive or {DISABLE_COVERAGE} (disabled), got {}",
                self.coverage
            )));
        }
        if self.termination_count == 0 {
            return Err(GraphError::Precondition(
                "termination_count must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The wire format implied by `include_from_edges`.
    pub fn edge_format(&self) -> EdgeFormat {
        if self.include_from_edges {
            EdgeFormat::EdgesToFrom
        } else {
            EdgeFormat::EdgesTo
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_keys() {
        let config = CoreConfig::default();
        assert!(!config.allow_edge_multiples);
        assert!(config.compress_multiples_must_match);
        assert!(!config.include_from_edges);
        assert!(config.partition_branches_chains);
        assert_eq!(config.coverage, DISABLE_COVERAGE);
        assert_eq!(config.termination_count, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_coverage() {
        let config = CoreConfig {
            coverage: 0,
            ..CoreConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GraphError::Precondition(_))
        ));
    }

    #[test]
    fn rejects_zero_termination_count() {
        let config = CoreConfig {
            termination_count: 0,
            ..CoreConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_toml_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "allow_edge_multiples = true\ncoverage = 4\ntermination_count = 2"
        )
        .unwrap();

        let config = CoreConfig::from_file(file.path()).unwrap();
        assert!(config.allow_edge_multiples);
        assert_eq!(config.coverage, 4);
        assert_eq!(config.termination_count, 2);
        // Untouched keys keep their defaults.
        assert!(config.compress_multiples_must_match);
    }
}
