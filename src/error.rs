// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Error types for Silicon Advisor

use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;

use crate::inspector::ProbeKind;

/// Result type alias for advisor operations
pub type Result<T> = std::result::Result<T, AdvisorError>;

/// Kind of a single validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// Missing field, wrong type, unparsable string or unknown enum name
    Schema,
    /// Value present and well-typed but outside its allowed range
    Range,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Schema => write!(f, "schema"),
            ViolationKind::Range => write!(f, "range"),
        }
    }
}

/// One violated field, addressed by its path in the raw mapping
/// (e.g. `cpu.logical_core_count`, `gpus[1].vram_gb`, `$` for the root).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub path: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl FieldViolation {
    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ViolationKind::Schema,
            message: message.into(),
        }
    }

    pub fn range(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ViolationKind::Range,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} error): {}", self.path, self.kind, self.message)
    }
}

/// Raw hardware data failed validation.
///
/// Carries every violated field found in a single pass, never just the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub(crate) fn new(violations: Vec<FieldViolation>) -> Self {
        Self { violations }
    }

    /// All violations, in the order the validator encountered them
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Missing or mistyped fields
    pub fn schema_errors(&self) -> impl Iterator<Item = &FieldViolation> {
        self.violations
            .iter()
            .filter(|v| v.kind == ViolationKind::Schema)
    }

    /// Fields present with out-of-range values
    pub fn range_errors(&self) -> impl Iterator<Item = &FieldViolation> {
        self.violations
            .iter()
            .filter(|v| v.kind == ViolationKind::Range)
    }

    pub fn has_schema_errors(&self) -> bool {
        self.schema_errors().next().is_some()
    }

    pub fn has_range_errors(&self) -> bool {
        self.range_errors().next().is_some()
    }

    /// Paths of all violated fields
    pub fn paths(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.path.as_str()).collect()
    }

    /// Violation recorded for `path`, if any
    pub fn violation_at(&self, path: &str) -> Option<&FieldViolation> {
        self.violations.iter().find(|v| v.path == path)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid hardware data ({} violation{})",
            self.violations.len(),
            if self.violations.len() == 1 { "" } else { "s" }
        )?;
        for v in &self.violations {
            write!(f, "; {}", v)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// A single probe failed to produce its subsection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("probe '{probe_name}' failed: {cause}")]
pub struct ProbeError {
    pub probe_name: String,
    pub cause: String,
}

impl ProbeError {
    pub fn new(probe_name: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            probe_name: probe_name.into(),
            cause: cause.into(),
        }
    }

    pub fn io(probe_name: impl Into<String>, what: &str, err: io::Error) -> Self {
        Self::new(probe_name, format!("{}: {}", what, err))
    }

    pub fn timeout(probe_name: impl Into<String>, what: &str, limit: Duration) -> Self {
        Self::new(
            probe_name,
            format!("{} did not finish within {} ms", what, limit.as_millis()),
        )
    }

    pub fn parse(probe_name: impl Into<String>, what: &str) -> Self {
        Self::new(probe_name, format!("could not parse {}", what))
    }
}

/// Inspection could not produce a profile
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InspectionError {
    /// A probe supplying required data (CPU, memory) failed
    #[error("required probe failed: {0}")]
    ProbeFailed(#[source] ProbeError),

    /// No probe was configured for a required section
    #[error("no probe configured for required section '{}'", .0.section())]
    MissingProbe(ProbeKind),

    /// The merged snapshot did not validate
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Misuse of a recommender or catalog contract
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid argument: {0}")]
pub struct InvalidArgumentError(pub String);

/// Catalog loading or validation error
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog file could not be read
    #[error("cannot read catalog {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Catalog text did not parse
    #[error("catalog parse error: {0}")]
    Parse(String),

    /// An entry violates the catalog rules
    #[error("invalid catalog entry '{engine}': {reason}")]
    InvalidEntry { engine: String, reason: String },

    /// Two entries share a name
    #[error("duplicate catalog entry '{0}'")]
    DuplicateEngine(String),
}

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(String),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Main error type for Silicon Advisor
#[derive(Error, Debug)]
pub enum AdvisorError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid hardware data
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Probe failure surfaced directly (outside an inspection)
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// Inspection failure
    #[error("inspection failed: {0}")]
    Inspection(#[from] InspectionError),

    /// Recommender misuse
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgumentError),

    /// Catalog error
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_lists_all() {
        let err = ValidationError::new(vec![
            FieldViolation::schema("memory", "missing required field"),
            FieldViolation::range("cpu.base_clock_ghz", "must be positive, got -1"),
        ]);
        let text = err.to_string();
        assert!(text.starts_with("invalid hardware data (2 violations)"));
        assert!(text.contains("memory (schema error): missing required field"));
        assert!(text.contains("cpu.base_clock_ghz (range error)"));
    }

    #[test]
    fn test_validation_error_subkinds() {
        let err = ValidationError::new(vec![
            FieldViolation::schema("memory", "missing"),
            FieldViolation::range("disk.free_gb", "negative"),
            FieldViolation::range("gpus[0].vram_gb", "negative"),
        ]);
        assert!(err.has_schema_errors());
        assert!(err.has_range_errors());
        assert_eq!(err.schema_errors().count(), 1);
        assert_eq!(err.range_errors().count(), 2);
        assert_eq!(err.paths(), vec!["memory", "disk.free_gb", "gpus[0].vram_gb"]);
        assert_eq!(
            err.violation_at("memory").map(|v| v.kind),
            Some(ViolationKind::Schema)
        );
    }

    #[test]
    fn test_probe_error_display() {
        let err = ProbeError::new("gpu", "no driver");
        assert_eq!(err.to_string(), "probe 'gpu' failed: no driver");
    }

    #[test]
    fn test_probe_error_timeout() {
        let err = ProbeError::timeout("gpu", "nvidia-smi", Duration::from_millis(250));
        assert_eq!(err.cause, "nvidia-smi did not finish within 250 ms");
    }

    #[test]
    fn test_inspection_error_missing_probe() {
        let err = InspectionError::MissingProbe(ProbeKind::Memory);
        assert_eq!(
            err.to_string(),
            "no probe configured for required section 'memory'"
        );
    }

    #[test]
    fn test_inspection_error_wraps_probe_error() {
        let err = InspectionError::ProbeFailed(ProbeError::new("cpu", "denied"));
        assert!(err.to_string().contains("probe 'cpu' failed: denied"));
    }

    #[test]
    fn test_advisor_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file missing");
        let err: AdvisorError = io_err.into();
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn test_advisor_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ invalid json }}}").unwrap_err();
        let err: AdvisorError = json_err.into();
        assert!(err.to_string().contains("JSON error"));
    }

    #[test]
    fn test_invalid_argument_conv() {
        let err: AdvisorError = InvalidArgumentError("top_k must be positive".into()).into();
        match err {
            AdvisorError::InvalidArgument(e) => assert_eq!(e.0, "top_k must be positive"),
            _ => panic!("Expected InvalidArgument"),
        }
    }
}
