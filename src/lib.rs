// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! # Silicon Advisor
//!
//! Hardware profiling and LLM inference engine recommendations.
//!
//! - [`profile`]: validated [`HardwareProfile`] built from an untyped JSON
//!   mapping by [`validate_hardware_data`], which reports every violation
//!   at once.
//! - [`inspector`]: runs one probe per resource category on the current host
//!   (or on fakes), defaults non-critical failures and validates the result.
//! - [`recommender`]: ranks a catalog of [`EngineRequirement`]s against a
//!   profile with a hard eligibility filter and a weighted score.
//! - [`config`]: TOML configuration tying the three together.
//!
//! ## Example
//!
//! ```
//! use advisorlib::{validate_hardware_data, Catalog, Recommender};
//! use serde_json::json;
//!
//! let profile = validate_hardware_data(&json!({
//!     "cpu": {
//!         "logical_core_count": 16,
//!         "physical_core_count": 8,
//!         "base_clock_ghz": 3.6,
//!         "architecture": "x86_64"
//!     },
//!     "memory": { "total_gb": 64, "available_gb": 48 },
//!     "gpus": [{ "vendor": "nvidia", "model_name": "RTX 4090", "vram_gb": 24 }],
//!     "disk": { "free_gb": 500 },
//!     "os": "linux"
//! }))?;
//!
//! let catalog = Catalog::builtin();
//! let ranked = Recommender::new().recommend(&profile, catalog.engines(), Some(3))?;
//! for rec in &ranked {
//!     println!("{} {:.2} {:?}", rec.engine_name, rec.score, rec.rationale);
//! }
//! # Ok::<(), advisorlib::AdvisorError>(())
//! ```

pub mod config;
pub mod error;
pub mod inspector;
pub mod profile;
pub mod recommender;

pub use config::AdvisorConfig;
pub use error::{
    AdvisorError, CatalogError, ConfigError, FieldViolation, InspectionError,
    InvalidArgumentError, ProbeError, Result, ValidationError, ViolationKind,
};
pub use inspector::{
    FnProbe, HardwareInspector, HardwareProbe, Inspection, ProbeKind, ProbeOptions, ProbeSet,
    ProbeWarning,
};
pub use profile::{
    validate_hardware_data, CpuArchitecture, CpuInfo, DiskInfo, GpuInfo, GpuVendor,
    HardwareProfile, MemoryInfo, OsKind,
};
pub use recommender::{
    Assessment, Catalog, EngineRequirement, Exclusion, Recommendation, Recommender,
    ScoringWeights,
};

/// Inspect the current host with default probes and rank the built-in catalog.
pub fn advise(top_k: Option<usize>) -> Result<(Inspection, Vec<Recommendation>)> {
    let config = AdvisorConfig::default();
    let inspection = config.inspector().inspect()?;
    let catalog = config.catalog()?;
    let recommender = config.recommender()?;
    let recommendations = recommender.recommend(&inspection.profile, catalog.engines(), top_k)?;
    Ok((inspection, recommendations))
}
