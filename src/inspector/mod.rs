// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Hardware inspection: probe each resource, then validate the merged result.
//!
//! The inspector is polymorphic over [`HardwareProbe`]: one probe per
//! resource category (CPU, memory, GPUs, disk, OS), each returning the raw
//! value for its section of the profile. Probes for the current host live in
//! [`system`]; tests and callers replaying saved data can supply their own.
//!
//! # Failure policy
//!
//! - CPU and memory are required: a failing or missing probe aborts the
//!   inspection with [`InspectionError`].
//! - GPU, disk and OS are defaulted (`gpus = []`, `disk.free_gb = 0`, OS of
//!   the compile target) and the substitution is recorded as a
//!   [`ProbeWarning`] on the returned [`Inspection`].
//!
//! Every call re-probes; nothing is cached.
//!
//! # Examples
//!
//! ```no_run
//! use advisorlib::inspector::{HardwareInspector, ProbeOptions};
//!
//! let inspection = HardwareInspector::system(&ProbeOptions::default())
//!     .inspect()
//!     .unwrap();
//! println!("{}", inspection.profile);
//! for warning in &inspection.warnings {
//!     println!("warning: {}", warning);
//! }
//! ```

mod command;
mod linux;
mod macos;
mod nvidia;
pub mod system;
#[cfg(windows)]
mod windows;

pub use system::{
    ProbeOptions, SystemCpuProbe, SystemDiskProbe, SystemGpuProbe, SystemMemoryProbe,
    SystemOsProbe,
};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

use crate::error::{InspectionError, ProbeError};
use crate::profile::{validate_hardware_data, HardwareProfile, OsKind};

/// Resource category a probe covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    Cpu,
    Memory,
    Gpu,
    Disk,
    Os,
}

impl ProbeKind {
    /// Probing order
    pub const ALL: [ProbeKind; 5] = [
        ProbeKind::Cpu,
        ProbeKind::Memory,
        ProbeKind::Gpu,
        ProbeKind::Disk,
        ProbeKind::Os,
    ];

    /// Top-level profile key this probe fills
    pub fn section(&self) -> &'static str {
        match self {
            ProbeKind::Cpu => "cpu",
            ProbeKind::Memory => "memory",
            ProbeKind::Gpu => "gpus",
            ProbeKind::Disk => "disk",
            ProbeKind::Os => "os",
        }
    }

    /// Default probe name
    pub fn name(&self) -> &'static str {
        match self {
            ProbeKind::Cpu => "cpu",
            ProbeKind::Memory => "memory",
            ProbeKind::Gpu => "gpu",
            ProbeKind::Disk => "disk",
            ProbeKind::Os => "os",
        }
    }

    /// CPU and memory feed profile invariants and cannot be defaulted
    pub fn is_required(&self) -> bool {
        matches!(self, ProbeKind::Cpu | ProbeKind::Memory)
    }

    /// Substitute section for an unavailable optional probe
    fn default_section(&self) -> Value {
        match self {
            ProbeKind::Gpu => json!([]),
            ProbeKind::Disk => json!({ "free_gb": 0.0 }),
            ProbeKind::Os => OsKind::current()
                .map(|os| json!(os.as_str()))
                .unwrap_or(Value::Null),
            ProbeKind::Cpu | ProbeKind::Memory => Value::Null,
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Source of one section of raw hardware data.
///
/// Implementations must return promptly: the inspector imposes no timeout,
/// so a probe that may block (driver calls, external tools) bounds itself
/// and reports overruns as [`ProbeError`].
pub trait HardwareProbe: Send + Sync {
    /// Category this probe covers
    fn kind(&self) -> ProbeKind;

    /// Name used in errors and warnings
    fn name(&self) -> &str {
        self.kind().name()
    }

    /// Raw value for [`ProbeKind::section`]
    fn probe(&self) -> Result<Value, ProbeError>;
}

/// Probe backed by a closure
pub struct FnProbe<F> {
    kind: ProbeKind,
    name: String,
    f: F,
}

impl<F> FnProbe<F>
where
    F: Fn() -> Result<Value, ProbeError> + Send + Sync,
{
    pub fn new(kind: ProbeKind, f: F) -> Self {
        Self {
            kind,
            name: kind.name().to_string(),
            f,
        }
    }

    pub fn named(kind: ProbeKind, name: impl Into<String>, f: F) -> Self {
        Self {
            kind,
            name: name.into(),
            f,
        }
    }
}

impl<F> HardwareProbe for FnProbe<F>
where
    F: Fn() -> Result<Value, ProbeError> + Send + Sync,
{
    fn kind(&self) -> ProbeKind {
        self.kind
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn probe(&self) -> Result<Value, ProbeError> {
        (self.f)()
    }
}

/// At most one probe per [`ProbeKind`]
#[derive(Default)]
pub struct ProbeSet {
    probes: Vec<Box<dyn HardwareProbe>>,
}

impl ProbeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a probe, replacing any existing probe of the same kind
    pub fn with(mut self, probe: impl HardwareProbe + 'static) -> Self {
        self.insert(Box::new(probe));
        self
    }

    /// Add a boxed probe, returning the one it replaced
    pub fn insert(&mut self, probe: Box<dyn HardwareProbe>) -> Option<Box<dyn HardwareProbe>> {
        match self.probes.iter().position(|p| p.kind() == probe.kind()) {
            Some(index) => Some(std::mem::replace(&mut self.probes[index], probe)),
            None => {
                self.probes.push(probe);
                None
            }
        }
    }

    pub fn get(&self, kind: ProbeKind) -> Option<&dyn HardwareProbe> {
        self.probes
            .iter()
            .find(|p| p.kind() == kind)
            .map(|p| p.as_ref())
    }

    pub fn kinds(&self) -> Vec<ProbeKind> {
        self.probes.iter().map(|p| p.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}

impl fmt::Debug for ProbeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.probes.iter().map(|p| p.name()))
            .finish()
    }
}

/// A defaulted section, recorded instead of failing the inspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeWarning {
    pub kind: ProbeKind,
    pub probe_name: String,
    pub reason: String,
}

impl ProbeWarning {
    fn new(kind: ProbeKind, unavailable: &Unavailable) -> Self {
        match unavailable {
            Unavailable::Failed(err) => Self {
                kind,
                probe_name: err.probe_name.clone(),
                reason: err.cause.clone(),
            },
            Unavailable::NotConfigured => Self {
                kind,
                probe_name: kind.name().to_string(),
                reason: "not configured".to_string(),
            },
        }
    }
}

impl fmt::Display for ProbeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} probe unavailable ({}); using default {}",
            self.probe_name,
            self.reason,
            self.kind.section()
        )
    }
}

/// Result of one inspection
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub profile: HardwareProfile,
    /// Sections that were defaulted, in probing order
    pub warnings: Vec<ProbeWarning>,
    pub inspected_at: DateTime<Utc>,
}

impl Inspection {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn into_profile(self) -> HardwareProfile {
        self.profile
    }
}

enum Unavailable {
    Failed(ProbeError),
    NotConfigured,
}

/// Builds a [`HardwareProfile`] from a set of probes
#[derive(Debug)]
pub struct HardwareInspector {
    probes: ProbeSet,
}

impl HardwareInspector {
    pub fn new(probes: ProbeSet) -> Self {
        Self { probes }
    }

    /// Inspector over the built-in probes for the current host
    pub fn system(options: &ProbeOptions) -> Self {
        Self::new(ProbeSet::system(options))
    }

    pub fn probes(&self) -> &ProbeSet {
        &self.probes
    }

    /// Run every configured probe once, merge and validate.
    pub fn inspect(&self) -> Result<Inspection, InspectionError> {
        // All probes run before any failure is acted on.
        let outcomes: Vec<(ProbeKind, Result<Value, Unavailable>)> = ProbeKind::ALL
            .iter()
            .map(|&kind| (kind, self.run(kind)))
            .collect();

        let mut raw = Map::new();
        let mut warnings = Vec::new();
        for (kind, outcome) in outcomes {
            let section = match outcome {
                Ok(section) => section,
                Err(Unavailable::Failed(err)) if kind.is_required() => {
                    return Err(InspectionError::ProbeFailed(err));
                }
                Err(Unavailable::NotConfigured) if kind.is_required() => {
                    return Err(InspectionError::MissingProbe(kind));
                }
                Err(unavailable) => {
                    let warning = ProbeWarning::new(kind, &unavailable);
                    warn!("{}", warning);
                    warnings.push(warning);
                    kind.default_section()
                }
            };
            raw.insert(kind.section().to_string(), section);
        }

        let profile = validate_hardware_data(&Value::Object(raw))?;
        info!(
            "Inspection complete: {} GPU(s), {} ({} warning(s))",
            profile.gpu_count(),
            profile.os(),
            warnings.len()
        );

        Ok(Inspection {
            profile,
            warnings,
            inspected_at: Utc::now(),
        })
    }

    fn run(&self, kind: ProbeKind) -> Result<Value, Unavailable> {
        let probe = self.probes.get(kind).ok_or(Unavailable::NotConfigured)?;
        debug!("Running {} probe '{}'", kind, probe.name());
        probe.probe().map_err(Unavailable::Failed)
    }
}
