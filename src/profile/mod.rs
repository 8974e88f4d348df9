// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Validated hardware profile of one host.
//!
//! A [`HardwareProfile`] can only be obtained through
//! [`validate_hardware_data`], either directly from an untyped JSON mapping
//! (e.g. a saved snapshot) or via [`crate::inspector::HardwareInspector`].
//! Profiles are immutable once built.
//!
//! # Examples
//!
//! ```
//! use advisorlib::profile::{validate_hardware_data, CpuArchitecture};
//! use serde_json::json;
//!
//! let profile = validate_hardware_data(&json!({
//!     "cpu": {
//!         "logical_core_count": 16,
//!         "physical_core_count": 8,
//!         "base_clock_ghz": 3.6,
//!         "architecture": "x86_64"
//!     },
//!     "memory": { "total_gb": 32.0, "available_gb": 24.5 },
//!     "gpus": [
//!         { "vendor": "nvidia", "model_name": "GeForce RTX 4090", "vram_gb": 24.0,
//!           "compute_capability": "8.9" }
//!     ],
//!     "disk": { "free_gb": 512.0 },
//!     "os": "linux"
//! }))
//! .unwrap();
//!
//! assert_eq!(profile.cpu().architecture, CpuArchitecture::X86_64);
//! assert_eq!(profile.best_gpu_vram_gb(), Some(24.0));
//! ```

mod validate;

pub use validate::validate_hardware_data;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::{AdvisorError, ValidationError};

/// Unrecognised enum name in raw hardware data or a catalog
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}', expected one of {expected}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// CPU instruction set architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CpuArchitecture {
    #[serde(rename = "x86_64", alias = "amd64", alias = "x64")]
    X86_64,
    #[serde(rename = "arm64", alias = "aarch64")]
    Arm64,
    #[serde(rename = "other")]
    Other,
}

impl CpuArchitecture {
    pub const ALL: [CpuArchitecture; 3] = [
        CpuArchitecture::X86_64,
        CpuArchitecture::Arm64,
        CpuArchitecture::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CpuArchitecture::X86_64 => "x86_64",
            CpuArchitecture::Arm64 => "arm64",
            CpuArchitecture::Other => "other",
        }
    }

    /// Architecture of the compile target
    pub fn current() -> Self {
        Self::from_target(std::env::consts::ARCH)
    }

    /// Map a Rust target arch name (`std::env::consts::ARCH`)
    pub fn from_target(arch: &str) -> Self {
        match arch {
            "x86_64" => CpuArchitecture::X86_64,
            "aarch64" => CpuArchitecture::Arm64,
            _ => CpuArchitecture::Other,
        }
    }
}

impl FromStr for CpuArchitecture {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Ok(CpuArchitecture::X86_64),
            "arm64" | "aarch64" => Ok(CpuArchitecture::Arm64),
            "other" => Ok(CpuArchitecture::Other),
            _ => Err(UnknownVariant {
                kind: "architecture",
                value: s.to_string(),
                expected: "x86_64, arm64, other",
            }),
        }
    }
}

impl fmt::Display for CpuArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GPU vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpuVendor {
    Nvidia,
    Amd,
    Apple,
    Intel,
    /// Vendor could not be identified
    None,
}

impl GpuVendor {
    pub fn as_str(&self) -> &'static str {
        match self {
            GpuVendor::Nvidia => "nvidia",
            GpuVendor::Amd => "amd",
            GpuVendor::Apple => "apple",
            GpuVendor::Intel => "intel",
            GpuVendor::None => "none",
        }
    }

    /// Best-effort vendor guess from a marketing name
    pub fn from_model_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("nvidia")
            || lower.contains("geforce")
            || lower.contains("quadro")
            || lower.contains("tesla")
            || lower.contains("rtx")
            || lower.contains("gtx")
        {
            GpuVendor::Nvidia
        } else if lower.contains("amd") || lower.contains("radeon") || lower.contains("instinct") {
            GpuVendor::Amd
        } else if lower.contains("apple") {
            GpuVendor::Apple
        } else if lower.contains("intel") || lower.contains("arc ") || lower.contains("iris") {
            GpuVendor::Intel
        } else {
            GpuVendor::None
        }
    }
}

impl FromStr for GpuVendor {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nvidia" => Ok(GpuVendor::Nvidia),
            "amd" => Ok(GpuVendor::Amd),
            "apple" => Ok(GpuVendor::Apple),
            "intel" => Ok(GpuVendor::Intel),
            "none" => Ok(GpuVendor::None),
            _ => Err(UnknownVariant {
                kind: "GPU vendor",
                value: s.to_string(),
                expected: "nvidia, amd, apple, intel, none",
            }),
        }
    }
}

impl fmt::Display for GpuVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating system family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OsKind {
    #[serde(rename = "linux")]
    Linux,
    #[serde(rename = "macos", alias = "darwin")]
    MacOs,
    #[serde(rename = "windows")]
    Windows,
}

impl OsKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OsKind::Linux => "linux",
            OsKind::MacOs => "macos",
            OsKind::Windows => "windows",
        }
    }

    /// OS of the compile target, if it is one of the supported families
    pub fn current() -> Option<Self> {
        std::env::consts::OS.parse().ok()
    }
}

impl FromStr for OsKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linux" => Ok(OsKind::Linux),
            "macos" | "darwin" | "osx" => Ok(OsKind::MacOs),
            "windows" | "win32" => Ok(OsKind::Windows),
            _ => Err(UnknownVariant {
                kind: "operating system",
                value: s.to_string(),
                expected: "linux, macos, windows",
            }),
        }
    }
}

impl fmt::Display for OsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU resources
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuInfo {
    /// Hardware threads
    pub logical_core_count: u32,
    /// Physical cores (never more than logical)
    pub physical_core_count: u32,
    /// Base clock in GHz
    pub base_clock_ghz: f64,
    pub architecture: CpuArchitecture,
}

/// System memory in GB
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryInfo {
    pub total_gb: f64,
    /// Free memory at probe time; best-effort, varies between inspections
    pub available_gb: f64,
}

/// One GPU / accelerator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpuInfo {
    pub vendor: GpuVendor,
    pub model_name: String,
    /// Dedicated VRAM in GB (unified memory size on Apple silicon)
    pub vram_gb: f64,
    /// e.g. "8.9" for CUDA devices
    pub compute_capability: Option<String>,
}

/// Storage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskInfo {
    pub free_gb: f64,
}

/// Validated, immutable snapshot of a host's hardware resources.
///
/// The primary GPU is the first element of [`gpus`](Self::gpus); beyond that,
/// GPU order is detection order and carries no meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct HardwareProfile {
    cpu: CpuInfo,
    memory: MemoryInfo,
    gpus: Vec<GpuInfo>,
    disk: DiskInfo,
    os: OsKind,
}

impl HardwareProfile {
    pub fn cpu(&self) -> &CpuInfo {
        &self.cpu
    }

    pub fn memory(&self) -> &MemoryInfo {
        &self.memory
    }

    pub fn gpus(&self) -> &[GpuInfo] {
        &self.gpus
    }

    pub fn disk(&self) -> &DiskInfo {
        &self.disk
    }

    pub fn os(&self) -> OsKind {
        self.os
    }

    /// First detected GPU
    pub fn primary_gpu(&self) -> Option<&GpuInfo> {
        self.gpus.first()
    }

    pub fn gpu_count(&self) -> usize {
        self.gpus.len()
    }

    pub fn has_gpu(&self) -> bool {
        !self.gpus.is_empty()
    }

    /// Largest VRAM of any single GPU
    pub fn best_gpu_vram_gb(&self) -> Option<f64> {
        self.gpus.iter().map(|g| g.vram_gb).reduce(f64::max)
    }

    /// Sum of VRAM across all GPUs
    pub fn total_vram_gb(&self) -> f64 {
        self.gpus.iter().map(|g| g.vram_gb).sum()
    }

    /// Re-serialize into the raw mapping shape accepted by
    /// [`validate_hardware_data`].
    pub fn to_raw(&self) -> Value {
        let gpus: Vec<Value> = self
            .gpus
            .iter()
            .map(|g| {
                json!({
                    "vendor": g.vendor.as_str(),
                    "model_name": g.model_name,
                    "vram_gb": g.vram_gb,
                    "compute_capability": g.compute_capability,
                })
            })
            .collect();

        json!({
            "cpu": {
                "logical_core_count": self.cpu.logical_core_count,
                "physical_core_count": self.cpu.physical_core_count,
                "base_clock_ghz": self.cpu.base_clock_ghz,
                "architecture": self.cpu.architecture.as_str(),
            },
            "memory": {
                "total_gb": self.memory.total_gb,
                "available_gb": self.memory.available_gb,
            },
            "gpus": gpus,
            "disk": { "free_gb": self.disk.free_gb },
            "os": self.os.as_str(),
        })
    }

    /// Parse and validate a JSON snapshot
    pub fn from_json_str(text: &str) -> Result<Self, AdvisorError> {
        let raw: Value = serde_json::from_str(text)?;
        Ok(validate_hardware_data(&raw)?)
    }

    /// Pretty JSON in the raw mapping shape
    pub fn to_json_string_pretty(&self) -> Result<String, AdvisorError> {
        Ok(serde_json::to_string_pretty(&self.to_raw())?)
    }
}

impl TryFrom<Value> for HardwareProfile {
    type Error = ValidationError;

    fn try_from(raw: Value) -> Result<Self, Self::Error> {
        validate_hardware_data(&raw)
    }
}

impl fmt::Display for HardwareProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}C/{}T @ {:.2} GHz, {:.1}/{:.1} GB RAM free, ",
            self.cpu.architecture,
            self.cpu.physical_core_count,
            self.cpu.logical_core_count,
            self.cpu.base_clock_ghz,
            self.memory.available_gb,
            self.memory.total_gb,
        )?;
        match self.gpus.as_slice() {
            [] => write!(f, "no GPU")?,
            [gpu] => write!(f, "{} ({:.0} GB)", gpu.model_name, gpu.vram_gb)?,
            gpus => write!(
                f,
                "{} GPUs ({:.0} GB total VRAM)",
                gpus.len(),
                self.total_vram_gb()
            )?,
        }
        write!(f, ", {:.0} GB disk free, {}", self.disk.free_gb, self.os)
    }
}
