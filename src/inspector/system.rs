// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Built-in probes for the current host.
//!
//! # Platform Support
//!
//! - **Linux**: `/proc/cpuinfo`, cpufreq sysfs, `/proc/meminfo`, NVML or
//!   `nvidia-smi`, amdgpu sysfs, `statvfs`
//! - **macOS**: `sysctl`, `vm_stat`, `system_profiler`, `statvfs`
//! - **Windows**: WMI (`Win32_Processor`, `Win32_OperatingSystem`,
//!   `Win32_VideoController`, `Win32_LogicalDisk`), NVML or `nvidia-smi`
//!
//! External tools are bounded by [`ProbeOptions::timeout`].

use log::debug;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use super::{HardwareProbe, ProbeKind, ProbeSet};
use crate::error::ProbeError;
use crate::profile::{CpuArchitecture, GpuVendor, OsKind};

pub(crate) const BYTES_PER_GB: f64 = 1_073_741_824.0;
pub(crate) const KB_PER_GB: f64 = 1_048_576.0;
pub(crate) const MB_PER_GB: f64 = 1024.0;

/// Settings for the built-in probes
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOptions {
    /// Upper bound for each external tool invocation
    pub timeout: Duration,
    /// Filesystem whose free space is reported
    pub disk_path: PathBuf,
    /// Probe GPUs (otherwise `gpus` is defaulted with a warning)
    pub gpu: bool,
    /// Probe disk space (otherwise `disk` is defaulted with a warning)
    pub disk: bool,
}

impl ProbeOptions {
    pub fn default_disk_path() -> PathBuf {
        if cfg!(windows) {
            PathBuf::from("C:\\")
        } else {
            PathBuf::from("/")
        }
    }
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            disk_path: Self::default_disk_path(),
            gpu: true,
            disk: true,
        }
    }
}

impl ProbeSet {
    /// Probes for the current host
    pub fn system(options: &ProbeOptions) -> Self {
        let mut set = ProbeSet::new()
            .with(SystemCpuProbe {
                timeout: options.timeout,
            })
            .with(SystemMemoryProbe {
                timeout: options.timeout,
            })
            .with(SystemOsProbe);
        if options.gpu {
            set = set.with(SystemGpuProbe {
                timeout: options.timeout,
            });
        }
        if options.disk {
            set = set.with(SystemDiskProbe {
                path: options.disk_path.clone(),
            });
        }
        set
    }
}

/// Raw `cpu` section with the compile-target architecture
pub(crate) fn cpu_section(logical: u32, physical: u32, base_clock_ghz: f64) -> Value {
    json!({
        "logical_core_count": logical,
        "physical_core_count": physical,
        "base_clock_ghz": base_clock_ghz,
        "architecture": CpuArchitecture::current().as_str(),
    })
}

pub(crate) fn memory_section(total_gb: f64, available_gb: f64) -> Value {
    json!({
        "total_gb": total_gb,
        "available_gb": available_gb.min(total_gb),
    })
}

pub(crate) fn gpu_entry(
    vendor: GpuVendor,
    model_name: &str,
    vram_gb: f64,
    compute_capability: Option<String>,
) -> Value {
    json!({
        "vendor": vendor.as_str(),
        "model_name": model_name,
        "vram_gb": vram_gb,
        "compute_capability": compute_capability,
    })
}

/// CPU counts and clock
#[derive(Debug, Clone)]
pub struct SystemCpuProbe {
    timeout: Duration,
}

impl SystemCpuProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl HardwareProbe for SystemCpuProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Cpu
    }

    fn probe(&self) -> Result<Value, ProbeError> {
        #[cfg(target_os = "linux")]
        return super::linux::cpu(self.timeout);
        #[cfg(target_os = "macos")]
        return super::macos::cpu(self.timeout);
        #[cfg(windows)]
        return super::windows::cpu(self.timeout);
        #[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
        return Err(unsupported(self.name(), self.timeout));
    }
}

/// Total and available memory
#[derive(Debug, Clone)]
pub struct SystemMemoryProbe {
    timeout: Duration,
}

impl SystemMemoryProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl HardwareProbe for SystemMemoryProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Memory
    }

    fn probe(&self) -> Result<Value, ProbeError> {
        #[cfg(target_os = "linux")]
        return super::linux::memory(self.timeout);
        #[cfg(target_os = "macos")]
        return super::macos::memory(self.timeout);
        #[cfg(windows)]
        return super::windows::memory(self.timeout);
        #[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
        return Err(unsupported(self.name(), self.timeout));
    }
}

type GpuSource = fn(Duration) -> Result<Vec<Value>, ProbeError>;

/// Discrete GPUs and Apple-silicon unified memory
#[derive(Debug, Clone)]
pub struct SystemGpuProbe {
    timeout: Duration,
}

impl SystemGpuProbe {
    fn sources() -> Vec<(&'static str, GpuSource)> {
        #[allow(unused_mut)]
        let mut sources: Vec<(&'static str, GpuSource)> = Vec::new();
        #[cfg(any(target_os = "linux", windows))]
        sources.push(("nvidia", super::nvidia::gpus));
        #[cfg(target_os = "linux")]
        sources.push(("amdgpu sysfs", super::linux::amd_gpus));
        #[cfg(target_os = "macos")]
        sources.push(("system_profiler", super::macos::gpus));
        #[cfg(windows)]
        sources.push(("wmi", super::windows::gpus));
        sources
    }
}

impl SystemGpuProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl HardwareProbe for SystemGpuProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Gpu
    }

    fn probe(&self) -> Result<Value, ProbeError> {
        let results: Vec<Result<Vec<Value>, ProbeError>> = Self::sources()
            .into_iter()
            .map(|(label, source)| {
                let result = source(self.timeout);
                if let Err(ref e) = result {
                    debug!("GPU source {} unavailable: {}", label, e.cause);
                }
                result
            })
            .collect();
        merge_gpu_sources(self.name(), results).map(Value::Array)
    }
}

/// Combine GPU lists from several sources in priority order.
///
/// A later source does not add GPUs of a vendor an earlier source already
/// reported. Fails only when every source failed.
pub(crate) fn merge_gpu_sources(
    probe: &str,
    results: Vec<Result<Vec<Value>, ProbeError>>,
) -> Result<Vec<Value>, ProbeError> {
    if results.is_empty() {
        return Err(ProbeError::new(probe, "no GPU source on this platform"));
    }

    let mut gpus: Vec<Value> = Vec::new();
    let mut failures = Vec::new();
    let mut any_ok = false;
    for result in results {
        match result {
            Ok(list) => {
                any_ok = true;
                let seen: HashSet<String> = gpus
                    .iter()
                    .filter_map(|g| g.get("vendor").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect();
                gpus.extend(list.into_iter().filter(|g| {
                    g.get("vendor")
                        .and_then(Value::as_str)
                        .map_or(true, |v| !seen.contains(v))
                }));
            }
            Err(e) => failures.push(e.cause),
        }
    }

    if any_ok {
        Ok(gpus)
    } else {
        Err(ProbeError::new(probe, failures.join("; ")))
    }
}

/// Free space on the configured filesystem
#[derive(Debug, Clone)]
pub struct SystemDiskProbe {
    path: PathBuf,
}

impl SystemDiskProbe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HardwareProbe for SystemDiskProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Disk
    }

    #[cfg(unix)]
    fn probe(&self) -> Result<Value, ProbeError> {
        let stat = nix::sys::statvfs::statvfs(self.path.as_path()).map_err(|e| {
            ProbeError::new(
                self.name(),
                format!("statvfs {}: {}", self.path.display(), e),
            )
        })?;
        let free_bytes = stat.blocks_available() as f64 * stat.fragment_size() as f64;
        Ok(json!({ "free_gb": free_bytes / BYTES_PER_GB }))
    }

    #[cfg(windows)]
    fn probe(&self) -> Result<Value, ProbeError> {
        super::windows::disk(&self.path)
    }

    #[cfg(not(any(unix, windows)))]
    fn probe(&self) -> Result<Value, ProbeError> {
        Err(ProbeError::new(
            self.name(),
            format!("unsupported platform {}", std::env::consts::OS),
        ))
    }
}

/// OS family of the compile target
#[derive(Debug, Clone, Copy)]
pub struct SystemOsProbe;

impl HardwareProbe for SystemOsProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Os
    }

    fn probe(&self) -> Result<Value, ProbeError> {
        OsKind::current()
            .map(|os| json!(os.as_str()))
            .ok_or_else(|| {
                ProbeError::new(
                    self.name(),
                    format!("unsupported operating system {}", std::env::consts::OS),
                )
            })
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
fn unsupported(probe: &str, _timeout: Duration) -> ProbeError {
    ProbeError::new(
        probe,
        format!("unsupported platform {}", std::env::consts::OS),
    )
}
