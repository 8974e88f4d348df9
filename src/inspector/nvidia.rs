// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! NVIDIA GPUs via NVML (feature `nvidia`) with an `nvidia-smi` fallback.

#![cfg_attr(not(any(target_os = "linux", windows)), allow(dead_code))]

use serde_json::Value;
use std::time::Duration;

use super::command;
use super::system::{gpu_entry, MB_PER_GB};
use crate::error::ProbeError;
use crate::profile::GpuVendor;

const GPU_PROBE: &str = "gpu";

/// NVIDIA GPUs in device-index order
pub(crate) fn gpus(timeout: Duration) -> Result<Vec<Value>, ProbeError> {
    #[cfg(all(feature = "nvidia", any(target_os = "linux", windows)))]
    match nvml_gpus() {
        Ok(gpus) => return Ok(gpus),
        Err(e) => log::debug!("NVML unavailable, falling back to nvidia-smi: {}", e.cause),
    }
    smi_gpus(timeout)
}

#[cfg(all(feature = "nvidia", any(target_os = "linux", windows)))]
fn nvml_gpus() -> Result<Vec<Value>, ProbeError> {
    use nvml_wrapper::Nvml;

    let nvml_err = |what: &str, e: nvml_wrapper::error::NvmlError| {
        ProbeError::new(GPU_PROBE, format!("NVML {}: {}", what, e))
    };

    let nvml = Nvml::init().map_err(|e| nvml_err("init", e))?;
    let count = nvml.device_count().map_err(|e| nvml_err("device count", e))?;

    let mut gpus = Vec::with_capacity(count as usize);
    for index in 0..count {
        let device = nvml
            .device_by_index(index)
            .map_err(|e| nvml_err("device lookup", e))?;
        let name = device
            .name()
            .unwrap_or_else(|_| format!("NVIDIA GPU {}", index));
        let total_bytes = device
            .memory_info()
            .map_err(|e| nvml_err("memory info", e))?
            .total;
        let compute_capability = device
            .cuda_compute_capability()
            .ok()
            .map(|cc| format!("{}.{}", cc.major, cc.minor));
        gpus.push(gpu_entry(
            GpuVendor::Nvidia,
            &name,
            total_bytes as f64 / super::system::BYTES_PER_GB,
            compute_capability,
        ));
    }
    Ok(gpus)
}

fn smi_gpus(timeout: Duration) -> Result<Vec<Value>, ProbeError> {
    // compute_cap is only known to drivers from 510 on; retry without it.
    let output = command::run(
        GPU_PROBE,
        "nvidia-smi",
        &[
            "--query-gpu=name,memory.total,compute_cap",
            "--format=csv,noheader,nounits",
        ],
        timeout,
    )
    .or_else(|_| {
        command::run(
            GPU_PROBE,
            "nvidia-smi",
            &["--query-gpu=name,memory.total", "--format=csv,noheader,nounits"],
            timeout,
        )
    })?;
    parse_smi_csv(&output).ok_or_else(|| ProbeError::parse(GPU_PROBE, "nvidia-smi output"))
}

/// Parse `nvidia-smi --format=csv,noheader,nounits` rows of
/// `name, memory.total [MiB][, compute_cap]`.
pub(crate) fn parse_smi_csv(text: &str) -> Option<Vec<Value>> {
    let mut gpus = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let (name, mib) = match fields.as_slice() {
            [name, mib, ..] => (*name, mib.parse::<f64>().ok()?),
            _ => return None,
        };
        let compute_capability = fields
            .get(2)
            .filter(|cc| !cc.is_empty() && !cc.starts_with('['))
            .map(|cc| cc.to_string());
        gpus.push(gpu_entry(
            GpuVendor::Nvidia,
            name,
            mib / MB_PER_GB,
            compute_capability,
        ));
    }
    Some(gpus)
}
