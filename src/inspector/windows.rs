// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Windows probes via WMI.

use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use wmi::{COMLibrary, WMIConnection};

use super::system::{cpu_section, gpu_entry, memory_section, BYTES_PER_GB, KB_PER_GB};
use crate::error::ProbeError;
use crate::profile::GpuVendor;

/// Create WMI connection with robust COM initialization
/// Handles cases where COM is already initialized by the host application
fn connect(probe: &str) -> Result<WMIConnection, ProbeError> {
    if let Ok(com) = COMLibrary::new() {
        if let Ok(conn) = WMIConnection::with_namespace_path("root\\CIMV2", com) {
            return Ok(conn);
        }
    }

    if let Ok(com) = COMLibrary::without_security() {
        if let Ok(conn) = WMIConnection::with_namespace_path("root\\CIMV2", com) {
            return Ok(conn);
        }
    }

    let com = unsafe { COMLibrary::assume_initialized() };
    WMIConnection::with_namespace_path("root\\CIMV2", com)
        .map_err(|e| ProbeError::new(probe, format!("WMI connection failed: {}", e)))
}

fn query<T: for<'de> Deserialize<'de>>(probe: &str, wql: &str) -> Result<Vec<T>, ProbeError> {
    connect(probe)?
        .raw_query(wql)
        .map_err(|e| ProbeError::new(probe, format!("WMI query failed: {}", e)))
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct Win32Processor {
    number_of_cores: u32,
    number_of_logical_processors: u32,
    max_clock_speed: u32,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct Win32OperatingSystem {
    total_visible_memory_size: u64,
    free_physical_memory: u64,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct Win32VideoController {
    name: Option<String>,
    #[serde(rename = "AdapterRAM")]
    adapter_ram: Option<u32>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct Win32LogicalDisk {
    free_space: Option<u64>,
}

pub(crate) fn cpu(_timeout: Duration) -> Result<Value, ProbeError> {
    let sockets: Vec<Win32Processor> = query(
        "cpu",
        "SELECT NumberOfCores, NumberOfLogicalProcessors, MaxClockSpeed FROM Win32_Processor",
    )?;
    let first = sockets
        .first()
        .ok_or_else(|| ProbeError::new("cpu", "Win32_Processor returned no rows"))?;
    let physical = sockets.iter().map(|s| s.number_of_cores).sum();
    let logical = sockets.iter().map(|s| s.number_of_logical_processors).sum();
    Ok(cpu_section(
        logical,
        physical,
        first.max_clock_speed as f64 / 1000.0,
    ))
}

pub(crate) fn memory(_timeout: Duration) -> Result<Value, ProbeError> {
    let rows: Vec<Win32OperatingSystem> = query(
        "memory",
        "SELECT TotalVisibleMemorySize, FreePhysicalMemory FROM Win32_OperatingSystem",
    )?;
    let os = rows
        .first()
        .ok_or_else(|| ProbeError::new("memory", "Win32_OperatingSystem returned no rows"))?;
    Ok(memory_section(
        os.total_visible_memory_size as f64 / KB_PER_GB,
        os.free_physical_memory as f64 / KB_PER_GB,
    ))
}

/// Video controllers. `AdapterRAM` is a 32-bit field and saturates at 4 GB,
/// so NVIDIA cards are better served by the NVML source ahead of this one.
pub(crate) fn gpus(_timeout: Duration) -> Result<Vec<Value>, ProbeError> {
    let rows: Vec<Win32VideoController> =
        query("gpu", "SELECT Name, AdapterRAM FROM Win32_VideoController")?;
    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let name = row.name?;
            let vram = row.adapter_ram.unwrap_or(0) as f64 / BYTES_PER_GB;
            Some(gpu_entry(GpuVendor::from_model_name(&name), &name, vram, None))
        })
        .collect())
}

pub(crate) fn disk(path: &Path) -> Result<Value, ProbeError> {
    let text = path.to_string_lossy();
    let drive: String = text.chars().take(2).collect();
    if drive.len() != 2 || !drive.ends_with(':') {
        return Err(ProbeError::new(
            "disk",
            format!("{} is not on a drive letter", path.display()),
        ));
    }
    let rows: Vec<Win32LogicalDisk> = query(
        "disk",
        &format!(
            "SELECT FreeSpace FROM Win32_LogicalDisk WHERE DeviceID = '{}'",
            drive
        ),
    )?;
    let free = rows
        .first()
        .and_then(|d| d.free_space)
        .ok_or_else(|| ProbeError::new("disk", format!("no free space reported for {}", drive)))?;
    Ok(json!({ "free_gb": free as f64 / BYTES_PER_GB }))
}
