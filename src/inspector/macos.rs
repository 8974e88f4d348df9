// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! macOS probes: `sysctl`, `vm_stat` and `system_profiler`.

#![cfg_attr(not(target_os = "macos"), allow(dead_code))]

use serde_json::Value;
use std::time::Duration;

use super::command;
use super::system::{cpu_section, gpu_entry, memory_section, BYTES_PER_GB, MB_PER_GB};
use crate::error::ProbeError;
use crate::profile::GpuVendor;

const CPU_PROBE: &str = "cpu";
const MEMORY_PROBE: &str = "memory";
const GPU_PROBE: &str = "gpu";

/// Nominal performance-core clock of Apple silicon generations, which do not
/// expose `hw.cpufrequency`.
pub(crate) fn apple_silicon_clock_ghz(brand: &str) -> Option<f64> {
    let generation = brand
        .split_whitespace()
        .find_map(|token| token.strip_prefix('M')?.parse::<u32>().ok())?;
    match generation {
        1 => Some(3.2),
        2 => Some(3.49),
        3 => Some(4.05),
        4 => Some(4.4),
        _ => None,
    }
}

/// Bytes of free + inactive + speculative pages from `vm_stat`
pub(crate) fn parse_vm_stat(text: &str) -> Option<u64> {
    let mut lines = text.lines();
    let header = lines.next()?;
    let page_size: u64 = header
        .split("page size of")
        .nth(1)?
        .split_whitespace()
        .next()?
        .parse()
        .ok()?;

    let mut pages = 0u64;
    let mut found = false;
    for line in lines {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if matches!(
            key.trim(),
            "Pages free" | "Pages inactive" | "Pages speculative"
        ) {
            pages += value.trim().trim_end_matches('.').parse::<u64>().ok()?;
            found = true;
        }
    }
    found.then_some(pages * page_size)
}

/// `"8 GB"`, `"1536 MB"` → GB
pub(crate) fn parse_size_gb(text: &str) -> Option<f64> {
    let mut parts = text.split_whitespace();
    let amount: f64 = parts.next()?.parse().ok()?;
    match parts.next()?.to_ascii_uppercase().as_str() {
        "GB" => Some(amount),
        "MB" => Some(amount / MB_PER_GB),
        "TB" => Some(amount * 1024.0),
        _ => None,
    }
}

/// GPUs from `system_profiler SPDisplaysDataType -json`.
///
/// Apple-silicon GPUs report no VRAM of their own; they share
/// `unified_memory_gb` with the CPU.
pub(crate) fn parse_displays(report: &Value, unified_memory_gb: f64) -> Vec<Value> {
    let Some(items) = report.get("SPDisplaysDataType").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let model = item.get("sppci_model").and_then(Value::as_str)?;
            let vendor_text = item
                .get("spdisplays_vendor")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_lowercase();
            let vendor = if vendor_text.contains("apple") {
                GpuVendor::Apple
            } else if vendor_text.contains("nvidia") || vendor_text.contains("10de") {
                GpuVendor::Nvidia
            } else if vendor_text.contains("amd")
                || vendor_text.contains("ati")
                || vendor_text.contains("1002")
            {
                GpuVendor::Amd
            } else if vendor_text.contains("intel") || vendor_text.contains("8086") {
                GpuVendor::Intel
            } else {
                GpuVendor::from_model_name(model)
            };

            let vram_gb = ["spdisplays_vram", "spdisplays_vram_shared"]
                .iter()
                .find_map(|key| item.get(*key).and_then(Value::as_str).and_then(parse_size_gb))
                .unwrap_or(if vendor == GpuVendor::Apple {
                    unified_memory_gb
                } else {
                    0.0
                });

            Some(gpu_entry(vendor, model, vram_gb, None))
        })
        .collect()
}

fn sysctl(probe: &str, names: &[&str], timeout: Duration) -> Result<Vec<String>, ProbeError> {
    let mut args = vec!["-n"];
    args.extend_from_slice(names);
    let output = command::run(probe, "sysctl", &args, timeout)?;
    let lines: Vec<String> = output.lines().map(|l| l.trim().to_string()).collect();
    if lines.len() < names.len() {
        return Err(ProbeError::parse(probe, "sysctl output"));
    }
    Ok(lines)
}

fn memsize_bytes(probe: &str, timeout: Duration) -> Result<u64, ProbeError> {
    sysctl(probe, &["hw.memsize"], timeout)?[0]
        .parse()
        .map_err(|_| ProbeError::parse(probe, "hw.memsize"))
}

pub(crate) fn cpu(timeout: Duration) -> Result<Value, ProbeError> {
    let values = sysctl(
        CPU_PROBE,
        &["hw.logicalcpu", "hw.physicalcpu", "machdep.cpu.brand_string"],
        timeout,
    )?;
    let logical: u32 = values[0]
        .parse()
        .map_err(|_| ProbeError::parse(CPU_PROBE, "hw.logicalcpu"))?;
    let physical: u32 = values[1]
        .parse()
        .map_err(|_| ProbeError::parse(CPU_PROBE, "hw.physicalcpu"))?;
    let brand = &values[2];

    // Intel Macs report hw.cpufrequency in Hz; Apple silicon does not.
    let clock = sysctl(CPU_PROBE, &["hw.cpufrequency"], timeout)
        .ok()
        .and_then(|v| v[0].parse::<f64>().ok())
        .filter(|hz| *hz > 0.0)
        .map(|hz| hz / 1e9)
        .or_else(|| apple_silicon_clock_ghz(brand))
        .ok_or_else(|| {
            ProbeError::new(CPU_PROBE, format!("unknown base clock for '{}'", brand))
        })?;

    Ok(cpu_section(logical, physical, clock))
}

pub(crate) fn memory(timeout: Duration) -> Result<Value, ProbeError> {
    let total = memsize_bytes(MEMORY_PROBE, timeout)?;
    let vm_stat = command::run(MEMORY_PROBE, "vm_stat", &[], timeout)?;
    let available =
        parse_vm_stat(&vm_stat).ok_or_else(|| ProbeError::parse(MEMORY_PROBE, "vm_stat output"))?;
    Ok(memory_section(
        total as f64 / BYTES_PER_GB,
        available as f64 / BYTES_PER_GB,
    ))
}

pub(crate) fn gpus(timeout: Duration) -> Result<Vec<Value>, ProbeError> {
    let unified_gb = memsize_bytes(GPU_PROBE, timeout)? as f64 / BYTES_PER_GB;
    let output = command::run(
        GPU_PROBE,
        "system_profiler",
        &["SPDisplaysDataType", "-json"],
        timeout,
    )?;
    let report: Value = serde_json::from_str(&output)
        .map_err(|_| ProbeError::parse(GPU_PROBE, "system_profiler output"))?;
    Ok(parse_displays(&report, unified_gb))
}
