// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Linux probes: procfs and sysfs.
//!
//! Parsers are plain functions over file contents so they can be exercised
//! with fixtures on any host.

#![cfg_attr(not(target_os = "linux"), allow(dead_code))]

use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use super::command;
use super::system::{cpu_section, gpu_entry, memory_section, BYTES_PER_GB, KB_PER_GB};
use crate::error::ProbeError;
use crate::profile::GpuVendor;

const CPU_PROBE: &str = "cpu";
const MEMORY_PROBE: &str = "memory";
const GPU_PROBE: &str = "gpu";

const CPU_DIR: &str = "/sys/devices/system/cpu";
const DRM_DIR: &str = "/sys/class/drm";
const AMD_PCI_VENDOR: &str = "0x1002";

/// Core counts and advertised clock from `/proc/cpuinfo`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CpuInfoSummary {
    pub logical: u32,
    pub physical: u32,
    pub mhz: Option<f64>,
}

/// Parse `/proc/cpuinfo`.
///
/// Physical cores are distinct `(physical id, core id)` pairs; kernels that
/// omit topology (many ARM boards, some VMs) fall back to the logical count.
pub(crate) fn parse_cpuinfo(text: &str) -> Option<CpuInfoSummary> {
    let mut logical = 0u32;
    let mut cores = HashSet::new();
    let mut mhz = None;
    let mut package: Option<String> = None;

    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        match key {
            "processor" => {
                logical += 1;
                package = None;
            }
            "physical id" => package = Some(value.to_string()),
            "core id" => {
                cores.insert((package.clone().unwrap_or_default(), value.to_string()));
            }
            "cpu MHz" if mhz.is_none() => mhz = value.parse::<f64>().ok(),
            _ => {}
        }
    }

    if logical == 0 {
        return None;
    }
    let physical = if cores.is_empty() {
        logical
    } else {
        (cores.len() as u32).min(logical)
    };
    Some(CpuInfoSummary {
        logical,
        physical,
        mhz,
    })
}

/// Parse a cpufreq sysfs value (kHz) into GHz
pub(crate) fn parse_khz(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|khz| *khz > 0.0)
        .map(|khz| khz / 1_000_000.0)
}

/// `(total_kb, available_kb)` from `/proc/meminfo`.
///
/// Kernels older than 3.14 lack `MemAvailable`; free + buffers + cached
/// approximates it.
pub(crate) fn parse_meminfo(text: &str) -> Option<(u64, u64)> {
    let mut total = None;
    let mut available = None;
    let (mut free, mut buffers, mut cached) = (0u64, 0u64, 0u64);

    for line in text.lines() {
        let mut parts = line.split_whitespace();
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Ok(kb) = value.parse::<u64>() else {
            continue;
        };
        match key {
            "MemTotal:" => total = Some(kb),
            "MemAvailable:" => available = Some(kb),
            "MemFree:" => free = kb,
            "Buffers:" => buffers = kb,
            "Cached:" => cached = kb,
            _ => {}
        }
    }

    let total = total?;
    let available = available.unwrap_or(free + buffers + cached);
    Some((total, available.min(total)))
}

fn read(probe: &str, path: &str) -> Result<String, ProbeError> {
    fs::read_to_string(path).map_err(|e| ProbeError::io(probe, &format!("reading {}", path), e))
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Highest advertised clock in GHz from cpufreq under `cpu_dir`.
///
/// `cpu0/cpufreq/base_frequency` wins when present. Otherwise the maximum
/// `cpuinfo_max_freq` across every `cpuN`, then `scaling_max_freq`. Hybrid
/// and big.LITTLE parts often expose cpufreq on some cores only.
pub(crate) fn sysfs_clock_ghz(cpu_dir: &Path) -> Option<f64> {
    if let Some(base) = read_trimmed(&cpu_dir.join("cpu0/cpufreq/base_frequency"))
        .and_then(|s| parse_khz(&s))
    {
        return Some(base);
    }

    let cpufreq_dirs: Vec<_> = fs::read_dir(cpu_dir)
        .ok()?
        .flatten()
        .filter(|entry| is_cpu_node(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.path().join("cpufreq"))
        .collect();

    ["cpuinfo_max_freq", "scaling_max_freq"].iter().find_map(|file| {
        cpufreq_dirs
            .iter()
            .filter_map(|dir| read_trimmed(&dir.join(file)).and_then(|s| parse_khz(&s)))
            .reduce(f64::max)
    })
}

/// `CPU max MHz` (else `CPU MHz`) from `lscpu` output, in GHz
pub(crate) fn parse_lscpu_ghz(text: &str) -> Option<f64> {
    ["CPU max MHz", "CPU MHz"]
        .iter()
        .find_map(|key| {
            text.lines().find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.trim() == *key {
                    value.trim().parse::<f64>().ok()
                } else {
                    None
                }
            })
        })
        .filter(|mhz| *mhz > 0.0)
        .map(|mhz| mhz / 1000.0)
}

/// cpufreq, then `/proc/cpuinfo`, then `lscpu`. ARM kernels print no
/// `cpu MHz` and many ARM VMs have no cpufreq.
fn base_clock_ghz(
    cpu_dir: &Path,
    summary: &CpuInfoSummary,
    lscpu: impl FnOnce() -> Option<String>,
) -> Option<f64> {
    sysfs_clock_ghz(cpu_dir)
        .or_else(|| summary.mhz.filter(|m| *m > 0.0).map(|m| m / 1000.0))
        .or_else(|| lscpu().and_then(|out| parse_lscpu_ghz(&out)))
}

pub(crate) fn cpu(timeout: Duration) -> Result<Value, ProbeError> {
    let text = read(CPU_PROBE, "/proc/cpuinfo")?;
    let summary =
        parse_cpuinfo(&text).ok_or_else(|| ProbeError::parse(CPU_PROBE, "/proc/cpuinfo"))?;
    let lscpu = || match command::run(CPU_PROBE, "lscpu", &[], timeout) {
        Ok(out) => Some(out),
        Err(e) => {
            log::debug!("lscpu unavailable: {}", e.cause);
            None
        }
    };
    let clock = base_clock_ghz(Path::new(CPU_DIR), &summary, lscpu).ok_or_else(|| {
        ProbeError::new(
            CPU_PROBE,
            "CPU clock not reported by cpufreq, /proc/cpuinfo or lscpu",
        )
    })?;
    Ok(cpu_section(summary.logical, summary.physical, clock))
}

pub(crate) fn memory(_timeout: Duration) -> Result<Value, ProbeError> {
    let text = read(MEMORY_PROBE, "/proc/meminfo")?;
    let (total_kb, available_kb) =
        parse_meminfo(&text).ok_or_else(|| ProbeError::parse(MEMORY_PROBE, "/proc/meminfo"))?;
    Ok(memory_section(
        total_kb as f64 / KB_PER_GB,
        available_kb as f64 / KB_PER_GB,
    ))
}

/// AMD GPUs from amdgpu sysfs (`mem_info_vram_total`)
pub(crate) fn amd_gpus(_timeout: Duration) -> Result<Vec<Value>, ProbeError> {
    let entries = fs::read_dir(DRM_DIR)
        .map_err(|e| ProbeError::io(GPU_PROBE, &format!("reading {}", DRM_DIR), e))?;

    let mut cards: Vec<_> = entries
        .flatten()
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| is_card_node(name))
        .collect();
    cards.sort();

    let mut gpus = Vec::new();
    for card in cards {
        let device = Path::new(DRM_DIR).join(&card).join("device");
        if read_trimmed(&device.join("vendor")).as_deref() != Some(AMD_PCI_VENDOR) {
            continue;
        }
        let Some(vram_bytes) =
            read_trimmed(&device.join("mem_info_vram_total")).and_then(|s| s.parse::<u64>().ok())
        else {
            continue;
        };
        let name = read_trimmed(&device.join("product_name"))
            .unwrap_or_else(|| format!("AMD GPU ({})", card));
        gpus.push(gpu_entry(
            GpuVendor::Amd,
            &name,
            vram_bytes as f64 / BYTES_PER_GB,
            None,
        ));
    }
    Ok(gpus)
}

/// `card0`, `card1`, ... but not connector nodes like `card0-HDMI-A-1`
fn is_card_node(name: &str) -> bool {
    has_numeric_suffix(name, "card")
}

/// `cpu0`, `cpu1`, ... but not `cpufreq` or `cpuidle`
fn is_cpu_node(name: &str) -> bool {
    has_numeric_suffix(name, "cpu")
}

fn has_numeric_suffix(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .map_or(false, |rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CPUINFO_X86: &str = "\
processor\t: 0
vendor_id\t: GenuineIntel
model name\t: Intel(R) Core(TM) i7-8700 CPU @ 3.20GHz
cpu MHz\t\t: 3192.000
physical id\t: 0
core id\t\t: 0

processor\t: 1
cpu MHz\t\t: 4100.000
physical id\t: 0
core id\t\t: 1

processor\t: 2
physical id\t: 0
core id\t\t: 0

processor\t: 3
physical id\t: 0
core id\t\t: 1
";

    const CPUINFO_ARM: &str = "\
processor\t: 0
BogoMIPS\t: 108.00
Features\t: fp asimd evtstrm crc32 cpuid

processor\t: 1
BogoMIPS\t: 108.00
";

    #[test]
    fn test_parse_cpuinfo_smt() {
        let summary = parse_cpuinfo(CPUINFO_X86).unwrap();
        assert_eq!(summary.logical, 4);
        assert_eq!(summary.physical, 2);
        assert_eq!(summary.mhz, Some(3192.0));
    }

    #[test]
    fn test_parse_cpuinfo_without_topology() {
        let summary = parse_cpuinfo(CPUINFO_ARM).unwrap();
        assert_eq!(summary.logical, 2);
        assert_eq!(summary.physical, 2);
        assert_eq!(summary.mhz, None);
    }

    #[test]
    fn test_parse_cpuinfo_multi_socket() {
        let text = "processor : 0\nphysical id : 0\ncore id : 0\n\n\
                    processor : 1\nphysical id : 1\ncore id : 0\n";
        let summary = parse_cpuinfo(text).unwrap();
        assert_eq!(summary.physical, 2);
    }

    #[test]
    fn test_parse_cpuinfo_empty() {
        assert_eq!(parse_cpuinfo(""), None);
    }

    #[test]
    fn test_parse_khz() {
        assert_eq!(parse_khz("3600000\n"), Some(3.6));
        assert_eq!(parse_khz("0"), None);
        assert_eq!(parse_khz("n/a"), None);
    }

    const LSCPU_ARM: &str = "\
Architecture:                    aarch64
CPU op-mode(s):                  32-bit, 64-bit
Byte Order:                      Little Endian
CPU(s):                          4
Vendor ID:                       ARM
Model name:                      Neoverse-N1
BogoMIPS:                        243.75
CPU max MHz:                     2500.0000
CPU min MHz:                     1000.0000
";

    /// Fresh directory standing in for `/sys/devices/system/cpu`
    fn cpu_dir_fixture(name: &str, files: &[(&str, &str)]) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("advisor-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("cpufreq")).unwrap();
        fs::create_dir_all(dir.join("cpuidle")).unwrap();
        for (path, contents) in files {
            let path = dir.join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }
        dir
    }

    #[test]
    fn test_sysfs_clock_prefers_base_frequency() {
        let dir = cpu_dir_fixture(
            "cpufreq-base",
            &[
                ("cpu0/cpufreq/base_frequency", "3200000\n"),
                ("cpu0/cpufreq/cpuinfo_max_freq", "5000000\n"),
            ],
        );
        let clock = sysfs_clock_ghz(&dir);
        let _ = fs::remove_dir_all(&dir);
        assert_eq!(clock, Some(3.2));
    }

    #[test]
    fn test_sysfs_clock_scans_every_cpu() {
        let dir = cpu_dir_fixture(
            "cpufreq-scan",
            &[
                ("cpu0/topology/core_id", "0\n"),
                ("cpu1/cpufreq/cpuinfo_max_freq", "1800000\n"),
                ("cpu2/cpufreq/cpuinfo_max_freq", "2400000\n"),
                ("cpu3/cpufreq/scaling_max_freq", "3000000\n"),
            ],
        );
        let clock = sysfs_clock_ghz(&dir);
        let _ = fs::remove_dir_all(&dir);
        assert_eq!(clock, Some(2.4));
    }

    #[test]
    fn test_sysfs_clock_scaling_max_only() {
        let dir = cpu_dir_fixture(
            "cpufreq-scaling",
            &[("cpu0/cpufreq/scaling_max_freq", "2000000\n")],
        );
        let clock = sysfs_clock_ghz(&dir);
        let _ = fs::remove_dir_all(&dir);
        assert_eq!(clock, Some(2.0));
    }

    #[test]
    fn test_parse_lscpu() {
        assert_eq!(parse_lscpu_ghz(LSCPU_ARM), Some(2.5));
        let fallback = parse_lscpu_ghz("CPU MHz:  2899.998\n").unwrap();
        assert!((fallback - 2.899998).abs() < 1e-9);
        assert_eq!(parse_lscpu_ghz("BogoMIPS: 243.75\n"), None);
    }

    #[test]
    fn test_arm_vm_without_cpufreq_uses_lscpu() {
        let dir = cpu_dir_fixture("cpufreq-none", &[("cpu0/online", "1\n")]);
        let summary = parse_cpuinfo(CPUINFO_ARM).unwrap();
        let with_lscpu = base_clock_ghz(&dir, &summary, || Some(LSCPU_ARM.to_string()));
        let without = base_clock_ghz(&dir, &summary, || None);
        let _ = fs::remove_dir_all(&dir);
        assert_eq!(with_lscpu, Some(2.5));
        assert_eq!(without, None);
    }

    #[test]
    fn test_cpuinfo_mhz_before_lscpu() {
        let dir = cpu_dir_fixture("cpufreq-mhz", &[]);
        let summary = parse_cpuinfo(CPUINFO_X86).unwrap();
        let clock = base_clock_ghz(&dir, &summary, || panic!("lscpu must not run"));
        let _ = fs::remove_dir_all(&dir);
        assert_eq!(clock, Some(3.192));
    }

    #[test]
    fn test_parse_meminfo() {
        let text = "MemTotal:       32768000 kB\nMemFree:         1000000 kB\n\
                    MemAvailable:   16384000 kB\nBuffers:          200000 kB\n";
        assert_eq!(parse_meminfo(text), Some((32_768_000, 16_384_000)));
    }

    #[test]
    fn test_parse_meminfo_without_available() {
        let text = "MemTotal: 8000000 kB\nMemFree: 1000000 kB\nBuffers: 250000 kB\nCached: 750000 kB\n";
        assert_eq!(parse_meminfo(text), Some((8_000_000, 2_000_000)));
    }

    #[test]
    fn test_parse_meminfo_missing_total() {
        assert_eq!(parse_meminfo("MemFree: 10 kB\n"), None);
    }

    #[test]
    fn test_is_card_node() {
        assert!(is_card_node("card0"));
        assert!(is_card_node("card12"));
        assert!(!is_card_node("card0-HDMI-A-1"));
        assert!(!is_card_node("renderD128"));
        assert!(!is_card_node("card"));
        assert!(is_cpu_node("cpu7"));
        assert!(!is_cpu_node("cpufreq"));
        assert!(!is_cpu_node("cpuidle"));
    }
}
