// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Raw mapping → [`HardwareProfile`] validation.
//!
//! The validator walks the whole mapping and records every violation before
//! failing. Numbers may be given as JSON numbers or as strings; an integer
//! field accepts a float only when its fractional part is zero, and a string
//! must parse to the declared type exactly (`"8.0"` is not an integer).

use serde_json::{Map, Value};
use std::str::FromStr;

use super::{CpuArchitecture, CpuInfo, DiskInfo, GpuInfo, GpuVendor, HardwareProfile, MemoryInfo, OsKind, UnknownVariant};
use crate::error::{FieldViolation, ValidationError};

/// Validate an untyped hardware mapping into a [`HardwareProfile`].
///
/// Pure function. On failure the returned [`ValidationError`] lists every
/// violated field, split into schema errors (missing, mistyped) and range
/// errors (present but out of range).
pub fn validate_hardware_data(raw: &Value) -> Result<HardwareProfile, ValidationError> {
    let root = match raw.as_object() {
        Some(obj) => obj,
        None => {
            return Err(ValidationError::new(vec![FieldViolation::schema(
                "$",
                format!("expected an object, got {}", json_type(raw)),
            )]))
        }
    };

    let mut v = Validator::default();

    let cpu = v.object(root, "", "cpu").and_then(|obj| v.cpu(obj));
    let memory = v.object(root, "", "memory").and_then(|obj| v.memory(obj));
    let gpus = v.gpus(root);
    let disk = v.object(root, "", "disk").and_then(|obj| v.disk(obj));
    let os = v.choice::<OsKind>(root, "", "os");

    match (cpu, memory, gpus, disk, os) {
        (Some(cpu), Some(memory), Some(gpus), Some(disk), Some(os)) if v.violations.is_empty() => {
            Ok(HardwareProfile {
                cpu,
                memory,
                gpus,
                disk,
                os,
            })
        }
        _ => Err(ValidationError::new(v.violations)),
    }
}

/// Lower bound a numeric field must respect
#[derive(Debug, Clone, Copy)]
enum Bound {
    Positive,
    NonNegative,
}

#[derive(Default)]
struct Validator {
    violations: Vec<FieldViolation>,
}

impl Validator {
    fn record<T>(&mut self, result: Result<T, FieldViolation>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(violation) => {
                self.violations.push(violation);
                None
            }
        }
    }

    /// Look up a required key; missing and `null` both count as absent.
    fn required<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        parent: &str,
        key: &str,
    ) -> Option<(String, &'a Value)> {
        let path = join(parent, key);
        match obj.get(key) {
            Some(Value::Null) | None => {
                self.violations
                    .push(FieldViolation::schema(path, "missing required field"));
                None
            }
            Some(value) => Some((path, value)),
        }
    }

    fn object<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        parent: &str,
        key: &str,
    ) -> Option<&'a Map<String, Value>> {
        let (path, value) = self.required(obj, parent, key)?;
        match value.as_object() {
            Some(inner) => Some(inner),
            None => {
                self.violations.push(FieldViolation::schema(
                    path,
                    format!("expected an object, got {}", json_type(value)),
                ));
                None
            }
        }
    }

    fn count(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) -> Option<u32> {
        let (path, value) = self.required(obj, parent, key)?;
        self.record(read_count(&path, value))
    }

    fn quantity(
        &mut self,
        obj: &Map<String, Value>,
        parent: &str,
        key: &str,
        bound: Bound,
    ) -> Option<f64> {
        let (path, value) = self.required(obj, parent, key)?;
        self.record(read_quantity(&path, value, bound))
    }

    fn choice<T>(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) -> Option<T>
    where
        T: FromStr<Err = UnknownVariant>,
    {
        let (path, value) = self.required(obj, parent, key)?;
        let parsed = match value.as_str() {
            Some(s) => s
                .parse::<T>()
                .map_err(|e| FieldViolation::schema(path.as_str(), e.to_string())),
            None => Err(FieldViolation::schema(
                path.as_str(),
                format!("expected a string, got {}", json_type(value)),
            )),
        };
        self.record(parsed)
    }

    fn text(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) -> Option<String> {
        let (path, value) = self.required(obj, parent, key)?;
        match value.as_str() {
            Some(s) => Some(s.to_string()),
            None => {
                self.violations.push(FieldViolation::schema(
                    path,
                    format!("expected a string, got {}", json_type(value)),
                ));
                None
            }
        }
    }

    /// Optional string: absent or `null` → `None`.
    fn optional_text(
        &mut self,
        obj: &Map<String, Value>,
        parent: &str,
        key: &str,
    ) -> Option<Option<String>> {
        match obj.get(key) {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(s)) => Some(Some(s.clone())),
            Some(other) => {
                self.violations.push(FieldViolation::schema(
                    join(parent, key),
                    format!("expected a string or null, got {}", json_type(other)),
                ));
                None
            }
        }
    }

    fn cpu(&mut self, obj: &Map<String, Value>) -> Option<CpuInfo> {
        let logical = self.count(obj, "cpu", "logical_core_count");
        let physical = self.count(obj, "cpu", "physical_core_count");
        let clock = self.quantity(obj, "cpu", "base_clock_ghz", Bound::Positive);
        let architecture = self.choice::<CpuArchitecture>(obj, "cpu", "architecture");

        let (logical, physical) = (logical?, physical?);
        if physical > logical {
            self.violations.push(FieldViolation::range(
                "cpu.physical_core_count",
                format!(
                    "physical core count {} exceeds logical core count {}",
                    physical, logical
                ),
            ));
            return None;
        }

        Some(CpuInfo {
            logical_core_count: logical,
            physical_core_count: physical,
            base_clock_ghz: clock?,
            architecture: architecture?,
        })
    }

    fn memory(&mut self, obj: &Map<String, Value>) -> Option<MemoryInfo> {
        let total = self.quantity(obj, "memory", "total_gb", Bound::Positive);
        let available = self.quantity(obj, "memory", "available_gb", Bound::NonNegative);

        let (total_gb, available_gb) = (total?, available?);
        if available_gb > total_gb {
            self.violations.push(FieldViolation::range(
                "memory.available_gb",
                format!(
                    "available memory {} GB exceeds total memory {} GB",
                    available_gb, total_gb
                ),
            ));
            return None;
        }

        Some(MemoryInfo {
            total_gb,
            available_gb,
        })
    }

    fn gpus(&mut self, root: &Map<String, Value>) -> Option<Vec<GpuInfo>> {
        let (path, value) = self.required(root, "", "gpus")?;
        let items = match value.as_array() {
            Some(items) => items,
            None => {
                self.violations.push(FieldViolation::schema(
                    path,
                    format!("expected an array, got {}", json_type(value)),
                ));
                return None;
            }
        };

        // Every element is visited so all violations are reported.
        let mut gpus = Vec::with_capacity(items.len());
        let mut complete = true;
        for (index, item) in items.iter().enumerate() {
            let item_path = format!("gpus[{}]", index);
            match item.as_object() {
                Some(obj) => match self.gpu(obj, &item_path) {
                    Some(gpu) => gpus.push(gpu),
                    None => complete = false,
                },
                None => {
                    self.violations.push(FieldViolation::schema(
                        item_path,
                        format!("expected an object, got {}", json_type(item)),
                    ));
                    complete = false;
                }
            }
        }

        complete.then_some(gpus)
    }

    fn gpu(&mut self, obj: &Map<String, Value>, path: &str) -> Option<GpuInfo> {
        let vendor = self.choice::<GpuVendor>(obj, path, "vendor");
        let model_name = self.text(obj, path, "model_name");
        let vram_gb = self.quantity(obj, path, "vram_gb", Bound::NonNegative);
        let compute_capability = self.optional_text(obj, path, "compute_capability");

        Some(GpuInfo {
            vendor: vendor?,
            model_name: model_name?,
            vram_gb: vram_gb?,
            compute_capability: compute_capability?,
        })
    }

    fn disk(&mut self, obj: &Map<String, Value>) -> Option<DiskInfo> {
        let free_gb = self.quantity(obj, "disk", "free_gb", Bound::NonNegative)?;
        Some(DiskInfo { free_gb })
    }
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Positive integer that fits in `u32`.
fn read_count(path: &str, value: &Value) -> Result<u32, FieldViolation> {
    let n: i128 = match value {
        Value::Number(num) => {
            if let Some(i) = num.as_i64() {
                i as i128
            } else if let Some(u) = num.as_u64() {
                u as i128
            } else {
                let f = num.as_f64().unwrap_or(f64::NAN);
                if !f.is_finite() {
                    return Err(FieldViolation::range(path, "must be finite"));
                }
                if f.fract() != 0.0 {
                    return Err(FieldViolation::schema(
                        path,
                        format!("expected an integer, got {}", f),
                    ));
                }
                if f.abs() > u32::MAX as f64 {
                    return Err(FieldViolation::range(
                        path,
                        format!("{} is out of range", f),
                    ));
                }
                f as i128
            }
        }
        Value::String(s) => s.trim().parse::<i128>().map_err(|_| {
            FieldViolation::schema(path, format!("'{}' is not an integer", s))
        })?,
        other => {
            return Err(FieldViolation::schema(
                path,
                format!("expected an integer, got {}", json_type(other)),
            ))
        }
    };

    if n <= 0 {
        return Err(FieldViolation::range(
            path,
            format!("must be positive, got {}", n),
        ));
    }
    u32::try_from(n).map_err(|_| FieldViolation::range(path, format!("{} is out of range", n)))
}

/// Finite float respecting `bound`.
fn read_quantity(path: &str, value: &Value, bound: Bound) -> Result<f64, FieldViolation> {
    let f = match value {
        Value::Number(num) => num.as_f64().ok_or_else(|| {
            FieldViolation::schema(path, format!("{} is not representable as a float", num))
        })?,
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            FieldViolation::schema(path, format!("'{}' is not a number", s))
        })?,
        other => {
            return Err(FieldViolation::schema(
                path,
                format!("expected a number, got {}", json_type(other)),
            ))
        }
    };

    if !f.is_finite() {
        return Err(FieldViolation::range(path, format!("must be finite, got {}", f)));
    }
    match bound {
        Bound::Positive if f <= 0.0 => Err(FieldViolation::range(
            path,
            format!("must be positive, got {}", f),
        )),
        Bound::NonNegative if f < 0.0 => Err(FieldViolation::range(
            path,
            format!("must be non-negative, got {}", f),
        )),
        _ => Ok(f),
    }
}
