// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Inference engine requirement catalog.
//!
//! Catalogs are plain data supplied by the caller, usually a TOML file:
//!
//! ```toml
//! [[engines]]
//! engine_name = "vLLM"
//! min_vram_gb = 16.0
//! min_ram_gb = 16.0
//! supported_architectures = ["x86_64", "arm64"]
//! supports_multi_gpu = true
//! quantization_levels = ["fp16", "fp8", "int8", "int4"]
//! ```

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use crate::error::CatalogError;
use crate::profile::CpuArchitecture;

/// Hardware requirements of one inference engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineRequirement {
    pub engine_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Minimum VRAM on a single GPU; 0 means the engine runs on CPU
    #[serde(default)]
    pub min_vram_gb: f64,
    pub min_ram_gb: f64,
    pub supported_architectures: BTreeSet<CpuArchitecture>,
    #[serde(default)]
    pub supports_multi_gpu: bool,
    /// Quantization labels such as "fp16", "int8", "int4"
    #[serde(default)]
    pub quantization_levels: Vec<String>,
}

impl EngineRequirement {
    /// CPU-capable entry for x86_64 and arm64 with no quantization levels
    pub fn new(engine_name: impl Into<String>, min_ram_gb: f64) -> Self {
        Self {
            engine_name: engine_name.into(),
            description: None,
            min_vram_gb: 0.0,
            min_ram_gb,
            supported_architectures: [CpuArchitecture::X86_64, CpuArchitecture::Arm64]
                .into_iter()
                .collect(),
            supports_multi_gpu: false,
            quantization_levels: Vec::new(),
        }
    }

    pub fn with_min_vram_gb(mut self, min_vram_gb: f64) -> Self {
        self.min_vram_gb = min_vram_gb;
        self
    }

    pub fn with_architectures(mut self, architectures: impl IntoIterator<Item = CpuArchitecture>) -> Self {
        self.supported_architectures = architectures.into_iter().collect();
        self
    }

    pub fn with_multi_gpu(mut self, supports_multi_gpu: bool) -> Self {
        self.supports_multi_gpu = supports_multi_gpu;
        self
    }

    pub fn with_quantization<I, S>(mut self, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quantization_levels = levels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Runs without a GPU
    pub fn is_cpu_capable(&self) -> bool {
        self.min_vram_gb == 0.0
    }

    /// Check the entry's own invariants
    pub fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |reason: String| CatalogError::InvalidEntry {
            engine: self.engine_name.clone(),
            reason,
        };

        if self.engine_name.trim().is_empty() {
            return Err(invalid("engine_name is empty".into()));
        }
        if !self.min_ram_gb.is_finite() || self.min_ram_gb <= 0.0 {
            return Err(invalid(format!(
                "min_ram_gb must be positive, got {}",
                self.min_ram_gb
            )));
        }
        if !self.min_vram_gb.is_finite() || self.min_vram_gb < 0.0 {
            return Err(invalid(format!(
                "min_vram_gb must be non-negative, got {}",
                self.min_vram_gb
            )));
        }
        if self.supported_architectures.is_empty() {
            return Err(invalid("supported_architectures is empty".into()));
        }
        let mut seen = HashSet::new();
        for level in &self.quantization_levels {
            if !seen.insert(level.to_ascii_lowercase()) {
                return Err(invalid(format!("quantization level '{}' listed twice", level)));
            }
        }
        Ok(())
    }
}

/// Ordered, validated list of engine requirements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCatalog")]
pub struct Catalog {
    engines: Vec<EngineRequirement>,
}

/// Unchecked `engines` table as read from disk
#[derive(Deserialize)]
struct RawCatalog {
    engines: Vec<EngineRequirement>,
}

impl TryFrom<RawCatalog> for Catalog {
    type Error = CatalogError;

    fn try_from(raw: RawCatalog) -> Result<Self, Self::Error> {
        Catalog::new(raw.engines)
    }
}

impl Catalog {
    /// Validate entries and build a catalog; order is preserved.
    pub fn new(engines: Vec<EngineRequirement>) -> Result<Self, CatalogError> {
        let mut names = HashSet::new();
        for engine in &engines {
            engine.validate()?;
            if !names.insert(engine.engine_name.as_str()) {
                return Err(CatalogError::DuplicateEngine(engine.engine_name.clone()));
            }
        }
        Ok(Self { engines })
    }

    /// Parse `[[engines]]` tables
    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog =
            toml::from_str(content).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::try_from(raw)
    }

    /// Parse `{"engines": [...]}`
    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog =
            serde_json::from_str(content).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::try_from(raw)
    }

    /// Load from a `.json` or TOML file
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json(&content)?,
            _ => Self::from_toml(&content)?,
        };
        info!(
            "Loaded catalog {} ({} engines)",
            path.display(),
            catalog.len()
        );
        Ok(catalog)
    }

    /// Serialize as TOML `[[engines]]` tables
    pub fn to_toml(&self) -> Result<String, CatalogError> {
        toml::to_string_pretty(self).map_err(|e| CatalogError::Parse(e.to_string()))
    }

    /// Common open-source LLM runtimes with conservative requirements
    pub fn builtin() -> Self {
        use CpuArchitecture::{Arm64, Other, X86_64};

        Self {
            engines: vec![
                EngineRequirement::new("llama.cpp (CPU)", 8.0)
                    .with_description("GGUF inference on CPU threads")
                    .with_quantization(["int8", "int4"]),
                EngineRequirement::new("llama.cpp (GPU offload)", 8.0)
                    .with_description("GGUF inference with layers offloaded to CUDA, ROCm or Metal")
                    .with_min_vram_gb(6.0)
                    .with_multi_gpu(true)
                    .with_quantization(["fp16", "int8", "int4"]),
                EngineRequirement::new("Ollama", 8.0)
                    .with_description("llama.cpp-based server; uses a GPU when one is present")
                    .with_multi_gpu(true)
                    .with_quantization(["fp16", "int8", "int4"]),
                EngineRequirement::new("vLLM", 16.0)
                    .with_description("Paged-attention server for high-throughput batching")
                    .with_min_vram_gb(16.0)
                    .with_multi_gpu(true)
                    .with_quantization(["bf16", "fp16", "fp8", "int8", "int4"]),
                EngineRequirement::new("TensorRT-LLM", 32.0)
                    .with_description("Compiled engines for NVIDIA data-center and RTX GPUs")
                    .with_min_vram_gb(24.0)
                    .with_multi_gpu(true)
                    .with_quantization(["fp16", "fp8", "int8", "int4"]),
                EngineRequirement::new("MLX", 8.0)
                    .with_description("Apple silicon inference on unified memory via Metal")
                    .with_architectures([Arm64])
                    .with_min_vram_gb(8.0)
                    .with_quantization(["bf16", "fp16", "int8", "int4"]),
                EngineRequirement::new("ExLlamaV2", 16.0)
                    .with_description("EXL2/GPTQ inference tuned for consumer GPUs")
                    .with_architectures([X86_64])
                    .with_min_vram_gb(8.0)
                    .with_multi_gpu(true)
                    .with_quantization(["fp16", "int8", "q6", "int4"]),
                EngineRequirement::new("ONNX Runtime (CPU)", 4.0)
                    .with_description("Portable CPU execution provider")
                    .with_architectures([X86_64, Arm64, Other])
                    .with_quantization(["fp32", "int8"]),
            ],
        }
    }

    pub fn engines(&self) -> &[EngineRequirement] {
        &self.engines
    }

    pub fn get(&self, engine_name: &str) -> Option<&EngineRequirement> {
        self.engines.iter().find(|e| e.engine_name == engine_name)
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
