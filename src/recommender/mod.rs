// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Inference engine recommendation
//!
//! Ranks catalog entries against a [`HardwareProfile`]. Every entry first
//! passes a hard eligibility filter (architecture, total RAM, single-GPU
//! VRAM); survivors are scored from three weighted factors:
//!
//! ```text
//! memory_headroom = clamp(available_gb / max(min_ram_gb, 1), 0, 1)
//! accelerator_fit = 1                                          if min_vram_gb == 0
//!                 = clamp(best_vram / (min_vram_gb * margin), 0, 1)  otherwise
//! score           = clamp(0.5 * memory_headroom + 0.4 * accelerator_fit + bonus, 0, 1)
//! ```
//!
//! where `bonus` is 0.1 for multi-GPU capable engines on hosts with more
//! than one GPU. Results are sorted by descending score; ties keep catalog
//! order.

pub mod catalog;

pub use catalog::{Catalog, EngineRequirement};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::InvalidArgumentError;
use crate::profile::HardwareProfile;

/// Scoring constants. Defaults are the documented contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub memory_headroom_weight: f64,
    pub accelerator_fit_weight: f64,
    pub multi_gpu_bonus: f64,
    /// VRAM multiple of the minimum that counts as a full fit
    pub vram_margin: f64,
    /// Fraction above a minimum below which a near-miss warning is raised
    pub low_headroom_ratio: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            memory_headroom_weight: 0.5,
            accelerator_fit_weight: 0.4,
            multi_gpu_bonus: 0.1,
            vram_margin: 1.5,
            low_headroom_ratio: 0.10,
        }
    }
}

impl ScoringWeights {
    pub fn validate(&self) -> Result<(), InvalidArgumentError> {
        let unit = [
            ("memory_headroom_weight", self.memory_headroom_weight),
            ("accelerator_fit_weight", self.accelerator_fit_weight),
            ("multi_gpu_bonus", self.multi_gpu_bonus),
            ("low_headroom_ratio", self.low_headroom_ratio),
        ];
        for (name, value) in unit {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(InvalidArgumentError(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if !self.vram_margin.is_finite() || self.vram_margin < 1.0 {
            return Err(InvalidArgumentError(format!(
                "vram_margin must be at least 1, got {}",
                self.vram_margin
            )));
        }
        Ok(())
    }
}

/// Per-factor breakdown behind a score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreFactors {
    pub memory_headroom: f64,
    pub accelerator_fit: f64,
    pub multi_gpu_bonus: f64,
}

/// One ranked engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub engine_name: String,
    /// Always within [0, 1]
    pub score: f64,
    pub factors: ScoreFactors,
    pub rationale: Vec<String>,
    pub warnings: Vec<String>,
    pub suggested_quantization: Option<String>,
}

/// Catalog entry removed by the hard filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub engine_name: String,
    pub reasons: Vec<String>,
}

/// Full outcome of a recommendation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Sorted by descending score, ties in catalog order
    pub recommendations: Vec<Recommendation>,
    /// In catalog order
    pub excluded: Vec<Exclusion>,
}

/// Stateless ranking of catalog entries against a profile
#[derive(Debug, Clone, Default)]
pub struct Recommender {
    weights: ScoringWeights,
}

impl Recommender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: ScoringWeights) -> Result<Self, InvalidArgumentError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Ranked recommendations, truncated to `top_k` when given.
    ///
    /// `top_k == Some(0)` and malformed catalog entries are caller errors.
    pub fn recommend(
        &self,
        profile: &HardwareProfile,
        catalog: &[EngineRequirement],
        top_k: Option<usize>,
    ) -> Result<Vec<Recommendation>, InvalidArgumentError> {
        if top_k == Some(0) {
            return Err(InvalidArgumentError("top_k must be positive, got 0".into()));
        }
        let mut recommendations = self.assess(profile, catalog)?.recommendations;
        if let Some(k) = top_k {
            recommendations.truncate(k);
        }
        Ok(recommendations)
    }

    /// Score every eligible entry and explain every exclusion
    pub fn assess(
        &self,
        profile: &HardwareProfile,
        catalog: &[EngineRequirement],
    ) -> Result<Assessment, InvalidArgumentError> {
        for entry in catalog {
            entry
                .validate()
                .map_err(|e| InvalidArgumentError(e.to_string()))?;
        }

        let mut recommendations = Vec::new();
        let mut excluded = Vec::new();
        for entry in catalog {
            match eligibility(profile, entry) {
                Ok(()) => recommendations.push(self.score(profile, entry)),
                Err(reasons) => {
                    debug!("Excluding {}: {}", entry.engine_name, reasons.join("; "));
                    excluded.push(Exclusion {
                        engine_name: entry.engine_name.clone(),
                        reasons,
                    });
                }
            }
        }

        // sort_by is stable: equal scores keep catalog order
        recommendations.sort_by(|a, b| b.score.total_cmp(&a.score));

        Ok(Assessment {
            recommendations,
            excluded,
        })
    }

    /// Score a single entry; `None` when it fails the hard filter
    pub fn evaluate(
        &self,
        profile: &HardwareProfile,
        entry: &EngineRequirement,
    ) -> Option<Recommendation> {
        eligibility(profile, entry).ok()?;
        Some(self.score(profile, entry))
    }

    /// Factor values for an entry, whether or not it is eligible
    pub fn factors(&self, profile: &HardwareProfile, entry: &EngineRequirement) -> ScoreFactors {
        let w = &self.weights;
        let memory_headroom =
            (profile.memory().available_gb / entry.min_ram_gb.max(1.0)).clamp(0.0, 1.0);
        let accelerator_fit = if entry.is_cpu_capable() {
            1.0
        } else {
            let best = profile.best_gpu_vram_gb().unwrap_or(0.0);
            (best / (entry.min_vram_gb * w.vram_margin)).clamp(0.0, 1.0)
        };
        let multi_gpu_bonus = if entry.supports_multi_gpu && profile.gpu_count() > 1 {
            w.multi_gpu_bonus
        } else {
            0.0
        };
        ScoreFactors {
            memory_headroom,
            accelerator_fit,
            multi_gpu_bonus,
        }
    }

    fn score(&self, profile: &HardwareProfile, entry: &EngineRequirement) -> Recommendation {
        let w = &self.weights;
        let factors = self.factors(profile, entry);
        let score = (w.memory_headroom_weight * factors.memory_headroom
            + w.accelerator_fit_weight * factors.accelerator_fit
            + factors.multi_gpu_bonus)
            .clamp(0.0, 1.0);

        let suggested_quantization = suggest_quantization(
            &entry.quantization_levels,
            factors.memory_headroom.min(factors.accelerator_fit),
        );

        let mut rationale = Vec::new();
        let memory = profile.memory();
        if factors.memory_headroom >= 1.0 {
            rationale.push(format!(
                "ample free memory: {} available vs {} required",
                gb(memory.available_gb),
                gb(entry.min_ram_gb)
            ));
        } else if factors.memory_headroom > 0.0 {
            rationale.push(format!(
                "partial memory headroom: {} available vs {} required",
                gb(memory.available_gb),
                gb(entry.min_ram_gb)
            ));
        }

        let best_vram = profile.best_gpu_vram_gb().unwrap_or(0.0);
        if entry.is_cpu_capable() {
            rationale.push("runs on CPU: no GPU memory required".to_string());
        } else if factors.accelerator_fit >= 1.0 {
            rationale.push(format!(
                "ample VRAM margin: {} available vs {} required",
                gb(best_vram),
                gb(entry.min_vram_gb)
            ));
        } else {
            rationale.push(format!(
                "VRAM meets minimum: {} available vs {} required",
                gb(best_vram),
                gb(entry.min_vram_gb)
            ));
        }

        if factors.multi_gpu_bonus > 0.0 {
            rationale.push(format!(
                "multi-GPU support: can use all {} GPUs",
                profile.gpu_count()
            ));
        }
        if let Some(level) = &suggested_quantization {
            rationale.push(format!("suggested quantization: {}", level));
        }

        let mut warnings = Vec::new();
        let near = 1.0 + w.low_headroom_ratio;
        let percent = w.low_headroom_ratio * 100.0;
        if memory.total_gb < entry.min_ram_gb * near {
            warnings.push(format!(
                "meets minimum RAM but with <{:.0}% headroom ({} total vs {} required)",
                percent,
                gb(memory.total_gb),
                gb(entry.min_ram_gb)
            ));
        }
        if memory.available_gb < entry.min_ram_gb {
            warnings.push(format!(
                "only {} of memory currently free vs {} required",
                gb(memory.available_gb),
                gb(entry.min_ram_gb)
            ));
        }
        if !entry.is_cpu_capable() && best_vram < entry.min_vram_gb * near {
            warnings.push(format!(
                "meets minimum VRAM but with <{:.0}% headroom ({} vs {} required)",
                percent,
                gb(best_vram),
                gb(entry.min_vram_gb)
            ));
        }
        if profile.gpu_count() > 1 && !entry.supports_multi_gpu {
            warnings.push(format!(
                "engine uses a single GPU; {} of {} GPUs left idle",
                profile.gpu_count() - 1,
                profile.gpu_count()
            ));
        }

        debug!(
            "{}: score {:.3} (memory {:.2}, accelerator {:.2}, bonus {:.2})",
            entry.engine_name,
            score,
            factors.memory_headroom,
            factors.accelerator_fit,
            factors.multi_gpu_bonus
        );

        Recommendation {
            engine_name: entry.engine_name.clone(),
            score,
            factors,
            rationale,
            warnings,
            suggested_quantization,
        }
    }
}

/// Hard filter. `Err` lists every failed check.
pub fn eligibility(profile: &HardwareProfile, entry: &EngineRequirement) -> Result<(), Vec<String>> {
    let mut reasons = Vec::new();

    let arch = profile.cpu().architecture;
    if !entry.supported_architectures.contains(&arch) {
        let supported: Vec<&str> = entry
            .supported_architectures
            .iter()
            .map(|a| a.as_str())
            .collect();
        reasons.push(format!(
            "architecture {} not supported (supports {})",
            arch.as_str(),
            supported.join(", ")
        ));
    }

    let total = profile.memory().total_gb;
    if total < entry.min_ram_gb {
        reasons.push(format!(
            "insufficient RAM: {} total vs {} required",
            gb(total),
            gb(entry.min_ram_gb)
        ));
    }

    if entry.min_vram_gb > 0.0
        && !profile.gpus().iter().any(|g| g.vram_gb >= entry.min_vram_gb)
    {
        reasons.push(match profile.best_gpu_vram_gb() {
            Some(best) => format!(
                "insufficient VRAM: best GPU has {} vs {} required",
                gb(best),
                gb(entry.min_vram_gb)
            ),
            None => format!("requires a GPU with {} VRAM", gb(entry.min_vram_gb)),
        });
    }

    if reasons.is_empty() {
        Ok(())
    } else {
        Err(reasons)
    }
}

/// Position of a quantization label from most (0) to least precise
pub fn precision_rank(level: &str) -> Option<u8> {
    let rank = match level.to_ascii_lowercase().as_str() {
        "fp32" | "f32" => 0,
        "bf16" | "fp16" | "f16" => 1,
        "fp8" | "int8" | "q8" | "q8_0" => 2,
        "q6" | "q6_k" => 3,
        "q5" | "q5_0" | "q5_k_m" => 4,
        "int4" | "q4" | "q4_0" | "q4_k_m" => 5,
        "q3" | "q3_k_m" => 6,
        "q2" | "q2_k" => 7,
        _ => return None,
    };
    Some(rank)
}

/// Pick a level from `levels` given the weaker of the memory and accelerator
/// factors: most precise at full fit, the middle level from 0.75, otherwise
/// the most compressed.
pub fn suggest_quantization(levels: &[String], fit: f64) -> Option<String> {
    let mut ordered: Vec<&String> = levels.iter().collect();
    ordered.sort_by_key(|level| precision_rank(level).unwrap_or(u8::MAX));

    let index = if fit >= 1.0 {
        0
    } else if fit >= 0.75 {
        ordered.len() / 2
    } else {
        ordered.len().checked_sub(1)?
    };
    ordered.get(index).map(|level| level.to_string())
}

/// `24GB`, `7.5GB`; rounded to one decimal first
fn gb(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{:.0}GB", rounded)
    } else {
        format!("{:.1}GB", rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{validate_hardware_data, CpuArchitecture};
    use serde_json::{json, Value};

    fn profile(total_gb: f64, available_gb: f64, vram: &[f64], arch: &str) -> HardwareProfile {
        let gpus: Vec<Value> = vram
            .iter()
            .enumerate()
            .map(|(i, v)| json!({ "vendor": "nvidia", "model_name": format!("GPU {}", i), "vram_gb": v }))
            .collect();
        validate_hardware_data(&json!({
            "cpu": {
                "logical_core_count": 8,
                "physical_core_count": 4,
                "base_clock_ghz": 3.0,
                "architecture": arch
            },
            "memory": { "total_gb": total_gb, "available_gb": available_gb },
            "gpus": gpus,
            "disk": { "free_gb": 100.0 },
            "os": "linux"
        }))
        .unwrap()
    }

    fn cpu_entry(name: &str, min_ram_gb: f64) -> EngineRequirement {
        EngineRequirement::new(name, min_ram_gb)
    }

    fn gpu_entry(name: &str, min_ram_gb: f64, min_vram_gb: f64) -> EngineRequirement {
        EngineRequirement::new(name, min_ram_gb).with_min_vram_gb(min_vram_gb)
    }

    fn names(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.engine_name.as_str()).collect()
    }

    #[test]
    fn test_cpu_only_host_gets_cpu_engine_only() {
        let host = profile(8.0, 6.0, &[], "x86_64");
        let catalog = vec![cpu_entry("cpu", 4.0), gpu_entry("gpu", 4.0, 8.0)];
        let recs = Recommender::new().recommend(&host, &catalog, None).unwrap();
        assert_eq!(names(&recs), vec!["cpu"]);
    }

    #[test]
    fn test_accelerator_fit_caps_at_one() {
        let host = profile(64.0, 48.0, &[24.0], "x86_64");
        let factors = Recommender::new().factors(&host, &gpu_entry("gpu", 16.0, 12.0));
        assert_eq!(factors.accelerator_fit, 1.0);
    }

    #[test]
    fn test_accelerator_fit_partial() {
        let host = profile(64.0, 48.0, &[16.0], "x86_64");
        let factors = Recommender::new().factors(&host, &gpu_entry("gpu", 16.0, 16.0));
        assert!((factors.accelerator_fit - 16.0 / 24.0).abs() < 1e-12);
    }

    #[test]
    fn test_top_k_zero_is_invalid() {
        let host = profile(8.0, 6.0, &[], "x86_64");
        let err = Recommender::new()
            .recommend(&host, &[cpu_entry("cpu", 4.0)], Some(0))
            .unwrap_err();
        assert!(err.to_string().contains("top_k"));
    }

    #[test]
    fn test_top_k_truncates() {
        let host = profile(32.0, 32.0, &[], "x86_64");
        let catalog = vec![cpu_entry("a", 4.0), cpu_entry("b", 8.0), cpu_entry("c", 64.0)];
        let recs = Recommender::new().recommend(&host, &catalog, Some(1)).unwrap();
        assert_eq!(recs.len(), 1);
        let all = Recommender::new().recommend(&host, &catalog, Some(10)).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_empty_catalog() {
        let host = profile(8.0, 6.0, &[], "x86_64");
        assert!(Recommender::new().recommend(&host, &[], None).unwrap().is_empty());
    }

    #[test]
    fn test_score_formula() {
        let host = profile(32.0, 8.0, &[12.0, 12.0], "x86_64");
        let entry = gpu_entry("gpu", 16.0, 8.0).with_multi_gpu(true);
        let rec = Recommender::new().evaluate(&host, &entry).unwrap();
        // 0.5 * (8/16) + 0.4 * (12/12) + 0.1
        assert!((rec.score - 0.75).abs() < 1e-12);
        assert_eq!(rec.factors.multi_gpu_bonus, 0.1);
    }

    #[test]
    fn test_score_clamped() {
        let host = profile(64.0, 64.0, &[80.0, 80.0], "x86_64");
        let entry = gpu_entry("gpu", 16.0, 8.0).with_multi_gpu(true);
        let weights = ScoringWeights {
            memory_headroom_weight: 1.0,
            accelerator_fit_weight: 1.0,
            multi_gpu_bonus: 1.0,
            ..ScoringWeights::default()
        };
        let rec = Recommender::with_weights(weights)
            .unwrap()
            .evaluate(&host, &entry)
            .unwrap();
        assert_eq!(rec.score, 1.0);
    }

    #[test]
    fn test_score_bounds() {
        let recommender = Recommender::new();
        let hosts = [
            profile(1.0, 0.0, &[], "x86_64"),
            profile(8.0, 8.0, &[4.0], "x86_64"),
            profile(512.0, 400.0, &[80.0, 80.0, 80.0, 80.0], "x86_64"),
        ];
        let entries = [
            cpu_entry("tiny", 0.5),
            cpu_entry("mid", 8.0).with_multi_gpu(true),
            gpu_entry("gpu", 1.0, 0.1).with_multi_gpu(true),
            gpu_entry("big", 256.0, 80.0),
        ];
        for host in &hosts {
            for entry in &entries {
                if let Some(rec) = recommender.evaluate(host, entry) {
                    assert!((0.0..=1.0).contains(&rec.score), "{}", rec.score);
                }
            }
        }
    }

    #[test]
    fn test_eligibility_monotonic_in_requirements() {
        let host = profile(32.0, 16.0, &[16.0], "x86_64");
        let mut passed_before = true;
        for step in 0..20 {
            let ram = 4.0 + step as f64 * 4.0;
            let passes = eligibility(&host, &cpu_entry("x", ram)).is_ok();
            assert!(passed_before || !passes, "became eligible at {} GB", ram);
            passed_before = passes;
        }
        let mut passed_before = true;
        for step in 0..20 {
            let vram = 2.0 + step as f64 * 2.0;
            let passes = eligibility(&host, &gpu_entry("x", 4.0, vram)).is_ok();
            assert!(passed_before || !passes, "became eligible at {} GB", vram);
            passed_before = passes;
        }
    }

    #[test]
    fn test_vram_must_fit_on_one_gpu() {
        let host = profile(64.0, 48.0, &[12.0, 12.0], "x86_64");
        let reasons = eligibility(&host, &gpu_entry("x", 8.0, 16.0)).unwrap_err();
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].contains("insufficient VRAM"));
    }

    #[test]
    fn test_exclusion_lists_every_reason() {
        let host = profile(8.0, 6.0, &[], "arm64");
        let entry = gpu_entry("x", 16.0, 8.0).with_architectures([CpuArchitecture::X86_64]);
        let assessment = Recommender::new().assess(&host, &[entry]).unwrap();
        assert!(assessment.recommendations.is_empty());
        assert_eq!(assessment.excluded.len(), 1);
        let reasons = &assessment.excluded[0].reasons;
        assert_eq!(reasons.len(), 3);
        assert!(reasons[0].starts_with("architecture arm64"));
        assert!(reasons[1].starts_with("insufficient RAM"));
        assert!(reasons[2].starts_with("requires a GPU"));
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let host = profile(32.0, 32.0, &[], "x86_64");
        let catalog = vec![cpu_entry("first", 4.0), cpu_entry("second", 8.0), cpu_entry("third", 2.0)];
        let recs = Recommender::new().recommend(&host, &catalog, None).unwrap();
        assert_eq!(names(&recs), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_sorted_descending() {
        let host = profile(32.0, 8.0, &[], "x86_64");
        let catalog = vec![cpu_entry("heavy", 16.0), cpu_entry("light", 4.0)];
        let recs = Recommender::new().recommend(&host, &catalog, None).unwrap();
        assert_eq!(names(&recs), vec!["light", "heavy"]);
        assert!(recs[0].score > recs[1].score);
    }

    #[test]
    fn test_deterministic() {
        let host = profile(64.0, 40.0, &[24.0, 8.0], "x86_64");
        let catalog = Catalog::builtin();
        let recommender = Recommender::new();
        let first = recommender.recommend(&host, catalog.engines(), None).unwrap();
        for _ in 0..5 {
            assert_eq!(recommender.recommend(&host, catalog.engines(), None).unwrap(), first);
        }
    }

    #[test]
    fn test_invalid_entry_rejected() {
        let host = profile(8.0, 6.0, &[], "x86_64");
        let err = Recommender::new()
            .recommend(&host, &[cpu_entry("bad", -1.0)], None)
            .unwrap_err();
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_rationale_and_warnings() {
        let host = profile(17.0, 10.0, &[13.0, 13.0], "x86_64");
        let entry = gpu_entry("gpu", 16.0, 12.0).with_quantization(["int4", "fp16", "int8"]);
        let rec = Recommender::new().evaluate(&host, &entry).unwrap();

        assert_eq!(
            rec.rationale,
            vec![
                "partial memory headroom: 10GB available vs 16GB required",
                "VRAM meets minimum: 13GB available vs 12GB required",
                "suggested quantization: int4",
            ]
        );
        assert_eq!(
            rec.warnings,
            vec![
                "meets minimum RAM but with <10% headroom (17GB total vs 16GB required)",
                "only 10GB of memory currently free vs 16GB required",
                "meets minimum VRAM but with <10% headroom (13GB vs 12GB required)",
                "engine uses a single GPU; 1 of 2 GPUs left idle",
            ]
        );
    }

    #[test]
    fn test_ample_resources_rationale() {
        let host = profile(64.0, 48.0, &[24.0], "x86_64");
        let entry = gpu_entry("gpu", 16.0, 12.0).with_quantization(["int8", "fp16"]);
        let rec = Recommender::new().evaluate(&host, &entry).unwrap();
        assert!(rec.warnings.is_empty());
        assert_eq!(rec.rationale[0], "ample free memory: 48GB available vs 16GB required");
        assert_eq!(rec.rationale[1], "ample VRAM margin: 24GB available vs 12GB required");
        assert_eq!(rec.suggested_quantization.as_deref(), Some("fp16"));
        assert!((rec.score - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_cpu_entry_rationale() {
        let host = profile(16.0, 12.0, &[], "arm64");
        let rec = Recommender::new().evaluate(&host, &cpu_entry("cpu", 8.0)).unwrap();
        assert!(rec.rationale.iter().any(|r| r.starts_with("runs on CPU")));
        assert_eq!(rec.suggested_quantization, None);
    }

    #[test]
    fn test_gb_formatting() {
        assert_eq!(gb(24.0), "24GB");
        assert_eq!(gb(23.97), "24GB");
        assert_eq!(gb(23.94), "23.9GB");
        assert_eq!(gb(7.5), "7.5GB");
        assert_eq!(gb(0.04), "0GB");
    }

    #[test]
    fn test_precision_rank() {
        assert!(precision_rank("fp32") < precision_rank("FP16"));
        assert_eq!(precision_rank("bf16"), precision_rank("fp16"));
        assert_eq!(precision_rank("int8"), precision_rank("q8"));
        assert!(precision_rank("q6") < precision_rank("int4"));
        assert_eq!(precision_rank("exl2-4.65bpw"), None);
    }

    #[test]
    fn test_suggest_quantization() {
        let levels: Vec<String> = ["int4", "custom", "fp16", "int8"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(suggest_quantization(&levels, 1.0).as_deref(), Some("fp16"));
        assert_eq!(suggest_quantization(&levels, 0.8).as_deref(), Some("int4"));
        assert_eq!(suggest_quantization(&levels, 0.3).as_deref(), Some("custom"));
        assert_eq!(suggest_quantization(&[], 1.0), None);
    }

    #[test]
    fn test_weights_validation() {
        assert!(ScoringWeights::default().validate().is_ok());
        let bad_margin = ScoringWeights {
            vram_margin: 0.5,
            ..ScoringWeights::default()
        };
        assert!(Recommender::with_weights(bad_margin).is_err());
        let bad_weight = ScoringWeights {
            memory_headroom_weight: f64::NAN,
            ..ScoringWeights::default()
        };
        assert!(bad_weight.validate().is_err());
    }

    #[test]
    fn test_builtin_catalog_on_workstation() {
        let host = validate_hardware_data(&crate::profile::tests::workstation_raw()).unwrap();
        let assessment = Recommender::new()
            .assess(&host, Catalog::builtin().engines())
            .unwrap();
        assert_eq!(
            assessment.recommendations.len() + assessment.excluded.len(),
            Catalog::builtin().len()
        );
        assert!(assessment.recommendations.iter().any(|r| r.engine_name == "vLLM"));
        let windows = assessment.recommendations.windows(2);
        assert!(windows.into_iter().all(|w| w[0].score >= w[1].score));
    }
}
