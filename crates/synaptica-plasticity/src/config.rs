// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Learning configuration.
//!
//! All knobs live in one serde-friendly struct validated up front:
//! a bad config is rejected loudly before the engine enters a running
//! state, never mid-tick.

use serde::{Deserialize, Serialize};
use synaptica_neural::{Result, SynapticaError};

/// How plastic updates are boosted by attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionMode {
    Off,
    /// Boost synapses touching neurons in an externally supplied map.
    ExternalMap,
    /// Boost derived from activation saliency.
    Saliency,
    /// Boost the currently most-active neurons.
    TopK,
}

/// How the competence scalar feeds back into learning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetenceMode {
    Off,
    /// Track the EMA but do not gate anything.
    Ema,
    /// Multiply effective learning rates by competence.
    ScaleLearningRates,
    /// Multiply effective p_gate by competence.
    ScalePGate,
}

/// Which synapses an explicit Hebbian pass touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HebbianScope {
    /// Only synapses tagged with the Hebbian rule.
    RuleTagged,
    /// Every valid synapse, regardless of rule tag.
    AllValid,
}

/// Full learning configuration. `0` disables the corresponding rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningConfig {
    /// Base multiplier for reward-modulated updates.
    pub global_learning_rate: f32,
    pub hebbian_rate: f32,
    pub hebbian_scope: HebbianScope,
    pub stdp_rate: f32,
    pub stdp_rate_multiplier: f32,
    /// Uniform per-tick weight decay.
    pub decay_rate: f32,
    /// Run decay before the Hebbian pass instead of after it.
    pub decay_before_hebbian: bool,

    pub enable_homeostasis: bool,
    /// Target mean incoming-weight sum per neuron for homeostasis.
    pub homeostasis_target: f32,

    /// Probability of accepting any individual plastic update.
    pub p_gate: f32,

    pub attention_mode: AttentionMode,
    pub attention_amin: f32,
    pub attention_amax: f32,
    /// Linear anneal window for the attention boost, in ms. 0 = no anneal.
    pub attention_anneal_ms: f64,
    /// Map entries kept under `AttentionMode::TopK`; the rest are dropped
    /// at submission.
    pub attention_top_k: usize,

    pub competence_mode: CompetenceMode,
    /// EMA rate for the competence scalar.
    pub competence_rho: f32,

    /// Strength of periodic weight-tag consolidation in [0, 1].
    pub consolidation_strength: f32,
    /// Duration of a consolidation phase, in ms.
    pub consolidation_duration_ms: f64,
    /// Minimum idle time between consolidation phases, in ms.
    pub consolidation_interval_ms: f64,
    /// Weight magnitude above which a synapse counts as stable during
    /// consolidation.
    pub consolidation_stability_threshold: f32,

    /// Eligibility decay factor per tick.
    pub lambda: f32,
    /// Eligibility increment gain.
    pub eta_elig: f32,
    /// Reward gain.
    pub kappa: f32,
    /// Novelty weight in shaped reward.
    pub alpha: f32,
    /// Task-reward weight in shaped reward.
    pub gamma: f32,
    /// Reserved.
    pub eta: f32,
    /// When true the tick loop emits synthetic (pre, post) eligibility
    /// events for every valid synapse.
    pub auto_eligibility: bool,

    /// Relative weight of observation novelty in shaped reward.
    pub novelty_obs_weight: f32,
    /// Relative weight of substrate (region-activation) novelty.
    pub novelty_substrate_weight: f32,
    /// EMA rate for the novelty running means.
    pub novelty_ema_rate: f32,

    /// Every how many plasticity passes Hebbian/STDP/homeostasis/decay run.
    pub plasticity_interval_steps: u64,

    // Structural plasticity.
    pub structural_interval_steps: u64,
    pub structural_prune_threshold: f32,
    pub structural_grow_batch: usize,
    pub structural_spawn_batch: usize,
    pub structural_max_regions_per_cycle: usize,
    /// Mean-activation ceiling below which a region is eligible for growth.
    pub structural_energy_gate: f32,

    /// Rewards are accepted as-is but saturated to ±this for statistics.
    pub reward_stat_clamp: f32,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            global_learning_rate: 0.01,
            hebbian_rate: 0.01,
            hebbian_scope: HebbianScope::RuleTagged,
            stdp_rate: 0.01,
            stdp_rate_multiplier: 1.0,
            decay_rate: 0.0,
            decay_before_hebbian: false,
            enable_homeostasis: false,
            homeostasis_target: 1.0,
            p_gate: 1.0,
            attention_mode: AttentionMode::Off,
            attention_amin: 0.5,
            attention_amax: 2.0,
            attention_anneal_ms: 0.0,
            attention_top_k: 8,
            competence_mode: CompetenceMode::Off,
            competence_rho: 0.05,
            consolidation_strength: 0.0,
            consolidation_duration_ms: 1000.0,
            consolidation_interval_ms: 1000.0,
            consolidation_stability_threshold: 0.5,
            lambda: 0.9,
            eta_elig: 1.0,
            kappa: 0.1,
            alpha: 0.1,
            gamma: 1.0,
            eta: 0.0,
            auto_eligibility: false,
            novelty_obs_weight: 0.5,
            novelty_substrate_weight: 0.5,
            novelty_ema_rate: 0.1,
            plasticity_interval_steps: 1,
            structural_interval_steps: 0,
            structural_prune_threshold: 0.01,
            structural_grow_batch: 8,
            structural_spawn_batch: 0,
            structural_max_regions_per_cycle: 4,
            structural_energy_gate: 0.2,
            reward_stat_clamp: 10.0,
        }
    }
}

impl LearningConfig {
    /// Validate before use. A failing config must not reach a running
    /// engine.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.p_gate) {
            return Err(SynapticaError::InvalidArgument(format!(
                "p_gate {} outside [0, 1]",
                self.p_gate
            )));
        }
        if self.attention_amax < self.attention_amin {
            return Err(SynapticaError::InvalidArgument(format!(
                "attention_amax {} < attention_amin {}",
                self.attention_amax, self.attention_amin
            )));
        }
        if !(0.0..=1.0).contains(&self.lambda) {
            return Err(SynapticaError::InvalidArgument(format!(
                "lambda {} outside [0, 1]",
                self.lambda
            )));
        }
        if !(0.0..=1.0).contains(&self.competence_rho) {
            return Err(SynapticaError::InvalidArgument(format!(
                "competence_rho {} outside [0, 1]",
                self.competence_rho
            )));
        }
        for (name, value) in [
            ("global_learning_rate", self.global_learning_rate),
            ("hebbian_rate", self.hebbian_rate),
            ("stdp_rate", self.stdp_rate),
            ("stdp_rate_multiplier", self.stdp_rate_multiplier),
            ("decay_rate", self.decay_rate),
            ("eta_elig", self.eta_elig),
            ("structural_prune_threshold", self.structural_prune_threshold),
        ] {
            if value < 0.0 || !value.is_finite() {
                return Err(SynapticaError::InvalidArgument(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.consolidation_strength) {
            return Err(SynapticaError::InvalidArgument(format!(
                "consolidation_strength {} outside [0, 1]",
                self.consolidation_strength
            )));
        }
        for (name, value) in [
            ("consolidation_duration_ms", self.consolidation_duration_ms),
            ("consolidation_interval_ms", self.consolidation_interval_ms),
        ] {
            if value < 0.0 || !value.is_finite() {
                return Err(SynapticaError::InvalidArgument(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        if self.attention_mode == AttentionMode::TopK && self.attention_top_k == 0 {
            return Err(SynapticaError::InvalidArgument(
                "attention_top_k must be positive under AttentionMode::TopK".into(),
            ));
        }
        Ok(())
    }
}
