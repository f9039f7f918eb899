// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Synapse
//!
//! Directed, weighted, typed edge between two neurons.
//!
//! ## Update contract
//!
//! ```text
//! Hebbian:          Δw = rate × a_pre × a_post
//! STDP:             Δw = sign(dt) × rate × exp(−|dt| / τ),  τ = 20 ms
//! Reward-modulated: Δw = κ × R × eligibility × global_rate
//! Decay:            w ← w × (1 − rate)
//! ```
//!
//! The weight is clamped to [WEIGHT_MIN, WEIGHT_MAX] after **every** update.
//! Updates on invalid synapses are no-ops. A synapse never changes its
//! endpoints.

use crate::types::{NeuronId, SynapseId, STDP_TAU_MS, WEIGHT_MAX, WEIGHT_MIN};
use serde::{Deserialize, Serialize};

/// Synapse type: determines the sign of the integration contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynapseType {
    Excitatory,
    Inhibitory,
    /// Carries eligibility for reward-modulated learning but contributes
    /// nothing to integration.
    Modulatory,
}

/// Plasticity rule assigned to a synapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlasticityRule {
    None,
    Hebbian,
    Stdp,
    RewardModulated,
}

/// A single synapse.
///
/// Endpoints are held as stable ids, never as owning references: if either
/// endpoint is destroyed the synapse is invalidated and stops contributing
/// to integration and plasticity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Synapse {
    id: SynapseId,
    source: NeuronId,
    target: NeuronId,
    weight: f32,
    synapse_type: SynapseType,
    rule: PlasticityRule,
    learning_rate: f32,
    /// Decaying memory of recent coincident pre/post activity.
    eligibility: f32,
    valid: bool,
}

impl Synapse {
    pub fn new(
        id: SynapseId,
        source: NeuronId,
        target: NeuronId,
        weight: f32,
        synapse_type: SynapseType,
        rule: PlasticityRule,
        learning_rate: f32,
    ) -> Self {
        Self {
            id,
            source,
            target,
            weight: weight.clamp(WEIGHT_MIN, WEIGHT_MAX),
            synapse_type,
            rule,
            learning_rate,
            eligibility: 0.0,
            valid: true,
        }
    }

    #[inline]
    pub fn id(&self) -> SynapseId {
        self.id
    }

    #[inline]
    pub fn source(&self) -> NeuronId {
        self.source
    }

    #[inline]
    pub fn target(&self) -> NeuronId {
        self.target
    }

    #[inline]
    pub fn weight(&self) -> f32 {
        self.weight
    }

    #[inline]
    pub fn synapse_type(&self) -> SynapseType {
        self.synapse_type
    }

    #[inline]
    pub fn rule(&self) -> PlasticityRule {
        self.rule
    }

    #[inline]
    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, rate: f32) {
        self.learning_rate = rate.max(0.0);
    }

    #[inline]
    pub fn eligibility(&self) -> f32 {
        self.eligibility
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Retire the synapse. Invalid synapses are skipped by integration and
    /// every plasticity pass, and are removed from endpoint lists by the
    /// owning region.
    pub fn invalidate(&mut self) {
        self.valid = false;
        self.eligibility = 0.0;
    }

    /// Force the weight to a value (clamped). Used by connectome import and
    /// by tests; plasticity goes through the `apply_*` operations.
    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight.clamp(WEIGHT_MIN, WEIGHT_MAX);
    }

    /// Signed contribution this synapse makes to its target's integration,
    /// given the source neuron's current activation.
    ///
    /// Inhibition is expressed by type, not weight sign: an inhibitory
    /// synapse contributes −|w|·a regardless of the stored sign. Modulatory
    /// synapses contribute nothing.
    #[inline]
    pub fn contribution(&self, pre_activation: f32) -> f32 {
        if !self.valid {
            return 0.0;
        }
        match self.synapse_type {
            SynapseType::Excitatory => self.weight * pre_activation,
            SynapseType::Inhibitory => -self.weight.abs() * pre_activation,
            SynapseType::Modulatory => 0.0,
        }
    }

    /// Hebbian update: Δw = rate × pre × post. Returns the committed delta.
    pub fn apply_hebbian(&mut self, pre: f32, post: f32, rate: f32) -> f32 {
        if !self.valid {
            return 0.0;
        }
        let delta = rate * pre * post;
        self.commit_delta(delta)
    }

    /// STDP update for a (post − pre) spike-time difference in milliseconds.
    ///
    /// dt > 0 (pre before post) potentiates, dt < 0 depresses, dt == 0 is a
    /// no-op. Magnitude falls off as exp(−|dt|/τ) with τ = 20 ms.
    pub fn apply_stdp(&mut self, dt_ms: f64, rate: f32) -> f32 {
        if !self.valid || dt_ms == 0.0 {
            return 0.0;
        }
        let magnitude = rate * (-(dt_ms.abs()) / STDP_TAU_MS).exp() as f32;
        let delta = if dt_ms > 0.0 { magnitude } else { -magnitude };
        self.commit_delta(delta)
    }

    /// Reward-modulated update: Δw = κ × R × eligibility × global_rate.
    pub fn apply_reward_modulated(&mut self, kappa: f32, reward: f32, global_rate: f32) -> f32 {
        if !self.valid {
            return 0.0;
        }
        let delta = kappa * reward * self.eligibility * global_rate;
        self.commit_delta(delta)
    }

    /// Uniform multiplicative decay: w ← w × (1 − rate).
    pub fn decay(&mut self, rate: f32) -> f32 {
        if !self.valid || rate == 0.0 {
            return 0.0;
        }
        let delta = -self.weight * rate;
        self.commit_delta(delta)
    }

    /// Eligibility trace step: e ← λ·e + η_e × pre × post.
    pub fn accumulate_eligibility(&mut self, lambda: f32, eta_elig: f32, pre: f32, post: f32) {
        if !self.valid {
            return;
        }
        self.eligibility = lambda * self.eligibility + eta_elig * pre * post;
    }

    /// Pure decay of the eligibility trace (no new pre/post event):
    /// e ← λ·e exactly.
    pub fn decay_eligibility(&mut self, lambda: f32) {
        if self.valid {
            self.eligibility *= lambda;
        }
    }

    pub fn clear_eligibility(&mut self) {
        self.eligibility = 0.0;
    }

    #[inline]
    fn commit_delta(&mut self, delta: f32) -> f32 {
        let before = self.weight;
        self.weight = (self.weight + delta).clamp(WEIGHT_MIN, WEIGHT_MAX);
        self.weight - before
    }
}
