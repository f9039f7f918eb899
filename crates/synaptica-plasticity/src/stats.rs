// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Learning telemetry.
//!
//! Every counter is monotonic; snapshot readers must never observe a sum
//! decreasing. `total_updates` always equals the sum of the per-rule
//! counters.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LearningStats {
    pub total_updates: u64,
    pub hebbian_updates: u64,
    pub stdp_updates: u64,
    pub reward_updates: u64,
    pub decay_updates: u64,
    pub homeostasis_updates: u64,

    pub potentiated_synapses: u64,
    pub depressed_synapses: u64,

    /// Updates skipped because the operand was invalid or unresolvable.
    pub skipped_updates: u64,
    /// Updates rejected by the p_gate draw.
    pub gated_rejections: u64,

    pub cumulative_reward: f64,
    pub last_reward: f32,
    pub rewards_delivered: u64,

    /// Sum of |committed Δw| and the count backing the average.
    pub total_weight_change: f64,
    pub weight_change_samples: u64,

    pub attention_events: u64,
    pub mean_attention_weight: f32,

    pub consolidation_events: u64,
    pub competence: f32,

    pub last_novelty: f32,
    pub last_shaped_reward: f32,

    pub pruned_synapses: u64,
    pub grown_synapses: u64,
    pub spawned_neurons: u64,
    pub structural_cycles: u64,
}

impl LearningStats {
    /// Record one committed plastic update of any rule kind.
    pub(crate) fn record_update(&mut self, delta: f32) {
        self.total_updates += 1;
        if delta > 0.0 {
            self.potentiated_synapses += 1;
        } else if delta < 0.0 {
            self.depressed_synapses += 1;
        }
        self.total_weight_change += delta.abs() as f64;
        self.weight_change_samples += 1;
    }

    pub fn average_weight_change(&self) -> f64 {
        if self.weight_change_samples == 0 {
            0.0
        } else {
            self.total_weight_change / self.weight_change_samples as f64
        }
    }
}
