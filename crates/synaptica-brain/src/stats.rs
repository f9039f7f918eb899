// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Global telemetry snapshot assembled by the orchestrator.

use serde::{Deserialize, Serialize};
use synaptica_plasticity::LearningStats;

/// Point-in-time view over the whole substrate. Learning counters are
/// embedded as-is; the surrounding fields are derived by the brain at
/// snapshot time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalStatistics {
    pub cycles: u64,
    pub clock_ms: f64,
    pub region_count: usize,
    pub neuron_count: usize,
    pub active_synapse_count: usize,
    pub total_spikes: u64,

    pub learning: LearningStats,

    /// Mean region activation.
    pub mean_energy: f32,
    /// Fraction of regions running close to saturation.
    pub metabolic_hazard: f32,

    // Opaque mimicry-bridge signals; stored at the boundary, surfaced
    // here, never consumed by the dynamics.
    pub uncertainty: f32,
    pub surprise: f32,
    pub prediction_error: f32,
    pub intrinsic_motivation: f32,

    pub mean_substrate_novelty: f32,
    pub mean_substrate_similarity: f32,
    pub competence: f32,

    // Degradation counters.
    pub unknown_modality_feeds: u64,
    pub empty_pattern_feeds: u64,
    pub unknown_region_lookups: u64,
    pub ticks_while_not_running: u64,
    pub tick_faults: u64,
}
