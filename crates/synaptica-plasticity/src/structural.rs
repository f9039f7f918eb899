// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Structural plasticity: prune, grow, spawn.
//!
//! The cycle is best-effort; partial progress is reported, never an
//! error. Pruning runs over every region. Growth and spawning are
//! restricted to a bounded number of low-energy regions per cycle, so
//! a single cycle cannot rewire the whole substrate.

use crate::engine::LearningEngine;
use ahash::AHashMap;
use synaptica_neural::{sample_normal, IdAllocator, Region, RegionId};
use tracing::debug;

/// Mean and sigma of freshly grown synapse weights.
const GROWTH_WEIGHT_MEAN: f32 = 0.1;
const GROWTH_WEIGHT_SIGMA: f32 = 0.05;

/// What one structural cycle changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructuralReport {
    pub pruned: usize,
    pub grown: usize,
    pub spawned: usize,
}

impl LearningEngine {
    /// Run one prune → grow → spawn cycle over the whole substrate.
    ///
    /// Cross-region synapse retirements discovered during pruning are
    /// detached from their remote target regions before the cycle ends,
    /// so neuron bookkeeping stays consistent.
    pub fn structural_cycle(
        &mut self,
        regions: &mut AHashMap<RegionId, Region>,
        alloc: &mut IdAllocator,
    ) -> StructuralReport {
        let mut report = StructuralReport::default();
        let threshold = self.config.structural_prune_threshold;

        // Prune everywhere, deferring remote detachments.
        let mut remote_detach = Vec::new();
        for region in regions.values_mut() {
            let outcome = region.prune_weak_synapses(threshold);
            report.pruned += outcome.pruned;
            for (target_region, target, sid) in outcome.cross_region {
                remote_detach.push((region.id(), target_region, target, sid));
            }
        }
        for (source_region, target_region, target, sid) in remote_detach {
            if let Some(region) = regions.get_mut(&target_region) {
                region.unregister_incoming(sid, source_region, target);
            }
        }

        // Grow and spawn in low-energy regions only, bounded per cycle.
        let mut eligible: Vec<RegionId> = regions
            .values()
            .filter(|r| r.is_active() && r.global_activation() < self.config.structural_energy_gate)
            .map(|r| r.id())
            .collect();
        eligible.sort_by_key(|r| r.0);
        eligible.truncate(self.config.structural_max_regions_per_cycle);

        for id in eligible {
            let Some(region) = regions.get_mut(&id) else {
                continue;
            };
            let rng = &mut self.rng;
            report.grown += region.grow_synapses(self.config.structural_grow_batch, alloc, || {
                sample_normal(rng, GROWTH_WEIGHT_MEAN, GROWTH_WEIGHT_SIGMA)
            });
            if self.config.structural_spawn_batch > 0 {
                let spawned = region.create_neurons(self.config.structural_spawn_batch, alloc);
                report.spawned += spawned.len();
            }
        }

        self.stats.pruned_synapses += report.pruned as u64;
        self.stats.grown_synapses += report.grown as u64;
        self.stats.spawned_neurons += report.spawned as u64;
        self.stats.structural_cycles += 1;
        debug!(
            target: "plasticity",
            "structural cycle: pruned {}, grew {}, spawned {}",
            report.pruned, report.grown, report.spawned
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LearningConfig;
    use synaptica_neural::{ActivationPattern, PlasticityRule, RegionKind, SynapseType};

    fn substrate() -> (AHashMap<RegionId, Region>, IdAllocator) {
        let mut alloc = IdAllocator::new();
        let mut regions = AHashMap::new();
        let mut region = Region::new(
            alloc.next_region_id(),
            "r0",
            RegionKind::Cortical,
            ActivationPattern::Synchronous,
        );
        let ids = region.create_neurons(4, &mut alloc);
        region
            .connect_neurons(ids[0], ids[1], 0.001, SynapseType::Excitatory, PlasticityRule::None, 0.0, &mut alloc)
            .unwrap();
        region
            .connect_neurons(ids[1], ids[2], 0.5, SynapseType::Excitatory, PlasticityRule::None, 0.0, &mut alloc)
            .unwrap();
        regions.insert(region.id(), region);
        (regions, alloc)
    }

    #[test]
    fn test_cycle_prunes_weak_synapses() {
        let (mut regions, mut alloc) = substrate();
        let config = LearningConfig {
            structural_prune_threshold: 0.01,
            structural_grow_batch: 0,
            ..Default::default()
        };
        let mut engine = LearningEngine::with_seed(config, 3).unwrap();

        let report = engine.structural_cycle(&mut regions, &mut alloc);
        assert_eq!(report.pruned, 1);
        let region = regions.values().next().unwrap();
        assert_eq!(region.synapse_count(), 1);
        assert_eq!(engine.stats().pruned_synapses, 1);
    }

    #[test]
    fn test_cycle_grows_in_low_energy_regions() {
        let (mut regions, mut alloc) = substrate();
        // Activations above the active threshold but region mean below
        // the energy gate, so growth candidates exist.
        for region in regions.values_mut() {
            let ids = region.neuron_ids();
            region.neuron_mut(ids[0]).unwrap().set_activation(0.3);
            region.neuron_mut(ids[1]).unwrap().set_activation(0.3);
        }
        let config = LearningConfig {
            structural_prune_threshold: 0.0,
            structural_grow_batch: 1,
            structural_energy_gate: 0.5,
            ..Default::default()
        };
        let mut engine = LearningEngine::with_seed(config, 3).unwrap();

        let report = engine.structural_cycle(&mut regions, &mut alloc);
        assert_eq!(report.grown, 1);
    }

    #[test]
    fn test_cycle_spawns_neurons() {
        let (mut regions, mut alloc) = substrate();
        let config = LearningConfig {
            structural_prune_threshold: 0.0,
            structural_grow_batch: 0,
            structural_spawn_batch: 2,
            structural_energy_gate: 0.5,
            ..Default::default()
        };
        let mut engine = LearningEngine::with_seed(config, 3).unwrap();

        let before = regions.values().next().unwrap().neuron_count();
        let report = engine.structural_cycle(&mut regions, &mut alloc);
        assert_eq!(report.spawned, 2);
        assert_eq!(regions.values().next().unwrap().neuron_count(), before + 2);
    }
}
