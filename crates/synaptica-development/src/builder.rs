// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # ConnectivityBuilder
//!
//! Materializes synapses between two regions according to a typed
//! pattern and a distance distribution. Wiring is planned from immutable
//! reads and applied in a second phase, so the source-region-owns-
//! synapses arena discipline is never violated mid-pass.
//!
//! Wiring calls are total: invalid parameters or empty regions abort
//! the single call and yield 0 synapses, with a warning, rather than
//! an error.

use crate::params::{ConnectionParams, ConnectivityPattern};
use ahash::AHashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use synaptica_neural::{
    sample_normal, IdAllocator, NeuronId, Region, RegionId, Synapse, WEIGHT_MAX, WEIGHT_MIN,
};
use tracing::{info, warn};

/// Neurons per module under the Modular pattern (ordinal partition).
const MODULE_SIZE: usize = 8;
/// Intra-module probability multiplier for Modular.
const MODULAR_INTRA_FACTOR: f32 = 4.0;
/// Inter-module probability multiplier for Modular.
const MODULAR_INTER_FACTOR: f32 = 0.1;

/// Cumulative wiring telemetry.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuilderStats {
    pub synapses_created: u64,
    pub pairs_considered: u64,
    pub fanout_rejections: u64,
    pub rejected_calls: u64,
}

#[derive(Debug)]
pub struct ConnectivityBuilder {
    rng: StdRng,
    stats: BuilderStats,
}

/// One planned edge, produced in the read phase.
struct PlannedSynapse {
    source: NeuronId,
    target: NeuronId,
    weight: f32,
    /// True when the edge runs target-region → source-region (inlined
    /// Reciprocal back-edge).
    reversed: bool,
}

impl Default for ConnectivityBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityBuilder {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            stats: BuilderStats::default(),
        }
    }

    /// Deterministic construction for tests and reproducible builds.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            stats: BuilderStats::default(),
        }
    }

    pub fn stats(&self) -> &BuilderStats {
        &self.stats
    }

    /// Wire `source` to `target` (distinct regions). Returns the number
    /// of synapses created; 0 on invalid parameters or empty regions.
    pub fn connect_regions(
        &mut self,
        source: &mut Region,
        target: &mut Region,
        params: &ConnectionParams,
        alloc: &mut IdAllocator,
    ) -> usize {
        self.connect_regions_inner(source, target, params, alloc, true)
    }

    /// Wire a region to itself. Lateral self-connections (same neuron)
    /// are always forbidden.
    pub fn connect_within(
        &mut self,
        region: &mut Region,
        params: &ConnectionParams,
        alloc: &mut IdAllocator,
    ) -> usize {
        if let Err(e) = params.validate() {
            warn!(target: "development", "rejected wiring call: {}", e);
            self.stats.rejected_calls += 1;
            return 0;
        }
        if region.neuron_count() == 0 {
            self.stats.rejected_calls += 1;
            return 0;
        }

        let ids = region.neuron_ids();
        let plan = self.plan_pairs(&ids, &ids, params);
        let mut created = 0;
        for edge in plan {
            if edge.source == edge.target {
                continue;
            }
            if region
                .connect_neurons(
                    edge.source,
                    edge.target,
                    edge.weight,
                    params.synapse_type,
                    params.plasticity_rule,
                    params.learning_rate,
                    alloc,
                )
                .is_ok()
            {
                created += 1;
            }
        }
        self.stats.synapses_created += created as u64;
        created
    }

    fn connect_regions_inner(
        &mut self,
        source: &mut Region,
        target: &mut Region,
        params: &ConnectionParams,
        alloc: &mut IdAllocator,
        allow_recursion: bool,
    ) -> usize {
        if let Err(e) = params.validate() {
            warn!(target: "development", "rejected wiring call: {}", e);
            self.stats.rejected_calls += 1;
            return 0;
        }
        if source.neuron_count() == 0 || target.neuron_count() == 0 {
            self.stats.rejected_calls += 1;
            return 0;
        }

        let src_ids = source.neuron_ids();
        let tgt_ids = target.neuron_ids();
        let plan = self.plan_pairs(&src_ids, &tgt_ids, params);

        // Apply phase: forward edges live in `source`'s arena, reversed
        // (Reciprocal) edges in `target`'s.
        let mut created = 0;
        for edge in plan {
            let (from, to) = if edge.reversed {
                (&mut *target, &mut *source)
            } else {
                (&mut *source, &mut *target)
            };
            let synapse = Synapse::new(
                alloc.next_synapse_id(),
                edge.source,
                edge.target,
                edge.weight,
                params.synapse_type,
                params.plasticity_rule,
                params.learning_rate,
            );
            let sid = synapse.id();
            if from.insert_outgoing_synapse(synapse, to.id()).is_ok()
                && to.register_incoming(sid, from.id(), edge.target).is_ok()
            {
                created += 1;
            }
        }
        self.stats.synapses_created += created as u64;

        // Automatic second pass, recursion disabled. Never applies to
        // Reciprocal, whose back-edges are inlined above.
        if params.bidirectional
            && allow_recursion
            && params.pattern != ConnectivityPattern::Reciprocal
        {
            created += self.connect_regions_inner(target, source, params, alloc, false);
        }
        created
    }

    /// Read phase: decide which pairs get a synapse and sample weights.
    fn plan_pairs(
        &mut self,
        src_ids: &[NeuronId],
        tgt_ids: &[NeuronId],
        params: &ConnectionParams,
    ) -> Vec<PlannedSynapse> {
        let mut plan = Vec::new();
        // Fan-out accounting covers edges planned in this call.
        let mut fanout: AHashMap<NeuronId, usize> = AHashMap::new();

        for (i, &s) in src_ids.iter().enumerate() {
            for (j, &t) in tgt_ids.iter().enumerate() {
                if s == t {
                    // Lateral forbids self-connections; for every other
                    // pattern the pair is meaningless anyway.
                    continue;
                }
                self.stats.pairs_considered += 1;

                let distance = (i as f32 - j as f32).abs();
                let base = params.base_probability
                    * params.distribution.probability(distance, params.sigma);
                let p = match params.pattern {
                    ConnectivityPattern::Dense => 1.0,
                    ConnectivityPattern::Modular if i / MODULE_SIZE == j / MODULE_SIZE => {
                        (base * MODULAR_INTRA_FACTOR).clamp(0.0, 1.0)
                    }
                    ConnectivityPattern::Modular => (base * MODULAR_INTER_FACTOR).clamp(0.0, 1.0),
                    _ => base.clamp(0.0, 1.0),
                };

                if self.rng.gen::<f32>() >= p {
                    continue;
                }

                let reciprocal = params.pattern == ConnectivityPattern::Reciprocal;
                if params.max_per_neuron > 0 {
                    // A reciprocal pair is all-or-nothing: if either
                    // direction would bust its cap, neither is planned.
                    let src_full = fanout.get(&s).copied().unwrap_or(0) >= params.max_per_neuron;
                    let tgt_full = reciprocal
                        && fanout.get(&t).copied().unwrap_or(0) >= params.max_per_neuron;
                    if src_full || tgt_full {
                        self.stats.fanout_rejections += 1;
                        continue;
                    }
                    *fanout.entry(s).or_insert(0) += 1;
                    if reciprocal {
                        *fanout.entry(t).or_insert(0) += 1;
                    }
                }

                let weight = sample_normal(&mut self.rng, params.weight_mean, params.weight_std)
                    .clamp(WEIGHT_MIN, WEIGHT_MAX);
                plan.push(PlannedSynapse {
                    source: s,
                    target: t,
                    weight,
                    reversed: false,
                });

                // Reciprocal inlines the back-edge with an independent
                // weight sample.
                if reciprocal {
                    let back_weight =
                        sample_normal(&mut self.rng, params.weight_mean, params.weight_std)
                            .clamp(WEIGHT_MIN, WEIGHT_MAX);
                    plan.push(PlannedSynapse {
                        source: t,
                        target: s,
                        weight: back_weight,
                        reversed: true,
                    });
                }
            }
        }
        plan
    }

    // ------------------------------------------------------------------
    // Multi-region helpers
    // ------------------------------------------------------------------

    /// Feedforward edges along `order`, plus Feedback edges in reverse
    /// with probability x0.3 and weight x0.7.
    pub fn build_cortical_hierarchy(
        &mut self,
        regions: &mut AHashMap<RegionId, Region>,
        order: &[RegionId],
        params: &ConnectionParams,
        alloc: &mut IdAllocator,
    ) -> usize {
        if params.validate().is_err() || !order.iter().all(|id| regions.contains_key(id)) {
            warn!(target: "development", "cortical hierarchy rejected: bad params or unknown region");
            self.stats.rejected_calls += 1;
            return 0;
        }

        let forward = ConnectionParams {
            pattern: ConnectivityPattern::Feedforward,
            ..params.clone()
        };
        let feedback = ConnectionParams {
            pattern: ConnectivityPattern::Feedback,
            base_probability: (params.base_probability * 0.3).clamp(0.0, 1.0),
            weight_mean: params.weight_mean * 0.7,
            ..params.clone()
        };

        let mut created = 0;
        for pair in order.windows(2) {
            created += self.connect_pair(regions, pair[0], pair[1], &forward, alloc);
            created += self.connect_pair(regions, pair[1], pair[0], &feedback, alloc);
        }
        info!(target: "development", "cortical hierarchy over {} regions: {} synapses", order.len(), created);
        created
    }

    /// Thalamus Feedforward to every cortical region; Feedback at halved
    /// probability back to the thalamus.
    pub fn build_thalamocortical(
        &mut self,
        regions: &mut AHashMap<RegionId, Region>,
        thalamus: RegionId,
        cortical: &[RegionId],
        params: &ConnectionParams,
        alloc: &mut IdAllocator,
    ) -> usize {
        let all_known =
            regions.contains_key(&thalamus) && cortical.iter().all(|id| regions.contains_key(id));
        if params.validate().is_err() || !all_known {
            warn!(target: "development", "thalamocortical wiring rejected: bad params or unknown region");
            self.stats.rejected_calls += 1;
            return 0;
        }

        let forward = ConnectionParams {
            pattern: ConnectivityPattern::Feedforward,
            ..params.clone()
        };
        let feedback = ConnectionParams {
            pattern: ConnectivityPattern::Feedback,
            base_probability: (params.base_probability * 0.5).clamp(0.0, 1.0),
            ..params.clone()
        };

        let mut created = 0;
        for &region in cortical {
            created += self.connect_pair(regions, thalamus, region, &forward, alloc);
            created += self.connect_pair(regions, region, thalamus, &feedback, alloc);
        }
        info!(target: "development", "thalamocortical wiring to {} regions: {} synapses", cortical.len(), created);
        created
    }

    /// Fully connected Reciprocal edges over a set of regions at
    /// probability x1.5 vs. base.
    pub fn build_limbic(
        &mut self,
        regions: &mut AHashMap<RegionId, Region>,
        members: &[RegionId],
        params: &ConnectionParams,
        alloc: &mut IdAllocator,
    ) -> usize {
        if params.validate().is_err() || !members.iter().all(|id| regions.contains_key(id)) {
            warn!(target: "development", "limbic wiring rejected: bad params or unknown region");
            self.stats.rejected_calls += 1;
            return 0;
        }

        let reciprocal = ConnectionParams {
            pattern: ConnectivityPattern::Reciprocal,
            base_probability: (params.base_probability * 1.5).clamp(0.0, 1.0),
            ..params.clone()
        };

        let mut created = 0;
        for (i, &a) in members.iter().enumerate() {
            for &b in &members[i + 1..] {
                created += self.connect_pair(regions, a, b, &reciprocal, alloc);
            }
        }
        info!(target: "development", "limbic wiring over {} regions: {} synapses", members.len(), created);
        created
    }

    /// Borrow two distinct regions out of the map and wire them.
    fn connect_pair(
        &mut self,
        regions: &mut AHashMap<RegionId, Region>,
        source: RegionId,
        target: RegionId,
        params: &ConnectionParams,
        alloc: &mut IdAllocator,
    ) -> usize {
        if source == target {
            return 0;
        }
        let Some(mut src) = regions.remove(&source) else {
            return 0;
        };
        let created = match regions.get_mut(&target) {
            Some(tgt) => self.connect_regions(&mut src, tgt, params, alloc),
            None => 0,
        };
        regions.insert(source, src);
        created
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::DistanceDistribution;
    use synaptica_neural::{ActivationPattern, RegionKind};

    fn make_region(alloc: &mut IdAllocator, neurons: usize) -> Region {
        let mut region = Region::new(
            alloc.next_region_id(),
            "r",
            RegionKind::Cortical,
            ActivationPattern::Synchronous,
        );
        region.create_neurons(neurons, alloc);
        region
    }

    fn dense_params() -> ConnectionParams {
        ConnectionParams {
            pattern: ConnectivityPattern::Dense,
            base_probability: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_dense_connects_all_pairs() {
        let mut alloc = IdAllocator::new();
        let mut a = make_region(&mut alloc, 3);
        let mut b = make_region(&mut alloc, 4);
        let mut builder = ConnectivityBuilder::with_seed(11);

        let created = builder.connect_regions(&mut a, &mut b, &dense_params(), &mut alloc);
        assert_eq!(created, 12);
        assert_eq!(a.synapse_count(), 12);
        assert_eq!(b.input_connections()[&a.id()].len(), 12);
        a.validate().unwrap();
    }

    #[test]
    fn test_invalid_params_create_nothing() {
        let mut alloc = IdAllocator::new();
        let mut a = make_region(&mut alloc, 3);
        let mut b = make_region(&mut alloc, 3);
        let mut builder = ConnectivityBuilder::with_seed(11);

        let params = ConnectionParams {
            base_probability: 2.0,
            ..Default::default()
        };
        assert_eq!(builder.connect_regions(&mut a, &mut b, &params, &mut alloc), 0);
        assert_eq!(a.synapse_count(), 0);
    }

    #[test]
    fn test_empty_region_creates_nothing() {
        let mut alloc = IdAllocator::new();
        let mut a = make_region(&mut alloc, 0);
        let mut b = make_region(&mut alloc, 5);
        let mut builder = ConnectivityBuilder::with_seed(11);
        assert_eq!(builder.connect_regions(&mut a, &mut b, &dense_params(), &mut alloc), 0);
    }

    #[test]
    fn test_fanout_cap_is_respected() {
        let mut alloc = IdAllocator::new();
        let mut a = make_region(&mut alloc, 2);
        let mut b = make_region(&mut alloc, 10);
        let mut builder = ConnectivityBuilder::with_seed(11);

        let params = ConnectionParams {
            max_per_neuron: 3,
            ..dense_params()
        };
        let created = builder.connect_regions(&mut a, &mut b, &params, &mut alloc);
        assert_eq!(created, 6);
        for n in a.neurons() {
            assert!(n.output_synapse_count() <= 3);
        }
        assert!(builder.stats().fanout_rejections > 0);
    }

    #[test]
    fn test_reciprocal_creates_matched_back_edges() {
        let mut alloc = IdAllocator::new();
        let mut a = make_region(&mut alloc, 4);
        let mut b = make_region(&mut alloc, 4);
        let mut builder = ConnectivityBuilder::with_seed(11);

        let params = ConnectionParams {
            pattern: ConnectivityPattern::Reciprocal,
            base_probability: 0.5,
            // Bidirectional must not double Reciprocal wiring.
            bidirectional: true,
            ..Default::default()
        };
        let created = builder.connect_regions(&mut a, &mut b, &params, &mut alloc);
        assert_eq!(created % 2, 0);
        assert_eq!(a.synapse_count() + b.synapse_count(), created);

        // Every forward edge has exactly one matching back edge.
        for synapse in a.synapses() {
            let back = b
                .synapses()
                .filter(|s| s.source() == synapse.target() && s.target() == synapse.source())
                .count();
            assert_eq!(back, 1);
        }
    }

    #[test]
    fn test_bidirectional_runs_exactly_one_extra_pass() {
        let mut alloc = IdAllocator::new();
        let mut a = make_region(&mut alloc, 3);
        let mut b = make_region(&mut alloc, 3);
        let mut builder = ConnectivityBuilder::with_seed(11);

        let params = ConnectionParams {
            bidirectional: true,
            ..dense_params()
        };
        let created = builder.connect_regions(&mut a, &mut b, &params, &mut alloc);
        assert_eq!(created, 18);
        assert_eq!(a.synapse_count(), 9);
        assert_eq!(b.synapse_count(), 9);
    }

    #[test]
    fn test_lateral_within_region_forbids_self_connections() {
        let mut alloc = IdAllocator::new();
        let mut region = make_region(&mut alloc, 5);
        let mut builder = ConnectivityBuilder::with_seed(11);

        let params = ConnectionParams {
            pattern: ConnectivityPattern::Lateral,
            distribution: DistanceDistribution::Gaussian,
            base_probability: 1.0,
            sigma: 100.0,
            ..Default::default()
        };
        builder.connect_within(&mut region, &params, &mut alloc);
        for synapse in region.synapses() {
            assert_ne!(synapse.source(), synapse.target());
        }
    }

    #[test]
    fn test_cortical_hierarchy_wires_both_directions() {
        let mut alloc = IdAllocator::new();
        let mut regions = AHashMap::new();
        let mut order = Vec::new();
        for _ in 0..3 {
            let region = make_region(&mut alloc, 4);
            order.push(region.id());
            regions.insert(region.id(), region);
        }
        let mut builder = ConnectivityBuilder::with_seed(11);

        let created =
            builder.build_cortical_hierarchy(&mut regions, &order, &dense_params(), &mut alloc);
        assert!(created > 0);
        // Forward edges from the first region toward the second exist.
        let first = &regions[&order[0]];
        assert!(first.output_connections().contains_key(&order[1]));
        // Feedback edges from the second back to the first exist too.
        let second = &regions[&order[1]];
        assert!(second.output_connections().contains_key(&order[0]));
    }

    #[test]
    fn test_hierarchy_with_unknown_region_is_rejected() {
        let mut alloc = IdAllocator::new();
        let mut regions = AHashMap::new();
        let region = make_region(&mut alloc, 4);
        let known = region.id();
        regions.insert(known, region);
        let mut builder = ConnectivityBuilder::with_seed(11);

        let created = builder.build_cortical_hierarchy(
            &mut regions,
            &[known, RegionId(999)],
            &dense_params(),
            &mut alloc,
        );
        assert_eq!(created, 0);
    }

    #[test]
    fn test_sampled_weights_stay_clamped() {
        let mut alloc = IdAllocator::new();
        let mut a = make_region(&mut alloc, 6);
        let mut b = make_region(&mut alloc, 6);
        let mut builder = ConnectivityBuilder::with_seed(11);

        let params = ConnectionParams {
            weight_mean: 1.9,
            weight_std: 1.0,
            ..dense_params()
        };
        builder.connect_regions(&mut a, &mut b, &params, &mut alloc);
        for synapse in a.synapses() {
            assert!(synapse.weight() >= WEIGHT_MIN && synapse.weight() <= WEIGHT_MAX);
        }
    }

    #[test]
    fn test_builder_tracks_created_synapses() {
        let mut alloc = IdAllocator::new();
        let mut a = make_region(&mut alloc, 3);
        let mut b = make_region(&mut alloc, 3);
        let mut builder = ConnectivityBuilder::with_seed(11);
        builder.connect_regions(&mut a, &mut b, &dense_params(), &mut alloc);
        assert_eq!(builder.stats().synapses_created, 9);
    }
}
