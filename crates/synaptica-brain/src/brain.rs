// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Brain
//!
//! The single orchestrator: owns the regions, the id allocator, the
//! learning engine and the connectivity builder. There is no process-wide
//! state; two brains in one process are fully independent.
//!
//! `process_step` is infallible by contract. Unknown ids, unresolvable
//! operands and other internal degradations are tallied in the
//! diagnostics counters and the tick completes best-effort.

use crate::modality::Modality;
use crate::stats::GlobalStatistics;
use ahash::AHashMap;
use synaptica_development::{
    export_connectome, import_connectome, ConnectionParams, ConnectivityBuilder,
    ConnectivityPattern, ConnectomeExport,
};
use synaptica_neural::{
    ActivationPattern, IdAllocator, NeuronId, Region, RegionId, RegionKind, RegionProcessContext,
    Result, SpikeRecord, SynapseId, SynapticaError,
};
use synaptica_plasticity::{LearningConfig, LearningEngine, LearningStats};
use tracing::{debug, info};

/// Region mean activation above which a region counts toward the
/// metabolic hazard figure.
const HAZARD_ACTIVATION: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrainState {
    Created,
    Initialized,
    Running,
    Stopped,
    Shutdown,
}

#[derive(Debug, Clone, Default)]
struct Diagnostics {
    unknown_modality_feeds: u64,
    empty_pattern_feeds: u64,
    unknown_region_lookups: u64,
    ticks_while_not_running: u64,
    tick_faults: u64,
    total_spikes: u64,
}

/// Opaque scalars and vectors accepted at the boundary for external
/// mimicry layers. Stored and returned, never consumed by the dynamics.
#[derive(Debug, Clone, Default)]
struct MimicryBridge {
    scalars: AHashMap<String, f32>,
    vectors: AHashMap<String, Vec<f32>>,
}

#[derive(Debug)]
pub struct Brain {
    state: BrainState,
    regions: AHashMap<RegionId, Region>,
    region_names: AHashMap<String, RegionId>,
    modality_map: AHashMap<Modality, RegionId>,
    alloc: IdAllocator,
    engine: LearningEngine,
    builder: ConnectivityBuilder,
    cycle: u64,
    clock_ms: f64,
    diagnostics: Diagnostics,
    bridge: MimicryBridge,
}

impl Brain {
    pub fn new(config: LearningConfig) -> Result<Self> {
        Ok(Self::assemble(LearningEngine::new(config)?, ConnectivityBuilder::new()))
    }

    /// Deterministic construction for tests and reproducible runs.
    pub fn with_seed(config: LearningConfig, seed: u64) -> Result<Self> {
        Ok(Self::assemble(
            LearningEngine::with_seed(config, seed)?,
            ConnectivityBuilder::with_seed(seed.wrapping_add(1)),
        ))
    }

    fn assemble(engine: LearningEngine, builder: ConnectivityBuilder) -> Self {
        Self {
            state: BrainState::Created,
            regions: AHashMap::new(),
            region_names: AHashMap::new(),
            modality_map: AHashMap::new(),
            alloc: IdAllocator::new(),
            engine,
            builder,
            cycle: 0,
            clock_ms: 0.0,
            diagnostics: Diagnostics::default(),
            bridge: MimicryBridge::default(),
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub fn state(&self) -> BrainState {
        self.state
    }

    fn ensure_not_shutdown(&self) -> Result<()> {
        if self.state == BrainState::Shutdown {
            return Err(SynapticaError::InvalidState("brain is shut down".into()));
        }
        Ok(())
    }

    pub fn initialize(&mut self) -> Result<()> {
        if self.state != BrainState::Created {
            return Err(SynapticaError::InvalidState(format!(
                "initialize from {:?}",
                self.state
            )));
        }
        for region in self.regions.values_mut() {
            region.set_initialized(true);
        }
        self.state = BrainState::Initialized;
        info!(target: "brain", "initialized with {} regions", self.regions.len());
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        match self.state {
            BrainState::Initialized | BrainState::Stopped => {
                self.state = BrainState::Running;
                Ok(())
            }
            other => Err(SynapticaError::InvalidState(format!("start from {:?}", other))),
        }
    }

    /// Observed at tick boundaries; an in-flight tick completes.
    pub fn stop(&mut self) -> Result<()> {
        match self.state {
            BrainState::Running => {
                self.state = BrainState::Stopped;
                Ok(())
            }
            other => Err(SynapticaError::InvalidState(format!("stop from {:?}", other))),
        }
    }

    pub fn shutdown(&mut self) {
        self.state = BrainState::Shutdown;
        info!(
            target: "brain",
            "shutdown after {} cycles, {} spikes",
            self.cycle, self.diagnostics.total_spikes
        );
    }

    // ------------------------------------------------------------------
    // Regions
    // ------------------------------------------------------------------

    pub fn create_region(
        &mut self,
        name: impl Into<String>,
        kind: RegionKind,
        pattern: ActivationPattern,
    ) -> Result<RegionId> {
        self.ensure_not_shutdown()?;
        let name = name.into();
        if self.region_names.contains_key(&name) {
            return Err(SynapticaError::InvalidArgument(format!(
                "duplicate region name '{}'",
                name
            )));
        }
        let id = self.alloc.next_region_id();
        let region = Region::new(id, name.clone(), kind, pattern);
        self.region_names.insert(name, id);
        self.regions.insert(id, region);
        Ok(id)
    }

    pub fn add_region(&mut self, region: Region) -> Result<RegionId> {
        self.ensure_not_shutdown()?;
        let id = region.id();
        if self.regions.contains_key(&id) {
            return Err(SynapticaError::InvalidArgument(format!("duplicate {}", id)));
        }
        self.alloc.reserve_region_id(id);
        self.region_names.insert(region.name().to_string(), id);
        self.regions.insert(id, region);
        Ok(id)
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(&id)
    }

    pub fn region_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.regions.get_mut(&id)
    }

    pub fn region_by_name(&self, name: &str) -> Result<&Region> {
        let id = self
            .region_names
            .get(name)
            .ok_or_else(|| SynapticaError::RegionNameNotFound(name.to_string()))?;
        self.regions
            .get(id)
            .ok_or(SynapticaError::RegionNotFound(*id))
    }

    pub fn regions(&self) -> &AHashMap<RegionId, Region> {
        &self.regions
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn create_neurons(&mut self, region: RegionId, count: usize) -> Result<Vec<NeuronId>> {
        self.ensure_not_shutdown()?;
        let r = self
            .regions
            .get_mut(&region)
            .ok_or(SynapticaError::RegionNotFound(region))?;
        Ok(r.create_neurons(count, &mut self.alloc))
    }

    pub fn map_modality(&mut self, modality: Modality, region: RegionId) -> Result<()> {
        if !self.regions.contains_key(&region) {
            return Err(SynapticaError::RegionNotFound(region));
        }
        self.modality_map.insert(modality, region);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Wiring
    // ------------------------------------------------------------------

    /// Thin wrapper over the builder with a Sparse default. The weight
    /// range maps onto a Normal centered in the range with the range as
    /// a +/-3 sigma envelope.
    pub fn connect_regions(
        &mut self,
        source: RegionId,
        target: RegionId,
        probability: f32,
        weight_range: (f32, f32),
    ) -> usize {
        let (lo, hi) = weight_range;
        let params = ConnectionParams {
            pattern: ConnectivityPattern::Sparse,
            base_probability: probability,
            weight_mean: (lo + hi) * 0.5,
            weight_std: ((hi - lo).abs() / 6.0).max(0.0),
            ..Default::default()
        };
        self.connect_regions_with(source, target, &params)
    }

    /// Full-parameter wiring between two registered regions.
    pub fn connect_regions_with(
        &mut self,
        source: RegionId,
        target: RegionId,
        params: &ConnectionParams,
    ) -> usize {
        if source == target {
            return match self.regions.get_mut(&source) {
                Some(region) => self.builder.connect_within(region, params, &mut self.alloc),
                None => {
                    self.diagnostics.unknown_region_lookups += 1;
                    0
                }
            };
        }
        let Some(mut src) = self.regions.remove(&source) else {
            self.diagnostics.unknown_region_lookups += 1;
            return 0;
        };
        let created = match self.regions.get_mut(&target) {
            Some(tgt) => self
                .builder
                .connect_regions(&mut src, tgt, params, &mut self.alloc),
            None => {
                self.diagnostics.unknown_region_lookups += 1;
                0
            }
        };
        self.regions.insert(source, src);
        created
    }

    /// Create a single intra-region synapse. Test scaffolding and
    /// fine-grained construction both go through here.
    #[allow(clippy::too_many_arguments)]
    pub fn connect_neurons(
        &mut self,
        region: RegionId,
        source: NeuronId,
        target: NeuronId,
        weight: f32,
        synapse_type: synaptica_neural::SynapseType,
        rule: synaptica_neural::PlasticityRule,
        learning_rate: f32,
    ) -> Result<SynapseId> {
        let r = self
            .regions
            .get_mut(&region)
            .ok_or(SynapticaError::RegionNotFound(region))?;
        r.connect_neurons(source, target, weight, synapse_type, rule, learning_rate, &mut self.alloc)
    }

    pub fn builder_mut(&mut self) -> &mut ConnectivityBuilder {
        &mut self.builder
    }

    pub fn allocator_mut(&mut self) -> &mut IdAllocator {
        &mut self.alloc
    }

    // ------------------------------------------------------------------
    // Inbound boundary
    // ------------------------------------------------------------------

    /// Drive the region bound to `modality` with a pattern. Values are
    /// clamped into [0, 1]; an unbound modality or empty vector is a
    /// counted no-op.
    pub fn feed_pattern(&mut self, modality: Modality, pattern: &[f32]) {
        let Some(&region_id) = self.modality_map.get(&modality) else {
            self.diagnostics.unknown_modality_feeds += 1;
            return;
        };
        if pattern.is_empty() {
            self.diagnostics.empty_pattern_feeds += 1;
            return;
        }
        let Some(region) = self.regions.get_mut(&region_id) else {
            self.diagnostics.unknown_region_lookups += 1;
            return;
        };
        for (i, neuron) in region.neurons_mut().iter_mut().enumerate() {
            neuron.set_activation(pattern[i % pattern.len()]);
        }
        debug!(target: "brain", "fed {} values into {} via {}", pattern.len(), region_id, modality);
    }

    /// Accept a reward scalar. `source` and `context` are opaque to the
    /// core and only logged.
    pub fn deliver_reward(&mut self, value: f32, source: &str, context: &str) {
        info!(target: "brain", reward = value, source, context, "reward delivered");
        self.engine.apply_reward(value);
    }

    // ------------------------------------------------------------------
    // Tick loop
    // ------------------------------------------------------------------

    /// Advance the substrate one tick of `dt` seconds. Infallible: ticks
    /// on a non-running brain and internal degradations are counted, not
    /// raised.
    pub fn process_step(&mut self, dt: f64) {
        if self.state != BrainState::Running {
            self.diagnostics.ticks_while_not_running += 1;
            return;
        }
        self.clock_ms += dt * 1000.0;
        self.cycle += 1;
        let now_ms = self.clock_ms;

        // Deterministic region order regardless of map iteration.
        let mut region_ids: Vec<RegionId> = self.regions.keys().copied().collect();
        region_ids.sort_by_key(|r| r.0);

        // Phase 1: aggregate cross-region input from the pre-tick state.
        let external = self.collect_external_input();
        let empty = AHashMap::new();

        // Phase 2: integrate every region.
        let mut spikes: Vec<SpikeRecord> = Vec::new();
        for &id in &region_ids {
            let input = external.get(&id).unwrap_or(&empty);
            match self.regions.get_mut(&id) {
                Some(region) => spikes.extend(region.process(RegionProcessContext {
                    now_ms,
                    dt,
                    external_input: input,
                })),
                None => self.diagnostics.tick_faults += 1,
            }
        }

        // Phase 3: spike times precede any plastic update derived from
        // them.
        for spike in &spikes {
            self.engine.record_spike(spike.neuron, spike.at_ms);
        }
        self.diagnostics.total_spikes += spikes.len() as u64;

        let activations = self.activation_snapshot();

        // Phase 4: synthetic eligibility events.
        if self.engine.config().auto_eligibility {
            for &id in &region_ids {
                if let Some(region) = self.regions.get_mut(&id) {
                    self.engine.accumulate_eligibility(region, &activations);
                }
            }
        }

        // Phase 5: pending reward, distributed no later than this tick's
        // plasticity pass.
        if self.engine.pending_reward() != 0.0 {
            for &id in &region_ids {
                if let Some(region) = self.regions.get_mut(&id) {
                    self.engine.distribute_reward(region);
                }
            }
            self.engine.finish_reward_distribution();
        }

        // Phase 6: cadence'd plasticity. Homeostasis and decay run after
        // Hebbian/STDP; the Hebbian/decay order is configurable.
        let config = self.engine.config().clone();
        let on_cadence =
            config.plasticity_interval_steps > 0 && self.cycle % config.plasticity_interval_steps == 0;
        if on_cadence {
            self.engine.begin_plasticity_pass(now_ms);
            self.engine.maybe_begin_consolidation(now_ms);
            for &id in &region_ids {
                if let Some(region) = self.regions.get_mut(&id) {
                    if config.decay_before_hebbian {
                        self.engine.decay_pass(region);
                    }
                    self.engine.hebbian_pass(region, config.hebbian_rate, &activations);
                    self.engine.stdp_pass(region);
                    self.engine.homeostasis_pass(region);
                    if !config.decay_before_hebbian {
                        self.engine.decay_pass(region);
                    }
                }
            }
            // Spike pairs drive STDP once; a stale pair must not keep
            // re-applying the same update on later passes.
            self.engine.finish_plasticity_pass();
        }
        // Eligibility decays every tick, events or not.
        for &id in &region_ids {
            if let Some(region) = self.regions.get_mut(&id) {
                self.engine.decay_eligibility(region);
            }
        }
        self.engine.end_tick();

        if config.structural_interval_steps > 0
            && self.cycle % config.structural_interval_steps == 0
        {
            self.engine.structural_cycle(&mut self.regions, &mut self.alloc);
        }
    }

    /// Contribution of every valid cross-region synapse, grouped by
    /// target region then target neuron.
    fn collect_external_input(&self) -> AHashMap<RegionId, AHashMap<NeuronId, f32>> {
        let mut external: AHashMap<RegionId, AHashMap<NeuronId, f32>> = AHashMap::new();
        for region in self.regions.values() {
            for (&target_region, ids) in region.output_connections() {
                for &sid in ids {
                    let Some(synapse) = region.synapse(sid) else {
                        continue;
                    };
                    if !synapse.is_valid() {
                        continue;
                    }
                    let Some(pre) = region.neuron(synapse.source()) else {
                        continue;
                    };
                    *external
                        .entry(target_region)
                        .or_default()
                        .entry(synapse.target())
                        .or_insert(0.0) += synapse.contribution(pre.activation());
                }
            }
        }
        external
    }

    /// Activation of every neuron in the substrate, for cross-region
    /// endpoint resolution in learning passes.
    fn activation_snapshot(&self) -> AHashMap<NeuronId, f32> {
        let mut snapshot = AHashMap::new();
        for region in self.regions.values() {
            for neuron in region.neurons() {
                snapshot.insert(neuron.id(), neuron.activation());
            }
        }
        snapshot
    }

    // ------------------------------------------------------------------
    // Learning passthroughs
    // ------------------------------------------------------------------

    pub fn apply_hebbian_learning(&mut self, region: RegionId, rate: f32) -> Result<usize> {
        let activations = self.activation_snapshot();
        let r = self
            .regions
            .get_mut(&region)
            .ok_or(SynapticaError::RegionNotFound(region))?;
        Ok(self.engine.hebbian_pass(r, rate, &activations))
    }

    pub fn apply_stdp(&mut self, region: RegionId) -> Result<usize> {
        let r = self
            .regions
            .get_mut(&region)
            .ok_or(SynapticaError::RegionNotFound(region))?;
        Ok(self.engine.stdp_pass(r))
    }

    pub fn note_pre_post(
        &mut self,
        region: RegionId,
        synapse: SynapseId,
        pre: f32,
        post: f32,
    ) -> Result<()> {
        let r = self
            .regions
            .get_mut(&region)
            .ok_or(SynapticaError::RegionNotFound(region))?;
        self.engine.note_pre_post(r, synapse, pre, post)
    }

    pub fn record_spike(&mut self, neuron: NeuronId, at_ms: f64) {
        self.engine.record_spike(neuron, at_ms);
    }

    pub fn apply_attention_modulation(
        &mut self,
        map: impl IntoIterator<Item = (NeuronId, f32)>,
        base_boost: f32,
    ) {
        self.engine
            .apply_attention_modulation(map.into_iter().collect(), base_boost);
    }

    pub fn compute_shaped_reward(
        &mut self,
        obs: &[f32],
        task_reward: f32,
    ) -> f32 {
        let mut region_acts: Vec<(RegionId, f32)> = self
            .regions
            .values()
            .map(|r| (r.id(), r.global_activation()))
            .collect();
        region_acts.sort_by_key(|(id, _)| id.0);
        let acts: Vec<f32> = region_acts.into_iter().map(|(_, a)| a).collect();
        self.engine.compute_shaped_reward(obs, &acts, task_reward)
    }

    /// Prune weak synapses across every region, keeping cross-region
    /// bookkeeping consistent. Returns the number pruned.
    pub fn prune_weak_synapses(&mut self, threshold: f32) -> usize {
        let mut pruned = 0;
        let mut remote = Vec::new();
        for region in self.regions.values_mut() {
            let outcome = region.prune_weak_synapses(threshold);
            pruned += outcome.pruned;
            for (target_region, target, sid) in outcome.cross_region {
                remote.push((region.id(), target_region, target, sid));
            }
        }
        for (source_region, target_region, target, sid) in remote {
            if let Some(region) = self.regions.get_mut(&target_region) {
                region.unregister_incoming(sid, source_region, target);
            }
        }
        pruned
    }

    pub fn learning_statistics(&self) -> &LearningStats {
        self.engine.stats()
    }

    pub fn learning_engine(&self) -> &LearningEngine {
        &self.engine
    }

    // ------------------------------------------------------------------
    // Connectome
    // ------------------------------------------------------------------

    pub fn export_connectome(&self) -> ConnectomeExport {
        export_connectome(&self.regions)
    }

    /// Replace the substrate with one rebuilt from an export. Existing
    /// regions are discarded; modality bindings are cleared.
    pub fn import_connectome(&mut self, export: &ConnectomeExport) -> Result<()> {
        self.ensure_not_shutdown()?;
        let rebuilt = import_connectome(export, &mut self.alloc)?;
        self.region_names = rebuilt
            .values()
            .map(|r| (r.name().to_string(), r.id()))
            .collect();
        self.modality_map.clear();
        self.regions = rebuilt;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mimicry bridge
    // ------------------------------------------------------------------

    pub fn set_bridge_scalar(&mut self, key: impl Into<String>, value: f32) {
        self.bridge.scalars.insert(key.into(), value);
    }

    pub fn bridge_scalar(&self, key: &str) -> Option<f32> {
        self.bridge.scalars.get(key).copied()
    }

    pub fn set_bridge_vector(&mut self, key: impl Into<String>, value: Vec<f32>) {
        self.bridge.vectors.insert(key.into(), value);
    }

    pub fn bridge_vector(&self, key: &str) -> Option<&[f32]> {
        self.bridge.vectors.get(key).map(|v| v.as_slice())
    }

    // ------------------------------------------------------------------
    // Telemetry
    // ------------------------------------------------------------------

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn global_statistics(&self) -> GlobalStatistics {
        let learning = self.engine.stats().clone();
        let region_count = self.regions.len();
        let neuron_count = self.regions.values().map(|r| r.neuron_count()).sum();
        let active_synapse_count = self.regions.values().map(|r| r.synapse_count()).sum();
        let mean_energy = if region_count == 0 {
            0.0
        } else {
            self.regions.values().map(|r| r.global_activation()).sum::<f32>() / region_count as f32
        };
        let hazardous = self
            .regions
            .values()
            .filter(|r| r.global_activation() > HAZARD_ACTIVATION)
            .count();
        let metabolic_hazard = if region_count == 0 {
            0.0
        } else {
            hazardous as f32 / region_count as f32
        };

        let bridge = |key: &str| self.bridge.scalars.get(key).copied().unwrap_or(0.0);
        let novelty = learning.last_novelty;

        GlobalStatistics {
            cycles: self.cycle,
            clock_ms: self.clock_ms,
            region_count,
            neuron_count,
            active_synapse_count,
            total_spikes: self.diagnostics.total_spikes,
            mean_energy,
            metabolic_hazard,
            uncertainty: bridge("uncertainty"),
            surprise: bridge("surprise"),
            prediction_error: bridge("prediction_error"),
            intrinsic_motivation: bridge("intrinsic_motivation"),
            mean_substrate_novelty: novelty,
            mean_substrate_similarity: (1.0 - novelty).clamp(0.0, 1.0),
            competence: self.engine.competence(),
            unknown_modality_feeds: self.diagnostics.unknown_modality_feeds,
            empty_pattern_feeds: self.diagnostics.empty_pattern_feeds,
            unknown_region_lookups: self.diagnostics.unknown_region_lookups,
            ticks_while_not_running: self.diagnostics.ticks_while_not_running,
            tick_faults: self.diagnostics.tick_faults,
            learning,
        }
    }

    /// Arena-invariant check over every region.
    pub fn validate(&self) -> Result<()> {
        for region in self.regions.values() {
            region.validate()?;
        }
        Ok(())
    }
}
