// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Region
//!
//! A region owns a set of neurons and the synapse arena for every synapse
//! whose **source** neuron lives here (internal and outgoing alike). Synapses
//! targeting neurons in other regions are mirrored in per-region bookkeeping
//! maps on both sides; the bookkeeping never owns.
//!
//! Cross-region *incoming* activation is not resolved here: the orchestrator
//! aggregates it per target neuron and hands it to [`Region::process`] as
//! external input. A synapse id in a neuron's input list that does not
//! resolve in the local arena is therefore simply skipped.
//!
//! ## Activation patterns
//!
//! - `Asynchronous`: each neuron integrates against the others' live
//!   activations; within-tick dynamics are order-dependent.
//! - `Synchronous`: two-phase read-then-write against a snapshot; result is
//!   independent of neuron iteration order.
//! - `Oscillatory`: a region-local phase modulates the effective threshold.
//! - `Competitive`: synchronous integration, then winner-take-all over the
//!   top-k active neurons.
//! - `Layered`: neurons are partitioned into ordered layers; each layer sees
//!   the updated activations of earlier layers within the same tick.

use crate::neuron::{Neuron, ACTIVE_THRESHOLD};
use crate::synapse::{PlasticityRule, Synapse, SynapseType};
use crate::types::{IdAllocator, NeuronId, RegionId, Result, SynapseId, SynapticaError};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Oscillatory threshold modulation frequency (Hz).
const OSCILLATION_FREQ_HZ: f64 = 8.0;

/// Oscillatory threshold modulation depth.
const OSCILLATION_DEPTH: f32 = 0.2;

/// Region type tag. Replaces a subtype hierarchy: behavior differences live
/// in the activation pattern, not in the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Cortical,
    Subcortical,
    Thalamic,
    Limbic,
    Custom,
}

impl std::fmt::Display for RegionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RegionKind::Cortical => "cortical",
            RegionKind::Subcortical => "subcortical",
            RegionKind::Thalamic => "thalamic",
            RegionKind::Limbic => "limbic",
            RegionKind::Custom => "custom",
        };
        write!(f, "{}", s)
    }
}

/// Order/style of neuron updates within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationPattern {
    Asynchronous,
    Synchronous,
    Oscillatory,
    Competitive,
    Layered,
}

/// A spike observed during region processing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeRecord {
    pub neuron: NeuronId,
    pub at_ms: f64,
}

/// Per-tick context handed to [`Region::process`] by the orchestrator.
#[derive(Debug, Clone, Copy)]
pub struct RegionProcessContext<'a> {
    /// Monotonic wall clock in milliseconds.
    pub now_ms: f64,
    /// Tick duration in seconds.
    pub dt: f64,
    /// Aggregated cross-region input per target neuron.
    pub external_input: &'a AHashMap<NeuronId, f32>,
}

/// Outcome of a pruning pass.
///
/// Cross-region retirements are reported so the orchestrator can detach the
/// target side (the target neuron's input list lives in another region).
#[derive(Debug, Clone, Default)]
pub struct PruneOutcome {
    pub pruned: usize,
    pub cross_region: Vec<(RegionId, NeuronId, SynapseId)>,
}

/// A region of neurons with its source-resident synapse arena.
#[derive(Debug, Clone)]
pub struct Region {
    id: RegionId,
    name: String,
    kind: RegionKind,
    pattern: ActivationPattern,
    active: bool,
    initialized: bool,

    neurons: Vec<Neuron>,
    neuron_index: AHashMap<NeuronId, usize>,

    synapses: Vec<Synapse>,
    synapse_index: AHashMap<SynapseId, usize>,

    /// target region -> synapses sourced here (mirror, not ownership).
    output_connections: AHashMap<RegionId, Vec<SynapseId>>,
    /// source region -> synapses targeting neurons here (ids only).
    input_connections: AHashMap<RegionId, Vec<SynapseId>>,

    oscillation_phase: f64,
    competitive_k: usize,
    layer_count: usize,
}

impl Region {
    pub fn new(id: RegionId, name: impl Into<String>, kind: RegionKind, pattern: ActivationPattern) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            pattern,
            active: true,
            initialized: true,
            neurons: Vec::new(),
            neuron_index: AHashMap::new(),
            synapses: Vec::new(),
            synapse_index: AHashMap::new(),
            output_connections: AHashMap::new(),
            input_connections: AHashMap::new(),
            oscillation_phase: 0.0,
            competitive_k: 1,
            layer_count: 1,
        }
    }

    #[inline]
    pub fn id(&self) -> RegionId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    #[inline]
    pub fn pattern(&self) -> ActivationPattern {
        self.pattern
    }

    pub fn set_pattern(&mut self, pattern: ActivationPattern) {
        self.pattern = pattern;
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn set_initialized(&mut self, initialized: bool) {
        self.initialized = initialized;
    }

    /// Winner count for the Competitive pattern.
    pub fn set_competitive_k(&mut self, k: usize) {
        self.competitive_k = k.max(1);
    }

    /// Layer count for the Layered pattern (contiguous partition in
    /// insertion order).
    pub fn set_layer_count(&mut self, layers: usize) {
        self.layer_count = layers.max(1);
    }

    // ------------------------------------------------------------------
    // Neurons
    // ------------------------------------------------------------------

    pub fn neuron_count(&self) -> usize {
        self.neurons.len()
    }

    pub fn contains_neuron(&self, id: NeuronId) -> bool {
        self.neuron_index.contains_key(&id)
    }

    pub fn neuron(&self, id: NeuronId) -> Option<&Neuron> {
        self.neuron_index.get(&id).map(|&i| &self.neurons[i])
    }

    pub fn neuron_mut(&mut self, id: NeuronId) -> Option<&mut Neuron> {
        match self.neuron_index.get(&id) {
            Some(&i) => Some(&mut self.neurons[i]),
            None => None,
        }
    }

    /// Resident neurons in insertion order.
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn neurons_mut(&mut self) -> &mut [Neuron] {
        &mut self.neurons
    }

    pub fn neuron_ids(&self) -> Vec<NeuronId> {
        self.neurons.iter().map(|n| n.id()).collect()
    }

    /// Ordinal of a neuron in this region's insertion order. Used as the
    /// id-based distance proxy by the connectivity builder.
    pub fn neuron_ordinal(&self, id: NeuronId) -> Option<usize> {
        self.neuron_index.get(&id).copied()
    }

    pub fn add_neuron(&mut self, neuron: Neuron) -> Result<()> {
        if neuron.region() != self.id {
            return Err(SynapticaError::InvalidArgument(format!(
                "neuron {} belongs to {}, not {}",
                neuron.id(),
                neuron.region(),
                self.id
            )));
        }
        if self.neuron_index.contains_key(&neuron.id()) {
            return Err(SynapticaError::InvalidArgument(format!(
                "duplicate neuron {}",
                neuron.id()
            )));
        }
        self.neuron_index.insert(neuron.id(), self.neurons.len());
        self.neurons.push(neuron);
        Ok(())
    }

    /// Create `count` fresh neurons inside this region.
    pub fn create_neurons(&mut self, count: usize, alloc: &mut IdAllocator) -> Vec<NeuronId> {
        self.neurons.reserve(count);
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let id = alloc.next_neuron_id();
            self.neuron_index.insert(id, self.neurons.len());
            self.neurons.push(Neuron::new(id, self.id));
            ids.push(id);
        }
        ids
    }

    /// Mean activation over resident neurons.
    pub fn global_activation(&self) -> f32 {
        if self.neurons.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.neurons.iter().map(|n| n.activation()).sum();
        sum / self.neurons.len() as f32
    }

    // ------------------------------------------------------------------
    // Synapses
    // ------------------------------------------------------------------

    /// Valid synapses in the local arena (internal + outgoing).
    pub fn synapse_count(&self) -> usize {
        self.synapses.iter().filter(|s| s.is_valid()).count()
    }

    /// Valid synapses whose both endpoints are resident.
    pub fn internal_synapse_count(&self) -> usize {
        self.synapses
            .iter()
            .filter(|s| s.is_valid() && self.neuron_index.contains_key(&s.target()))
            .count()
    }

    pub fn synapse(&self, id: SynapseId) -> Option<&Synapse> {
        self.synapse_index.get(&id).map(|&i| &self.synapses[i])
    }

    pub fn synapse_mut(&mut self, id: SynapseId) -> Option<&mut Synapse> {
        match self.synapse_index.get(&id) {
            Some(&i) => Some(&mut self.synapses[i]),
            None => None,
        }
    }

    /// Iterate all valid arena synapses (internal + outgoing).
    pub fn synapses(&self) -> impl Iterator<Item = &Synapse> {
        self.synapses.iter().filter(|s| s.is_valid())
    }

    pub fn synapses_mut(&mut self) -> impl Iterator<Item = &mut Synapse> {
        self.synapses.iter_mut().filter(|s| s.is_valid())
    }

    /// Valid internal synapses (both endpoints resident).
    pub fn internal_synapses(&self) -> impl Iterator<Item = &Synapse> {
        self.synapses
            .iter()
            .filter(move |s| s.is_valid() && self.neuron_index.contains_key(&s.target()))
    }

    /// Bookkeeping: target region -> synapse ids sourced here.
    pub fn output_connections(&self) -> &AHashMap<RegionId, Vec<SynapseId>> {
        &self.output_connections
    }

    /// Bookkeeping: source region -> synapse ids targeting neurons here.
    pub fn input_connections(&self) -> &AHashMap<RegionId, Vec<SynapseId>> {
        &self.input_connections
    }

    /// All (peer region, synapse id) pairs this region participates in,
    /// outgoing and incoming.
    pub fn inter_region_connections(&self) -> Vec<(RegionId, SynapseId)> {
        let mut out = Vec::new();
        for (region, ids) in &self.output_connections {
            out.extend(ids.iter().map(|&s| (*region, s)));
        }
        for (region, ids) in &self.input_connections {
            out.extend(ids.iter().map(|&s| (*region, s)));
        }
        out
    }

    /// Create an internal synapse and register it with both endpoints.
    ///
    /// Fails if either id is not resident in this region.
    pub fn connect_neurons(
        &mut self,
        source: NeuronId,
        target: NeuronId,
        weight: f32,
        synapse_type: SynapseType,
        rule: PlasticityRule,
        learning_rate: f32,
        alloc: &mut IdAllocator,
    ) -> Result<SynapseId> {
        if !self.neuron_index.contains_key(&source) {
            return Err(SynapticaError::NeuronNotFound(source));
        }
        if !self.neuron_index.contains_key(&target) {
            return Err(SynapticaError::NeuronNotFound(target));
        }

        let id = alloc.next_synapse_id();
        let synapse = Synapse::new(id, source, target, weight, synapse_type, rule, learning_rate);
        self.synapse_index.insert(id, self.synapses.len());
        self.synapses.push(synapse);

        // Arena holds the edge once; endpoints reference it by id.
        if let Some(n) = self.neuron_mut(source) {
            n.add_output_synapse(id);
        }
        if let Some(n) = self.neuron_mut(target) {
            n.add_input_synapse(id);
        }
        Ok(id)
    }

    /// Insert an already-constructed synapse sourced in this region but
    /// targeting another region. Registers the source side; the caller
    /// registers the target side via [`Region::register_incoming`].
    pub fn insert_outgoing_synapse(&mut self, synapse: Synapse, target_region: RegionId) -> Result<()> {
        let source = synapse.source();
        if !self.neuron_index.contains_key(&source) {
            return Err(SynapticaError::NeuronNotFound(source));
        }
        let id = synapse.id();
        self.synapse_index.insert(id, self.synapses.len());
        self.synapses.push(synapse);
        if let Some(n) = self.neuron_mut(source) {
            n.add_output_synapse(id);
        }
        self.output_connections.entry(target_region).or_default().push(id);
        Ok(())
    }

    /// Record the target side of a cross-region synapse: the target neuron's
    /// input list plus the input bookkeeping map. Storage stays with the
    /// source region.
    pub fn register_incoming(
        &mut self,
        synapse: SynapseId,
        source_region: RegionId,
        target: NeuronId,
    ) -> Result<()> {
        if !self.neuron_index.contains_key(&target) {
            return Err(SynapticaError::NeuronNotFound(target));
        }
        if let Some(n) = self.neuron_mut(target) {
            n.add_input_synapse(synapse);
        }
        self.input_connections.entry(source_region).or_default().push(synapse);
        Ok(())
    }

    /// Drop a retired incoming synapse from the target-side bookkeeping.
    pub fn unregister_incoming(&mut self, synapse: SynapseId, source_region: RegionId, target: NeuronId) {
        if let Some(n) = self.neuron_mut(target) {
            n.remove_input_synapse(synapse);
        }
        if let Some(ids) = self.input_connections.get_mut(&source_region) {
            ids.retain(|&s| s != synapse);
            if ids.is_empty() {
                self.input_connections.remove(&source_region);
            }
        }
    }

    /// True if a valid edge source→target already exists in the arena.
    pub fn has_edge(&self, source: NeuronId, target: NeuronId) -> bool {
        match self.neuron(source) {
            Some(n) => n.output_synapses().iter().any(|sid| {
                self.synapse(*sid)
                    .map(|s| s.is_valid() && s.target() == target)
                    .unwrap_or(false)
            }),
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Structural plasticity
    // ------------------------------------------------------------------

    /// Mark synapses with |weight| < threshold invalid and detach them from
    /// resident endpoints. Cross-region retirements are returned so the
    /// orchestrator can detach the remote target side.
    pub fn prune_weak_synapses(&mut self, threshold: f32) -> PruneOutcome {
        let mut outcome = PruneOutcome::default();
        let mut retired: Vec<(SynapseId, NeuronId, NeuronId)> = Vec::new();

        for synapse in self.synapses.iter_mut() {
            if synapse.is_valid() && synapse.weight().abs() < threshold {
                synapse.invalidate();
                retired.push((synapse.id(), synapse.source(), synapse.target()));
            }
        }

        for (sid, source, target) in retired {
            if let Some(n) = self.neuron_mut(source) {
                n.remove_output_synapse(sid);
            }
            if let Some(n) = self.neuron_mut(target) {
                n.remove_input_synapse(sid);
            } else {
                // Target lives elsewhere; report for remote detachment.
                let mut target_region = None;
                for (region, ids) in self.output_connections.iter_mut() {
                    if ids.iter().any(|&s| s == sid) {
                        ids.retain(|&s| s != sid);
                        target_region = Some(*region);
                        break;
                    }
                }
                if let Some(region) = target_region {
                    outcome.cross_region.push((region, target, sid));
                }
            }
            outcome.pruned += 1;
        }

        self.output_connections.retain(|_, ids| !ids.is_empty());

        if outcome.pruned > 0 {
            debug!(
                target: "neural",
                "Region {} pruned {} synapses below {}",
                self.id, outcome.pruned, threshold
            );
        }
        outcome
    }

    /// Add up to `batch` intra-region synapses between active neuron pairs
    /// lacking a direct edge. Weights come from the caller's sampler so the
    /// region itself stays free of RNG state.
    pub fn grow_synapses(
        &mut self,
        batch: usize,
        alloc: &mut IdAllocator,
        mut weight_sampler: impl FnMut() -> f32,
    ) -> usize {
        if batch == 0 || self.neurons.len() < 2 {
            return 0;
        }

        let active: Vec<NeuronId> = self
            .neurons
            .iter()
            .filter(|n| n.activation() > ACTIVE_THRESHOLD)
            .map(|n| n.id())
            .collect();

        let mut created = 0;
        'outer: for &src in &active {
            for &tgt in &active {
                if src == tgt || self.has_edge(src, tgt) {
                    continue;
                }
                let weight = weight_sampler();
                if self
                    .connect_neurons(
                        src,
                        tgt,
                        weight,
                        SynapseType::Excitatory,
                        PlasticityRule::Hebbian,
                        0.01,
                        alloc,
                    )
                    .is_ok()
                {
                    created += 1;
                    if created >= batch {
                        break 'outer;
                    }
                }
            }
        }
        created
    }

    // ------------------------------------------------------------------
    // Processing
    // ------------------------------------------------------------------

    /// Advance every resident neuron one tick according to the region's
    /// activation pattern. No-op on an uninitialized or inactive region.
    pub fn process(&mut self, ctx: RegionProcessContext<'_>) -> Vec<SpikeRecord> {
        if !self.initialized || !self.active || self.neurons.is_empty() {
            return Vec::new();
        }

        match self.pattern {
            ActivationPattern::Asynchronous => self.process_sequential(ctx, None),
            ActivationPattern::Synchronous => {
                let snapshot = self.activation_snapshot();
                self.process_two_phase(ctx, &snapshot, 1.0)
            }
            ActivationPattern::Oscillatory => {
                self.oscillation_phase += ctx.dt * OSCILLATION_FREQ_HZ * std::f64::consts::TAU;
                let modulation = 1.0 + OSCILLATION_DEPTH * self.oscillation_phase.sin() as f32;
                self.process_sequential(ctx, Some(modulation))
            }
            ActivationPattern::Competitive => {
                // Competition re-evaluates winners every tick.
                for n in self.neurons.iter_mut() {
                    n.set_inhibited(false);
                }
                let snapshot = self.activation_snapshot();
                let spikes = self.process_two_phase(ctx, &snapshot, 1.0);
                self.apply_winner_take_all();
                spikes
            }
            ActivationPattern::Layered => self.process_layered(ctx),
        }
    }

    fn activation_snapshot(&self) -> Vec<f32> {
        self.neurons.iter().map(|n| n.activation()).collect()
    }

    /// Summed input for neuron at index `i`: local arena synapses plus the
    /// orchestrator-aggregated external input. Unresolvable or invalid
    /// synapses are silently skipped.
    fn synaptic_input_for(
        &self,
        i: usize,
        snapshot: Option<&[f32]>,
        external: &AHashMap<NeuronId, f32>,
    ) -> f32 {
        let neuron = &self.neurons[i];
        let mut total = external.get(&neuron.id()).copied().unwrap_or(0.0);
        for sid in neuron.input_synapses() {
            let Some(&si) = self.synapse_index.get(sid) else {
                continue; // Cross-region input; covered by `external`.
            };
            let synapse = &self.synapses[si];
            if !synapse.is_valid() {
                continue;
            }
            let Some(&pre_idx) = self.neuron_index.get(&synapse.source()) else {
                continue;
            };
            let pre = match snapshot {
                Some(snap) => snap[pre_idx],
                None => self.neurons[pre_idx].activation(),
            };
            total += synapse.contribution(pre);
        }
        total
    }

    fn process_sequential(
        &mut self,
        ctx: RegionProcessContext<'_>,
        threshold_modulation: Option<f32>,
    ) -> Vec<SpikeRecord> {
        let mut spikes = Vec::new();
        for i in 0..self.neurons.len() {
            let input = self.synaptic_input_for(i, None, ctx.external_input);
            let neuron = &mut self.neurons[i];
            let threshold = neuron.fire_threshold() * threshold_modulation.unwrap_or(1.0);
            if neuron.integrate(input, threshold, ctx.now_ms) {
                spikes.push(SpikeRecord {
                    neuron: neuron.id(),
                    at_ms: ctx.now_ms,
                });
            }
        }
        spikes
    }

    fn process_two_phase(
        &mut self,
        ctx: RegionProcessContext<'_>,
        snapshot: &[f32],
        threshold_modulation: f32,
    ) -> Vec<SpikeRecord> {
        let inputs: Vec<f32> = (0..self.neurons.len())
            .map(|i| self.synaptic_input_for(i, Some(snapshot), ctx.external_input))
            .collect();

        let mut spikes = Vec::new();
        for (i, input) in inputs.into_iter().enumerate() {
            let neuron = &mut self.neurons[i];
            let threshold = neuron.fire_threshold() * threshold_modulation;
            if neuron.integrate(input, threshold, ctx.now_ms) {
                spikes.push(SpikeRecord {
                    neuron: neuron.id(),
                    at_ms: ctx.now_ms,
                });
            }
        }
        spikes
    }

    fn process_layered(&mut self, ctx: RegionProcessContext<'_>) -> Vec<SpikeRecord> {
        let n = self.neurons.len();
        let layers = self.layer_count.min(n);
        let chunk = n.div_ceil(layers);

        let mut spikes = Vec::new();
        for layer_start in (0..n).step_by(chunk) {
            let layer_end = (layer_start + chunk).min(n);
            for i in layer_start..layer_end {
                let input = self.synaptic_input_for(i, None, ctx.external_input);
                let neuron = &mut self.neurons[i];
                let threshold = neuron.fire_threshold();
                if neuron.integrate(input, threshold, ctx.now_ms) {
                    spikes.push(SpikeRecord {
                        neuron: neuron.id(),
                        at_ms: ctx.now_ms,
                    });
                }
            }
        }
        spikes
    }

    /// Keep the top-k active neurons above the activity threshold; inhibit
    /// the rest.
    fn apply_winner_take_all(&mut self) {
        let mut ranked: Vec<(usize, f32)> = self
            .neurons
            .iter()
            .enumerate()
            .filter(|(_, n)| n.activation() > ACTIVE_THRESHOLD)
            .map(|(i, n)| (i, n.activation()))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let winners: AHashSet<usize> = ranked.iter().take(self.competitive_k).map(|(i, _)| *i).collect();
        for (i, neuron) in self.neurons.iter_mut().enumerate() {
            if neuron.activation() > ACTIVE_THRESHOLD && !winners.contains(&i) {
                neuron.set_activation(0.0);
                neuron.set_inhibited(true);
            }
        }
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Check the arena invariant: every synapse's source is resident, and
    /// every synapse either targets a resident neuron or appears in the
    /// outgoing bookkeeping.
    pub fn validate(&self) -> Result<()> {
        for synapse in self.synapses.iter().filter(|s| s.is_valid()) {
            if !self.neuron_index.contains_key(&synapse.source()) {
                return Err(SynapticaError::DegradedOperand(synapse.id()));
            }
            if !self.neuron_index.contains_key(&synapse.target()) {
                let tracked = self
                    .output_connections
                    .values()
                    .any(|ids| ids.contains(&synapse.id()));
                if !tracked {
                    return Err(SynapticaError::DegradedOperand(synapse.id()));
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} '{}' ({}): {} neurons, {} synapses",
            self.id,
            self.name,
            self.kind,
            self.neuron_count(),
            self.synapse_count()
        )
    }
}
