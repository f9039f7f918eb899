// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # LearningEngine
//!
//! Applies plasticity rules over regions, owns the reward/eligibility
//! machinery and the learning telemetry. The engine never owns regions:
//! every pass borrows the region (and, for cross-region synapses, an
//! activation snapshot supplied by the orchestrator) for the duration of
//! the call.
//!
//! Invalid or unresolvable operands never abort a pass: they are counted
//! in `skipped_updates` and skipped.

use crate::attention::AttentionState;
use crate::config::{AttentionMode, CompetenceMode, HebbianScope, LearningConfig};
use crate::shaping::RewardShaper;
use crate::stats::LearningStats;
use ahash::{AHashMap, AHashSet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use synaptica_neural::{NeuronId, Region, Result, SynapseId, SynapticaError};
use tracing::{debug, trace};

/// Consolidation phase machine. Exit is time-based.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsolidationPhase {
    Idle,
    Consolidating { until_ms: f64 },
}

#[derive(Debug)]
pub struct LearningEngine {
    pub(crate) config: LearningConfig,
    pub(crate) stats: LearningStats,
    attention: AttentionState,
    shaper: RewardShaper,
    pub(crate) rng: StdRng,

    /// Last spike time per neuron, fed by the orchestrator each tick.
    spike_times: AHashMap<NeuronId, f64>,
    /// Synapses whose eligibility already advanced this tick; the
    /// end-of-tick decay pass skips them.
    eligibility_touched: AHashSet<SynapseId>,

    pending_reward: f32,
    positive_rewards: u64,
    total_rewards: u64,
    competence: f32,
    consolidation: ConsolidationPhase,
    /// Earliest time the next consolidation phase may begin.
    consolidation_resume_at_ms: f64,
}

impl LearningEngine {
    pub fn new(config: LearningConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic construction for tests and reproducible runs.
    pub fn with_seed(config: LearningConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: LearningConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            stats: LearningStats::default(),
            attention: AttentionState::new(),
            shaper: RewardShaper::new(),
            rng,
            spike_times: AHashMap::new(),
            eligibility_touched: AHashSet::new(),
            pending_reward: 0.0,
            positive_rewards: 0,
            total_rewards: 0,
            competence: 0.5,
            consolidation: ConsolidationPhase::Idle,
            consolidation_resume_at_ms: 0.0,
        })
    }

    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    pub fn stats(&self) -> &LearningStats {
        &self.stats
    }

    pub fn competence(&self) -> f32 {
        self.competence
    }

    pub fn consolidation_phase(&self) -> ConsolidationPhase {
        self.consolidation
    }

    pub fn pending_reward(&self) -> f32 {
        self.pending_reward
    }

    // ------------------------------------------------------------------
    // Gating and modulation
    // ------------------------------------------------------------------

    /// Effective learning-rate multiplier under the competence mode.
    fn rate_scale(&self) -> f32 {
        match self.config.competence_mode {
            CompetenceMode::ScaleLearningRates => self.competence,
            _ => 1.0,
        }
    }

    /// One stochastic accept/reject draw per candidate update.
    fn gate(&mut self) -> bool {
        let mut p = self.config.p_gate;
        if self.config.competence_mode == CompetenceMode::ScalePGate {
            p *= self.competence;
        }
        if p >= 1.0 {
            return true;
        }
        if self.rng.gen::<f32>() < p {
            true
        } else {
            self.stats.gated_rejections += 1;
            false
        }
    }

    /// Stage an attention map; it becomes active at the next plasticity
    /// pass. The configured attention mode decides how the map is used:
    /// `Off` discards it, `ExternalMap` boosts attended synapses
    /// uniformly, `Saliency` grades the boost by each entry's weight,
    /// `TopK` keeps only the strongest entries.
    pub fn apply_attention_modulation(&mut self, map: AHashMap<NeuronId, f32>, base_boost: f32) {
        let (amin, amax) = (self.config.attention_amin, self.config.attention_amax);
        match self.config.attention_mode {
            AttentionMode::Off => {
                trace!(target: "plasticity", "attention map discarded: modulation is off");
            }
            AttentionMode::ExternalMap => {
                self.attention.submit(map, base_boost, amin, amax, false);
            }
            AttentionMode::Saliency => {
                self.attention.submit(map, base_boost, amin, amax, true);
            }
            AttentionMode::TopK => {
                let mut entries: Vec<(NeuronId, f32)> = map.into_iter().collect();
                entries.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0 .0.cmp(&b.0 .0)));
                entries.truncate(self.config.attention_top_k);
                self.attention
                    .submit(entries.into_iter().collect(), base_boost, amin, amax, false);
            }
        }
    }

    /// Swap in pending attention and advance its anneal envelope. Called
    /// by the orchestrator at the start of each plasticity pass.
    pub fn begin_plasticity_pass(&mut self, now_ms: f64) {
        if self.attention.swap_in(now_ms) {
            self.stats.attention_events += 1;
            self.stats.mean_attention_weight = self.attention.mean_attention_weight();
        }
        self.attention.anneal(now_ms, self.config.attention_anneal_ms);
        if let ConsolidationPhase::Consolidating { until_ms } = self.consolidation {
            if now_ms >= until_ms {
                self.consolidation = ConsolidationPhase::Idle;
                self.consolidation_resume_at_ms = now_ms + self.config.consolidation_interval_ms;
            }
        }
    }

    /// Retire the spike times this pass consumed. Spikes recorded between
    /// cadence'd passes accumulate until the next pass reads them exactly
    /// once; without this a stale pair would keep re-driving STDP.
    pub fn finish_plasticity_pass(&mut self) {
        self.spike_times.clear();
    }

    /// Enter a consolidation phase if idle, consolidation is configured,
    /// and the inter-phase interval since the last exit has elapsed.
    pub fn maybe_begin_consolidation(&mut self, now_ms: f64) {
        if self.config.consolidation_strength > 0.0
            && self.consolidation == ConsolidationPhase::Idle
            && now_ms >= self.consolidation_resume_at_ms
        {
            self.consolidation = ConsolidationPhase::Consolidating {
                until_ms: now_ms + self.config.consolidation_duration_ms,
            };
            self.stats.consolidation_events += 1;
            debug!(target: "plasticity", "consolidation phase entered at {} ms", now_ms);
        }
    }

    // ------------------------------------------------------------------
    // Spike bookkeeping
    // ------------------------------------------------------------------

    pub fn record_spike(&mut self, neuron: NeuronId, at_ms: f64) {
        self.spike_times.insert(neuron, at_ms);
    }

    pub fn spike_times(&self) -> &AHashMap<NeuronId, f64> {
        &self.spike_times
    }

    // ------------------------------------------------------------------
    // Hebbian
    // ------------------------------------------------------------------

    /// One Hebbian pass over a region's synapse arena with an explicit
    /// rate. `external_acts` resolves post-activations of outgoing
    /// synapses; endpoints that resolve nowhere are skipped and counted.
    pub fn hebbian_pass(
        &mut self,
        region: &mut Region,
        rate: f32,
        external_acts: &AHashMap<NeuronId, f32>,
    ) -> usize {
        if rate <= 0.0 {
            return 0;
        }
        let scope = self.config.hebbian_scope;

        // Read phase: resolve endpoint activations per candidate synapse.
        let mut candidates: Vec<(SynapseId, f32, f32, f32)> = Vec::new();
        let mut skipped = 0u64;
        for synapse in region.synapses() {
            if scope == HebbianScope::RuleTagged
                && synapse.rule() != synaptica_neural::PlasticityRule::Hebbian
            {
                continue;
            }
            let Some(pre) = region.neuron(synapse.source()).map(|n| n.activation()) else {
                skipped += 1;
                continue;
            };
            let post = match region.neuron(synapse.target()) {
                Some(n) => n.activation(),
                None => match external_acts.get(&synapse.target()) {
                    Some(&a) => a,
                    None => {
                        skipped += 1;
                        continue;
                    }
                },
            };
            let boost = self.attention.boost_for(synapse.source(), synapse.target());
            candidates.push((synapse.id(), pre, post, boost));
        }
        self.stats.skipped_updates += skipped;

        // Write phase.
        let scale = self.rate_scale();
        let mut committed = 0;
        for (sid, pre, post, boost) in candidates {
            if !self.gate() {
                continue;
            }
            if let Some(synapse) = region.synapse_mut(sid) {
                let delta = synapse.apply_hebbian(pre, post, rate * boost * scale);
                self.stats.record_update(delta);
                self.stats.hebbian_updates += 1;
                committed += 1;
            }
        }
        trace!(
            target: "plasticity",
            "hebbian pass on {}: {} committed, {} skipped",
            region.id(), committed, skipped
        );
        committed
    }

    // ------------------------------------------------------------------
    // STDP
    // ------------------------------------------------------------------

    /// One STDP pass over a region's STDP-tagged synapses using the
    /// engine's spike-time map. A synapse whose endpoints are missing
    /// from the map is skipped without error.
    pub fn stdp_pass(&mut self, region: &mut Region) -> usize {
        let rate = self.config.stdp_rate * self.config.stdp_rate_multiplier;
        if rate <= 0.0 {
            return 0;
        }

        let mut candidates: Vec<(SynapseId, f64, f32)> = Vec::new();
        for synapse in region.synapses() {
            if synapse.rule() != synaptica_neural::PlasticityRule::Stdp {
                continue;
            }
            let (Some(&t_pre), Some(&t_post)) = (
                self.spike_times.get(&synapse.source()),
                self.spike_times.get(&synapse.target()),
            ) else {
                continue;
            };
            let boost = self.attention.boost_for(synapse.source(), synapse.target());
            candidates.push((synapse.id(), t_post - t_pre, boost));
        }

        let scale = self.rate_scale();
        let mut committed = 0;
        for (sid, dt_ms, boost) in candidates {
            if !self.gate() {
                continue;
            }
            if let Some(synapse) = region.synapse_mut(sid) {
                let delta = synapse.apply_stdp(dt_ms, rate * boost * scale);
                self.stats.record_update(delta);
                self.stats.stdp_updates += 1;
                committed += 1;
            }
        }
        committed
    }

    // ------------------------------------------------------------------
    // Eligibility
    // ------------------------------------------------------------------

    /// Feed one (pre, post) coincidence event into a synapse's
    /// eligibility trace: e ← λ·e + η_e·pre·post.
    pub fn note_pre_post(
        &mut self,
        region: &mut Region,
        synapse: SynapseId,
        pre: f32,
        post: f32,
    ) -> Result<()> {
        let lambda = self.config.lambda;
        let eta = self.config.eta_elig;
        match region.synapse_mut(synapse) {
            Some(s) => {
                s.accumulate_eligibility(lambda, eta, pre, post);
                self.eligibility_touched.insert(synapse);
                Ok(())
            }
            None => Err(SynapticaError::SynapseNotFound(synapse)),
        }
    }

    /// Auto-accumulation: emit a synthetic (pre, post) event for every
    /// valid synapse whose endpoints resolve, equivalent to one
    /// `note_pre_post` per synapse.
    pub fn accumulate_eligibility(
        &mut self,
        region: &mut Region,
        external_acts: &AHashMap<NeuronId, f32>,
    ) {
        let mut events: Vec<(SynapseId, f32, f32)> = Vec::new();
        for synapse in region.synapses() {
            let Some(pre) = region.neuron(synapse.source()).map(|n| n.activation()) else {
                continue;
            };
            let post = match region.neuron(synapse.target()) {
                Some(n) => n.activation(),
                None => match external_acts.get(&synapse.target()) {
                    Some(&a) => a,
                    None => continue,
                },
            };
            events.push((synapse.id(), pre, post));
        }
        for (sid, pre, post) in events {
            // Resolution already succeeded above.
            let _ = self.note_pre_post(region, sid, pre, post);
        }
    }

    /// End-of-tick eligibility decay: synapses that saw no event this
    /// tick decay as e ← λ·e. Call once per region per tick, after
    /// reward distribution; then [`LearningEngine::end_tick`].
    pub fn decay_eligibility(&mut self, region: &mut Region) {
        let lambda = self.config.lambda;
        for synapse in region.synapses_mut() {
            if !self.eligibility_touched.contains(&synapse.id()) {
                synapse.decay_eligibility(lambda);
            }
        }
    }

    /// Clear per-tick bookkeeping. Call once after all regions' decay
    /// passes.
    pub fn end_tick(&mut self) {
        self.eligibility_touched.clear();
    }

    // ------------------------------------------------------------------
    // Reward
    // ------------------------------------------------------------------

    /// Accept a reward scalar. Stats saturate at the configured clamp;
    /// distribution uses the raw value.
    pub fn apply_reward(&mut self, value: f32) {
        self.pending_reward += value;
        let clamp = self.config.reward_stat_clamp;
        let saturated = value.clamp(-clamp, clamp);
        self.stats.last_reward = saturated;
        self.stats.cumulative_reward += saturated as f64;
        self.stats.rewards_delivered += 1;
        self.total_rewards += 1;
        if value > 0.0 {
            self.positive_rewards += 1;
        }
    }

    /// Distribute the pending reward across one region's eligibility
    /// traces: Δw = κ·R·e·global_learning_rate per synapse.
    pub fn distribute_reward(&mut self, region: &mut Region) -> usize {
        let reward = self.pending_reward;
        if reward == 0.0 {
            return 0;
        }
        let kappa = self.config.kappa;
        let global_rate = self.config.global_learning_rate;

        let mut candidates: Vec<(SynapseId, f32)> = Vec::new();
        for synapse in region.synapses() {
            if synapse.eligibility() != 0.0 {
                let boost = self.attention.boost_for(synapse.source(), synapse.target());
                candidates.push((synapse.id(), boost));
            }
        }

        let scale = self.rate_scale();
        let mut committed = 0;
        for (sid, boost) in candidates {
            if !self.gate() {
                continue;
            }
            if let Some(synapse) = region.synapse_mut(sid) {
                let delta = synapse.apply_reward_modulated(kappa * boost * scale, reward, global_rate);
                self.stats.record_update(delta);
                self.stats.reward_updates += 1;
                committed += 1;
            }
        }
        committed
    }

    /// Clear the pending reward and fold the outcome into the competence
    /// EMA. Call once after every region has received its distribution.
    pub fn finish_reward_distribution(&mut self) {
        self.pending_reward = 0.0;
        if self.config.competence_mode != CompetenceMode::Off && self.total_rewards > 0 {
            let success = self.positive_rewards as f32 / self.total_rewards as f32;
            let rho = self.config.competence_rho;
            self.competence = ((1.0 - rho) * self.competence + rho * success).clamp(0.0, 1.0);
            self.stats.competence = self.competence;
        }
    }

    /// Shaped reward: gamma·task + alpha·novelty against running means.
    pub fn compute_shaped_reward(
        &mut self,
        obs: &[f32],
        region_acts: &[f32],
        task_reward: f32,
    ) -> f32 {
        let (shaped, novelty) = self.shaper.shape(obs, region_acts, task_reward, &self.config);
        self.stats.last_novelty = novelty;
        self.stats.last_shaped_reward = shaped;
        shaped
    }

    // ------------------------------------------------------------------
    // Homeostasis and decay
    // ------------------------------------------------------------------

    /// Scale each neuron's locally resolvable incoming weights toward the
    /// target sum. Scale factors are bounded to [0.5, 2.0] per pass.
    pub fn homeostasis_pass(&mut self, region: &mut Region) -> usize {
        if !self.config.enable_homeostasis {
            return 0;
        }
        let target = self.config.homeostasis_target;

        let mut plans: Vec<(SynapseId, f32)> = Vec::new();
        for neuron in region.neurons() {
            let mut resolved: Vec<SynapseId> = Vec::new();
            let mut current = 0.0f32;
            for &sid in neuron.input_synapses() {
                if let Some(synapse) = region.synapse(sid) {
                    if synapse.is_valid() {
                        current += synapse.weight();
                        resolved.push(sid);
                    }
                }
            }
            if resolved.is_empty() || current.abs() < f32::EPSILON {
                continue;
            }
            let factor = (target / current).clamp(0.5, 2.0);
            if (factor - 1.0).abs() < f32::EPSILON {
                continue;
            }
            plans.extend(resolved.into_iter().map(|sid| (sid, factor)));
        }

        let mut adjusted = 0;
        for (sid, factor) in plans {
            if let Some(synapse) = region.synapse_mut(sid) {
                let before = synapse.weight();
                synapse.set_weight(before * factor);
                self.stats.record_update(synapse.weight() - before);
                self.stats.homeostasis_updates += 1;
                adjusted += 1;
            }
        }
        adjusted
    }

    /// Uniform weight decay: w ← w·(1 − decay_rate). During a
    /// consolidation phase, decay on stable synapses is scaled down by
    /// the consolidation strength.
    pub fn decay_pass(&mut self, region: &mut Region) -> usize {
        let rate = self.config.decay_rate;
        if rate <= 0.0 {
            return 0;
        }
        let consolidating = matches!(self.consolidation, ConsolidationPhase::Consolidating { .. });
        let stability = self.config.consolidation_stability_threshold;
        let strength = self.config.consolidation_strength;

        let mut decayed = 0;
        let mut total_delta = 0.0f64;
        for synapse in region.synapses_mut() {
            let effective = if consolidating && synapse.weight().abs() >= stability {
                rate * (1.0 - strength)
            } else {
                rate
            };
            let delta = synapse.decay(effective);
            total_delta += delta.abs() as f64;
            decayed += 1;
        }
        self.stats.decay_updates += decayed as u64;
        self.stats.total_updates += decayed as u64;
        self.stats.total_weight_change += total_delta;
        self.stats.weight_change_samples += decayed as u64;
        decayed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synaptica_neural::{
        ActivationPattern, IdAllocator, PlasticityRule, Region, RegionKind, SynapseType,
    };

    fn engine(config: LearningConfig) -> LearningEngine {
        LearningEngine::with_seed(config, 7).unwrap()
    }

    fn two_neuron_region(
        weight: f32,
        rule: PlasticityRule,
        rate: f32,
    ) -> (Region, IdAllocator, SynapseId) {
        let mut alloc = IdAllocator::new();
        let mut region = Region::new(
            alloc.next_region_id(),
            "r",
            RegionKind::Cortical,
            ActivationPattern::Synchronous,
        );
        let ids = region.create_neurons(2, &mut alloc);
        let sid = region
            .connect_neurons(ids[0], ids[1], weight, SynapseType::Excitatory, rule, rate, &mut alloc)
            .unwrap();
        (region, alloc, sid)
    }

    #[test]
    fn test_hebbian_pass_two_neuron_law() {
        let (mut region, _alloc, sid) = two_neuron_region(0.1, PlasticityRule::Hebbian, 0.05);
        for id in region.neuron_ids() {
            region.neuron_mut(id).unwrap().set_activation(1.0);
        }

        let mut engine = engine(LearningConfig::default());
        let committed = engine.hebbian_pass(&mut region, 0.05, &AHashMap::new());

        assert_eq!(committed, 1);
        let w = region.synapse(sid).unwrap().weight();
        assert!((w - 0.15).abs() < 1e-6, "w = {}", w);
        assert_eq!(engine.stats().hebbian_updates, 1);
        assert_eq!(engine.stats().total_updates, 1);
    }

    #[test]
    fn test_hebbian_scope_rule_tagged_skips_untagged() {
        let (mut region, _alloc, sid) = two_neuron_region(0.1, PlasticityRule::Stdp, 0.05);
        for id in region.neuron_ids() {
            region.neuron_mut(id).unwrap().set_activation(1.0);
        }
        let mut engine = engine(LearningConfig::default());
        assert_eq!(engine.hebbian_pass(&mut region, 0.05, &AHashMap::new()), 0);
        assert_eq!(region.synapse(sid).unwrap().weight(), 0.1);
    }

    #[test]
    fn test_stdp_ltp_and_ltd_are_antisymmetric() {
        let mut alloc = IdAllocator::new();
        let mut region = Region::new(
            alloc.next_region_id(),
            "r",
            RegionKind::Cortical,
            ActivationPattern::Synchronous,
        );
        let ids = region.create_neurons(4, &mut alloc);
        let ltp = region
            .connect_neurons(ids[0], ids[1], 0.5, SynapseType::Excitatory, PlasticityRule::Stdp, 0.05, &mut alloc)
            .unwrap();
        let ltd = region
            .connect_neurons(ids[2], ids[3], 0.5, SynapseType::Excitatory, PlasticityRule::Stdp, 0.05, &mut alloc)
            .unwrap();

        let config = LearningConfig {
            stdp_rate: 0.05,
            stdp_rate_multiplier: 1.0,
            ..Default::default()
        };
        let mut engine = engine(config);
        // dt = +10 ms for LTP, -10 ms for LTD.
        engine.record_spike(ids[0], 100.0);
        engine.record_spike(ids[1], 110.0);
        engine.record_spike(ids[2], 110.0);
        engine.record_spike(ids[3], 100.0);

        assert_eq!(engine.stdp_pass(&mut region), 2);

        let expected = 0.05 * (-0.5f64).exp() as f32;
        let w_ltp = region.synapse(ltp).unwrap().weight();
        let w_ltd = region.synapse(ltd).unwrap().weight();
        assert!(w_ltp > w_ltd);
        assert!((w_ltp - (0.5 + expected)).abs() < 1e-5);
        assert!((w_ltd - (0.5 - expected)).abs() < 1e-5);
        assert_eq!(engine.stats().stdp_updates, 2);
    }

    #[test]
    fn test_reward_distribution_uses_eligibility() {
        let (mut region, _alloc, sid) =
            two_neuron_region(0.5, PlasticityRule::RewardModulated, 0.0);
        let config = LearningConfig {
            kappa: 0.2,
            lambda: 0.9,
            eta_elig: 1.0,
            global_learning_rate: 0.01,
            hebbian_rate: 0.0,
            stdp_rate: 0.0,
            decay_rate: 0.0,
            ..Default::default()
        };
        let mut engine = engine(config);

        engine.note_pre_post(&mut region, sid, 1.0, 1.0).unwrap();
        assert!((region.synapse(sid).unwrap().eligibility() - 1.0).abs() < 1e-6);

        engine.apply_reward(0.5);
        engine.distribute_reward(&mut region);
        engine.finish_reward_distribution();

        let w = region.synapse(sid).unwrap().weight();
        assert!((w - 0.501).abs() < 1e-6, "w = {}", w);
        assert_eq!(engine.pending_reward(), 0.0);
        assert_eq!(engine.stats().reward_updates, 1);
    }

    #[test]
    fn test_eligibility_decays_without_events() {
        let (mut region, _alloc, sid) = two_neuron_region(0.5, PlasticityRule::RewardModulated, 0.0);
        let mut engine = engine(LearningConfig::default());

        engine.note_pre_post(&mut region, sid, 1.0, 1.0).unwrap();
        engine.end_tick();

        // Tick with no events: e' = lambda * e exactly.
        engine.decay_eligibility(&mut region);
        engine.end_tick();
        let e = region.synapse(sid).unwrap().eligibility();
        assert!((e - 0.9).abs() < 1e-7, "e = {}", e);
    }

    #[test]
    fn test_p_gate_zero_rejects_everything() {
        let (mut region, _alloc, sid) = two_neuron_region(0.1, PlasticityRule::Hebbian, 0.05);
        for id in region.neuron_ids() {
            region.neuron_mut(id).unwrap().set_activation(1.0);
        }
        let config = LearningConfig {
            p_gate: 0.0,
            ..Default::default()
        };
        let mut engine = engine(config);
        assert_eq!(engine.hebbian_pass(&mut region, 0.05, &AHashMap::new()), 0);
        assert_eq!(region.synapse(sid).unwrap().weight(), 0.1);
        assert!(engine.stats().gated_rejections > 0);
    }

    #[test]
    fn test_homeostasis_scale_is_bounded() {
        // Incoming sum 0.1 against target 1.0 wants x10; bound caps at x2.
        let (mut region, _alloc, sid) = two_neuron_region(0.1, PlasticityRule::None, 0.0);
        let config = LearningConfig {
            enable_homeostasis: true,
            homeostasis_target: 1.0,
            ..Default::default()
        };
        let mut engine = engine(config);
        assert_eq!(engine.homeostasis_pass(&mut region), 1);
        let w = region.synapse(sid).unwrap().weight();
        assert!((w - 0.2).abs() < 1e-6, "w = {}", w);
    }

    #[test]
    fn test_decay_pass_shrinks_weights() {
        let (mut region, _alloc, sid) = two_neuron_region(0.5, PlasticityRule::None, 0.0);
        let config = LearningConfig {
            decay_rate: 0.1,
            ..Default::default()
        };
        let mut engine = engine(config);
        engine.decay_pass(&mut region);
        let w = region.synapse(sid).unwrap().weight();
        assert!((w - 0.45).abs() < 1e-6);
        assert_eq!(engine.stats().decay_updates, 1);
    }

    #[test]
    fn test_attention_boost_scales_hebbian_delta() {
        let (mut region, _alloc, sid) = two_neuron_region(0.1, PlasticityRule::Hebbian, 0.05);
        let pre = region.neuron_ids()[0];
        for id in region.neuron_ids() {
            region.neuron_mut(id).unwrap().set_activation(1.0);
        }
        let mut engine = engine(LearningConfig {
            attention_mode: AttentionMode::ExternalMap,
            ..Default::default()
        });
        let mut map = AHashMap::new();
        map.insert(pre, 1.0);
        engine.apply_attention_modulation(map, 2.0);
        engine.begin_plasticity_pass(0.0);

        engine.hebbian_pass(&mut region, 0.05, &AHashMap::new());
        let w = region.synapse(sid).unwrap().weight();
        // Boosted delta: 2.0 * 0.05 * 1 * 1 = 0.1.
        assert!((w - 0.2).abs() < 1e-6, "w = {}", w);
        assert_eq!(engine.stats().attention_events, 1);
    }

    #[test]
    fn test_attention_off_discards_submitted_map() {
        let (mut region, _alloc, sid) = two_neuron_region(0.1, PlasticityRule::Hebbian, 0.05);
        let pre = region.neuron_ids()[0];
        for id in region.neuron_ids() {
            region.neuron_mut(id).unwrap().set_activation(1.0);
        }
        let mut engine = engine(LearningConfig::default());
        let mut map = AHashMap::new();
        map.insert(pre, 1.0);
        engine.apply_attention_modulation(map, 2.0);
        engine.begin_plasticity_pass(0.0);

        engine.hebbian_pass(&mut region, 0.05, &AHashMap::new());
        let w = region.synapse(sid).unwrap().weight();
        // Unboosted delta: 0.05 * 1 * 1.
        assert!((w - 0.15).abs() < 1e-6, "w = {}", w);
        assert_eq!(engine.stats().attention_events, 0);
    }

    #[test]
    fn test_attention_top_k_keeps_only_strongest_entries() {
        let (mut region, _alloc, sid) = two_neuron_region(0.1, PlasticityRule::Hebbian, 0.05);
        let ids = region.neuron_ids();
        for id in ids.clone() {
            region.neuron_mut(id).unwrap().set_activation(1.0);
        }
        let mut engine = engine(LearningConfig {
            attention_mode: AttentionMode::TopK,
            attention_top_k: 1,
            ..Default::default()
        });
        // The synapse's endpoints carry lower weights than an unrelated
        // neuron, so the k=1 cut drops both of them.
        let mut map = AHashMap::new();
        map.insert(ids[0], 0.2);
        map.insert(ids[1], 0.3);
        map.insert(NeuronId(9999), 0.9);
        engine.apply_attention_modulation(map, 2.0);
        engine.begin_plasticity_pass(0.0);

        engine.hebbian_pass(&mut region, 0.05, &AHashMap::new());
        let w = region.synapse(sid).unwrap().weight();
        assert!((w - 0.15).abs() < 1e-6, "w = {}", w);
    }

    #[test]
    fn test_stdp_pass_consumes_spike_times() {
        let (mut region, _alloc, sid) = two_neuron_region(0.5, PlasticityRule::Stdp, 0.05);
        let ids = region.neuron_ids();
        let config = LearningConfig {
            stdp_rate: 0.05,
            ..Default::default()
        };
        let mut engine = engine(config);
        engine.record_spike(ids[0], 100.0);
        engine.record_spike(ids[1], 110.0);

        engine.stdp_pass(&mut region);
        engine.finish_plasticity_pass();
        let w_after_first = region.synapse(sid).unwrap().weight();
        assert!(w_after_first > 0.5);

        // The pair is spent; later passes must not re-apply it.
        for _ in 0..5 {
            engine.stdp_pass(&mut region);
            engine.finish_plasticity_pass();
        }
        assert_eq!(region.synapse(sid).unwrap().weight(), w_after_first);
        assert_eq!(engine.stats().stdp_updates, 1);
    }

    #[test]
    fn test_consolidation_has_idle_periods_between_phases() {
        let config = LearningConfig {
            consolidation_strength: 0.5,
            consolidation_duration_ms: 100.0,
            consolidation_interval_ms: 200.0,
            ..Default::default()
        };
        let mut engine = engine(config);

        engine.maybe_begin_consolidation(0.0);
        assert!(matches!(engine.consolidation_phase(), ConsolidationPhase::Consolidating { .. }));

        // Time-based exit, then the interval holds the phase idle.
        engine.begin_plasticity_pass(150.0);
        assert_eq!(engine.consolidation_phase(), ConsolidationPhase::Idle);
        engine.maybe_begin_consolidation(151.0);
        assert_eq!(engine.consolidation_phase(), ConsolidationPhase::Idle);
        engine.maybe_begin_consolidation(349.0);
        assert_eq!(engine.consolidation_phase(), ConsolidationPhase::Idle);

        engine.maybe_begin_consolidation(350.0);
        assert!(matches!(engine.consolidation_phase(), ConsolidationPhase::Consolidating { .. }));
        assert_eq!(engine.stats().consolidation_events, 2);
    }

    #[test]
    fn test_reward_stats_saturate() {
        let mut engine = engine(LearningConfig::default());
        engine.apply_reward(100.0);
        assert_eq!(engine.stats().last_reward, 10.0);
        assert!((engine.pending_reward() - 100.0).abs() < 1e-6);
    }
}
