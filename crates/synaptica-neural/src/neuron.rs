// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neuron
//!
//! Unit of activation. Integrates weighted input from its incoming synapses,
//! applies a leaky bounded update, and emits a spike when activation crosses
//! threshold outside the refractory window.
//!
//! ## Dynamics
//!
//! ```text
//! a(t+1) = clamp01( a(t) + I_syn − leak × (a(t) − a_rest) )
//!
//! Firing check:
//!     if now < refractory_until:  skip (refractory)
//!     if state == Inhibited:      skip (externally gated)
//!     else if a(t+1) ≥ threshold: SPIKE, record time, enter Refractory
//! ```
//!
//! ## State machine
//!
//! Inactive → Active (activation > low threshold) → Refractory (on spike)
//! → Inactive (after the refractory interval). `Inhibited` is set externally
//! and blocks spiking while still permitting decay.

use crate::types::{NeuronId, RegionId, SynapseId};
use serde::{Deserialize, Serialize};

/// Activation above which a neuron counts as Active.
pub const ACTIVE_THRESHOLD: f32 = 0.1;

/// Default spike threshold.
pub const DEFAULT_FIRE_THRESHOLD: f32 = 0.9;

/// Default refractory interval in milliseconds.
pub const DEFAULT_REFRACTORY_MS: f64 = 5.0;

/// Default leak coefficient (fraction of (a − a_rest) lost per tick).
pub const DEFAULT_LEAK: f32 = 0.1;

/// Discrete neuron state tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeuronState {
    Inactive,
    Active,
    Inhibited,
    Refractory,
}

/// A single neuron.
///
/// Input/output synapse lists hold ids only; the owning region resolves them.
/// Both lists support amortized-O(1) append, capacity reservation, and
/// deduplicate against the same edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neuron {
    id: NeuronId,
    region: RegionId,
    activation: f32,
    state: NeuronState,
    last_spike_ms: Option<f64>,
    refractory_until_ms: f64,
    fire_threshold: f32,
    refractory_ms: f64,
    leak: f32,
    inputs: Vec<SynapseId>,
    outputs: Vec<SynapseId>,
}

impl Neuron {
    pub fn new(id: NeuronId, region: RegionId) -> Self {
        Self {
            id,
            region,
            activation: 0.0,
            state: NeuronState::Inactive,
            last_spike_ms: None,
            refractory_until_ms: 0.0,
            fire_threshold: DEFAULT_FIRE_THRESHOLD,
            refractory_ms: DEFAULT_REFRACTORY_MS,
            leak: DEFAULT_LEAK,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> NeuronId {
        self.id
    }

    #[inline]
    pub fn region(&self) -> RegionId {
        self.region
    }

    #[inline]
    pub fn activation(&self) -> f32 {
        self.activation
    }

    /// Set activation, clamped to [0, 1].
    pub fn set_activation(&mut self, activation: f32) {
        self.activation = activation.clamp(0.0, 1.0);
        if self.state != NeuronState::Inhibited && self.state != NeuronState::Refractory {
            self.state = if self.activation > ACTIVE_THRESHOLD {
                NeuronState::Active
            } else {
                NeuronState::Inactive
            };
        }
    }

    #[inline]
    pub fn state(&self) -> NeuronState {
        self.state
    }

    /// Externally gate the neuron: blocks spiking, permits decay.
    pub fn set_inhibited(&mut self, inhibited: bool) {
        if inhibited {
            self.state = NeuronState::Inhibited;
        } else if self.state == NeuronState::Inhibited {
            self.state = if self.activation > ACTIVE_THRESHOLD {
                NeuronState::Active
            } else {
                NeuronState::Inactive
            };
        }
    }

    #[inline]
    pub fn last_spike_ms(&self) -> Option<f64> {
        self.last_spike_ms
    }

    #[inline]
    pub fn fire_threshold(&self) -> f32 {
        self.fire_threshold
    }

    pub fn set_fire_threshold(&mut self, threshold: f32) {
        self.fire_threshold = threshold;
    }

    pub fn input_synapse_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_synapse_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn input_synapses(&self) -> &[SynapseId] {
        &self.inputs
    }

    pub fn output_synapses(&self) -> &[SynapseId] {
        &self.outputs
    }

    pub fn reserve_input_synapses(&mut self, additional: usize) {
        self.inputs.reserve(additional);
    }

    pub fn reserve_output_synapses(&mut self, additional: usize) {
        self.outputs.reserve(additional);
    }

    /// Append an incoming synapse reference, deduplicating the same edge.
    pub fn add_input_synapse(&mut self, synapse: SynapseId) {
        if !self.inputs.contains(&synapse) {
            self.inputs.push(synapse);
        }
    }

    /// Append an outgoing synapse reference, deduplicating the same edge.
    pub fn add_output_synapse(&mut self, synapse: SynapseId) {
        if !self.outputs.contains(&synapse) {
            self.outputs.push(synapse);
        }
    }

    pub fn remove_input_synapse(&mut self, synapse: SynapseId) {
        self.inputs.retain(|&s| s != synapse);
    }

    pub fn remove_output_synapse(&mut self, synapse: SynapseId) {
        self.outputs.retain(|&s| s != synapse);
    }

    /// Apply one tick of integration given the summed synaptic input and an
    /// effective threshold (regions modulate it for oscillatory processing).
    ///
    /// Returns `true` if the neuron spiked this tick.
    pub fn integrate(&mut self, synaptic_input: f32, effective_threshold: f32, now_ms: f64) -> bool {
        // Leaky bounded update toward a resting activation of zero.
        let next = self.activation + synaptic_input - self.leak * self.activation;
        self.activation = next.clamp(0.0, 1.0);

        if self.state == NeuronState::Refractory {
            if now_ms >= self.refractory_until_ms {
                self.state = NeuronState::Inactive;
            } else {
                return false;
            }
        }

        if self.state == NeuronState::Inhibited {
            return false;
        }

        if self.activation >= effective_threshold {
            self.last_spike_ms = Some(now_ms);
            self.refractory_until_ms = now_ms + self.refractory_ms;
            self.state = NeuronState::Refractory;
            self.activation = 0.0;
            return true;
        }

        self.state = if self.activation > ACTIVE_THRESHOLD {
            NeuronState::Active
        } else {
            NeuronState::Inactive
        };
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_neuron() -> Neuron {
        Neuron::new(NeuronId(0), RegionId(0))
    }

    #[test]
    fn test_activation_is_clamped() {
        let mut n = make_neuron();
        n.set_activation(1.5);
        assert_eq!(n.activation(), 1.0);
        n.set_activation(-0.5);
        assert_eq!(n.activation(), 0.0);
    }

    #[test]
    fn test_state_follows_activation() {
        let mut n = make_neuron();
        assert_eq!(n.state(), NeuronState::Inactive);
        n.set_activation(0.5);
        assert_eq!(n.state(), NeuronState::Active);
        n.set_activation(0.05);
        assert_eq!(n.state(), NeuronState::Inactive);
    }

    #[test]
    fn test_spike_enters_refractory() {
        let mut n = make_neuron();
        let spiked = n.integrate(1.0, DEFAULT_FIRE_THRESHOLD, 10.0);
        assert!(spiked);
        assert_eq!(n.state(), NeuronState::Refractory);
        assert_eq!(n.last_spike_ms(), Some(10.0));
        assert_eq!(n.activation(), 0.0);

        // Cannot spike again inside the refractory window.
        assert!(!n.integrate(0.0, DEFAULT_FIRE_THRESHOLD, 12.0));

        // After the window the neuron recovers and can spike again.
        assert!(!n.integrate(0.0, DEFAULT_FIRE_THRESHOLD, 20.0));
        assert_ne!(n.state(), NeuronState::Refractory);
        assert!(n.integrate(1.0, DEFAULT_FIRE_THRESHOLD, 21.0));
    }

    #[test]
    fn test_inhibited_blocks_spiking_but_decays() {
        let mut n = make_neuron();
        n.set_activation(0.8);
        n.set_inhibited(true);
        let spiked = n.integrate(1.0, DEFAULT_FIRE_THRESHOLD, 5.0);
        assert!(!spiked);
        assert_eq!(n.state(), NeuronState::Inhibited);

        // Zero input lets the leak pull activation down.
        let before = n.activation();
        n.integrate(0.0, DEFAULT_FIRE_THRESHOLD, 6.0);
        assert!(n.activation() < before);
    }

    #[test]
    fn test_synapse_lists_deduplicate() {
        let mut n = make_neuron();
        n.reserve_input_synapses(4);
        n.add_input_synapse(SynapseId(7));
        n.add_input_synapse(SynapseId(7));
        n.add_output_synapse(SynapseId(9));
        n.add_output_synapse(SynapseId(9));
        assert_eq!(n.input_synapse_count(), 1);
        assert_eq!(n.output_synapse_count(), 1);

        n.remove_input_synapse(SynapseId(7));
        assert_eq!(n.input_synapse_count(), 0);
    }

    #[test]
    fn test_zero_input_decays_activation() {
        let mut n = make_neuron();
        n.set_activation(0.5);
        n.integrate(0.0, DEFAULT_FIRE_THRESHOLD, 1.0);
        assert!((n.activation() - 0.45).abs() < 1e-6);
    }
}
