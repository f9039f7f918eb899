// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Attention modulation.
//!
//! Callers write a neuron→weight map plus a base boost into a pending
//! buffer from any thread; the processing tick swaps it in at the start
//! of the plasticity pass. The effective boost anneals linearly toward
//! 1.0 over a configured window, after which attention is neutral.

use ahash::AHashMap;
use synaptica_neural::NeuronId;

#[derive(Debug, Clone, Default)]
pub struct AttentionState {
    pending: Option<(AHashMap<NeuronId, f32>, f32, bool)>,
    active: AHashMap<NeuronId, f32>,
    /// Boost at swap-in time, before annealing.
    initial_boost: f32,
    boost_effective: f32,
    /// Graded mode scales the boost by the attended endpoint's map weight
    /// instead of applying it uniformly.
    graded: bool,
    amin: f32,
    amax: f32,
    swap_ms: f64,
}

impl AttentionState {
    pub fn new() -> Self {
        Self {
            pending: None,
            active: AHashMap::new(),
            initial_boost: 1.0,
            boost_effective: 1.0,
            graded: false,
            amin: 1.0,
            amax: 1.0,
            swap_ms: 0.0,
        }
    }

    /// Stage a new attention map. Takes effect at the next plasticity pass.
    pub fn submit(
        &mut self,
        map: AHashMap<NeuronId, f32>,
        base_boost: f32,
        amin: f32,
        amax: f32,
        graded: bool,
    ) {
        self.amin = amin;
        self.amax = amax;
        self.pending = Some((map, base_boost.clamp(amin, amax), graded));
    }

    /// Swap the pending map in, if any. Returns true on a swap.
    pub fn swap_in(&mut self, now_ms: f64) -> bool {
        match self.pending.take() {
            Some((map, boost, graded)) => {
                self.active = map;
                self.initial_boost = boost;
                self.boost_effective = boost;
                self.graded = graded;
                self.swap_ms = now_ms;
                true
            }
            None => false,
        }
    }

    /// Advance the annealing envelope. With `anneal_ms == 0` the boost
    /// holds until the next swap.
    pub fn anneal(&mut self, now_ms: f64, anneal_ms: f64) {
        if anneal_ms <= 0.0 || self.active.is_empty() {
            return;
        }
        let fraction = ((now_ms - self.swap_ms) / anneal_ms).clamp(0.0, 1.0) as f32;
        self.boost_effective = self.initial_boost + (1.0 - self.initial_boost) * fraction;
    }

    /// Multiplier for an update touching (pre, post). Neutral when neither
    /// endpoint is attended.
    pub fn boost_for(&self, pre: NeuronId, post: NeuronId) -> f32 {
        let attended = match (self.active.get(&pre), self.active.get(&post)) {
            (None, None) => return 1.0,
            (a, b) => a.copied().unwrap_or(f32::NEG_INFINITY).max(b.copied().unwrap_or(f32::NEG_INFINITY)),
        };
        if self.graded {
            (self.boost_effective * attended).clamp(self.amin, self.amax)
        } else {
            self.boost_effective
        }
    }

    pub fn is_active(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn attended_count(&self) -> usize {
        self.active.len()
    }

    pub fn mean_attention_weight(&self) -> f32 {
        if self.active.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.active.values().sum();
        sum / self.active.len() as f32
    }
}
