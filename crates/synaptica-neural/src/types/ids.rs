// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Identity types for neurons, synapses and regions

use core::fmt;

/// Neuron ID (globally unique across the entire brain)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct NeuronId(pub u32);

impl fmt::Display for NeuronId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Neuron({})", self.0)
    }
}

/// Synapse ID (unique identifier for a synaptic connection)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct SynapseId(pub u32);

impl fmt::Display for SynapseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Synapse({})", self.0)
    }
}

/// Region ID (unique identifier for a brain region)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct RegionId(pub u32);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Region({})", self.0)
    }
}

/// Per-brain monotonic id allocator.
///
/// Replaces any process-wide id counters: every `Brain` owns one allocator,
/// so two brains in the same process never contend or collide.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct IdAllocator {
    next_neuron: u32,
    next_synapse: u32,
    next_region: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_neuron_id(&mut self) -> NeuronId {
        let id = NeuronId(self.next_neuron);
        self.next_neuron += 1;
        id
    }

    pub fn next_synapse_id(&mut self) -> SynapseId {
        let id = SynapseId(self.next_synapse);
        self.next_synapse += 1;
        id
    }

    pub fn next_region_id(&mut self) -> RegionId {
        let id = RegionId(self.next_region);
        self.next_region += 1;
        id
    }

    /// Advance the region counter past an externally supplied id, so a
    /// rebuild from imported state never re-issues a taken id.
    pub fn reserve_region_id(&mut self, id: RegionId) {
        self.next_region = self.next_region.max(id.0 + 1);
    }
}
