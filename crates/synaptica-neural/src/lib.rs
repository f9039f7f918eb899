// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Synaptica Neural Substrate
//!
//! Core neural computation in one place:
//! - **Types**: id newtypes, the id allocator, errors, weight constants
//! - **Neuron**: leaky integrate-and-fire unit with refractory handling
//! - **Synapse**: weighted edge with local plasticity state
//! - **Region**: neuron population + source-resident synapse arena, with
//!   the five activation patterns
//!
//! Everything here is single-region local. Cross-region input aggregation
//! and tick orchestration live in `synaptica-brain`.

pub mod neuron;
pub mod region;
pub mod synapse;
pub mod types;

pub use neuron::{
    Neuron, NeuronState, ACTIVE_THRESHOLD, DEFAULT_FIRE_THRESHOLD, DEFAULT_LEAK,
    DEFAULT_REFRACTORY_MS,
};
pub use region::{
    ActivationPattern, PruneOutcome, Region, RegionKind, RegionProcessContext, SpikeRecord,
};
pub use synapse::{PlasticityRule, Synapse, SynapseType};
pub use types::{
    sample_normal, IdAllocator, NeuronId, RegionId, Result, SynapseId, SynapticaError,
    STDP_TAU_MS, WEIGHT_MAX, WEIGHT_MIN,
};
