// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Synaptica - a biologically inspired learning substrate
//!
//! Spiking-flavored neural regions with local plasticity: Hebbian, STDP,
//! eligibility-trace reward modulation, homeostasis, decay and structural
//! rewiring, driven by one explicit orchestrator.
//!
//! ## Quick start
//!
//! ```rust
//! use synaptica::prelude::*;
//!
//! let mut brain = Brain::new(LearningConfig::default()).unwrap();
//! let visual = brain
//!     .create_region("visual", RegionKind::Cortical, ActivationPattern::Synchronous)
//!     .unwrap();
//! let motor = brain
//!     .create_region("motor", RegionKind::Cortical, ActivationPattern::Competitive)
//!     .unwrap();
//! brain.create_neurons(visual, 64).unwrap();
//! brain.create_neurons(motor, 16).unwrap();
//! brain.connect_regions(visual, motor, 0.2, (0.2, 0.6));
//! brain.map_modality(Modality::Visual, visual).unwrap();
//!
//! brain.initialize().unwrap();
//! brain.start().unwrap();
//! brain.feed_pattern(Modality::Visual, &[0.8, 0.1, 0.5]);
//! brain.process_step(0.01);
//! brain.deliver_reward(1.0, "task", "{}");
//! brain.process_step(0.01);
//! ```
//!
//! ## Crate map
//!
//! - [`neural`]: neurons, synapses, regions
//! - [`plasticity`]: learning rules and telemetry
//! - [`development`]: connectivity building and connectome I/O
//! - [`brain`]: the orchestrator and its thread-safe handle
//!
//! ## License
//!
//! Apache-2.0

pub use synaptica_brain as brain;
pub use synaptica_development as development;
pub use synaptica_neural as neural;
pub use synaptica_plasticity as plasticity;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use crate::brain::{Brain, BrainState, GlobalStatistics, Modality, SharedBrain};
    pub use crate::development::{
        export_connectome, import_connectome, ConnectionParams, ConnectivityBuilder,
        ConnectivityPattern, ConnectomeExport, DistanceDistribution,
    };
    pub use crate::neural::{
        ActivationPattern, IdAllocator, Neuron, NeuronId, NeuronState, PlasticityRule, Region,
        RegionId, RegionKind, Synapse, SynapseId, SynapseType, SynapticaError,
    };
    pub use crate::plasticity::{
        AttentionMode, CompetenceMode, HebbianScope, LearningConfig, LearningEngine, LearningStats,
    };
}
