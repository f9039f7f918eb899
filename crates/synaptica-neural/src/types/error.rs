// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for Synaptica core operations

use super::ids::{NeuronId, RegionId, SynapseId};

/// Result type for core operations
pub type Result<T> = core::result::Result<T, SynapticaError>;

/// Errors that can occur in the activation, plasticity and wiring layers.
///
/// Per-tick numerical operations never surface these: invalid operands are
/// counted and skipped. Boundary calls (construction, configuration, explicit
/// queries) surface them to the caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SynapticaError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Neuron not found: {0}")]
    NeuronNotFound(NeuronId),

    #[error("Synapse not found: {0}")]
    SynapseNotFound(SynapseId),

    #[error("Region not found: {0}")]
    RegionNotFound(RegionId),

    #[error("Region not found: {0}")]
    RegionNameNotFound(String),

    #[error("Unknown modality: {0}")]
    UnknownModality(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Fan-out cap exceeded for {neuron} (max {max})")]
    ResourceExhausted { neuron: NeuronId, max: usize },

    #[error("Degraded operand: synapse {0} has an unresolvable endpoint")]
    DegradedOperand(SynapseId),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
