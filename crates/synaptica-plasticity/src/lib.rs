// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Synaptica Plasticity
//!
//! Learning rules and their telemetry:
//! - **Config**: one validated struct for every learning knob
//! - **Engine**: Hebbian, STDP, eligibility traces, reward-modulated
//!   updates, homeostasis, decay, consolidation, competence
//! - **Attention**: double-buffered boost map with linear annealing
//! - **Shaping**: novelty-based reward shaping
//! - **Structural**: prune/grow/spawn cycle
//!
//! The engine borrows regions from the orchestrator per pass; it owns
//! no neural state except the spike-time map and eligibility bookkeeping.

pub mod attention;
pub mod config;
pub mod engine;
pub mod shaping;
pub mod stats;
pub mod structural;

pub use attention::AttentionState;
pub use config::{AttentionMode, CompetenceMode, HebbianScope, LearningConfig};
pub use engine::{ConsolidationPhase, LearningEngine};
pub use shaping::RewardShaper;
pub use stats::LearningStats;
pub use structural::StructuralReport;
