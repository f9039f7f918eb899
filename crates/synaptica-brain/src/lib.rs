// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Synaptica Brain
//!
//! The orchestrator layer:
//! - **Brain**: region ownership, modality routing, the tick loop, and
//!   the learning-engine cadence
//! - **SharedBrain**: coarse-locked thread-safe handle
//! - **GlobalStatistics**: whole-substrate telemetry snapshot

pub mod brain;
pub mod modality;
pub mod shared;
pub mod stats;

pub use brain::{Brain, BrainState};
pub use modality::Modality;
pub use shared::SharedBrain;
pub use stats::GlobalStatistics;
