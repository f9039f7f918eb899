// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Synaptica Development
//!
//! Substrate construction:
//! - **Params**: connectivity patterns, distance distributions, and the
//!   validated per-call parameter set
//! - **Builder**: plan-then-apply wiring between (or within) regions,
//!   plus the cortical-hierarchy, thalamocortical and limbic helpers
//! - **Connectome**: JSON export/import of the region/connection
//!   structure, the substrate's only interoperability surface

pub mod builder;
pub mod connectome;
pub mod params;

pub use builder::{BuilderStats, ConnectivityBuilder};
pub use connectome::{
    export_connectome, import_connectome, ConnectionExport, ConnectomeExport, RegionExport,
};
pub use params::{ConnectionParams, ConnectivityPattern, DistanceDistribution};
